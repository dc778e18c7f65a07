//! Umbraix CLI - chat with OpenRouter models and run web searches from a terminal.

use std::io::Write as _;

use anyhow::{Context as _, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use umbraix_client::observability::init_observability;
use umbraix_client::prelude::*;
use umbraix_client::vendors::openrouter::OpenRouterClient;
use umbraix_client::vendors::search::{
    BraveSearchClient, GoogleSearchClient, SerpApiClient,
};

const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";

#[derive(Parser)]
#[command(name = "umbraix")]
#[command(author, version, about = "OpenRouter chat and web search from the terminal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List models available on OpenRouter
    Models,

    /// Send a single prompt to a model
    Chat {
        /// Prompt text
        prompt: String,
        /// Model id (provider/model)
        #[arg(short, long, default_value = DEFAULT_MODEL)]
        model: String,
        /// Optional system prompt
        #[arg(long)]
        system: Option<String>,
        /// Stream the reply as it is generated (Ctrl-C stops it, twice quits)
        #[arg(short, long)]
        stream: bool,
        /// Ask for image output alongside text
        #[arg(long)]
        image: bool,
    },

    /// Run a web search
    Search {
        /// Search backend
        provider: SearchProvider,
        /// Query text
        query: String,
        /// SerpApi engine (google, bing, ...)
        #[arg(long)]
        engine: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum SearchProvider {
    Serpapi,
    Google,
    Brave,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_observability();

    let cli = Cli::parse();
    let config = ClientConfig::from_env();

    match cli.command {
        Commands::Models => list_models(config).await,
        Commands::Chat {
            prompt,
            model,
            system,
            stream,
            image,
        } => {
            let request = build_request(&model, &prompt, system.as_deref(), image);
            let client = OpenRouterClient::new(config.openrouter)?;
            if stream {
                stream_chat(&client, &request).await
            } else {
                let reply = client.chat(&request).await?;
                println!("{reply}");
                Ok(())
            }
        }
        Commands::Search {
            provider,
            query,
            engine,
        } => search(config, provider, &query, engine).await,
    }
}

fn build_request(model: &str, prompt: &str, system: Option<&str>, image: bool) -> ChatRequest {
    let mut request = ChatRequest::new(model);
    if let Some(system) = system {
        request = request.system_prompt(system);
    }
    request = request.user_text(prompt);
    if image {
        request = request.modalities([Modality::Image, Modality::Text]);
    }
    request
}

async fn list_models(config: ClientConfig) -> anyhow::Result<()> {
    let client = OpenRouterClient::new(config.openrouter)?;
    let models = client.list_models().await?;
    if models.is_empty() {
        warn!("no models returned; is OPENROUTER_API_KEY set?");
    }
    for model in models {
        match model.name {
            Some(name) => println!("{}\t{}", model.id, name),
            None => println!("{}", model.id),
        }
    }
    Ok(())
}

const INTERRUPTED_EXIT_CODE: i32 = 130;

/// What a Ctrl-C does while a reply is streaming.
#[derive(Debug, PartialEq, Eq)]
enum Interrupt {
    /// Stop reading and print the partial reply.
    Abort,
    /// Quit even if the upstream read is stuck.
    Exit,
}

fn interrupt_action(presses: u32) -> Interrupt {
    if presses <= 1 {
        Interrupt::Abort
    } else {
        Interrupt::Exit
    }
}

async fn stream_chat(client: &OpenRouterClient, request: &ChatRequest) -> anyhow::Result<()> {
    let (abort, signal) = AbortHandle::new();
    let ctrl_c = tokio::spawn(async move {
        let mut presses = 0;
        while tokio::signal::ctrl_c().await.is_ok() {
            presses += 1;
            match interrupt_action(presses) {
                Interrupt::Abort => {
                    warn!("stopping stream; press Ctrl-C again to quit");
                    abort.abort();
                }
                Interrupt::Exit => std::process::exit(INTERRUPTED_EXIT_CODE),
            }
        }
    });

    let mut stdout = std::io::stdout();
    let mut sink = FnSink::new(
        |fragment: Fragment| {
            let _ = match &fragment {
                Fragment::Text(text) => write!(stdout, "{text}"),
                Fragment::Image(url) => write!(stdout, "\n[image] {url}\n"),
            };
            let _ = stdout.flush();
        },
        |_transcript: &str| {},
    );
    let outcome = client.stream_chat(request, &signal, &mut sink).await;
    ctrl_c.abort();
    let outcome = outcome?;

    println!();
    if outcome.cancelled {
        info!(chars = outcome.text.len(), "stream stopped by user");
    }
    Ok(())
}

async fn search(
    config: ClientConfig,
    provider: SearchProvider,
    query: &str,
    engine: Option<String>,
) -> anyhow::Result<()> {
    let backend: Box<dyn WebSearch> = match provider {
        SearchProvider::Serpapi => {
            let mut serp = config
                .serpapi
                .context("SERPAPI_API_KEY is not set")?;
            if let Some(engine) = engine {
                serp = serp.engine(engine);
            }
            Box::new(SerpApiClient::new(serp)?)
        }
        SearchProvider::Google => {
            let quota = config.quota_tracker();
            let google = config.google.ok_or_else(|| {
                anyhow!("set GOOGLE_API_KEY and GOOGLE_CSE_ID (or the shared pair)")
            })?;
            Box::new(GoogleSearchClient::new(google, quota)?)
        }
        SearchProvider::Brave => {
            let brave = config.brave.context("BRAVE_API_KEY is not set")?;
            Box::new(BraveSearchClient::new(brave)?)
        }
    };

    let response = backend.search(query).await?;
    info!(provider = backend.name(), hits = response.results.len(), "search finished");
    for (index, hit) in response.results.iter().enumerate() {
        println!("{}. {}\n   {}", index + 1, hit.title, hit.link);
        if !hit.snippet.is_empty() {
            println!("   {}", hit.snippet);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_defaults_to_non_streaming_text() {
        let cli = Cli::try_parse_from(["umbraix", "chat", "hello"]).expect("parse");
        match cli.command {
            Commands::Chat {
                prompt,
                model,
                stream,
                image,
                ..
            } => {
                assert_eq!(prompt, "hello");
                assert_eq!(model, DEFAULT_MODEL);
                assert!(!stream);
                assert!(!image);
            }
            _ => panic!("expected chat"),
        }
    }

    #[test]
    fn search_parses_provider_and_engine() {
        let cli = Cli::try_parse_from(["umbraix", "search", "serpapi", "rust", "--engine", "bing"])
            .expect("parse");
        assert!(matches!(
            cli.command,
            Commands::Search { provider: SearchProvider::Serpapi, ref engine, .. }
                if engine.as_deref() == Some("bing")
        ));
        assert!(Cli::try_parse_from(["umbraix", "search", "yahoo", "rust"]).is_err());
    }

    #[test]
    fn first_interrupt_aborts_and_second_exits() {
        assert_eq!(interrupt_action(1), Interrupt::Abort);
        assert_eq!(interrupt_action(2), Interrupt::Exit);
        assert_eq!(interrupt_action(5), Interrupt::Exit);
    }

    #[test]
    fn image_flag_requests_both_modalities() {
        let request = build_request("m", "draw", Some("be brief"), true);
        assert_eq!(request.modalities, vec![Modality::Image, Modality::Text]);
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[1].content, "draw");
    }
}
