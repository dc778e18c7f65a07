//! Process-wide `tracing` setup.
use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

const DEFAULT_FILTER: &str = "info";
const DEFAULT_LOG_FILE: &str = "umbraix.logs.jsonl";

static INIT: OnceCell<()> = OnceCell::new();

/// Where log events end up.
#[derive(Debug, PartialEq, Eq)]
enum LogSink {
    Off,
    /// Compact human-readable lines; stdout stays free for streamed output.
    Stderr,
    /// One JSON object per line in this file.
    JsonFile(PathBuf),
}

#[derive(Debug, PartialEq, Eq)]
struct LogSettings {
    sink: LogSink,
    filter: String,
}

impl LogSettings {
    /// Resolves settings through `lookup`, normally `std::env::var`.
    fn resolve(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let enabled = non_blank("UMBRAIX_OBSERVABILITY")
            .and_then(|value| parse_switch(&value))
            .unwrap_or(true);
        let sink = match (enabled, non_blank("UMBRAIX_JSON_LOG_PATH")) {
            (false, _) => LogSink::Off,
            (true, Some(path)) => LogSink::JsonFile(PathBuf::from(path.trim())),
            (true, None) => LogSink::Stderr,
        };

        let filter = [non_blank("UMBRAIX_LOG_LEVEL"), non_blank("RUST_LOG")]
            .into_iter()
            .flatten()
            .find(|candidate| EnvFilter::try_new(candidate).is_ok())
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());

        Self { sink, filter }
    }

    fn install(self) {
        let filter = EnvFilter::try_new(&self.filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        match self.sink {
            LogSink::Off => {}
            LogSink::Stderr => {
                let layer = tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr);
                let _ = tracing_subscriber::registry().with(filter).with(layer).try_init();
            }
            LogSink::JsonFile(path) => {
                let (dir, file_name) = split_log_path(&path);
                let _ = std::fs::create_dir_all(&dir);
                let layer = tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(tracing_appender::rolling::never(dir, file_name));
                let _ = tracing_subscriber::registry().with(filter).with(layer).try_init();
            }
        }
    }
}

fn parse_switch(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn split_log_path(path: &Path) -> (PathBuf, String) {
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(DEFAULT_LOG_FILE)
        .to_string();
    (dir, file_name)
}

/// Installs the global subscriber on first call; later calls do nothing.
///
/// - `UMBRAIX_OBSERVABILITY=0` turns logging off.
/// - `UMBRAIX_JSON_LOG_PATH` switches from stderr to a JSONL file.
/// - `UMBRAIX_LOG_LEVEL`, then `RUST_LOG`, select the filter (default `info`).
pub fn init_observability() {
    INIT.get_or_init(|| LogSettings::resolve(|key| std::env::var(key).ok()).install());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn resolve(vars: &[(&str, &str)]) -> LogSettings {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        LogSettings::resolve(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_to_stderr_at_info() {
        assert_eq!(
            resolve(&[]),
            LogSettings {
                sink: LogSink::Stderr,
                filter: "info".into()
            }
        );
    }

    #[test]
    fn switch_off_wins_over_log_path() {
        let settings = resolve(&[
            ("UMBRAIX_OBSERVABILITY", " Off "),
            ("UMBRAIX_JSON_LOG_PATH", "/tmp/umbraix.jsonl"),
        ]);
        assert_eq!(settings.sink, LogSink::Off);
        assert_eq!(resolve(&[("UMBRAIX_OBSERVABILITY", "maybe")]).sink, LogSink::Stderr);
    }

    #[test]
    fn json_path_selects_file_sink() {
        let settings = resolve(&[("UMBRAIX_JSON_LOG_PATH", "logs/run.jsonl")]);
        assert_eq!(settings.sink, LogSink::JsonFile(PathBuf::from("logs/run.jsonl")));
    }

    #[test]
    fn invalid_level_falls_back_to_rust_log() {
        let settings = resolve(&[
            ("UMBRAIX_LOG_LEVEL", "umbraix_client=notalevel"),
            ("RUST_LOG", "umbraix_client=debug"),
        ]);
        assert_eq!(settings.filter, "umbraix_client=debug");
        assert_eq!(resolve(&[("UMBRAIX_LOG_LEVEL", "warn")]).filter, "warn");
    }

    #[test]
    fn log_path_without_directory_uses_current_dir() {
        assert_eq!(
            split_log_path(Path::new("run.jsonl")),
            (PathBuf::from("."), "run.jsonl".to_string())
        );
        assert_eq!(
            split_log_path(Path::new("/var/log/umbraix/run.jsonl")),
            (PathBuf::from("/var/log/umbraix"), "run.jsonl".to_string())
        );
    }

    #[test]
    fn init_is_idempotent() {
        init_observability();
        init_observability();
    }
}
