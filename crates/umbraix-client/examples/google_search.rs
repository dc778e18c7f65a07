use umbraix_client::prelude::*;
use umbraix_client::vendors::search::GoogleSearchClient;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), ClientError> {
    let config = ClientConfig::from_env();
    let quota = config.quota_tracker();
    let google = config
        .google
        .ok_or_else(|| ClientError::Config("Google search credentials are not set".into()))?;
    let client = GoogleSearchClient::new(google, quota)?;

    let response = client.search("rust async streams").await?;
    for hit in response.results {
        println!("{}\n  {}", hit.title, hit.link);
    }
    Ok(())
}
