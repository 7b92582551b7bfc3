use std::time::Duration;

use core_srt::{TimeUnit, get_api_base_url, get_duration, setup_logging};
use cron_srt::{DEFAULT_POLL_INTERVAL_S, trigger_check};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file, if it exists
    dotenvy::dotenv().ok();

    setup_logging("cron_srt=debug,core_srt=info");

    let poll_interval = get_duration(TimeUnit::Seconds, "CRON_POLL_INTERVAL_S", DEFAULT_POLL_INTERVAL_S);
    tracing::info!("Cron service started, triggering a ranking check every {:?}", poll_interval);

    let http_client = match reqwest::Client::builder().timeout(Duration::from_secs(30)).build() {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("Failed to build HTTP client: {}", e);
            std::process::exit(1);
        }
    };

    let api_base_url = match get_api_base_url() {
        Ok(url) => url,
        Err(e) => {
            tracing::error!("Invalid API address: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!("API server URL: {}", api_base_url);

    loop {
        tracing::info!("Starting cron cycle");

        if let Err(e) = trigger_check(&http_client, &api_base_url).await {
            tracing::error!("Failed to trigger ranking check: {}", e);
        }

        tracing::info!("Sleeping for {:?} until next cycle", poll_interval);
        tokio::time::sleep(poll_interval).await;
    }
}
