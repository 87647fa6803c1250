mod config;
mod db;
mod error;
mod models;
mod runner;
mod scheduler;
mod services;

use config::Config;
use runner::ScrapeRunner;

/// One ingestion pass per invocation; the interval timer lives in the host
/// scheduler (cron or similar). Failures never escape as a non-zero exit,
/// only as error logs, so a bad pass cannot take the schedule down.
#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load config: {}", e);
            return;
        }
    };

    match ScrapeRunner::new(&config).await {
        Ok(runner) => runner.run().await,
        Err(e) => tracing::error!("Scrape pass could not start: {}", e),
    }
}
