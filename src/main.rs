//! Refresh Cache demo host
//!
//! Runs a cache holding a perpetually refreshed "site configuration" entry and
//! a short-lived session entry, logging what readers observe until Ctrl+C.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use refresh_cache::{Cache, CacheConfig};

const SITE_CONFIG_KEY: &str = "site-config";
const SESSION_KEY: &str = "session";

/// Main entry point for the demo.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cache (starts the sweep task)
/// 4. Register a perpetual and a transient entry
/// 5. Report served values and statistics every second
/// 6. Shut the cache down on Ctrl+C
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "refresh_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Refresh Cache demo");

    let config = CacheConfig::from_env();
    info!(
        "Configuration loaded: failure_policy={:?}",
        config.failure_policy
    );

    let cache: Arc<Cache<&'static str, String>> =
        Arc::new(Cache::with_config(config).context("failed to create cache")?);

    let revision = Arc::new(AtomicU64::new(0));
    let generator_revision = revision.clone();
    cache
        .store_perpetual(
            SITE_CONFIG_KEY,
            move || {
                let rev = generator_revision.fetch_add(1, Ordering::SeqCst) + 1;
                format!("site configuration rev {}", rev)
            },
            Duration::from_secs(3),
        )
        .await
        .context("failed to register site configuration")?;

    cache
        .store(SESSION_KEY, "guest".to_string(), Duration::from_secs(5))
        .await;

    let reporter = tokio::spawn(report_loop(cache.clone()));

    signal::ctrl_c()
        .await
        .context("failed to install Ctrl+C handler")?;
    info!("Received Ctrl+C, initiating shutdown...");

    reporter.abort();
    cache.shutdown().await.context("cache shutdown failed")?;

    info!("Demo shutdown complete");
    Ok(())
}

/// Logs what a reader sees once per second, with a JSON stats snapshot.
async fn report_loop(cache: Arc<Cache<&'static str, String>>) {
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    loop {
        ticker.tick().await;

        let site_config = cache.get(SITE_CONFIG_KEY).await;
        let session = cache.get(SESSION_KEY).await;
        info!("{} = {:?}, {} = {:?}", SITE_CONFIG_KEY, site_config, SESSION_KEY, session);

        match serde_json::to_string(&cache.stats().await) {
            Ok(json) => info!("stats: {}", json),
            Err(err) => tracing::warn!("failed to serialize stats: {}", err),
        }
    }
}
