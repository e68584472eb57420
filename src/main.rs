//! FiveM DB compliance service entry point.
//!
//! Loads configuration, picks a list source, and serves the check API.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fivemdb_compliance::cache::CachedSource;
use fivemdb_compliance::checker::ComplianceChecker;
use fivemdb_compliance::config::CheckerConfig;
use fivemdb_compliance::error::{ComplianceError, Result};
use fivemdb_compliance::filter::ContentFilter;
use fivemdb_compliance::source::{BlacklistSource, KeywordLists, MemorySource};
use fivemdb_compliance::supabase::SupabaseSource;
use fivemdb_compliance::web;

/// How often list cache statistics are logged.
const CACHE_STATS_INTERVAL: Duration = Duration::from_secs(300);

/// Wrap `source` in the list cache unless caching is disabled.
fn with_cache<S: BlacklistSource + 'static>(source: S, config: &CheckerConfig) -> Arc<dyn BlacklistSource> {
    if config.cache_ttl_secs == 0 {
        return Arc::new(source);
    }

    let cached = Arc::new(CachedSource::new(source, config.cache_ttl()));
    let stats = cached.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CACHE_STATS_INTERVAL);
        // The first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            stats.log_stats().await;
        }
    });
    cached
}

/// Resolve on ctrl-c; never resolves if the handler cannot be installed.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to install ctrl-c handler; graceful shutdown disabled");
            std::future::pending::<()>().await;
        }
    }
}

/// Choose the list source: hosted store, then local file, then nothing.
fn build_source(config: &CheckerConfig) -> Result<Arc<dyn BlacklistSource>> {
    if let Some(store) = &config.supabase {
        let source = SupabaseSource::new(
            &store.url,
            store.anon_key.clone(),
            config.request_timeout(),
        )?;
        tracing::info!(url = %store.url, "Using hosted store");
        return Ok(with_cache(source, config));
    }

    if let Some(path) = &config.keyword_lists_path {
        let lists = KeywordLists::from_file(path)?;
        tracing::info!(
            path = %path.display(),
            entries = lists.blacklist_entries.len(),
            "Using local lists file"
        );
        return Ok(Arc::new(MemorySource::new(lists)));
    }

    tracing::warn!("No list source configured; only the content filter is active");
    Ok(Arc::new(MemorySource::default()))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // RUST_LOG overrides the default info level
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Compliance service starting...");

    let config = CheckerConfig::from_env()?;
    tracing::info!(
        cache_ttl_secs = config.cache_ttl_secs,
        strict_links = config.strict_link_matching,
        "Configuration loaded"
    );

    let filter = ContentFilter::new(config.content_filter()?);
    let source = build_source(&config)?;
    let checker = ComplianceChecker::new(source, filter).with_options(config.match_options());

    let router = web::build_router(web::AppState {
        checker: Arc::new(checker),
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ComplianceError::Io(format!("Failed to bind {}: {}", addr, e)))?;
    tracing::info!(port = config.http_port, "Starting HTTP server");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ComplianceError::Io(format!("HTTP server error: {}", e)))?;

    Ok(())
}
