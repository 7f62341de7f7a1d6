mod cli;
mod server;

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use clap::Parser;
use eyre::{eyre, WrapErr};

use ordlist_core::psbt::StructuralVerifier;
use ordlist_core::resolver::{HttpOrdinalResolver, OrdinalResolver};
use ordlist_core::store::{ListingStore, MemoryListingStore};
use ordlist_core::ListingService;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .init();

    let mut resolver = HttpOrdinalResolver::new(
        args.resolver_api_key.as_deref(),
        Duration::from_secs(args.resolver_timeout_secs),
    )
    .context("build inscription resolver client")?;
    if let Some(url) = &args.resolver_url {
        resolver = resolver.with_base_url(args.network, url);
    }
    if args.resolver_api_key.is_none() {
        tracing::warn!("no resolver API key configured: indexer requests may be rate limited");
    }
    let resolver: Arc<dyn OrdinalResolver> = Arc::new(resolver);

    let store: Arc<dyn ListingStore> = match &args.store_path {
        Some(path) => {
            let store = MemoryListingStore::with_persistence(path)
                .context("load persisted listing store")?;
            tracing::info!(
                path = %path.display(),
                listings = store.len().await,
                "loaded persisted listing store"
            );
            Arc::new(store)
        }
        None => {
            tracing::warn!("no --store-path given: listings are kept in memory only");
            Arc::new(MemoryListingStore::new())
        }
    };

    let mut service = ListingService::new(resolver, store, args.network);
    if args.verify_signed_psbt {
        service = service.with_verifier(Arc::new(StructuralVerifier));
        tracing::info!("signed listing PSBTs are checked before activation");
    } else {
        tracing::warn!("signed listing PSBTs are stored unverified");
    }

    let allowed_origins = args
        .allowed_origin
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .map_err(|e| eyre!("invalid --allowed-origin `{origin}`: {e}"))
        })
        .collect::<eyre::Result<Vec<_>>>()?;

    let state = server::AppState {
        listings: Arc::new(service),
        network: args.network,
        request_timeout: Duration::from_secs(args.request_timeout_secs),
    };
    let router = server::build_router(state, &allowed_origins);

    let bind_addr = format!("{}:{}", args.bind, args.port);
    if args.bind == "0.0.0.0" {
        tracing::warn!("server is bound to 0.0.0.0: it is accessible from the network");
    }

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .context("bind TCP listener")?;

    tracing::info!(network = %args.network, "listening on {bind_addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("run HTTP server")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
