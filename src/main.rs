use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use eip7702_watch::aggregator::SessionState;
use eip7702_watch::api::{self, AppState};
use eip7702_watch::cli::{Cli, Commands};
use eip7702_watch::client::HypersyncClient;
use eip7702_watch::config::Config;
use eip7702_watch::format::{display_address, shorten_address};
use eip7702_watch::models::SessionSnapshot;
use eip7702_watch::poller::Poller;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env().context("failed to load configuration")?;

    match cli.command {
        Commands::Watch { query } => {
            let config = config.with_overrides(&query)?;
            let poller = build_poller(&config)?;
            let mut updates = poller.subscribe();
            let cancel = shutdown_on_ctrl_c();

            let handle = tokio::spawn(poller.run(cancel.clone()));
            let mut last_count = 0;
            while updates.changed().await.is_ok() {
                let snap = updates.borrow_and_update().clone();
                if snap.count != last_count {
                    last_count = snap.count;
                    log_snapshot(&snap);
                }
            }
            handle.await.context("poller task panicked")?;
        }
        Commands::PollOnce { query } => {
            let config = config.with_overrides(&query)?;
            let mut poller = build_poller(&config)?;
            poller
                .poll_once()
                .await
                .context("query to indexing service failed")?;
            let snap = poller.session().snapshot();
            println!("{}", serde_json::to_string_pretty(&snap)?);
        }
        Commands::Serve { query, addr } => {
            let config = config.with_overrides(&query)?;
            let bind = addr.unwrap_or_else(|| config.http_bind_addr.clone());
            let poller = build_poller(&config)?;
            let state = AppState {
                snapshot: poller.subscribe(),
            };
            let cancel = shutdown_on_ctrl_c();

            let handle = tokio::spawn(poller.run(cancel.clone()));
            api::run_http_server(&bind, state, cancel.clone()).await?;
            cancel.cancel();
            handle.await.context("poller task panicked")?;
        }
    }

    Ok(())
}

fn build_poller(config: &Config) -> anyhow::Result<Poller> {
    let client = HypersyncClient::new(
        config.hypersync_url.clone(),
        config.variant,
        config.request_timeout,
        config.api_token.as_deref(),
    )
    .context("failed to build HTTP client")?;
    let session = SessionState::new(config.start_block, config.variant.tracks_addresses());
    Ok(Poller::new(client, session, config.poll_interval()))
}

fn shutdown_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown requested");
        }
        token.cancel();
    });
    cancel
}

fn log_snapshot(snap: &SessionSnapshot) {
    tracing::info!(
        count = snap.count,
        checkpoint = snap.checkpoint,
        archive_height = snap.archive_height.unwrap_or_default(),
        "transactions updated"
    );
    for tx in &snap.latest {
        tracing::debug!(
            hash = tx.hash().unwrap_or_default(),
            from = %display_address(tx.from_address()),
            to = %display_address(tx.to_address()),
            "latest"
        );
    }
    for entry in &snap.top_from {
        tracing::debug!(address = %shorten_address(&entry.address), count = entry.count, "top sender");
    }
    for entry in &snap.top_to {
        tracing::debug!(address = %shorten_address(&entry.address), count = entry.count, "top receiver");
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();
}
