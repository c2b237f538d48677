use anyhow::Result;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::aggregator::TOP_LIMIT;
use crate::format::{display_address, shorten_address};
use crate::models::{AddressFrequency, SessionSnapshot, Transaction};
use crate::poll_stats::{PollStatsSnapshot, POLL_STATS};

#[derive(Clone)]
pub struct AppState {
    pub snapshot: watch::Receiver<SessionSnapshot>,
}

impl AppState {
    fn current(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Serialize)]
struct StatsResponse {
    count: u64,
    checkpoint: u64,
    archive_height: Option<u64>,
    loading: bool,
    placeholder: bool,
}

#[derive(Serialize)]
struct TxView {
    hash: String,
    from: Option<String>,
    to: Option<String>,
    from_display: String,
    to_display: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    value_wei: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    block_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    transaction_index: Option<u64>,
}

impl TxView {
    fn from_transaction(tx: &Transaction) -> Option<Self> {
        Some(Self {
            hash: tx.hash()?.to_string(),
            from: tx.from.clone(),
            to: tx.to.clone(),
            from_display: display_address(tx.from_address()),
            to_display: display_address(tx.to_address()),
            value_wei: tx.value_wei(),
            block_number: tx.block_number,
            transaction_index: tx.transaction_index,
        })
    }
}

#[derive(Serialize)]
struct LatestResponse {
    transactions: Vec<TxView>,
}

#[derive(Serialize)]
struct RankedAddress {
    address: String,
    display: String,
    count: u64,
}

#[derive(Serialize)]
struct TopSendersResponse {
    top_senders: Vec<RankedAddress>,
}

#[derive(Serialize)]
struct TopReceiversResponse {
    top_receivers: Vec<RankedAddress>,
}

#[derive(Deserialize)]
struct LimitParams {
    limit: Option<usize>,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let snap = state.current();
    Json(StatsResponse {
        count: snap.count,
        checkpoint: snap.checkpoint,
        archive_height: snap.archive_height,
        loading: snap.loading,
        placeholder: snap.show_placeholder(),
    })
}

async fn latest_txs(State(state): State<AppState>) -> Json<LatestResponse> {
    let snap = state.current();
    Json(LatestResponse {
        transactions: snap.latest.iter().filter_map(TxView::from_transaction).collect(),
    })
}

async fn top_senders(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Json<TopSendersResponse> {
    let snap = state.current();
    Json(TopSendersResponse {
        top_senders: ranked(&snap.top_from, params.limit),
    })
}

async fn top_receivers(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Json<TopReceiversResponse> {
    let snap = state.current();
    Json(TopReceiversResponse {
        top_receivers: ranked(&snap.top_to, params.limit),
    })
}

async fn poll_stats() -> Json<PollStatsSnapshot> {
    Json(POLL_STATS.snapshot())
}

fn ranked(entries: &[AddressFrequency], limit: Option<usize>) -> Vec<RankedAddress> {
    let limit = limit.unwrap_or(TOP_LIMIT).min(TOP_LIMIT);
    entries
        .iter()
        .take(limit)
        .map(|entry| RankedAddress {
            address: entry.address.clone(),
            display: shorten_address(&entry.address),
            count: entry.count,
        })
        .collect()
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/stats/top-senders", get(top_senders))
        .route("/stats/top-receivers", get(top_receivers))
        .route("/stats/poll", get(poll_stats))
        .route("/tx/latest", get(latest_txs))
        .with_state(state)
}

pub async fn run_http_server(addr: &str, state: AppState, cancel: CancellationToken) -> Result<()> {
    let app = app_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;
    Ok(())
}
