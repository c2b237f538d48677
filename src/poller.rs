use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::aggregator::{ApplyOutcome, SessionState};
use crate::client::{ClientError, HypersyncClient};
use crate::models::SessionSnapshot;
use crate::poll_stats::POLL_STATS;

/// Drives the query loop and owns the session. Every state change is
/// published to subscribers as a fresh snapshot.
pub struct Poller {
    client: HypersyncClient,
    session: SessionState,
    interval: Duration,
    updates: watch::Sender<SessionSnapshot>,
}

impl Poller {
    pub fn new(client: HypersyncClient, session: SessionState, interval: Duration) -> Self {
        let (updates, _) = watch::channel(session.snapshot());
        Self {
            client,
            session,
            interval,
            updates,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.updates.subscribe()
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Run a single query cycle. On error the session is left untouched
    /// apart from the loading flag.
    pub async fn poll_once(&mut self) -> Result<ApplyOutcome, ClientError> {
        let from_block = self.session.checkpoint();
        self.set_loading(true);
        POLL_STATS.inc_polls();

        let fetched = self.client.fetch(from_block).await;
        self.session.set_loading(false);

        let result = match fetched {
            Ok(result) => result,
            Err(err) => {
                POLL_STATS.inc_failed_polls();
                self.publish();
                return Err(err);
            }
        };

        let blocks = result.blocks.len() as u64;
        let outcome = self.session.apply(result);
        POLL_STATS.inc_blocks(blocks);
        POLL_STATS.inc_transactions(outcome.appended as u64);
        self.publish();

        debug!(
            from_block,
            blocks,
            appended = outcome.appended,
            checkpoint = self.session.checkpoint(),
            "poll applied"
        );
        Ok(outcome)
    }

    /// Poll immediately, then once per interval until `cancel` fires.
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            variant = %self.client.variant(),
            from_block = self.session.checkpoint(),
            interval_ms = self.interval.as_millis() as u64,
            "poller started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                res = self.poll_once() => {
                    if let Err(err) = res {
                        warn!("error fetching data: {}", err);
                    }
                }
            }
        }

        self.set_loading(false);
        info!(count = self.session.count(), "poller stopped");
    }

    fn set_loading(&mut self, loading: bool) {
        self.session.set_loading(loading);
        self.publish();
    }

    fn publish(&self) {
        self.updates.send_replace(self.session.snapshot());
    }
}
