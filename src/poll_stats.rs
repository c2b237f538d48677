use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug)]
pub struct PollStats {
    polls: AtomicU64,
    failed_polls: AtomicU64,
    blocks: AtomicU64,
    transactions: AtomicU64,
}

impl Default for PollStats {
    fn default() -> Self {
        Self::new()
    }
}

impl PollStats {
    pub const fn new() -> Self {
        Self {
            polls: AtomicU64::new(0),
            failed_polls: AtomicU64::new(0),
            blocks: AtomicU64::new(0),
            transactions: AtomicU64::new(0),
        }
    }

    pub fn inc_polls(&self) {
        self.polls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_failed_polls(&self) {
        self.failed_polls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_blocks(&self, n: u64) {
        self.blocks.fetch_add(n, Ordering::Relaxed);
    }

    pub fn inc_transactions(&self, n: u64) {
        self.transactions.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> PollStatsSnapshot {
        PollStatsSnapshot {
            polls: self.polls.load(Ordering::Relaxed),
            failed_polls: self.failed_polls.load(Ordering::Relaxed),
            blocks: self.blocks.load(Ordering::Relaxed),
            transactions: self.transactions.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct PollStatsSnapshot {
    pub polls: u64,
    pub failed_polls: u64,
    pub blocks: u64,
    pub transactions: u64,
}

pub static POLL_STATS: PollStats = PollStats::new();
