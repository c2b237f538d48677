use std::collections::HashMap;

use crate::models::{AddressFrequency, PollResult, SessionSnapshot, Transaction};

pub const LATEST_LIMIT: usize = 10;
pub const TOP_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressField {
    From,
    To,
}

impl AddressField {
    pub fn of(self, tx: &Transaction) -> Option<&str> {
        match self {
            AddressField::From => tx.from_address(),
            AddressField::To => tx.to_address(),
        }
    }
}

/// Running occurrence counts that remember first-seen order, so ties in
/// `top` come out in the order addresses first appeared.
#[derive(Debug, Clone, Default)]
pub struct FrequencyCounter {
    index: HashMap<String, usize>,
    entries: Vec<AddressFrequency>,
}

impl FrequencyCounter {
    pub fn record(&mut self, address: &str) {
        match self.index.get(address) {
            Some(&i) => self.entries[i].count += 1,
            None => {
                self.index.insert(address.to_string(), self.entries.len());
                self.entries.push(AddressFrequency {
                    address: address.to_string(),
                    count: 1,
                });
            }
        }
    }

    pub fn top(&self, limit: usize) -> Vec<AddressFrequency> {
        let mut ranked = self.entries.clone();
        // stable: equal counts keep first-occurrence order
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked.truncate(limit);
        ranked
    }
}

/// Count `field` over the whole slice and return the `limit` most frequent.
pub fn address_frequencies(
    transactions: &[Transaction],
    field: AddressField,
    limit: usize,
) -> Vec<AddressFrequency> {
    let mut counter = FrequencyCounter::default();
    for address in transactions.iter().filter_map(|tx| field.of(tx)) {
        counter.record(address);
    }
    counter.top(limit)
}

/// The last `limit` transactions, newest first, with hashless entries
/// dropped after slicing.
pub fn latest_transactions(transactions: &[Transaction], limit: usize) -> Vec<Transaction> {
    let start = transactions.len().saturating_sub(limit);
    transactions[start..]
        .iter()
        .rev()
        .filter(|tx| tx.hash().is_some())
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub appended: usize,
    pub checkpoint_advanced: bool,
}

/// Everything accumulated since start-up. Transactions are only ever
/// appended; the derived views are recomputed after each append.
#[derive(Debug, Clone)]
pub struct SessionState {
    transactions: Vec<Transaction>,
    checkpoint: u64,
    archive_height: Option<u64>,
    loading: bool,
    track_addresses: bool,
    senders: FrequencyCounter,
    receivers: FrequencyCounter,
    latest: Vec<Transaction>,
    top_from: Vec<AddressFrequency>,
    top_to: Vec<AddressFrequency>,
}

impl SessionState {
    pub fn new(start_block: u64, track_addresses: bool) -> Self {
        Self {
            transactions: Vec::new(),
            checkpoint: start_block,
            archive_height: None,
            loading: false,
            track_addresses,
            senders: FrequencyCounter::default(),
            receivers: FrequencyCounter::default(),
            latest: Vec::new(),
            top_from: Vec::new(),
            top_to: Vec::new(),
        }
    }

    pub fn checkpoint(&self) -> u64 {
        self.checkpoint
    }

    pub fn archive_height(&self) -> Option<u64> {
        self.archive_height
    }

    pub fn count(&self) -> u64 {
        self.transactions.len() as u64
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn latest(&self) -> &[Transaction] {
        &self.latest
    }

    pub fn top_from(&self) -> &[AddressFrequency] {
        &self.top_from
    }

    pub fn top_to(&self) -> &[AddressFrequency] {
        &self.top_to
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    /// Fold one poll result into the session.
    ///
    /// Transactions are appended in block order without de-duplication.
    /// The checkpoint only moves forward, to the highest block number in
    /// this result.
    pub fn apply(&mut self, result: PollResult) -> ApplyOutcome {
        if let Some(height) = result.archive_height.filter(|h| *h > 0) {
            self.archive_height = Some(height);
        }

        if result.blocks.is_empty() {
            return ApplyOutcome::default();
        }

        let previous = self.checkpoint;
        let mut new_max_block = previous;
        let mut fresh = Vec::new();
        for block in result.blocks {
            if let Some(number) = block.number {
                new_max_block = new_max_block.max(number);
            }
            fresh.extend(block.transactions);
        }

        let appended = fresh.len();
        if appended > 0 {
            if self.track_addresses {
                for tx in &fresh {
                    if let Some(address) = tx.from_address() {
                        self.senders.record(address);
                    }
                    if let Some(address) = tx.to_address() {
                        self.receivers.record(address);
                    }
                }
                self.top_from = self.senders.top(TOP_LIMIT);
                self.top_to = self.receivers.top(TOP_LIMIT);
            }
            self.transactions.extend(fresh);
            self.latest = latest_transactions(&self.transactions, LATEST_LIMIT);
        }

        let checkpoint_advanced = new_max_block > previous;
        if checkpoint_advanced {
            self.checkpoint = new_max_block;
        }

        ApplyOutcome {
            appended,
            checkpoint_advanced,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            count: self.count(),
            checkpoint: self.checkpoint,
            archive_height: self.archive_height,
            loading: self.loading,
            latest: self.latest.clone(),
            top_from: self.top_from.clone(),
            top_to: self.top_to.clone(),
        }
    }
}
