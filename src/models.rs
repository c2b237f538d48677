use ethers_core::types::U256;
use serde::{Deserialize, Serialize};

/// A transaction as returned by the indexing service. Every field is
/// optional because the selected fields vary per query variant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization_list: Option<Vec<serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_index: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
}

impl Transaction {
    pub fn with_hash(hash: impl Into<String>) -> Self {
        Self {
            hash: Some(hash.into()),
            ..Self::default()
        }
    }

    /// Hash, treating an empty string as missing.
    pub fn hash(&self) -> Option<&str> {
        non_empty(self.hash.as_deref())
    }

    pub fn from_address(&self) -> Option<&str> {
        non_empty(self.from.as_deref())
    }

    pub fn to_address(&self) -> Option<&str> {
        non_empty(self.to.as_deref())
    }

    /// Decimal wei string decoded from the hex `value` field.
    pub fn value_wei(&self) -> Option<String> {
        self.value.as_deref().and_then(hex_quantity_to_decimal)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

pub fn hex_quantity_to_decimal(raw: &str) -> Option<String> {
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .unwrap_or(raw);
    if digits.is_empty() {
        return Some("0".to_string());
    }
    U256::from_str_radix(digits, 16).ok().map(|v| v.to_string())
}

/// One block of a poll result. The flat response layout has no block number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block {
    pub number: Option<u64>,
    pub transactions: Vec<Transaction>,
}

/// Parsed outcome of a single successful query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollResult {
    pub archive_height: Option<u64>,
    pub blocks: Vec<Block>,
}

impl PollResult {
    pub fn transaction_count(&self) -> usize {
        self.blocks.iter().map(|b| b.transactions.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressFrequency {
    pub address: String,
    pub count: u64,
}

/// Point-in-time view of the session published after every update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub count: u64,
    pub checkpoint: u64,
    pub archive_height: Option<u64>,
    pub loading: bool,
    pub latest: Vec<Transaction>,
    pub top_from: Vec<AddressFrequency>,
    pub top_to: Vec<AddressFrequency>,
}

impl SessionSnapshot {
    /// The loading placeholder is only shown until the first transaction arrives.
    pub fn show_placeholder(&self) -> bool {
        self.loading && self.count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_hex_value_to_wei() {
        assert_eq!(
            hex_quantity_to_decimal("0xde0b6b3a7640000"),
            Some("1000000000000000000".to_string())
        );
        assert_eq!(hex_quantity_to_decimal("0x"), Some("0".to_string()));
        assert_eq!(hex_quantity_to_decimal("0xzz"), None);
    }

    #[test]
    fn empty_hash_is_treated_as_missing() {
        let tx = Transaction::with_hash("");
        assert_eq!(tx.hash(), None);
        assert_eq!(Transaction::default().from_address(), None);
    }

    #[test]
    fn deserializes_partial_transaction() {
        let tx: Transaction =
            serde_json::from_str(r#"{"hash":"0xA","from":"0x1","authorization_list":[{}]}"#)
                .unwrap();
        assert_eq!(tx.hash(), Some("0xA"));
        assert_eq!(tx.from_address(), Some("0x1"));
        assert_eq!(tx.to, None);
        assert_eq!(tx.authorization_list.map(|l| l.len()), Some(1));
    }

    #[test]
    fn placeholder_only_before_first_transaction() {
        let mut snap = SessionSnapshot {
            loading: true,
            ..SessionSnapshot::default()
        };
        assert!(snap.show_placeholder());
        snap.count = 3;
        assert!(!snap.show_placeholder());
    }
}
