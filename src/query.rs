use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

/// Which elaboration of the query to run. Each one selects a different field
/// set and response layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum QueryVariant {
    /// Hash and authorization list only, flat response.
    Minimal,
    /// Adds block numbers and addresses, block-wrapped response.
    Blocks,
    /// All eight transaction fields plus top-address views.
    #[default]
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseLayout {
    /// Only `data[0].transactions` is read.
    Flat,
    Blocks,
}

impl QueryVariant {
    pub fn default_interval(self) -> Duration {
        match self {
            QueryVariant::Minimal => Duration::from_secs(1),
            QueryVariant::Blocks => Duration::from_secs(2),
            QueryVariant::Full => Duration::from_secs(3),
        }
    }

    pub fn layout(self) -> ResponseLayout {
        match self {
            QueryVariant::Minimal => ResponseLayout::Flat,
            QueryVariant::Blocks | QueryVariant::Full => ResponseLayout::Blocks,
        }
    }

    pub fn tracks_addresses(self) -> bool {
        matches!(self, QueryVariant::Full)
    }

    pub fn field_selection(self) -> FieldSelection {
        match self {
            QueryVariant::Minimal => FieldSelection {
                block: Vec::new(),
                transaction: vec!["hash", "authorization_list"],
            },
            QueryVariant::Blocks => FieldSelection {
                block: vec!["block_number"],
                transaction: vec!["authorization_list", "hash", "block_number", "from", "to"],
            },
            QueryVariant::Full => FieldSelection {
                block: vec!["block_number"],
                transaction: vec![
                    "authorization_list",
                    "hash",
                    "block_number",
                    "transaction_index",
                    "from",
                    "to",
                    "value",
                    "input",
                ],
            },
        }
    }
}

impl fmt::Display for QueryVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueryVariant::Minimal => "minimal",
            QueryVariant::Blocks => "blocks",
            QueryVariant::Full => "full",
        };
        f.write_str(name)
    }
}

impl FromStr for QueryVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minimal" => Ok(QueryVariant::Minimal),
            "blocks" => Ok(QueryVariant::Blocks),
            "full" => Ok(QueryVariant::Full),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldSelection {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub block: Vec<&'static str>,
    pub transaction: Vec<&'static str>,
}

/// Empty filter object: matches any non-empty authorization list.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AuthorizationSelection {}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TransactionSelection {
    pub authorization_list: Vec<AuthorizationSelection>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum JoinMode {
    JoinAll,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Query {
    pub from_block: u64,
    pub include_all_blocks: bool,
    pub transactions: Vec<TransactionSelection>,
    pub join_mode: JoinMode,
    pub field_selection: FieldSelection,
}

impl Query {
    pub fn authorization_list(from_block: u64, variant: QueryVariant) -> Self {
        Self {
            from_block,
            include_all_blocks: true,
            transactions: vec![TransactionSelection {
                authorization_list: vec![AuthorizationSelection {}],
            }],
            join_mode: JoinMode::JoinAll,
            field_selection: variant.field_selection(),
        }
    }
}
