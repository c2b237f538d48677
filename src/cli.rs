use clap::{Args, Parser, Subcommand};

use crate::query::QueryVariant;

#[derive(Parser, Debug)]
#[command(name = "eip7702-watch", version, about = "EIP-7702 transaction watcher")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Overrides shared by every subcommand that talks to the indexing service.
#[derive(Args, Debug, Clone, Default)]
pub struct QueryArgs {
    /// Block to start polling from
    #[arg(long)]
    pub from_block: Option<u64>,
    /// Which field selection and response layout to use
    #[arg(long, value_enum)]
    pub variant: Option<QueryVariant>,
    /// Seconds between polls
    #[arg(long)]
    pub interval_secs: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll continuously and log every update
    Watch {
        #[command(flatten)]
        query: QueryArgs,
    },
    /// Run a single query and print the resulting snapshot as JSON
    PollOnce {
        #[command(flatten)]
        query: QueryArgs,
    },
    /// Poll in the background and serve the snapshot over HTTP
    Serve {
        #[command(flatten)]
        query: QueryArgs,
        /// Override bind address, e.g. 0.0.0.0:8080
        #[arg(long)]
        addr: Option<String>,
    },
}
