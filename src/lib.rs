pub mod aggregator;
pub mod api;
pub mod cli;
pub mod client;
pub mod config;
pub mod format;
pub mod models;
pub mod poll_stats;
pub mod poller;
pub mod query;
