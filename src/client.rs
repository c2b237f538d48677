use std::time::Duration;

use reqwest::{header, StatusCode};
use serde::Deserialize;
use url::Url;

use crate::models::{Block, PollResult, Transaction};
use crate::query::{Query, QueryVariant, ResponseLayout};

#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("request to indexing service failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("indexing service returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    archive_height: Option<u64>,
    #[serde(default)]
    data: Option<Vec<ResponseBlock>>,
}

#[derive(Debug, Deserialize)]
struct ResponseBlock {
    #[serde(default)]
    block_number: Option<u64>,
    #[serde(default)]
    transactions: Option<Vec<Transaction>>,
}

/// Thin client for the indexing service's query endpoint.
#[derive(Clone, Debug)]
pub struct HypersyncClient {
    http: reqwest::Client,
    url: Url,
    variant: QueryVariant,
}

impl HypersyncClient {
    pub fn new(
        url: Url,
        variant: QueryVariant,
        timeout: Duration,
        api_token: Option<&str>,
    ) -> Result<Self, ClientError> {
        let mut headers = header::HeaderMap::new();
        if let Some(token) = api_token {
            if let Ok(value) = header::HeaderValue::from_str(&format!("Bearer {}", token)) {
                headers.insert(header::AUTHORIZATION, value);
            } else {
                tracing::warn!("ignoring HYPERSYNC_API_TOKEN with invalid header characters");
            }
        }
        let http = reqwest::Client::builder()
            .no_proxy()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;
        Ok(Self { http, url, variant })
    }

    pub fn variant(&self) -> QueryVariant {
        self.variant
    }

    /// Issue one query for everything from `from_block` onward.
    pub async fn fetch(&self, from_block: u64) -> Result<PollResult, ClientError> {
        let query = Query::authorization_list(from_block, self.variant);
        let response = self.http.post(self.url.clone()).json(&query).send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ClientError::Status { status, body });
        }

        let parsed: QueryResponse = serde_json::from_str(&body)?;
        Ok(into_poll_result(parsed, self.variant.layout()))
    }
}

fn into_poll_result(response: QueryResponse, layout: ResponseLayout) -> PollResult {
    let data = response.data.unwrap_or_default();
    let blocks = match layout {
        ResponseLayout::Flat => data
            .into_iter()
            .next()
            .map(|first| Block {
                number: None,
                transactions: first.transactions.unwrap_or_default(),
            })
            .into_iter()
            .collect(),
        ResponseLayout::Blocks => data
            .into_iter()
            .map(|block| Block {
                number: block.block_number,
                transactions: block.transactions.unwrap_or_default(),
            })
            .collect(),
    };

    PollResult {
        archive_height: response.archive_height,
        blocks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str, layout: ResponseLayout) -> PollResult {
        into_poll_result(serde_json::from_str(raw).unwrap(), layout)
    }

    #[test]
    fn block_layout_keeps_every_block() {
        let result = parse(
            r#"{"archive_height":22450000,"data":[
                {"block_number":22400005,"transactions":[{"hash":"0xA"}]},
                {"block_number":22400006},
                {"block_number":22400007,"transactions":[{"hash":"0xB"},{"hash":"0xC"}]}
            ]}"#,
            ResponseLayout::Blocks,
        );
        assert_eq!(result.archive_height, Some(22_450_000));
        assert_eq!(result.blocks.len(), 3);
        assert!(result.blocks[1].transactions.is_empty());
        assert_eq!(result.transaction_count(), 3);
    }

    #[test]
    fn flat_layout_reads_only_first_bucket() {
        let result = parse(
            r#"{"data":[{"transactions":[{"hash":"0xA"}]},{"transactions":[{"hash":"0xB"}]}]}"#,
            ResponseLayout::Flat,
        );
        assert_eq!(result.archive_height, None);
        assert_eq!(result.blocks.len(), 1);
        assert_eq!(result.blocks[0].number, None);
        assert_eq!(result.blocks[0].transactions[0].hash(), Some("0xA"));
    }

    #[test]
    fn missing_data_is_empty() {
        let result = parse("{}", ResponseLayout::Blocks);
        assert!(result.blocks.is_empty());
        let flat = parse(r#"{"data":[]}"#, ResponseLayout::Flat);
        assert!(flat.blocks.is_empty());
    }

    #[test]
    fn null_data_keeps_archive_height() {
        let raw = r#"{"archive_height":22450000,"data":null}"#;
        for layout in [ResponseLayout::Blocks, ResponseLayout::Flat] {
            let result = parse(raw, layout);
            assert_eq!(result.archive_height, Some(22_450_000));
            assert!(result.blocks.is_empty());
        }
    }

    #[test]
    fn null_fields_inside_blocks_are_absent() {
        let result = parse(
            r#"{"archive_height":null,"data":[{"block_number":null,"transactions":null},
                {"block_number":7,"transactions":[{"hash":"0xA","from":null}]}]}"#,
            ResponseLayout::Blocks,
        );
        assert_eq!(result.archive_height, None);
        assert_eq!(result.blocks[0].number, None);
        assert!(result.blocks[0].transactions.is_empty());
        assert_eq!(result.blocks[1].transactions[0].from_address(), None);
    }
}
