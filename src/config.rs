use std::env;
use std::time::Duration;

use url::Url;

use crate::cli::QueryArgs;
use crate::query::QueryVariant;

pub const DEFAULT_HYPERSYNC_URL: &str = "https://eth.hypersync.xyz/query";
pub const DEFAULT_START_BLOCK: u64 = 22_400_000;

#[derive(Debug, Clone)]
pub struct Config {
    pub hypersync_url: Url,
    pub api_token: Option<String>,
    pub start_block: u64,
    pub variant: QueryVariant,
    /// Explicit interval; falls back to the variant's cadence.
    pub poll_interval: Option<Duration>,
    pub request_timeout: Duration,
    pub http_bind_addr: String,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("invalid HYPERSYNC_URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("invalid {name}: expected a non-negative integer, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },
    #[error("invalid QUERY_VARIANT {0:?}: expected minimal, blocks or full")]
    InvalidVariant(String),
    #[error("poll interval must be greater than zero")]
    ZeroInterval,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_url = lookup("HYPERSYNC_URL").unwrap_or_else(|| DEFAULT_HYPERSYNC_URL.to_string());
        let hypersync_url = Url::parse(&raw_url)?;
        let api_token = lookup("HYPERSYNC_API_TOKEN").filter(|t| !t.trim().is_empty());

        let start_block = parse_u64(&lookup, "START_BLOCK")?.unwrap_or(DEFAULT_START_BLOCK);
        let variant = match lookup("QUERY_VARIANT") {
            Some(raw) => raw.parse().map_err(ConfigError::InvalidVariant)?,
            None => QueryVariant::default(),
        };
        let poll_interval = match parse_u64(&lookup, "POLL_INTERVAL_SECS")? {
            Some(0) => return Err(ConfigError::ZeroInterval),
            Some(secs) => Some(Duration::from_secs(secs)),
            None => None,
        };
        let request_timeout = parse_u64(&lookup, "REQUEST_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(10));
        let http_bind_addr = lookup("HTTP_BIND").unwrap_or_else(|| "127.0.0.1:8080".to_string());

        Ok(Self {
            hypersync_url,
            api_token,
            start_block,
            variant,
            poll_interval,
            request_timeout,
            http_bind_addr,
        })
    }

    /// Layer command-line flags over the environment.
    pub fn with_overrides(mut self, args: &QueryArgs) -> Result<Self, ConfigError> {
        if let Some(from_block) = args.from_block {
            self.start_block = from_block;
        }
        if let Some(variant) = args.variant {
            self.variant = variant;
        }
        match args.interval_secs {
            Some(0) => return Err(ConfigError::ZeroInterval),
            Some(secs) => self.poll_interval = Some(Duration::from_secs(secs)),
            None => {}
        }
        Ok(self)
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval.unwrap_or_else(|| self.variant.default_interval())
    }
}

fn parse_u64(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<u64>, ConfigError> {
    let Some(raw) = lookup(name) else {
        return Ok(None);
    };
    match raw.trim().parse::<u64>() {
        Ok(value) => Ok(Some(value)),
        Err(_) => Err(ConfigError::InvalidNumber { name, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_without_env() {
        let config = load(&[]).unwrap();
        assert_eq!(config.hypersync_url.as_str(), DEFAULT_HYPERSYNC_URL);
        assert_eq!(config.start_block, DEFAULT_START_BLOCK);
        assert_eq!(config.variant, QueryVariant::Full);
        assert_eq!(config.poll_interval(), Duration::from_secs(3));
        assert_eq!(config.api_token, None);
    }

    #[test]
    fn interval_follows_variant_unless_overridden() {
        let config = load(&[("QUERY_VARIANT", "minimal")]).unwrap();
        assert_eq!(config.poll_interval(), Duration::from_secs(1));

        let config = load(&[("QUERY_VARIANT", "minimal"), ("POLL_INTERVAL_SECS", "7")]).unwrap();
        assert_eq!(config.poll_interval(), Duration::from_secs(7));
    }

    #[test]
    fn cli_flags_override_env() {
        let args = QueryArgs {
            from_block: Some(1),
            variant: Some(QueryVariant::Blocks),
            interval_secs: None,
        };
        let config = load(&[("START_BLOCK", "99")])
            .unwrap()
            .with_overrides(&args)
            .unwrap();
        assert_eq!(config.start_block, 1);
        assert_eq!(config.variant, QueryVariant::Blocks);
        assert_eq!(config.poll_interval(), Duration::from_secs(2));

        let zero = QueryArgs {
            interval_secs: Some(0),
            ..QueryArgs::default()
        };
        assert!(matches!(
            load(&[]).unwrap().with_overrides(&zero),
            Err(ConfigError::ZeroInterval)
        ));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            load(&[("START_BLOCK", "abc")]),
            Err(ConfigError::InvalidNumber { name: "START_BLOCK", .. })
        ));
        assert!(matches!(
            load(&[("QUERY_VARIANT", "everything")]),
            Err(ConfigError::InvalidVariant(_))
        ));
        assert!(matches!(
            load(&[("HYPERSYNC_URL", "not a url")]),
            Err(ConfigError::InvalidUrl(_))
        ));
        assert!(matches!(
            load(&[("POLL_INTERVAL_SECS", "0")]),
            Err(ConfigError::ZeroInterval)
        ));
    }

    #[test]
    fn blank_token_is_ignored() {
        let config = load(&[("HYPERSYNC_API_TOKEN", "  ")]).unwrap();
        assert_eq!(config.api_token, None);
    }
}
