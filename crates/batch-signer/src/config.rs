use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

pub const DEFAULT_SIGNER_CLIENT_TIMEOUT_MS: u64 = 60_000;

/// Batch signer settings, read once at startup.
///
/// The same timeout bounds how long a caller waits for its signature and how
/// old a queued request may get before the worker refuses to sign it.
#[derive(Debug, Clone, Parser)]
pub struct BatchSignerConfig {
    #[clap(
        long = "signer-client-timeout-ms",
        env = "SIGNER_CLIENT_TIMEOUT_MS",
        default_value_t = DEFAULT_SIGNER_CLIENT_TIMEOUT_MS
    )]
    pub signer_client_timeout_ms: u64,
}

impl BatchSignerConfig {
    pub fn new(timeout: Duration) -> Self {
        Self {
            signer_client_timeout_ms: timeout.as_millis() as u64,
        }
    }

    /// Reads the configuration from the process environment only.
    pub fn from_env() -> Result<Self> {
        Self::try_parse_from(["batch-signer"]).context("reading batch signer configuration")
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.signer_client_timeout_ms)
    }
}

impl Default for BatchSignerConfig {
    fn default() -> Self {
        Self {
            signer_client_timeout_ms: DEFAULT_SIGNER_CLIENT_TIMEOUT_MS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timeout_is_one_minute() {
        assert_eq!(BatchSignerConfig::default().timeout(), Duration::from_secs(60));
    }

    #[test]
    fn timeout_from_flag() {
        let config =
            BatchSignerConfig::try_parse_from(["batch-signer", "--signer-client-timeout-ms", "5000"])
                .unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn rejects_non_numeric_timeout() {
        let result =
            BatchSignerConfig::try_parse_from(["batch-signer", "--signer-client-timeout-ms", "soon"]);
        assert!(result.is_err());
    }

    #[test]
    fn new_from_duration() {
        let config = BatchSignerConfig::new(Duration::from_millis(250));
        assert_eq!(config.signer_client_timeout_ms, 250);
    }
}
