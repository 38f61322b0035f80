use crate::application::service::RetryPolicy;
use crate::domain::engine::Pipeline;
use crate::error::{LedgerError, Result};
use clap::Args;
use std::time::Duration;

/// Engine tuning shared by the CLI and library callers.
#[derive(Debug, Clone, Args)]
pub struct EngineConfig {
    /// Number of pipeline stages (indexed 0..N-1); reaching the last one completes the item.
    #[arg(long, default_value_t = Pipeline::DEFAULT_STAGES)]
    pub stages: u32,

    /// Extra attempts after a concurrent-write conflict before giving up.
    #[arg(long, default_value_t = RetryPolicy::DEFAULT_MAX_RETRIES)]
    pub max_retries: u32,

    /// Pause between conflict retries, in milliseconds.
    #[arg(long, default_value_t = RetryPolicy::DEFAULT_BACKOFF_MS)]
    pub retry_backoff_ms: u64,

    /// Upper bound for a single action including its retries, in milliseconds.
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stages: Pipeline::DEFAULT_STAGES,
            max_retries: RetryPolicy::DEFAULT_MAX_RETRIES,
            retry_backoff_ms: RetryPolicy::DEFAULT_BACKOFF_MS,
            timeout_ms: None,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        Pipeline::new(self.stages)?;
        if self.timeout_ms == Some(0) {
            return Err(LedgerError::ValidationError(
                "timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn pipeline(&self) -> Result<Pipeline> {
        Pipeline::new(self.stages)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}
