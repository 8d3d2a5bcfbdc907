use crate::config::AgentConfig;
use crate::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Fallback deadline when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Fallback retry budget when none is configured.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Per-call overrides for one executed operation.
///
/// `None` (or a zero value) means "use the executor's configured default".
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecOptions {
    pub timeout: Option<Duration>,
    pub max_retries: Option<u32>,
}

impl ExecOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }
}

/// Runs units of work with a per-attempt deadline and a bounded retry budget.
///
/// Every tool call passes through here; retries are this layer's job alone.
#[derive(Debug, Clone)]
pub struct OperationExecutor {
    default_timeout: Duration,
    default_max_retries: u32,
}

impl OperationExecutor {
    pub fn new(default_timeout: Duration, default_max_retries: u32) -> Self {
        Self {
            default_timeout: if default_timeout.is_zero() {
                DEFAULT_TIMEOUT
            } else {
                default_timeout
            },
            default_max_retries: if default_max_retries == 0 {
                DEFAULT_MAX_RETRIES
            } else {
                default_max_retries
            },
        }
    }

    pub fn from_config(config: &AgentConfig) -> Self {
        Self::new(config.timeout(), config.max_retries)
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    pub fn default_max_retries(&self) -> u32 {
        self.default_max_retries
    }

    fn effective(&self, opts: ExecOptions) -> (Duration, u32) {
        let deadline = match opts.timeout {
            Some(timeout) if !timeout.is_zero() => timeout,
            _ => self.default_timeout,
        };
        let budget = match opts.max_retries {
            Some(retries) if retries > 0 => retries,
            _ => self.default_max_retries,
        };
        (deadline, budget)
    }

    /// Execute `work` until it succeeds or the retry budget is spent.
    ///
    /// `work` is re-invoked for every attempt. Each attempt is bounded by the
    /// effective deadline; an attempt that overruns it is abandoned (its
    /// future is dropped) and counted against the budget. Failed attempts are
    /// retried immediately. The terminal error names `label`, the attempt
    /// count, and (for timeouts) the deadline.
    pub async fn execute<T, F, Fut>(&self, work: F, opts: ExecOptions, label: &str) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let (deadline, budget) = self.effective(opts);
        let mut attempts = 0u32;

        loop {
            debug!(operation = label, attempt = attempts + 1, "starting attempt");
            match timeout(deadline, work()).await {
                Ok(Ok(value)) => {
                    if attempts > 0 {
                        debug!(
                            operation = label,
                            attempts = attempts + 1,
                            "operation succeeded after retries"
                        );
                    }
                    return Ok(value);
                }
                Ok(Err(error)) => {
                    attempts += 1;
                    if attempts < budget {
                        warn!(
                            operation = label,
                            attempt = attempts,
                            budget,
                            error = %error,
                            "operation failed, retrying"
                        );
                    } else {
                        return Err(Error::OperationFailed {
                            operation: label.to_string(),
                            message: error.to_string(),
                            attempts,
                        });
                    }
                }
                Err(_) => {
                    attempts += 1;
                    if attempts < budget {
                        warn!(
                            operation = label,
                            attempt = attempts,
                            budget,
                            timeout = ?deadline,
                            "operation timed out, retrying"
                        );
                    } else {
                        return Err(Error::TimeoutExceeded {
                            operation: label.to_string(),
                            timeout: deadline,
                            attempts,
                        });
                    }
                }
            }
        }
    }

    /// Variant for blocking work: each attempt runs on the blocking pool and
    /// is raced against the deadline.
    ///
    /// A timed-out attempt is abandoned, not cancelled; the blocking worker
    /// keeps running until the call returns on its own.
    pub async fn execute_blocking<T, F>(&self, work: F, opts: ExecOptions, label: &str) -> Result<T>
    where
        F: Fn() -> Result<T> + Clone + Send + 'static,
        T: Send + 'static,
    {
        self.execute(
            || {
                let work = work.clone();
                async move { tokio::task::spawn_blocking(work).await? }
            },
            opts,
            label,
        )
        .await
    }
}

impl Default for OperationExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT, DEFAULT_MAX_RETRIES)
    }
}
