pub mod executor;
pub mod limiter;

pub use executor::{ExecOptions, OperationExecutor, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT};
pub use limiter::{ConcurrencyLimiter, Permit, DEFAULT_CAPACITY};
