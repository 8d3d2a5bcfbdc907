//! The tool contract: one uniform sync/async execution surface for every
//! external capability the agent can dispatch to.

pub mod pubmed_article;
pub mod pubmed_search;
pub mod translate;

pub use pubmed_article::PubMedArticleTool;
pub use pubmed_search::PubMedSearchTool;
pub use translate::TranslateTool;

use crate::resilience::ExecOptions;
use crate::{Error, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// External capability a tool provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Search,
    Fetch,
    Translate,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Search => write!(f, "search"),
            Self::Fetch => write!(f, "fetch"),
            Self::Translate => write!(f, "translate"),
        }
    }
}

/// Identity of a registered tool. Immutable after registration; the name is
/// the unique registry key.
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub capability: Capability,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, capability: Capability) -> Self {
        Self {
            name: name.into(),
            capability,
        }
    }
}

/// Entry-point flavor, used in logs and `Unimplemented` errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationMode {
    Sync,
    Async,
}

impl fmt::Display for InvocationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync => write!(f, "sync"),
            Self::Async => write!(f, "async"),
        }
    }
}

/// Opaque structured result payload returned by every tool.
pub type ToolOutput = Value;

/// Already-validated, already-deserialized parameter map for one invocation.
///
/// Per-call `timeout` / `max_retries` overrides travel inside the map and are
/// read back out with [`ToolArgs::exec_options`].
#[derive(Debug, Clone, Default)]
pub struct ToolArgs(Map<String, Value>);

impl ToolArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.0.get(key).and_then(Value::as_u64)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Per-call deadline override, in seconds.
    pub fn timeout_override(&self) -> Option<Duration> {
        self.get_u64("timeout").map(Duration::from_secs)
    }

    /// Per-call retry budget override.
    pub fn max_retries_override(&self) -> Option<u32> {
        self.get_u64("max_retries").and_then(|n| u32::try_from(n).ok())
    }

    /// Executor overrides carried by this invocation.
    pub fn exec_options(&self) -> ExecOptions {
        ExecOptions {
            timeout: self.timeout_override(),
            max_retries: self.max_retries_override(),
        }
    }
}

impl From<Map<String, Value>> for ToolArgs {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Uniform contract every capability implements.
///
/// A tool provides at least one of the two entry points: blocking-only tools
/// implement [`Tool::invoke_sync`] and reach the async path through the
/// dispatcher's worker offload, async-native tools implement
/// [`Tool::invoke_async`]. Retries are not this layer's job; they belong to
/// the operation executor inside each implementation.
#[async_trait]
pub trait Tool: Send + Sync + 'static {
    fn descriptor(&self) -> &ToolDescriptor;

    fn name(&self) -> &str {
        &self.descriptor().name
    }

    /// Blocking entry point.
    fn invoke_sync(&self, _args: &ToolArgs) -> Result<ToolOutput> {
        Err(Error::Unimplemented {
            tool: self.name().to_string(),
            mode: InvocationMode::Sync,
        })
    }

    /// Async-native entry point.
    async fn invoke_async(&self, _args: ToolArgs) -> Result<ToolOutput> {
        Err(Error::Unimplemented {
            tool: self.name().to_string(),
            mode: InvocationMode::Async,
        })
    }
}

/// Run a tool without blocking the caller, picking whichever entry point it
/// implements.
///
/// The async-native entry point is preferred; a tool that only has a blocking
/// implementation is offloaded to the blocking worker pool. `Unimplemented`
/// surfaces only when both entry points are absent.
pub(crate) async fn invoke(tool: Arc<dyn Tool>, args: ToolArgs) -> Result<ToolOutput> {
    info!(tool = tool.name(), mode = %InvocationMode::Async, "invoking tool");
    match tool.invoke_async(args.clone()).await {
        Err(Error::Unimplemented {
            mode: InvocationMode::Async,
            ..
        }) => {
            info!(
                tool = tool.name(),
                mode = %InvocationMode::Sync,
                "no async entry point, offloading blocking entry point"
            );
            let blocking = Arc::clone(&tool);
            let result = tokio::task::spawn_blocking(move || blocking.invoke_sync(&args)).await?;
            if let Err(err) = &result {
                error!(tool = tool.name(), error = %err, "tool invocation failed");
            }
            result
        }
        Err(err) => {
            error!(tool = tool.name(), error = %err, "tool invocation failed");
            Err(err)
        }
        Ok(value) => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bare {
        descriptor: ToolDescriptor,
    }

    #[async_trait]
    impl Tool for Bare {
        fn descriptor(&self) -> &ToolDescriptor {
            &self.descriptor
        }
    }

    #[tokio::test]
    async fn both_entry_points_absent_surfaces_unimplemented() {
        let tool: Arc<dyn Tool> = Arc::new(Bare {
            descriptor: ToolDescriptor::new("bare", Capability::Search),
        });
        let result = invoke(tool, ToolArgs::new()).await;
        assert!(matches!(
            result,
            Err(Error::Unimplemented {
                mode: InvocationMode::Sync,
                ..
            })
        ));
    }

    #[test]
    fn exec_options_read_overrides_from_the_parameter_map() {
        let args = ToolArgs::new().with("timeout", 5_u64).with("max_retries", 2_u64);
        let opts = args.exec_options();
        assert_eq!(opts.timeout, Some(Duration::from_secs(5)));
        assert_eq!(opts.max_retries, Some(2));

        let empty = ToolArgs::new().exec_options();
        assert_eq!(empty.timeout, None);
        assert_eq!(empty.max_retries, None);
    }

    #[test]
    fn typed_accessors() {
        let args = ToolArgs::new().with("query", "cancer").with("max_results", 10_u64);
        assert_eq!(args.get_str("query"), Some("cancer"));
        assert_eq!(args.get_u64("max_results"), Some(10));
        assert!(args.get_str("missing").is_none());
    }
}
