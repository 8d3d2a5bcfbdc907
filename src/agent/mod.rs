//! Agent core: tool registry, single-call dispatch, and concurrent batch
//! fan-out with per-task failure isolation.

pub mod assistant;
pub mod outcome;

pub use assistant::PubMedAssistant;
pub use outcome::{FailureKind, TaskFailure, TaskOutcome};

use crate::config::AgentConfig;
use crate::resilience::ConcurrencyLimiter;
use crate::tools::{self, InvocationMode, Tool, ToolArgs, ToolOutput};
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument};
use uuid::Uuid;

/// Multi-tool agent.
///
/// Owns the registry of named tools, dispatches single calls, and fans out
/// batches of parameter sets concurrently through the shared limiter. The
/// registry is built before dispatch begins and never mutated afterwards, so
/// concurrent dispatches read it without locking.
pub struct Agent {
    name: String,
    registry: HashMap<String, Arc<dyn Tool>>,
    limiter: ConcurrencyLimiter,
}

impl Agent {
    pub fn new(name: impl Into<String>, config: &AgentConfig) -> Self {
        let name = name.into();
        info!(agent = %name, max_concurrent_tasks = config.max_concurrent_tasks, "creating agent");
        Self {
            name,
            registry: HashMap::new(),
            limiter: ConcurrencyLimiter::new(config.max_concurrent_tasks),
        }
    }

    /// Register a tool under its descriptor name.
    ///
    /// Re-registering a name silently replaces the previous instance; the
    /// last write wins.
    pub fn register_tool(&mut self, tool: Arc<dyn Tool>) {
        let tool_name = tool.name().to_string();
        let replaced = self.registry.insert(tool_name.clone(), tool).is_some();
        if replaced {
            info!(agent = %self.name, tool = %tool_name, "tool re-registered, previous instance replaced");
        } else {
            info!(agent = %self.name, tool = %tool_name, "tool registered");
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.registry.keys().map(String::as_str).collect()
    }

    pub fn contains_tool(&self, tool_name: &str) -> bool {
        self.registry.contains_key(tool_name)
    }

    pub fn limiter(&self) -> &ConcurrencyLimiter {
        &self.limiter
    }

    fn lookup(&self, tool_name: &str) -> Result<&Arc<dyn Tool>> {
        self.registry
            .get(tool_name)
            .ok_or_else(|| Error::ToolNotFound {
                name: tool_name.to_string(),
            })
    }

    /// Run a tool's blocking entry point on the calling thread.
    pub fn dispatch_sync(&self, tool_name: &str, args: &ToolArgs) -> Result<ToolOutput> {
        let tool = self.lookup(tool_name)?;
        info!(agent = %self.name, tool = tool_name, mode = %InvocationMode::Sync, "invoking tool");
        let result = tool.invoke_sync(args);
        if let Err(err) = &result {
            error!(agent = %self.name, tool = tool_name, error = %err, "tool invocation failed");
        }
        result
    }

    /// Run a tool without blocking the caller. The canonical dispatch path.
    pub async fn dispatch_async(&self, tool_name: &str, args: ToolArgs) -> Result<ToolOutput> {
        let tool = Arc::clone(self.lookup(tool_name)?);
        tools::invoke(tool, args).await
    }

    /// Fan a batch of parameter sets out to one tool and keep the successes,
    /// in request order.
    ///
    /// Failed tasks are logged and dropped, so the returned positions do not
    /// correspond 1:1 with the input once anything failed; callers that need
    /// positional alignment should use [`Agent::fan_out_outcomes`].
    pub async fn fan_out(
        &self,
        tool_name: &str,
        params_list: Vec<ToolArgs>,
    ) -> Result<Vec<ToolOutput>> {
        let outcomes = self.fan_out_outcomes(tool_name, params_list).await?;
        Ok(outcomes
            .into_iter()
            .filter_map(TaskOutcome::into_success)
            .collect())
    }

    /// Fan a batch out and report one settled outcome per input, positionally
    /// aligned with `params_list`.
    ///
    /// The only batch-level error is an unknown tool name, raised before any
    /// work is scheduled. Every scheduled task runs to completion behind a
    /// limiter permit; one task's failure never cancels its siblings.
    #[instrument(skip(self, params_list), fields(agent = %self.name, tool = tool_name))]
    pub async fn fan_out_outcomes(
        &self,
        tool_name: &str,
        params_list: Vec<ToolArgs>,
    ) -> Result<Vec<TaskOutcome>> {
        let tool = Arc::clone(self.lookup(tool_name)?);
        let batch_id = Uuid::new_v4();
        info!(batch = %batch_id, tasks = params_list.len(), "dispatching fan-out batch");

        let handles: Vec<JoinHandle<Result<ToolOutput>>> = params_list
            .into_iter()
            .map(|args| {
                let tool = Arc::clone(&tool);
                let limiter = self.limiter.clone();
                tokio::spawn(async move {
                    let _permit = limiter.acquire().await;
                    tools::invoke(tool, args).await
                })
            })
            .collect();

        let settled = futures::future::join_all(handles).await;
        let mut outcomes = Vec::with_capacity(settled.len());
        for (index, joined) in settled.into_iter().enumerate() {
            let outcome = match joined {
                Ok(result) => {
                    if let Err(err) = &result {
                        error!(batch = %batch_id, task = index, error = %err, "fan-out task failed");
                    }
                    TaskOutcome::from_result(result)
                }
                Err(join_error) => {
                    error!(batch = %batch_id, task = index, error = %join_error, "fan-out task aborted");
                    TaskOutcome::from_result(Err(Error::TaskJoin(join_error)))
                }
            };
            outcomes.push(outcome);
        }

        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        info!(
            batch = %batch_id,
            succeeded,
            failed = outcomes.len() - succeeded,
            "fan-out batch settled"
        );
        Ok(outcomes)
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("tools", &self.registry.keys().collect::<Vec<_>>())
            .field("capacity", &self.limiter.capacity())
            .finish()
    }
}
