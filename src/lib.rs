pub mod agent;
pub mod config;
pub mod error;
pub mod resilience;
pub mod tools;

pub use agent::{Agent, FailureKind, PubMedAssistant, TaskFailure, TaskOutcome};
pub use config::{AgentConfig, Config, PubMedConfig, TranslationConfig};
pub use error::{Error, Result};
pub use resilience::{ConcurrencyLimiter, ExecOptions, OperationExecutor};
pub use tools::{
    Capability, InvocationMode, PubMedArticleTool, PubMedSearchTool, Tool, ToolArgs,
    ToolDescriptor, ToolOutput, TranslateTool,
};
