//! Tool catalog and execution registry
//!
//! The catalog describes every tool the model may call. Tools carrying an
//! inline executor run without confirmation; the rest are confirmation-gated
//! and are executed by the resolver through the [`ExecutionRegistry`] once a
//! human approved them.

mod local_time;
mod weather;

pub use local_time::LocalTimeTool;
pub use weather::WeatherTool;

use crate::conversation::Message;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Failure of a single tool execution
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("{0}")]
    Failed(String),
    #[error("Execution cancelled")]
    Cancelled,
    #[error("Tool panicked: {0}")]
    Panicked(String),
}

impl ToolError {
    pub fn failed(message: impl Into<String>) -> Self {
        ToolError::Failed(message.into())
    }

    /// Terminal result recorded on the invocation that failed
    pub fn to_result_value(&self) -> Value {
        Value::String(format!("Error: {self}"))
    }
}

/// Everything an executor gets to see about the call it serves.
///
/// Passed explicitly on every call; executors hold no ambient agent state.
#[derive(Clone)]
pub struct ExecutionContext {
    /// Cancellation signal for long-running executions
    pub cancel: CancellationToken,

    /// Id of the invocation being executed
    pub tool_call_id: String,

    conversation: Arc<[Message]>,
    prefix_len: usize,
}

impl ExecutionContext {
    /// `prefix_len` is the number of leading messages of `conversation`
    /// visible to the executor.
    pub fn new(
        cancel: CancellationToken,
        tool_call_id: impl Into<String>,
        conversation: Arc<[Message]>,
        prefix_len: usize,
    ) -> Self {
        let prefix_len = prefix_len.min(conversation.len());
        Self {
            cancel,
            tool_call_id: tool_call_id.into(),
            conversation,
            prefix_len,
        }
    }

    /// The conversation up to and including the message carrying this call
    pub fn messages(&self) -> &[Message] {
        &self.conversation[..self.prefix_len]
    }
}

/// Static description of a tool
pub trait Tool: Send + Sync {
    /// Tool name, the key used by invocations
    fn name(&self) -> &str;

    /// Tool description for the model
    fn description(&self) -> String;

    /// JSON schema for tool arguments
    fn input_schema(&self) -> Value;
}

/// Something that can run a tool call
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Run the call. Long-running executors should watch `ctx.cancel`.
    async fn execute(&self, args: Value, ctx: ExecutionContext) -> Result<Value, ToolError>;
}

/// Adapter turning an async closure into a [`ToolExecutor`]
pub struct FnExecutor<F>(F);

impl<F> FnExecutor<F> {
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F, Fut> ToolExecutor for FnExecutor<F>
where
    F: Fn(Value, ExecutionContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
{
    async fn execute(&self, args: Value, ctx: ExecutionContext) -> Result<Value, ToolError> {
        (self.0)(args, ctx).await
    }
}

/// Executors for confirmation-gated tools, keyed by tool name
#[derive(Clone, Default)]
pub struct ExecutionRegistry {
    executors: HashMap<String, Arc<dyn ToolExecutor>>,
}

impl ExecutionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry for the tools of [`ToolCatalog::standard`] that need confirmation
    pub fn standard() -> Self {
        Self::new().with(WeatherTool.name().to_string(), Arc::new(WeatherTool))
    }

    /// Register an executor, returning the one it replaced
    pub fn register(
        &mut self,
        name: impl Into<String>,
        executor: Arc<dyn ToolExecutor>,
    ) -> Option<Arc<dyn ToolExecutor>> {
        self.executors.insert(name.into(), executor)
    }

    /// Register an async closure as executor
    pub fn register_fn<F, Fut>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(Value, ExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
    {
        self.register(name, Arc::new(FnExecutor::new(f)));
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, executor: Arc<dyn ToolExecutor>) -> Self {
        self.register(name, executor);
        self
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<dyn ToolExecutor>> {
        self.executors.get(name).cloned()
    }

    /// Registered tool names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.executors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.executors.is_empty()
    }
}

/// Tool definition as advertised to the model and the UI
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
    pub requires_confirmation: bool,
}

/// A catalog entry: the tool plus its inline executor, if it has one
#[derive(Clone)]
pub struct CatalogEntry {
    tool: Arc<dyn Tool>,
    inline: Option<Arc<dyn ToolExecutor>>,
}

impl CatalogEntry {
    /// A tool that only runs after a human approved it
    pub fn gated(tool: Arc<dyn Tool>) -> Self {
        Self { tool, inline: None }
    }

    /// A tool that runs as soon as the model calls it
    pub fn auto(tool: Arc<dyn Tool>, executor: Arc<dyn ToolExecutor>) -> Self {
        Self {
            tool,
            inline: Some(executor),
        }
    }

    pub fn name(&self) -> &str {
        self.tool.name()
    }

    pub fn requires_confirmation(&self) -> bool {
        self.inline.is_none()
    }

    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.tool.name().to_string(),
            description: self.tool.description(),
            input_schema: self.tool.input_schema(),
            requires_confirmation: self.requires_confirmation(),
        }
    }
}

/// Collection of tools available to the model
#[derive(Clone, Default)]
pub struct ToolCatalog {
    entries: Vec<CatalogEntry>,
}

impl ToolCatalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// Weather lookup behind confirmation, local time without
    pub fn standard() -> Self {
        let local_time = Arc::new(LocalTimeTool);
        Self::new(vec![
            CatalogEntry::gated(Arc::new(WeatherTool)),
            CatalogEntry::auto(local_time.clone(), local_time),
        ])
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.entries.iter().map(CatalogEntry::definition).collect()
    }

    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|entry| entry.name() == name)
    }

    /// Whether calls to `name` wait for a human. Unknown tools do not.
    pub fn requires_confirmation(&self, name: &str) -> bool {
        self.get(name).is_some_and(CatalogEntry::requires_confirmation)
    }

    /// Run an auto-executing tool. `None` if the tool is unknown or gated.
    pub async fn execute_inline(
        &self,
        name: &str,
        args: Value,
        ctx: ExecutionContext,
    ) -> Option<Result<Value, ToolError>> {
        let executor = self.get(name)?.inline.clone()?;
        Some(executor.execute(args, ctx).await)
    }
}
