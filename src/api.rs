//! HTTP API for the agent
//!
//! The request/response boundary around the resolver: tool listing, the
//! UI-side decision helpers and the streaming resolve endpoint.

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;
pub use types::*;

use crate::config::AgentConfig;
use crate::tools::{ExecutionRegistry, ToolCatalog};
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<ToolCatalog>,
    pub registry: Arc<ExecutionRegistry>,
    pub config: Arc<AgentConfig>,
}

impl AppState {
    pub fn new(catalog: ToolCatalog, registry: ExecutionRegistry, config: AgentConfig) -> Self {
        for def in catalog.definitions() {
            if def.requires_confirmation && registry.lookup(&def.name).is_none() {
                tracing::warn!(
                    tool = %def.name,
                    "Confirmation-gated tool has no executor; approvals will resolve to an error"
                );
            }
        }

        Self {
            catalog: Arc::new(catalog),
            registry: Arc::new(registry),
            config: Arc::new(config),
        }
    }
}
