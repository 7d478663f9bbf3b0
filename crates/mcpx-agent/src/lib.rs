//! Bounded tool-calling agent for mcpx.
//!
//! - `model`: chat message types and the [`ModelClient`] port
//! - `openai`: client for OpenAI-compatible `/chat/completions` endpoints
//! - `toolbox`: tool table handed to the model
//! - `agent_loop`: the step-bounded loop
//! - `install`: tools and prompt for `mcpx install <url>`
#![deny(unsafe_code)]

pub mod agent_loop;
mod error;
pub mod install;
pub mod model;
mod openai;
pub mod toolbox;

pub use agent_loop::{
    AgentObserver, AgentRequest, DEFAULT_MAX_STEPS, MAX_STEPS_MESSAGE, SilentObserver,
    run_agent_loop,
};
pub use error::{AgentError, ModelError};
pub use install::{RegistryConfig, run_install};
pub use model::{ChatMessage, ModelClient, ModelResponse, Role, ToolCallRequest, ToolSpec};
pub use openai::OpenAiClient;
pub use toolbox::{ToolDef, ToolExecutor, Toolbox};
