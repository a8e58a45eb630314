//! Overseer - a supervisor for tool-using LLM agents
//!
//! This crate provides:
//! - A permission-gated catalogue of file, shell, web, PDF and spreadsheet tools
//! - Agents that run a bounded reason/act loop against an OpenAI-compatible model
//! - A supervisor that routes commands to agents without blocking intake
//! - CLI/REPL interface for operating it

pub mod config;
pub mod message;
pub mod permissions;
pub mod telemetry;
pub mod templates;

// Agent system
pub mod agent;
pub mod events;
pub mod provider;
pub mod supervisor;
pub mod tool;
pub mod tools;

pub use config::{Config, ConfigError};
pub use permissions::{PermissionFlag, PermissionGate};
pub use telemetry::Telemetry;

pub use agent::{Action, AgentProfile, AgentStatus, BaseAgent, PromptBuilder};
pub use events::{LogEntry, LogKind, TaskOutcome, Termination};
pub use message::{ChatMessage, ConversationHistory, Role};
pub use provider::{CompletionError, CompletionModel, ProviderClient, ProviderConfig};
pub use supervisor::{Supervisor, SupervisorError, SupervisorEvent};
pub use tool::{Tool, ToolError, ToolInput, ToolRegistry, ToolResult};
