//! Agent system
//!
//! - `BaseAgent`: bounded reasoning loop over one conversation
//! - `PromptBuilder`: system prompt from profile, enabled tools and history
//! - `parse_action`: one model response to one `Action`
//!
//! Agent configuration:
//! - `AgentDescriptor`: one entry of the agents file
//! - `AgentProfile`: validated, enabled agent with known tools only

mod base;
mod config;
pub mod config_loader;
pub mod parser;
pub mod prompt;

pub use base::*;
pub use config::*;
pub use config_loader::{load_agent_profiles, load_agents_file, resolve_profiles};
pub use parser::{parse_action, parse_response, Action};
pub use prompt::{enabled_tools, PromptBuilder};
