//! Agent configuration loader
//!
//! Loads the agents file (`.json` as JSON, anything else as YAML) and turns
//! its enabled entries into validated profiles. A missing or malformed file
//! is not fatal: it yields no agents and a warning.

use super::config::{AgentProfile, AgentsFile};
use crate::config::ConfigError;
use crate::tool::ToolRegistry;
use std::path::Path;

/// Parse an agents file
pub fn load_agents_file(path: &Path) -> Result<AgentsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let parsed = if is_json {
        serde_json::from_str(&content).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str(&content).map_err(|e| e.to_string())
    };

    parsed.map_err(|message| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

/// Keep enabled agents, dropping tool names the registry does not know
pub fn resolve_profiles(file: AgentsFile, registry: &ToolRegistry) -> Vec<AgentProfile> {
    file.agents
        .into_iter()
        .filter(|descriptor| descriptor.enabled)
        .map(|descriptor| {
            let tools = descriptor
                .tools
                .into_iter()
                .filter(|tool| {
                    let known = registry.contains(tool);
                    if !known {
                        tracing::warn!(
                            agent = %descriptor.name,
                            tool = %tool,
                            "Tool for agent not found, omitting"
                        );
                    }
                    known
                })
                .collect();
            AgentProfile {
                name: descriptor.name,
                description: descriptor.description,
                tools,
            }
        })
        .collect()
}

/// Load profiles from the agents file, or none if it cannot be read
pub fn load_agent_profiles(path: &Path, registry: &ToolRegistry) -> Vec<AgentProfile> {
    match load_agents_file(path) {
        Ok(file) => {
            let profiles = resolve_profiles(file, registry);
            tracing::info!(
                path = %path.display(),
                agents = profiles.len(),
                "Loaded agent configuration"
            );
            profiles
        }
        Err(e) => {
            tracing::warn!(error = %e, "No agents loaded");
            Vec::new()
        }
    }
}
