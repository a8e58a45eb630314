//! Agent configuration types
//!
//! `AgentDescriptor` is one entry of the agents file as written by the
//! operator. `AgentProfile` is what survives validation: an enabled agent
//! whose tool list only names registered tools.

use serde::{Deserialize, Serialize};

/// One agent entry in the agents file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDescriptor {
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Only enabled agents are instantiated
    #[serde(default)]
    pub enabled: bool,

    /// Tool names, in the order they are offered to the model
    #[serde(default)]
    pub tools: Vec<String>,
}

impl AgentDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            enabled: true,
            tools: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tools = tools.into_iter().map(Into::into).collect();
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Top-level shape of the agents file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentsFile {
    #[serde(default)]
    pub agents: Vec<AgentDescriptor>,
}

/// A validated, enabled agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentProfile {
    pub name: String,
    pub description: String,
    /// Registered tool names this agent may use, in configured order
    pub tools: Vec<String>,
}

impl AgentProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            tools: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tools = tools.into_iter().map(Into::into).collect();
        self
    }

    pub fn uses_tool(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_defaults() {
        let descriptor: AgentDescriptor = serde_json::from_str(r#"{"name": "bare"}"#).unwrap();
        assert_eq!(descriptor.name, "bare");
        assert!(!descriptor.enabled);
        assert!(descriptor.tools.is_empty());
        assert!(descriptor.description.is_empty());
    }

    #[test]
    fn test_agents_file_yaml() {
        let yaml = r#"
agents:
  - name: FileAgent
    description: Works with files
    enabled: true
    tools: [read_file, create_file]
  - name: Sleeper
"#;
        let file: AgentsFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(file.agents.len(), 2);
        assert_eq!(file.agents[0].tools, vec!["read_file", "create_file"]);
        assert!(!file.agents[1].enabled);
    }

    #[test]
    fn test_profile_builder() {
        let profile = AgentProfile::new("ops")
            .with_description("Operations")
            .with_tools(["run_command"]);
        assert!(profile.uses_tool("run_command"));
        assert!(!profile.uses_tool("read_file"));
    }
}
