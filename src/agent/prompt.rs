//! System prompt construction for agents
//!
//! The prompt lists exactly the tools an agent may call right now: those in
//! its profile, registered, and switched on in the permission gate. Rendering
//! is a pure function of those inputs so identical state gives a
//! byte-identical prompt.

use super::config::AgentProfile;
use crate::message::{ChatMessage, ConversationHistory};
use crate::permissions::PermissionGate;
use crate::templates::{SystemPromptTemplate, Templates, ToolEntryTemplate};
use crate::tool::{ToolDefinition, ToolRegistry};
use std::sync::Arc;

/// Action name that ends a task
pub const FINAL_ANSWER_ACTION: &str = "Final Answer";

/// Tool block shown when an agent has nothing it may call
pub const NO_TOOLS_PLACEHOLDER: &str = "No tools are currently available.";

/// Tools an agent may call, in the order of its profile
pub fn enabled_tools(
    profile: &AgentProfile,
    registry: &ToolRegistry,
    gate: &PermissionGate,
) -> Vec<ToolDefinition> {
    profile
        .tools
        .iter()
        .filter(|name| gate.is_tool_enabled(name))
        .filter_map(|name| registry.get(name))
        .map(|tool| tool.definition())
        .collect()
}

pub struct PromptBuilder {
    templates: Arc<Templates>,
}

impl PromptBuilder {
    pub fn new(templates: Arc<Templates>) -> Self {
        Self { templates }
    }

    /// Render the system prompt for an agent and its enabled tools
    pub fn system_prompt(&self, profile: &AgentProfile, tools: &[ToolDefinition]) -> String {
        let (tool_list, tool_names_list) = if tools.is_empty() {
            (
                NO_TOOLS_PLACEHOLDER.to_string(),
                format!("\"{}\"", FINAL_ANSWER_ACTION),
            )
        } else {
            let entries: Vec<String> = tools.iter().map(|def| self.tool_entry(def)).collect();
            let names: Vec<String> = tools
                .iter()
                .map(|def| def.name.as_str())
                .chain(std::iter::once(FINAL_ANSWER_ACTION))
                .map(|name| format!("\"{}\"", name))
                .collect();
            (entries.join("\n\n"), names.join(", "))
        };

        let template = SystemPromptTemplate {
            agent_name: &profile.name,
            agent_description: &profile.description,
            tool_list,
            tool_names_list,
        };

        match template.render(&self.templates) {
            Ok(prompt) => prompt,
            Err(e) => {
                tracing::error!(agent = %profile.name, error = %e, "Failed to render system prompt");
                format!(
                    "You are {}.\n\n<tools>\n{}\n</tools>\n\nValid \"action\" values are: {}",
                    profile.name, template.tool_list, template.tool_names_list
                )
            }
        }
    }

    fn tool_entry(&self, def: &ToolDefinition) -> String {
        let entry = ToolEntryTemplate {
            name: &def.name,
            description: &def.description,
            args_schema: &def.args_schema,
        };
        entry.render(&self.templates).unwrap_or_else(|e| {
            tracing::error!(tool = %def.name, error = %e, "Failed to render tool entry");
            format!(
                "Tool: {}\n  Description: {}\n  Argument Schema: {}",
                def.name, def.description, def.args_schema
            )
        })
    }

    /// Working message list for one task: rendered system prompt plus history
    pub fn build(
        &self,
        profile: &AgentProfile,
        registry: &ToolRegistry,
        gate: &PermissionGate,
        history: &ConversationHistory,
    ) -> Vec<ChatMessage> {
        let tools = enabled_tools(profile, registry, gate);
        history.working_messages(&self.system_prompt(profile, &tools))
    }
}
