//! Handlebars templates for system prompts

use handlebars::Handlebars;
use serde::Serialize;
use std::sync::Arc;

const SYSTEM_PROMPT_TEMPLATE: &str = include_str!("templates/system_prompt.hbs");
const TOOL_ENTRY_TEMPLATE: &str = include_str!("templates/tool_entry.hbs");

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("failed to register template: {0}")]
    Register(#[from] handlebars::TemplateError),
    #[error("failed to render template: {0}")]
    Render(#[from] handlebars::RenderError),
}

/// Holds the handlebars templates
pub struct Templates {
    handlebars: Handlebars<'static>,
}

impl Templates {
    pub fn new() -> Result<Arc<Self>, TemplateError> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        // Schemas are rendered verbatim, quotes and angle brackets included
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars
            .register_template_string("system_prompt.hbs", SYSTEM_PROMPT_TEMPLATE)?;
        handlebars
            .register_template_string("tool_entry.hbs", TOOL_ENTRY_TEMPLATE)?;

        Ok(Arc::new(Self { handlebars }))
    }

    /// Render a template by name with the given data
    pub fn render<T: Serialize>(&self, template_name: &str, data: &T) -> Result<String, TemplateError> {
        Ok(self.handlebars.render(template_name, data)?)
    }
}

/// Data for one tool entry in the prompt
#[derive(Serialize)]
pub struct ToolEntryTemplate<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub args_schema: &'a str,
}

impl ToolEntryTemplate<'_> {
    pub fn render(&self, templates: &Templates) -> Result<String, TemplateError> {
        templates.render("tool_entry.hbs", self)
    }
}

/// Data for rendering the system prompt template
#[derive(Serialize)]
pub struct SystemPromptTemplate<'a> {
    pub agent_name: &'a str,
    pub agent_description: &'a str,
    /// Rendered tool entries, or the no-tools placeholder
    pub tool_list: String,
    /// Quoted valid action names
    pub tool_names_list: String,
}

impl SystemPromptTemplate<'_> {
    pub fn render(&self, templates: &Templates) -> Result<String, TemplateError> {
        templates.render("system_prompt.hbs", self)
    }
}
