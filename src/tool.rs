//! Tool system
//!
//! Tools implement the `Tool` trait and are registered with `ToolRegistry`.
//! Argument payloads arrive either as a structured object or as raw text and
//! are normalized exactly once, at the dispatch boundary, before any tool body
//! runs.

use crate::permissions::{PermissionFlag, PermissionGate};
use async_trait::async_trait;
use futures::FutureExt;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;

/// Tool description shown to the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// Expected JSON shape, rendered verbatim into the system prompt
    pub args_schema: String,
}

/// Argument payload as the model produced it
#[derive(Debug, Clone, PartialEq)]
pub enum ToolInput {
    Structured(Map<String, Value>),
    Raw(String),
}

impl From<Value> for ToolInput {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => ToolInput::Structured(map),
            Value::Null => ToolInput::Structured(Map::new()),
            Value::String(text) => ToolInput::Raw(text),
            other => ToolInput::Raw(other.to_string()),
        }
    }
}

impl ToolInput {
    /// Normalize into a structured object.
    ///
    /// Structured input passes through; raw text is decoded as JSON, then as a
    /// YAML flow mapping (tolerates single quotes and bare keys), and anything
    /// that still isn't an object is a type error.
    pub fn normalize(self) -> Result<ToolArgs, ToolError> {
        let text = match self {
            ToolInput::Structured(map) => return Ok(ToolArgs(map)),
            ToolInput::Raw(text) => text,
        };
        let trimmed = text.trim();

        match serde_json::from_str::<Value>(trimmed) {
            Ok(Value::Object(map)) => Ok(ToolArgs(map)),
            Ok(other) => Err(ToolError::InvalidType(json_type_name(&other))),
            Err(json_err) => {
                let literal = serde_yaml::from_str::<serde_yaml::Value>(trimmed)
                    .ok()
                    .and_then(|yaml| serde_json::to_value(yaml).ok());
                match literal {
                    Some(Value::Object(map)) => Ok(ToolArgs(map)),
                    _ => Err(ToolError::InvalidInput(json_err.to_string())),
                }
            }
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Normalized tool arguments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArgs(Map<String, Value>);

impl ToolArgs {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Decode into a tool's own argument struct. A field of the wrong type
    /// is an error, never a silent default.
    pub fn parse<T: DeserializeOwned>(self) -> Result<T, ToolError> {
        serde_json::from_value(Value::Object(self.0))
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

/// Outcome of a tool run that completed without raising
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub output: String,
    pub is_error: bool,
}

impl ToolResult {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            output: message.into(),
            is_error: true,
        }
    }
}

/// Failure raised from inside a tool
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Input is not a valid JSON object or literal: {0}")]
    InvalidInput(String),
    #[error("Invalid input type: {0}. Expected an object or a JSON string.")]
    InvalidType(&'static str),
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Failed(String),
    #[error("tool panicked: {0}")]
    Panicked(String),
}

/// Context passed to tools during execution
#[derive(Clone)]
pub struct ToolContext {
    pub working_dir: PathBuf,
    pub permissions: Arc<PermissionGate>,
}

impl ToolContext {
    pub fn new(working_dir: PathBuf, permissions: Arc<PermissionGate>) -> Self {
        Self {
            working_dir,
            permissions,
        }
    }

    pub fn allows(&self, flag: PermissionFlag) -> bool {
        self.permissions.is_allowed(flag)
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (used for dispatch)
    fn name(&self) -> &str;

    fn definition(&self) -> ToolDefinition;

    /// Run the tool. Soft failures (bad arguments, denied permissions) come
    /// back as `ToolResult::error`; anything raised is an `Err`.
    async fn execute(&self, args: ToolArgs, ctx: &ToolContext) -> Result<ToolResult, ToolError>;
}

/// Registration table consulted at startup and on reload
pub type ToolCatalog = Arc<dyn Fn() -> Vec<Arc<dyn Tool>> + Send + Sync>;

/// Registry of available tools, in registration order
pub struct ToolRegistry {
    tools: RwLock<IndexMap<String, Arc<dyn Tool>>>,
    catalog: Option<ToolCatalog>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: RwLock::new(IndexMap::new()),
            catalog: None,
        }
    }

    /// Build a registry from a catalog; `reload` re-runs the same catalog
    pub fn from_catalog(catalog: ToolCatalog) -> Self {
        let registry = Self {
            tools: RwLock::new(IndexMap::new()),
            catalog: Some(catalog.clone()),
        };
        for tool in catalog() {
            registry.register_arc(tool);
        }
        registry
    }

    pub fn register<T: Tool + 'static>(&self, tool: T) {
        self.register_arc(Arc::new(tool));
    }

    pub fn register_arc(&self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        tracing::debug!(tool = %name, "Registered tool");
        self.tools.write().insert(name, tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.read().contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.read().keys().cloned().collect()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.read().values().map(|t| t.definition()).collect()
    }

    /// Re-scan the catalog and merge newly found tools.
    ///
    /// Tools that vanished from the catalog stay registered so agents holding
    /// their names keep working. Returns the names that were added.
    pub fn reload(&self, permissions: &PermissionGate) -> Vec<String> {
        let Some(catalog) = &self.catalog else {
            return Vec::new();
        };

        let mut added = Vec::new();
        {
            let mut tools = self.tools.write();
            for tool in catalog() {
                let name = tool.name().to_string();
                if !tools.contains_key(&name) {
                    added.push(name.clone());
                    tools.insert(name, tool);
                }
            }
        }

        permissions.register_tools(added.iter().map(String::as_str));
        tracing::info!(added = ?added, "Tool registry reloaded");
        added
    }

    /// Invoke a tool by name. Never fails: unknown tools, bad arguments,
    /// raised errors and panics all come back as an error string.
    pub async fn invoke(&self, name: &str, input: ToolInput, ctx: &ToolContext) -> ToolResult {
        let Some(tool) = self.get(name) else {
            return ToolResult::error(format!(
                "Error: Tool '{}' is not available or is disabled.",
                name
            ));
        };

        let outcome = match input.normalize() {
            Ok(args) => AssertUnwindSafe(tool.execute(args, ctx))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| Err(ToolError::Panicked(panic_message(panic.as_ref())))),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "Tool raised an error");
                ToolResult::error(format!("Error executing tool '{}': {}", name, e))
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
