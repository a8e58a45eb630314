//! Read file tool - return the text content of a file

use super::common::{definition, resolve_path};
use crate::tool::{Tool, ToolArgs, ToolContext, ToolDefinition, ToolError, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;

/// Number of bytes to check for binary content detection
const BINARY_CHECK_SIZE: usize = 8192;

const DESCRIPTION: &str = "Reads and returns the entire text content of a specified file.";
const ARGS_SCHEMA: &str = r#"{"file_path": "<string: The full path of the file to read>"}"#;

#[derive(Debug, Deserialize)]
struct Args {
    #[serde(default)]
    file_path: Option<String>,
}

pub struct ReadFile;

/// Check if content appears to be binary by looking for null bytes
fn looks_binary(bytes: &[u8]) -> bool {
    bytes[..bytes.len().min(BINARY_CHECK_SIZE)].contains(&0)
}

#[async_trait]
impl Tool for ReadFile {
    fn name(&self) -> &str {
        "read_file"
    }

    fn definition(&self) -> ToolDefinition {
        definition(self.name(), DESCRIPTION, ARGS_SCHEMA)
    }

    async fn execute(&self, args: ToolArgs, ctx: &ToolContext) -> Result<ToolResult, ToolError> {
        let args: Args = args.parse()?;
        let Some(path) = resolve_path(args.file_path.as_deref().unwrap_or_default(), &ctx.working_dir)
        else {
            return Ok(ToolResult::error("Error: 'file_path' argument is required."));
        };
        if !path.exists() {
            return Ok(ToolResult::error(format!(
                "Error: File not found at path: {}",
                path.display()
            )));
        }

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) => return Ok(ToolResult::error(format!("Error reading file: {}", e))),
        };

        if looks_binary(&bytes) {
            return Ok(ToolResult::error(format!(
                "Error: Cannot read binary file: {}",
                path.display()
            )));
        }

        Ok(ToolResult::success(String::from_utf8_lossy(&bytes).into_owned()))
    }
}
