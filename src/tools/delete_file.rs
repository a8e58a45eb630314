//! Delete file tool

use super::common::{definition, resolve_path};
use crate::permissions::PermissionFlag;
use crate::tool::{Tool, ToolArgs, ToolContext, ToolDefinition, ToolError, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;

const DESCRIPTION: &str = "Deletes a specified file from the filesystem.";
const ARGS_SCHEMA: &str = r#"{"file_path": "<string: The full path of the file to delete>"}"#;

#[derive(Debug, Deserialize)]
struct Args {
    #[serde(default)]
    file_path: Option<String>,
}

pub struct DeleteFile;

#[async_trait]
impl Tool for DeleteFile {
    fn name(&self) -> &str {
        "delete_file"
    }

    fn definition(&self) -> ToolDefinition {
        definition(self.name(), DESCRIPTION, ARGS_SCHEMA)
    }

    async fn execute(&self, args: ToolArgs, ctx: &ToolContext) -> Result<ToolResult, ToolError> {
        if !ctx.allows(PermissionFlag::FileDelete) {
            return Ok(ToolResult::error(
                "Error: File deletion is disabled by permissions.",
            ));
        }

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

        Ok(match tokio::fs::remove_file(&path).await {
            Ok(()) => ToolResult::success(format!("File deleted successfully: {}", path.display())),
            Err(e) => ToolResult::error(format!("Error deleting file: {}", e)),
        })
    }
}
