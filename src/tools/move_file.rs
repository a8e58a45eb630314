//! Move file tool - move or rename a file

use super::common::{definition, ensure_parent, resolve_path};
use crate::permissions::PermissionFlag;
use crate::tool::{Tool, ToolArgs, ToolContext, ToolDefinition, ToolError, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;

const DESCRIPTION: &str =
    "Moves or renames a file. Creates destination directories if they do not exist.";
const ARGS_SCHEMA: &str = r#"{"source_path": "<string: The path of the file to move>", "destination_path": "<string: The new path for the file>"}"#;

#[derive(Debug, Deserialize)]
struct Args {
    #[serde(default)]
    source_path: Option<String>,
    #[serde(default)]
    destination_path: Option<String>,
}

pub struct MoveFile;

/// Rename, falling back to copy + remove when crossing filesystems
async fn move_path(source: &Path, destination: &Path) -> std::io::Result<()> {
    ensure_parent(destination).await?;
    if tokio::fs::rename(source, destination).await.is_ok() {
        return Ok(());
    }
    tokio::fs::copy(source, destination).await?;
    tokio::fs::remove_file(source).await
}

#[async_trait]
impl Tool for MoveFile {
    fn name(&self) -> &str {
        "move_file"
    }

    fn definition(&self) -> ToolDefinition {
        definition(self.name(), DESCRIPTION, ARGS_SCHEMA)
    }

    async fn execute(&self, args: ToolArgs, ctx: &ToolContext) -> Result<ToolResult, ToolError> {
        if !ctx.allows(PermissionFlag::FileCreate) {
            return Ok(ToolResult::error(
                "Error: File move/creation is disabled by permissions.",
            ));
        }

        let args: Args = args.parse()?;
        let source = resolve_path(args.source_path.as_deref().unwrap_or_default(), &ctx.working_dir);
        let destination =
            resolve_path(args.destination_path.as_deref().unwrap_or_default(), &ctx.working_dir);
        let (Some(source), Some(destination)) = (source, destination) else {
            return Ok(ToolResult::error(
                "Error: 'source_path' and 'destination_path' arguments are required.",
            ));
        };

        if !source.exists() {
            return Ok(ToolResult::error(format!(
                "Error: Source file not found: {}",
                source.display()
            )));
        }

        Ok(match move_path(&source, &destination).await {
            Ok(()) => ToolResult::success(format!(
                "File moved successfully: {} -> {}",
                source.display(),
                destination.display()
            )),
            Err(e) => ToolResult::error(format!("Error moving file: {}", e)),
        })
    }
}
