//! Create file tool - write text content to a new or existing file

use super::common::{definition, ensure_parent, resolve_path, text_content};
use crate::permissions::PermissionFlag;
use crate::tool::{Tool, ToolArgs, ToolContext, ToolDefinition, ToolError, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

const DESCRIPTION: &str =
    "Creates a new file and writes specified content to it. Overwrites existing files.";
const ARGS_SCHEMA: &str = r#"{"file_path": "<string: The full path of the file to create>", "content": "<string: The text content to write into the file>"}"#;

#[derive(Debug, Deserialize)]
struct Args {
    #[serde(default)]
    file_path: Option<String>,
    /// String, or an object/array to be stringified
    #[serde(default)]
    content: Value,
}

pub struct CreateFile;

#[async_trait]
impl Tool for CreateFile {
    fn name(&self) -> &str {
        "create_file"
    }

    fn definition(&self) -> ToolDefinition {
        definition(self.name(), DESCRIPTION, ARGS_SCHEMA)
    }

    async fn execute(&self, args: ToolArgs, ctx: &ToolContext) -> Result<ToolResult, ToolError> {
        if !ctx.allows(PermissionFlag::FileCreate) {
            return Ok(ToolResult::error(
                "Error: File creation is disabled by permissions.",
            ));
        }

        let args: Args = args.parse()?;
        let Some(path) = resolve_path(args.file_path.as_deref().unwrap_or_default(), &ctx.working_dir)
        else {
            return Ok(ToolResult::error("Error: 'file_path' argument is required."));
        };
        let content = text_content(args.content);

        let written = async {
            ensure_parent(&path).await?;
            tokio::fs::write(&path, &content).await
        }
        .await;

        Ok(match written {
            Ok(()) => {
                tracing::debug!(path = %path.display(), bytes = content.len(), "File created");
                ToolResult::success(format!("File created successfully: {}", path.display()))
            }
            Err(e) => ToolResult::error(format!("Error creating file: {}", e)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::PermissionGate;
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn args(value: serde_json::Value) -> ToolArgs {
        crate::tool::ToolInput::from(value).normalize().unwrap()
    }

    #[tokio::test]
    async fn test_creates_nested_file() {
        let dir = TempDir::new().unwrap();
        let ctx = ToolContext::new(dir.path().to_path_buf(), Arc::new(PermissionGate::new()));

        let result = CreateFile
            .execute(args(json!({"file_path": "out/notes.txt", "content": "hello"})), &ctx)
            .await
            .unwrap();

        assert!(!result.is_error, "{}", result.output);
        assert!(result.output.starts_with("File created successfully:"));
        let written = std::fs::read_to_string(dir.path().join("out/notes.txt")).unwrap();
        assert_eq!(written, "hello");
    }

    #[tokio::test]
    async fn test_denied_without_permission() {
        let dir = TempDir::new().unwrap();
        let gate = PermissionGate::with_flags([(PermissionFlag::FileCreate, false)]);
        let ctx = ToolContext::new(dir.path().to_path_buf(), Arc::new(gate));

        let result = CreateFile
            .execute(args(json!({"file_path": "a.txt", "content": "x"})), &ctx)
            .await
            .unwrap();

        assert_eq!(result.output, "Error: File creation is disabled by permissions.");
        assert!(!dir.path().join("a.txt").exists());
    }

    #[tokio::test]
    async fn test_missing_path() {
        let dir = TempDir::new().unwrap();
        let ctx = ToolContext::new(dir.path().to_path_buf(), Arc::new(PermissionGate::new()));
        let result = CreateFile.execute(args(json!({"content": "x"})), &ctx).await.unwrap();
        assert_eq!(result.output, "Error: 'file_path' argument is required.");
    }

    #[tokio::test]
    async fn test_object_content_is_written_as_json() {
        let dir = TempDir::new().unwrap();
        let ctx = ToolContext::new(dir.path().to_path_buf(), Arc::new(PermissionGate::new()));

        let result = CreateFile
            .execute(args(json!({"file_path": "data.json", "content": {"k": 1}})), &ctx)
            .await
            .unwrap();

        assert!(!result.is_error, "{}", result.output);
        let written = std::fs::read_to_string(dir.path().join("data.json")).unwrap();
        assert_eq!(written, "{\n  \"k\": 1\n}");
    }

    #[tokio::test]
    async fn test_numeric_path_is_rejected() {
        let dir = TempDir::new().unwrap();
        let ctx = ToolContext::new(dir.path().to_path_buf(), Arc::new(PermissionGate::new()));

        let err = CreateFile
            .execute(args(json!({"file_path": 42, "content": "x"})), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)), "{}", err);

        let registry = crate::tool::ToolRegistry::new();
        registry.register(CreateFile);
        let result = registry
            .invoke("create_file", json!({"file_path": 42, "content": "x"}).into(), &ctx)
            .await;
        assert!(result.is_error);
        assert!(result
            .output
            .starts_with("Error executing tool 'create_file': Invalid arguments:"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
