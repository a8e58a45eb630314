//! Run command tool - execute a program without a shell

use super::common::{definition, optional_count};
use crate::permissions::PermissionFlag;
use crate::tool::{Tool, ToolArgs, ToolContext, ToolDefinition, ToolError, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::process::Stdio;
use tokio::process::Command;

const TIMEOUT_SECS: u64 = 120; // 2 minute timeout

const DESCRIPTION: &str = "Executes a shell command and returns its output. Essential for file system navigation (e.g., 'ls -R') and other system interactions.";
const ARGS_SCHEMA: &str = r#"{"command": "<string: The full shell command to execute, e.g., 'ls -l /path/to/dir'>", "timeout": "<integer: optional, seconds before the command is killed, default 120>"}"#;

#[derive(Debug, Deserialize)]
struct Args {
    #[serde(default)]
    command: Option<String>,
    #[serde(default, deserialize_with = "optional_count")]
    timeout: Option<u64>,
}

pub struct RunCommand;

/// Format a finished process the way the model sees it
fn format_output(code: Option<i32>, stdout: &[u8], stderr: &[u8]) -> ToolResult {
    let stdout = String::from_utf8_lossy(stdout);
    let stderr = String::from_utf8_lossy(stderr);
    let (stdout, stderr) = (stdout.trim(), stderr.trim());

    match code {
        Some(0) => {
            if stderr.is_empty() {
                ToolResult::success(stdout)
            } else {
                ToolResult::success(format!("{}\n{}", stdout, stderr).trim().to_string())
            }
        }
        other => {
            let code = other.map_or_else(|| "signal".to_string(), |c| c.to_string());
            ToolResult::error(
                format!(
                    "Error: Command failed with exit code {}.\nSTDOUT:\n{}\nSTDERR:\n{}",
                    code, stdout, stderr
                )
                .trim()
                .to_string(),
            )
        }
    }
}

#[async_trait]
impl Tool for RunCommand {
    fn name(&self) -> &str {
        "run_command"
    }

    fn definition(&self) -> ToolDefinition {
        definition(self.name(), DESCRIPTION, ARGS_SCHEMA)
    }

    async fn execute(&self, args: ToolArgs, ctx: &ToolContext) -> Result<ToolResult, ToolError> {
        if !ctx.allows(PermissionFlag::RunScripts) {
            return Ok(ToolResult::error(
                "Error: Command execution is disabled by permissions.",
            ));
        }

        let args: Args = args.parse()?;
        let command = args.command.as_deref().unwrap_or_default().trim();
        if command.is_empty() {
            return Ok(ToolResult::error("Error: 'command' argument is required."));
        }

        let Some(words) = shlex::split(command) else {
            return Ok(ToolResult::error(format!(
                "Error: Could not parse command line: {}",
                command
            )));
        };
        let Some((program, rest)) = words.split_first() else {
            return Ok(ToolResult::error("Error: 'command' argument is required."));
        };

        if program == "sudo" && !ctx.allows(PermissionFlag::Sudo) {
            return Ok(ToolResult::error(
                "Error: Sudo (superuser) execution is disabled by permissions.",
            ));
        }

        let timeout_secs = args.timeout.unwrap_or(TIMEOUT_SECS);
        tracing::info!(command, timeout_secs, "Running command");

        let child = Command::new(program)
            .args(rest)
            .current_dir(&ctx.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ToolResult::error(format!(
                    "Error: Command not found: '{}'. Please ensure it is installed and on your system's PATH.",
                    program
                )));
            }
            Err(e) => return Err(ToolError::Io(e)),
        };

        let timeout = tokio::time::Duration::from_secs(timeout_secs);
        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => Ok(format_output(output.status.code(), &output.stdout, &output.stderr)),
            Ok(Err(e)) => Err(ToolError::Io(e)),
            // Dropping the future kills the child
            Err(_) => Ok(ToolResult::error(format!(
                "Error: Command timed out after {} seconds.",
                timeout_secs
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::PermissionGate;
    use crate::tool::ToolInput;
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn ctx(dir: &TempDir, allow: bool) -> ToolContext {
        let gate = PermissionGate::with_flags([(PermissionFlag::RunScripts, allow)]);
        ToolContext::new(dir.path().to_path_buf(), Arc::new(gate))
    }

    fn args(command: &str) -> ToolArgs {
        ToolInput::from(json!({ "command": command })).normalize().unwrap()
    }

    #[tokio::test]
    async fn test_denied_by_default() {
        let dir = TempDir::new().unwrap();
        let ctx = ToolContext::new(dir.path().to_path_buf(), Arc::new(PermissionGate::new()));
        let result = RunCommand.execute(args("echo hi"), &ctx).await.unwrap();
        assert_eq!(result.output, "Error: Command execution is disabled by permissions.");
    }

    #[tokio::test]
    async fn test_sudo_needs_its_own_flag() {
        let dir = TempDir::new().unwrap();
        let result = RunCommand.execute(args("sudo ls"), &ctx(&dir, true)).await.unwrap();
        assert_eq!(
            result.output,
            "Error: Sudo (superuser) execution is disabled by permissions."
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_runs_without_shell() {
        let dir = TempDir::new().unwrap();
        let result = RunCommand
            .execute(args("echo 'hello   world' $HOME"), &ctx(&dir, true))
            .await
            .unwrap();
        assert!(!result.is_error);
        // Quotes are honoured, variables are not expanded
        assert_eq!(result.output, "hello   world $HOME");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit() {
        let dir = TempDir::new().unwrap();
        let result = RunCommand
            .execute(args("sh -c 'echo out; echo err >&2; exit 3'"), &ctx(&dir, true))
            .await
            .unwrap();
        assert!(result.is_error);
        assert_eq!(
            result.output,
            "Error: Command failed with exit code 3.\nSTDOUT:\nout\nSTDERR:\nerr"
        );
    }

    #[tokio::test]
    async fn test_unknown_program() {
        let dir = TempDir::new().unwrap();
        let result = RunCommand
            .execute(args("definitely-not-a-real-binary-xyz"), &ctx(&dir, true))
            .await
            .unwrap();
        assert!(result.output.starts_with("Error: Command not found: 'definitely-not-a-real-binary-xyz'"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout() {
        let dir = TempDir::new().unwrap();
        let args = ToolInput::from(json!({"command": "sleep 5", "timeout": 1}))
            .normalize()
            .unwrap();
        let result = RunCommand.execute(args, &ctx(&dir, true)).await.unwrap();
        assert_eq!(result.output, "Error: Command timed out after 1 seconds.");
    }
}
