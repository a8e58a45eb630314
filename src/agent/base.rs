//! BaseAgent - agent with a bounded reasoning loop
//!
//! One task runs the cycle:
//! 1. Call the model with the system prompt plus history
//! 2. Parse one action from the response
//! 3. Dispatch the tool and feed the observation back
//! 4. Repeat until a final answer, the step budget, or a model failure
//!
//! Only a model failure ends a task abnormally. Unknown tools, tool errors and
//! prose responses are folded into the conversation or taken as the answer.

use super::config::AgentProfile;
use super::parser::{parse_response, Action};
use super::prompt::PromptBuilder;
use crate::events::{LogEntry, LogKind, TaskOutcome, Termination};
use crate::message::{ChatMessage, ConversationHistory};
use crate::permissions::PermissionGate;
use crate::provider::CompletionModel;
use crate::tool::{ToolContext, ToolInput, ToolRegistry};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

/// Model-call cycles allowed per task
pub const MAX_STEPS: usize = 10;

/// Observations longer than this many characters are cut
pub const MAX_OBSERVATION_CHARS: usize = 2000;

pub const TRUNCATION_MARKER: &str = "... [truncated]";

pub const NO_FINAL_ANSWER_REPLY: &str = "(No final answer after max steps)";

pub const MODEL_FAILURE_REPLY: &str = "(Error: LLM failure)";

/// Characters of a prose response quoted in the transcript
const NO_ACTION_PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Idle,
    Running,
}

/// Marks the agent running for its lifetime, idle again on drop
struct StatusGuard<'a>(&'a Mutex<AgentStatus>);

impl<'a> StatusGuard<'a> {
    fn enter(status: &'a Mutex<AgentStatus>) -> Self {
        *status.lock() = AgentStatus::Running;
        Self(status)
    }
}

impl Drop for StatusGuard<'_> {
    fn drop(&mut self) {
        *self.0.lock() = AgentStatus::Idle;
    }
}

/// Cut an observation to `MAX_OBSERVATION_CHARS` characters plus the marker
pub fn truncate_observation(text: &str) -> String {
    match text.char_indices().nth(MAX_OBSERVATION_CHARS) {
        Some((cut, _)) => format!("{}{}", &text[..cut], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}

fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => &text[..cut],
        None => text,
    }
}

/// Callback receiving transcript entries as they are recorded
pub type LogSink<'a> = &'a (dyn Fn(&LogEntry) + Send + Sync);

/// Step-by-step transcript of one task, forwarded to an optional sink
struct Transcript<'a> {
    entries: Vec<LogEntry>,
    sink: Option<LogSink<'a>>,
}

impl<'a> Transcript<'a> {
    fn new(sink: Option<LogSink<'a>>) -> Self {
        Self {
            entries: Vec::new(),
            sink,
        }
    }

    fn push(&mut self, entry: LogEntry) {
        if let Some(sink) = self.sink {
            sink(&entry);
        }
        self.entries.push(entry);
    }
}

/// Agent that owns one conversation and runs tasks against it
pub struct BaseAgent {
    pub profile: AgentProfile,
    model: Arc<dyn CompletionModel>,
    registry: Arc<ToolRegistry>,
    permissions: Arc<PermissionGate>,
    prompts: Arc<PromptBuilder>,
    working_dir: PathBuf,
    max_steps: usize,
    /// Held for a whole task, so tasks on one agent run one at a time
    history: tokio::sync::Mutex<ConversationHistory>,
    status: Mutex<AgentStatus>,
}

impl BaseAgent {
    pub fn new(
        profile: AgentProfile,
        model: Arc<dyn CompletionModel>,
        registry: Arc<ToolRegistry>,
        permissions: Arc<PermissionGate>,
        prompts: Arc<PromptBuilder>,
        working_dir: PathBuf,
    ) -> Self {
        Self {
            profile,
            model,
            registry,
            permissions,
            prompts,
            working_dir,
            max_steps: MAX_STEPS,
            history: tokio::sync::Mutex::new(ConversationHistory::new()),
            status: Mutex::new(AgentStatus::Idle),
        }
    }

    /// Override the step budget
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    pub fn name(&self) -> &str {
        &self.profile.name
    }

    pub fn status(&self) -> AgentStatus {
        *self.status.lock()
    }

    /// Clear persisted history between tasks
    pub async fn reset_conversation(&self) {
        self.history.lock().await.clear();
        tracing::info!(agent = %self.profile.name, "Conversation reset");
    }

    /// Copy of the persisted history
    pub async fn history(&self) -> Vec<ChatMessage> {
        self.history.lock().await.messages().to_vec()
    }

    /// Run one task to completion
    pub async fn process(&self, input: &str) -> TaskOutcome {
        self.run(input, None).await
    }

    /// Run one task, reporting each transcript entry as it happens
    pub async fn process_observed(&self, input: &str, sink: LogSink<'_>) -> TaskOutcome {
        self.run(input, Some(sink)).await
    }

    async fn run(&self, input: &str, sink: Option<LogSink<'_>>) -> TaskOutcome {
        let span = tracing::info_span!(
            "task",
            agent = %self.profile.name,
            task_id = %Uuid::new_v4()
        );
        self.run_loop(input, sink).instrument(span).await
    }

    async fn run_loop(&self, input: &str, sink: Option<LogSink<'_>>) -> TaskOutcome {
        let mut history = self.history.lock().await;
        let _running = StatusGuard::enter(&self.status);

        tracing::info!(model = self.model.model_name(), "Starting task");
        history.push_user(input);

        let mut messages =
            self.prompts
                .build(&self.profile, &self.registry, &self.permissions, &history);
        let ctx = ToolContext::new(self.working_dir.clone(), self.permissions.clone());
        let mut logs = Transcript::new(sink);
        let mut answer: Option<(String, Termination)> = None;
        let mut steps = 0;

        for step in 1..=self.max_steps {
            steps = step;

            let output = match self.model.complete(&messages).await {
                Ok(output) => output,
                Err(e) => {
                    tracing::error!(step, error = %e, "Model call failed");
                    logs.push(LogEntry::new(
                        step,
                        LogKind::ModelError,
                        format!("[ERROR] Model call failed: {}", e),
                    ));
                    // A retried task starts from clean history
                    history.pop_last_user();
                    return TaskOutcome {
                        reply: MODEL_FAILURE_REPLY.to_string(),
                        termination: Termination::ModelCallFailed,
                        logs: logs.entries,
                        steps,
                    };
                }
            };

            let (action, written) = parse_response(&output);
            let echoed = written.unwrap_or_else(|| action.to_json());
            match action {
                Action::Unparseable(text) => {
                    tracing::info!(step, "Model responded without an action");
                    logs.push(LogEntry::new(
                        step,
                        LogKind::NoAction,
                        format!(
                            "LLM response (no action): {}",
                            preview(&text, NO_ACTION_PREVIEW_CHARS)
                        ),
                    ));
                    answer = Some((text, Termination::Unparseable));
                    break;
                }
                Action::FinalAnswer(text) => {
                    self.echo_action(&mut messages, &mut logs, step, &echoed);
                    logs.push(LogEntry::new(step, LogKind::FinalAnswer, "Final Answer received."));
                    answer = Some((text, Termination::FinalAnswer));
                    break;
                }
                Action::ToolInvocation { tool, input } => {
                    self.echo_action(&mut messages, &mut logs, step, &echoed);
                    let observation = truncate_observation(&self.dispatch(&tool, input, &ctx).await);
                    tracing::debug!(step, tool = %tool, chars = observation.len(), "Observation");
                    logs.push(LogEntry::new(
                        step,
                        LogKind::Observation,
                        format!("Observation: {}", observation),
                    ));
                    messages.push(ChatMessage::system(format!("Observation: {}", observation)));
                }
            }
        }

        let (reply, termination) = match answer {
            Some((text, termination)) => (text.trim().to_string(), termination),
            None => {
                tracing::warn!(steps, "Stopped after max steps");
                logs.push(LogEntry::new(steps, LogKind::MaxSteps, "Stopped after max steps."));
                (NO_FINAL_ANSWER_REPLY.to_string(), Termination::MaxStepsExhausted)
            }
        };

        // Only answers the model produced become part of the conversation
        if termination.is_model_answer() && !reply.is_empty() {
            history.push_assistant(reply.clone());
        }

        tracing::info!(steps, termination = ?termination, "Task finished");
        TaskOutcome {
            reply,
            termination,
            logs: logs.entries,
            steps,
        }
    }

    /// Show the model its own decision, as it wrote it, and record it in the
    /// transcript
    fn echo_action(
        &self,
        messages: &mut Vec<ChatMessage>,
        logs: &mut Transcript<'_>,
        step: usize,
        action: &Value,
    ) {
        let pretty = serde_json::to_string_pretty(action).unwrap_or_else(|_| action.to_string());
        messages.push(ChatMessage::assistant(pretty));
        tracing::info!(step, action = %action, "LLM action");
        logs.push(LogEntry::new(step, LogKind::Action, format!("LLM Action: {}", action)));
    }

    /// Run a tool the agent may use; anything else yields the unavailable text
    async fn dispatch(&self, tool: &str, input: Value, ctx: &ToolContext) -> String {
        let available = self.profile.uses_tool(tool)
            && self.permissions.is_tool_enabled(tool)
            && self.registry.contains(tool);
        if !available {
            tracing::warn!(tool, "Model chose an unavailable tool");
            return format!("Error: Tool '{}' is not available or is disabled.", tool);
        }

        tracing::info!(tool, "Executing tool");
        let result = self.registry.invoke(tool, ToolInput::from(input), ctx).await;
        if result.is_error {
            tracing::debug!(tool, output = %result.output, "Tool reported an error");
        }
        result.output
    }
}
