//! Task transcript types
//!
//! Every task run by an agent ends with a `TaskOutcome`: the reply text, how
//! the loop terminated, and a step-by-step transcript. The transcript is what
//! callers show to operators; the same entries are mirrored into `tracing`.

use serde::Serialize;
use std::fmt;

/// Kind of a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    /// Structured action the model chose
    Action,
    /// Model produced a final answer action
    FinalAnswer,
    /// Model output had no recognizable action
    NoAction,
    /// Tool result fed back to the model
    Observation,
    /// Step budget ran out
    MaxSteps,
    /// Completion call failed
    ModelError,
}

/// One line of the transcript
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    /// 1-based model-call cycle the entry belongs to
    pub step: usize,
    pub kind: LogKind,
    pub message: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl LogEntry {
    pub fn new(step: usize, kind: LogKind, message: impl Into<String>) -> Self {
        Self {
            step,
            kind,
            message: message.into(),
            timestamp: chrono::Utc::now(),
        }
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Terminal state of the agent loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    FinalAnswer,
    /// Model output was prose; taken as the answer
    Unparseable,
    MaxStepsExhausted,
    ModelCallFailed,
}

impl Termination {
    /// Whether the reply text was produced by the model
    pub fn is_model_answer(self) -> bool {
        matches!(self, Termination::FinalAnswer | Termination::Unparseable)
    }
}

/// Result of one task
#[derive(Debug, Clone, Serialize)]
pub struct TaskOutcome {
    pub reply: String,
    pub termination: Termination,
    pub logs: Vec<LogEntry>,
    /// Model-call cycles used
    pub steps: usize,
}

impl TaskOutcome {
    pub fn is_error(&self) -> bool {
        self.termination == Termination::ModelCallFailed
    }

    /// Transcript as plain lines
    pub fn log_lines(&self) -> Vec<String> {
        self.logs.iter().map(|entry| entry.message.clone()).collect()
    }
}
