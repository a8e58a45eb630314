//! Supervisor - command dispatcher over a set of agents
//!
//! Commands are submitted to a queue and handled one at a time by a single
//! dispatch loop. `list_tools` is answered directly with an inventory; any
//! other command is handed to the first configured agent and run as its own
//! tokio task, so intake never waits on an agent.
//!
//! Everything the supervisor and its agents report goes out as
//! `SupervisorEvent`s on one update channel.

use crate::agent::BaseAgent;
use crate::events::LogEntry;
use indexmap::IndexMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

/// Reserved command that reports agents and their tools
pub const LIST_TOOLS_COMMAND: &str = "list_tools";

/// How long the dispatch loop waits for a command before rechecking its flag
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq)]
pub enum SupervisorEvent {
    /// Agent began a task
    TaskStarted { agent: String, task: String },
    /// One transcript entry from a running task
    Log { agent: String, entry: LogEntry },
    /// Agent finished a task
    TaskFinished {
        agent: String,
        reply: String,
        is_error: bool,
    },
    Dispatched { agent: String, task: String },
    NoAgents,
    Inventory(String),
    Error(String),
}

impl fmt::Display for SupervisorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupervisorEvent::TaskStarted { agent, task } => {
                write!(f, "[{}] Starting new task: {}", agent, task)
            }
            SupervisorEvent::Log { agent, entry } => write!(f, "[{}] {}", agent, entry),
            SupervisorEvent::TaskFinished {
                agent,
                reply,
                is_error,
            } => {
                if *is_error {
                    write!(f, "[{}] Task failed: {}", agent, reply)
                } else {
                    write!(f, "[{}] Task Complete. Final Answer:\n{}", agent, reply)
                }
            }
            SupervisorEvent::Dispatched { agent, task } => {
                write!(f, "Task '{}' dispatched to agent '{}'.", task, agent)
            }
            SupervisorEvent::NoAgents => f.write_str("No agents available to handle the command."),
            SupervisorEvent::Inventory(report) => f.write_str(report),
            SupervisorEvent::Error(message) => write!(f, "[SUPERVISOR_ERROR] {}", message),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error("update channel closed")]
    UpdatesClosed,
    #[error("command queue closed")]
    CommandsClosed,
    #[error("dispatch loop is already running")]
    AlreadyRunning,
}

/// Inventory report for `list_tools`
pub fn inventory<'a>(agents: impl IntoIterator<Item = &'a BaseAgent>) -> String {
    let mut report = String::from("--- Available Agents & Tools ---\n");
    let mut any = false;
    for agent in agents {
        any = true;
        report.push_str(&format!("\n[Agent] {}\n", agent.name()));
        if agent.profile.tools.is_empty() {
            report.push_str("  Tools: None\n");
        } else {
            report.push_str(&format!("  Tools: {}\n", agent.profile.tools.join(", ")));
        }
    }
    if !any {
        report.push_str("No agents have been loaded.");
    }
    report
}

/// Run one task on an agent, posting progress to `updates`
pub async fn run_agent_task(
    agent: Arc<BaseAgent>,
    task: String,
    updates: mpsc::UnboundedSender<SupervisorEvent>,
) {
    let name = agent.name().to_string();
    let _ = updates.send(SupervisorEvent::TaskStarted {
        agent: name.clone(),
        task: task.clone(),
    });

    let sink = |entry: &LogEntry| {
        let _ = updates.send(SupervisorEvent::Log {
            agent: name.clone(),
            entry: entry.clone(),
        });
    };
    let outcome = agent.process_observed(&task, &sink).await;

    let _ = updates.send(SupervisorEvent::TaskFinished {
        agent: name,
        is_error: outcome.is_error(),
        reply: outcome.reply,
    });
}

pub struct Supervisor {
    agents: IndexMap<String, Arc<BaseAgent>>,
    commands_tx: mpsc::UnboundedSender<String>,
    commands_rx: Mutex<mpsc::UnboundedReceiver<String>>,
    updates: mpsc::UnboundedSender<SupervisorEvent>,
    running: AtomicBool,
}

impl Supervisor {
    /// Create a supervisor and the receiving end of its update channel
    pub fn new(
        agents: impl IntoIterator<Item = Arc<BaseAgent>>,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<SupervisorEvent>) {
        let (updates, updates_rx) = mpsc::unbounded_channel();
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();

        let mut by_name = IndexMap::new();
        for agent in agents {
            let name = agent.name().to_string();
            if by_name.insert(name.clone(), agent).is_some() {
                tracing::warn!(agent = %name, "Duplicate agent name, keeping the last one");
            }
        }
        tracing::info!(agents = by_name.len(), "Supervisor created");

        let supervisor = Arc::new(Self {
            agents: by_name,
            commands_tx,
            commands_rx: Mutex::new(commands_rx),
            updates,
            running: AtomicBool::new(false),
        });
        (supervisor, updates_rx)
    }

    pub fn agents(&self) -> impl Iterator<Item = &Arc<BaseAgent>> {
        self.agents.values()
    }

    pub fn agent(&self, name: &str) -> Option<&Arc<BaseAgent>> {
        self.agents.get(name)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Queue a command for the dispatch loop
    pub fn submit(&self, command: impl Into<String>) -> Result<(), SupervisorError> {
        self.commands_tx
            .send(command.into())
            .map_err(|_| SupervisorError::CommandsClosed)
    }

    /// Mark the loop as running; `run` returns at once unless this was called
    pub fn start(&self) {
        self.running.store(true, Ordering::SeqCst);
    }

    /// Stop pulling new commands; tasks already dispatched keep running
    pub fn stop(&self) {
        tracing::info!("Supervisor stopping");
        self.running.store(false, Ordering::SeqCst);
    }

    /// Start the dispatch loop on the runtime
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        let supervisor = Arc::clone(self);
        // Before spawning, so a stop() issued right away is not overwritten
        supervisor.start();
        tokio::spawn(async move {
            if let Err(e) = supervisor.run().await {
                tracing::error!(error = %e, "Dispatch loop exited");
            }
        })
    }

    /// Dispatch loop: runs between `start()` and `stop()`
    pub async fn run(&self) -> Result<(), SupervisorError> {
        let mut commands = self
            .commands_rx
            .try_lock()
            .map_err(|_| SupervisorError::AlreadyRunning)?;
        tracing::info!("Supervisor dispatch loop started");

        while self.is_running() {
            let command = match tokio::time::timeout(POLL_INTERVAL, commands.recv()).await {
                Ok(Some(command)) => command,
                Ok(None) => return Err(SupervisorError::CommandsClosed),
                Err(_) => continue,
            };

            tracing::info!(command = %command, "Supervisor received command");
            if let Err(e) = self.handle_command(&command) {
                tracing::error!(error = %e, command = %command, "Failed to handle command");
                let _ = self.updates.send(SupervisorEvent::Error(e.to_string()));
            }
        }

        tracing::info!("Supervisor dispatch loop terminated");
        Ok(())
    }

    fn handle_command(&self, command: &str) -> Result<(), SupervisorError> {
        if command.trim() == LIST_TOOLS_COMMAND {
            let report = inventory(self.agents.values().map(|agent| agent.as_ref()));
            return self.post(SupervisorEvent::Inventory(report));
        }

        // No routing: the first configured agent takes every task
        let Some(agent) = self.agents.values().next() else {
            return self.post(SupervisorEvent::NoAgents);
        };

        self.post(SupervisorEvent::Dispatched {
            agent: agent.name().to_string(),
            task: command.to_string(),
        })?;
        tokio::spawn(run_agent_task(
            Arc::clone(agent),
            command.to_string(),
            self.updates.clone(),
        ));
        Ok(())
    }

    fn post(&self, event: SupervisorEvent) -> Result<(), SupervisorError> {
        self.updates
            .send(event)
            .map_err(|_| SupervisorError::UpdatesClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{AgentProfile, PromptBuilder};
    use crate::events::LogKind;
    use crate::permissions::PermissionGate;
    use crate::provider::testing::ScriptedModel;
    use crate::templates::Templates;
    use crate::tool::ToolRegistry;
    use crate::tools;

    const WAIT: Duration = Duration::from_secs(5);

    fn agent(name: &str, tools: &[&str], model: ScriptedModel) -> Arc<BaseAgent> {
        let profile = AgentProfile::new(name).with_tools(tools.iter().copied());
        Arc::new(BaseAgent::new(
            profile,
            Arc::new(model),
            Arc::new(ToolRegistry::from_catalog(tools::catalog())),
            Arc::new(PermissionGate::new()),
            Arc::new(PromptBuilder::new(Templates::new().unwrap())),
            std::env::temp_dir(),
        ))
    }

    async fn next(rx: &mut mpsc::UnboundedReceiver<SupervisorEvent>) -> SupervisorEvent {
        tokio::time::timeout(WAIT, rx.recv())
            .await
            .expect("timed out waiting for event")
            .expect("update channel closed")
    }

    #[test]
    fn test_inventory_without_agents() {
        let report = inventory(std::iter::empty());
        assert_eq!(report, "--- Available Agents & Tools ---\nNo agents have been loaded.");
    }

    #[test]
    fn test_inventory_lists_agents_in_order() {
        let a = agent("FileAgent", &["read_file", "create_file"], ScriptedModel::default());
        let b = agent("Idle", &[], ScriptedModel::default());
        let report = inventory([a.as_ref(), b.as_ref()]);
        assert_eq!(
            report,
            "--- Available Agents & Tools ---\n\
             \n[Agent] FileAgent\n  Tools: read_file, create_file\n\
             \n[Agent] Idle\n  Tools: None\n"
        );
    }

    #[tokio::test]
    async fn test_list_tools_with_zero_agents() {
        let (supervisor, mut rx) = Supervisor::new(Vec::new());
        let handle = supervisor.spawn();
        supervisor.submit("list_tools").unwrap();

        match next(&mut rx).await {
            SupervisorEvent::Inventory(report) => {
                assert!(report.contains("No agents have been loaded."));
                assert!(!report.contains("[Agent]"));
            }
            other => panic!("unexpected {:?}", other),
        }

        supervisor.stop();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_task_without_agents() {
        let (supervisor, mut rx) = Supervisor::new(Vec::new());
        let handle = supervisor.spawn();
        supervisor.submit("do something").unwrap();

        let event = next(&mut rx).await;
        assert_eq!(event, SupervisorEvent::NoAgents);
        assert_eq!(event.to_string(), "No agents available to handle the command.");

        supervisor.stop();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_dispatches_to_first_agent() {
        let first = agent("First", &[], ScriptedModel::new(["hello back"]));
        let second = agent("Second", &[], ScriptedModel::new(["never"]));
        let (supervisor, mut rx) = Supervisor::new([first, second.clone()]);
        let handle = supervisor.spawn();
        supervisor.submit("hello").unwrap();

        let ack = next(&mut rx).await;
        assert_eq!(ack.to_string(), "Task 'hello' dispatched to agent 'First'.");
        assert_eq!(
            next(&mut rx).await,
            SupervisorEvent::TaskStarted {
                agent: "First".to_string(),
                task: "hello".to_string(),
            }
        );
        match next(&mut rx).await {
            SupervisorEvent::Log { agent, entry } => {
                assert_eq!(agent, "First");
                assert_eq!(entry.kind, LogKind::NoAction);
            }
            other => panic!("unexpected {:?}", other),
        }
        let finished = next(&mut rx).await;
        assert_eq!(
            finished.to_string(),
            "[First] Task Complete. Final Answer:\nhello back"
        );
        assert!(second.history().await.is_empty());

        supervisor.stop();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_intake_not_blocked_by_running_task() {
        let slow = agent(
            "Slow",
            &[],
            ScriptedModel::new(["late"]).with_delay(Duration::from_millis(500)),
        );
        let (supervisor, mut rx) = Supervisor::new([slow]);
        let handle = supervisor.spawn();
        supervisor.submit("long job").unwrap();
        supervisor.submit("list_tools").unwrap();

        let mut order = Vec::new();
        while order.len() < 4 {
            match next(&mut rx).await {
                SupervisorEvent::Inventory(_) => order.push("inventory"),
                SupervisorEvent::TaskFinished { .. } => order.push("finished"),
                SupervisorEvent::Dispatched { .. } => order.push("dispatched"),
                SupervisorEvent::TaskStarted { .. } => order.push("started"),
                _ => {}
            }
        }
        let inventory_at = order.iter().position(|e| *e == "inventory").unwrap();
        assert!(order[..inventory_at].contains(&"dispatched"));
        assert_eq!(order.last(), Some(&"finished"));

        supervisor.stop();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_model_failure_is_reported() {
        let broken = agent("Broken", &[], ScriptedModel::failing());
        let (supervisor, mut rx) = Supervisor::new([broken]);
        let handle = supervisor.spawn();
        supervisor.submit("anything").unwrap();

        loop {
            if let SupervisorEvent::TaskFinished { reply, is_error, .. } = next(&mut rx).await {
                assert!(is_error);
                assert_eq!(reply, "(Error: LLM failure)");
                break;
            }
        }

        supervisor.stop();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_stop_ends_loop() {
        let (supervisor, _rx) = Supervisor::new(Vec::new());
        let handle = supervisor.spawn();
        assert!(supervisor.is_running());
        supervisor.stop();
        tokio::time::timeout(WAIT, handle).await.unwrap().unwrap();
        assert!(!supervisor.is_running());
    }

    #[tokio::test]
    async fn test_second_loop_is_rejected() {
        let (supervisor, _rx) = Supervisor::new(Vec::new());
        let handle = supervisor.spawn();
        // Let the spawned loop take the queue
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(matches!(supervisor.run().await, Err(SupervisorError::AlreadyRunning)));
        supervisor.stop();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_closed_update_channel_does_not_end_loop() {
        let (supervisor, rx) = Supervisor::new(Vec::new());
        drop(rx);
        let handle = supervisor.spawn();
        supervisor.submit("list_tools").unwrap();
        supervisor.submit("list_tools").unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(supervisor.is_running());
        supervisor.stop();
        handle.await.unwrap();
    }
}
