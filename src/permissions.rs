//! Permission gate for capability-bearing tools
//!
//! Two layers of switches live here:
//! - Capability flags (`ALLOW_FILE_CREATE`, ...) consulted by tool bodies
//!   before any side effect.
//! - Per-tool enable toggles consulted by the prompt builder and the agent
//!   loop before a tool is offered or dispatched.
//!
//! The gate is constructed once and shared as `Arc<PermissionGate>`. Writes are
//! atomic per entry; there is no cross-flag transaction.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// A capability that a tool may require before acting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PermissionFlag {
    #[serde(rename = "ALLOW_FILE_CREATE")]
    FileCreate,
    #[serde(rename = "ALLOW_FILE_DELETE")]
    FileDelete,
    #[serde(rename = "ALLOW_RUN_SCRIPTS")]
    RunScripts,
    #[serde(rename = "ALLOW_SUDO")]
    Sudo,
    #[serde(rename = "ALLOW_NETWORK")]
    Network,
}

impl PermissionFlag {
    pub const ALL: [PermissionFlag; 5] = [
        PermissionFlag::FileCreate,
        PermissionFlag::FileDelete,
        PermissionFlag::RunScripts,
        PermissionFlag::Sudo,
        PermissionFlag::Network,
    ];

    /// Value used when the flag has never been set.
    ///
    /// File and network conveniences default open; execution and privilege
    /// escalation default closed.
    pub fn default_allowed(self) -> bool {
        match self {
            PermissionFlag::FileCreate | PermissionFlag::FileDelete | PermissionFlag::Network => {
                true
            }
            PermissionFlag::RunScripts | PermissionFlag::Sudo => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PermissionFlag::FileCreate => "ALLOW_FILE_CREATE",
            PermissionFlag::FileDelete => "ALLOW_FILE_DELETE",
            PermissionFlag::RunScripts => "ALLOW_RUN_SCRIPTS",
            PermissionFlag::Sudo => "ALLOW_SUDO",
            PermissionFlag::Network => "ALLOW_NETWORK",
        }
    }
}

impl fmt::Display for PermissionFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown permission flag: {0}")]
pub struct UnknownFlag(pub String);

impl FromStr for PermissionFlag {
    type Err = UnknownFlag;

    /// Accepts `ALLOW_FILE_CREATE`, `allow_file_create` or the short `file_create`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let key = upper.strip_prefix("ALLOW_").unwrap_or(&upper);
        match key {
            "FILE_CREATE" => Ok(PermissionFlag::FileCreate),
            "FILE_DELETE" => Ok(PermissionFlag::FileDelete),
            "RUN_SCRIPTS" => Ok(PermissionFlag::RunScripts),
            "SUDO" => Ok(PermissionFlag::Sudo),
            "NETWORK" => Ok(PermissionFlag::Network),
            _ => Err(UnknownFlag(s.to_string())),
        }
    }
}

/// Process-wide permission state, last writer wins
#[derive(Debug, Default)]
pub struct PermissionGate {
    flags: RwLock<HashMap<PermissionFlag, bool>>,
    tools: RwLock<HashMap<String, bool>>,
}

impl PermissionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a gate with some flags already set
    pub fn with_flags(initial: impl IntoIterator<Item = (PermissionFlag, bool)>) -> Self {
        let gate = Self::new();
        for (flag, value) in initial {
            gate.set_flag(flag, value);
        }
        gate
    }

    pub fn is_allowed(&self, flag: PermissionFlag) -> bool {
        self.flags
            .read()
            .get(&flag)
            .copied()
            .unwrap_or_else(|| flag.default_allowed())
    }

    pub fn set_flag(&self, flag: PermissionFlag, value: bool) {
        self.flags.write().insert(flag, value);
        tracing::info!(flag = %flag, value, "Permission flag updated");
    }

    /// Current value of every flag, defaults included
    pub fn snapshot(&self) -> Vec<(PermissionFlag, bool)> {
        PermissionFlag::ALL
            .iter()
            .map(|flag| (*flag, self.is_allowed(*flag)))
            .collect()
    }

    /// Whether a tool is switched on. Tools never seen default to enabled.
    pub fn is_tool_enabled(&self, name: &str) -> bool {
        self.tools.read().get(name).copied().unwrap_or(true)
    }

    pub fn set_tool_enabled(&self, name: &str, enabled: bool) {
        self.tools.write().insert(name.to_string(), enabled);
        tracing::info!(tool = name, enabled, "Tool toggle updated");
    }

    /// Record newly discovered tools as enabled, leaving existing toggles alone
    pub fn register_tools<'a>(&self, names: impl IntoIterator<Item = &'a str>) {
        let mut tools = self.tools.write();
        for name in names {
            tools.entry(name.to_string()).or_insert(true);
        }
    }
}
