//! Domain types for the Curtain command configuration.
//!
//! All types are deserializable from `commands.json` via serde + serde_json.
//! Optional fields default so that a step only needs a `command`.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Leading character that marks a step as a built-in macro rather than an
/// executable.
pub const MACRO_SENTINEL: char = '!';

/// Human label of the binding registered when `hotkeys` is absent.
pub const DEFAULT_HOTKEY_NAME: &str = "CTRL + SHIFT + ALT + K";

/// Key combination of the binding registered when `hotkeys` is absent.
pub const DEFAULT_HOTKEY_KEYS: &str = "ctrl+shift+alt+KeyK";

// ---------------------------------------------------------------------------
// Steps and sequences
// ---------------------------------------------------------------------------

/// One entry of a startup or cleanup sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CommandStep {
    /// Executable name, or a macro name when it starts with [`MACRO_SENTINEL`].
    pub command: String,
    /// Process arguments, or macro parameters for a macro step.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    /// Log a failure of this step and keep going, even in a startup sequence.
    #[serde(default)]
    pub ignore_error: bool,
    /// Start the process and move on without waiting for it.
    #[serde(default)]
    pub background: bool,
    /// Discard the process output instead of echoing it.
    #[serde(default)]
    pub null_stdout: bool,
    /// Macro deadline in whole seconds. Ignored by process steps.
    #[serde(default)]
    pub timeout: u64,
}

impl CommandStep {
    /// Build a foreground process step.
    pub fn new<I, S>(command: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: command.into(),
            args: args.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = secs;
        self
    }

    pub fn ignoring_errors(mut self) -> Self {
        self.ignore_error = true;
        self
    }

    pub fn in_background(mut self) -> Self {
        self.background = true;
        self
    }

    pub fn quiet(mut self) -> Self {
        self.null_stdout = true;
        self
    }

    /// `true` when `command` names a built-in macro.
    pub fn is_macro(&self) -> bool {
        self.command.starts_with(MACRO_SENTINEL)
    }

    /// Macro deadline as a [`Duration`] (`timeout` seconds).
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

impl fmt::Display for CommandStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Steps executed strictly in listed order.
pub type CommandSequence = Vec<CommandStep>;

// ---------------------------------------------------------------------------
// Hot-keys
// ---------------------------------------------------------------------------

/// A global key combination to claim at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotkeySpec {
    /// Human label used in log lines.
    pub name: String,
    /// Combination string such as `ctrl+shift+alt+KeyK`.
    pub keys: String,
}

impl HotkeySpec {
    pub fn new(name: impl Into<String>, keys: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            keys: keys.into(),
        }
    }
}

impl Default for HotkeySpec {
    fn default() -> Self {
        Self::new(DEFAULT_HOTKEY_NAME, DEFAULT_HOTKEY_KEYS)
    }
}

fn default_hotkeys() -> Vec<HotkeySpec> {
    vec![HotkeySpec::default()]
}

// ---------------------------------------------------------------------------
// Root config
// ---------------------------------------------------------------------------

/// Root of `commands.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub startup: CommandSequence,
    #[serde(default)]
    pub cleanup: CommandSequence,
    /// Carried for the desktop front-end; unused by the orchestrator.
    #[serde(default)]
    pub show_apps: Vec<String>,
    /// Carried for the desktop front-end; unused by the orchestrator.
    #[serde(default)]
    pub hide_apps: Vec<String>,
    #[serde(default = "default_hotkeys")]
    pub hotkeys: Vec<HotkeySpec>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            startup: Vec::new(),
            cleanup: Vec::new(),
            show_apps: Vec::new(),
            hide_apps: Vec::new(),
            hotkeys: default_hotkeys(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
