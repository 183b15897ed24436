//! Loading `commands.json`.
//!
//! # Location
//!
//! ```text
//! <dir>/
//!   commands.json   (dir = first CLI argument, or the current directory)
//! ```
//!
//! Every step must carry a non-empty `command`; hot-key bindings must carry a
//! non-empty `name` and `keys`. Violations surface as [`ConfigError::Invalid`]
//! so nothing is started from a half-valid file.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::types::{CommandSequence, Config};

/// File name looked up inside the config directory.
pub const CONFIG_FILE_NAME: &str = "commands.json";

// ---------------------------------------------------------------------------
// 1. Path helpers
// ---------------------------------------------------------------------------

/// `<dir>/commands.json`. Pure, no I/O.
pub fn config_path(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILE_NAME)
}

/// Absolute config directory for an optional CLI argument.
///
/// `None` means the current working directory. Relative paths are resolved
/// against it.
pub fn resolve_dir(arg: Option<&Path>) -> Result<PathBuf, ConfigError> {
    let cwd = std::env::current_dir().map_err(|source| ConfigError::Io {
        path: PathBuf::from("."),
        source,
    })?;
    Ok(match arg {
        Some(dir) if dir.is_absolute() => dir.to_path_buf(),
        Some(dir) => cwd.join(dir),
        None => cwd,
    })
}

// ---------------------------------------------------------------------------
// 2. Load
// ---------------------------------------------------------------------------

/// Load and validate `<dir>/commands.json`.
pub fn load_from_dir(dir: &Path) -> Result<Config, ConfigError> {
    load(&config_path(dir))
}

/// Load and validate a config file at an explicit path.
///
/// Returns [`ConfigError::Io`] if the file cannot be read,
/// [`ConfigError::Parse`] (with serde_json line/column context) if malformed,
/// and [`ConfigError::Invalid`] if an invariant is broken.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: Config = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate().map_err(|reason| ConfigError::Invalid {
        path: path.to_path_buf(),
        reason,
    })?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// 3. Validation
// ---------------------------------------------------------------------------

impl Config {
    /// Check the invariants serde cannot express.
    pub fn validate(&self) -> Result<(), String> {
        check_sequence("startup", &self.startup)?;
        check_sequence("cleanup", &self.cleanup)?;
        for (i, hotkey) in self.hotkeys.iter().enumerate() {
            if hotkey.name.trim().is_empty() {
                return Err(format!("hotkeys[{i}]: name must not be empty"));
            }
            if hotkey.keys.trim().is_empty() {
                return Err(format!("hotkeys[{i}] ({}): keys must not be empty", hotkey.name));
            }
        }
        Ok(())
    }
}

fn check_sequence(label: &str, steps: &CommandSequence) -> Result<(), String> {
    for (i, step) in steps.iter().enumerate() {
        if step.command.is_empty() {
            return Err(format!("{label}[{i}]: command must not be empty"));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
