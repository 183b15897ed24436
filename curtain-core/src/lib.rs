//! Curtain core library: command/config types, config loading, errors.
//!
//! Public API surface:
//! - [`types`]: steps, sequences, hot-key specs, root [`Config`]
//! - [`error`]: [`ConfigError`]
//! - [`config`]: locate / load / validate `commands.json`

pub mod config;
pub mod error;
pub mod types;

pub use error::ConfigError;
pub use types::{CommandSequence, CommandStep, Config, HotkeySpec, MACRO_SENTINEL};
