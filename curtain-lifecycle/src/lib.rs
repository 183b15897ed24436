//! Lifecycle runtime: hot-keys + interrupt listener + cleanup-once orchestrator.

mod error;
mod event_loop;
pub mod guard;
pub mod hotkey;
pub mod interrupt;
pub mod multiplexer;
pub mod orchestrator;
mod runtime;

pub use error::{LifecycleError, RegistrationError};
pub use guard::CleanupGuard;
pub use hotkey::{HotkeyBackend, HotkeyBinding, HotkeyRegistry, KeyDispatch, NoHotkeys};
pub use interrupt::InterruptListener;
pub use multiplexer::{EventMultiplexer, EventSource, Readiness};
pub use orchestrator::{Lifecycle, Phase, Termination, Trigger};
pub use runtime::{init_tracing, start_blocking};

#[cfg(feature = "global-hotkey")]
pub use hotkey::GlobalHotkeyBackend;
