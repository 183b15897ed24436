//! Global hot-key registration.
//!
//! The registry is an ordinary value owned by whoever starts the lifecycle.
//! Backends claim combinations and report key-downs by id; [`KeyDispatch`]
//! routes each id to the [`EventSource`] of its binding.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;

use curtain_core::HotkeySpec;

use crate::error::{registration_err, RegistrationError};
use crate::multiplexer::EventSource;

/// OS capability that claims a key combination for the whole session.
pub trait HotkeyBackend {
    /// Claim `keys` and return the id later passed to [`KeyDispatch::key_down`].
    fn claim(&mut self, keys: &str) -> Result<u32, String>;
}

/// Routes key-down notifications from a backend to binding channels.
#[derive(Debug, Clone, Default)]
pub struct KeyDispatch {
    routes: Arc<Mutex<HashMap<u32, mpsc::UnboundedSender<()>>>>,
}

impl KeyDispatch {
    /// Deliver one key-down. Returns `false` for ids nobody registered.
    pub fn key_down(&self, id: u32) -> bool {
        let routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
        match routes.get(&id) {
            Some(tx) => tx.send(()).is_ok(),
            None => false,
        }
    }

    fn route(&self, id: u32, tx: mpsc::UnboundedSender<()>) {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, tx);
    }
}

/// A claimed combination and the source of its key-down events.
#[derive(Debug)]
pub struct HotkeyBinding {
    pub name: String,
    pub id: u32,
    pub source: EventSource,
}

pub struct HotkeyRegistry {
    backend: Box<dyn HotkeyBackend>,
    dispatch: KeyDispatch,
}

impl HotkeyRegistry {
    /// `dispatch` must be the same handle the backend reports key-downs to.
    pub fn new(backend: Box<dyn HotkeyBackend>, dispatch: KeyDispatch) -> Self {
        Self { backend, dispatch }
    }

    pub fn register(&mut self, name: &str, keys: &str) -> Result<HotkeyBinding, RegistrationError> {
        let id = match self.backend.claim(keys) {
            Ok(id) => id,
            Err(reason) => {
                tracing::error!("ERR: register hotkey {name} failed, {reason}");
                return Err(registration_err(format!("{name} ({keys})"), reason));
            }
        };

        let (tx, source) = EventSource::channel(name);
        self.dispatch.route(id, tx);
        tracing::info!("[REGISTER HOTKEY] {name} ok");
        Ok(HotkeyBinding {
            name: name.to_string(),
            id,
            source,
        })
    }

    /// Register every spec in order; the first failure aborts the batch.
    pub fn register_all(&mut self, specs: &[HotkeySpec]) -> Result<Vec<HotkeyBinding>, RegistrationError> {
        specs
            .iter()
            .map(|spec| self.register(&spec.name, &spec.keys))
            .collect()
    }

    pub fn dispatch(&self) -> &KeyDispatch {
        &self.dispatch
    }
}

/// Backend for builds or configs without hot-key support. Every claim fails.
#[derive(Debug, Default)]
pub struct NoHotkeys;

impl HotkeyBackend for NoHotkeys {
    fn claim(&mut self, _keys: &str) -> Result<u32, String> {
        Err("global hot-key support is not available in this build".to_string())
    }
}

#[cfg(feature = "global-hotkey")]
pub use system::GlobalHotkeyBackend;

#[cfg(feature = "global-hotkey")]
mod system {
    use global_hotkey::hotkey::HotKey;
    use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};

    use super::{HotkeyBackend, KeyDispatch};
    use crate::error::{registration_err, RegistrationError};

    /// Claims combinations through the `global-hotkey` crate.
    ///
    /// Create it on the main thread and keep it alive for the whole run;
    /// dropping the manager releases every claimed combination.
    pub struct GlobalHotkeyBackend {
        manager: GlobalHotKeyManager,
    }

    impl GlobalHotkeyBackend {
        pub fn new(dispatch: KeyDispatch) -> Result<Self, RegistrationError> {
            let manager = GlobalHotKeyManager::new()
                .map_err(|e| registration_err("global hot-key manager", e))?;
            GlobalHotKeyEvent::set_event_handler(Some(move |event: GlobalHotKeyEvent| {
                if matches!(event.state(), HotKeyState::Pressed) {
                    dispatch.key_down(event.id());
                }
            }));
            Ok(Self { manager })
        }
    }

    impl HotkeyBackend for GlobalHotkeyBackend {
        fn claim(&mut self, keys: &str) -> Result<u32, String> {
            let hotkey: HotKey = keys.parse().map_err(|e| format!("{e}"))?;
            let id = hotkey.id();
            self.manager.register(hotkey).map_err(|e| e.to_string())?;
            Ok(id)
        }
    }
}
