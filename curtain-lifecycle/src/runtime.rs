use std::sync::mpsc;

use curtain_core::Config;
use curtain_runner::CommandRunner;

use crate::error::LifecycleError;
use crate::event_loop;
use crate::hotkey::{HotkeyBackend, HotkeyRegistry, KeyDispatch, NoHotkeys};
use crate::interrupt::InterruptListener;
use crate::orchestrator::{Lifecycle, Termination};

/// Register hot-keys on the calling thread, run the lifecycle on a worker
/// thread with its own tokio runtime, and pump platform events here until it
/// terminates.
///
/// Call from the main thread: Windows delivers hot-keys to the thread that
/// created the manager and macOS only to the main thread's event loop. A
/// registration failure is returned before any startup command runs.
pub fn start_blocking(config: Config) -> Result<Termination, LifecycleError> {
    let dispatch = KeyDispatch::default();
    let backend = system_backend(&config, dispatch.clone())?;
    let mut registry = HotkeyRegistry::new(backend, dispatch);
    let bindings = registry.register_all(&config.hotkeys)?;
    let hotkeys_active = !bindings.is_empty();

    tracing::debug!(
        show_apps = config.show_apps.len(),
        hide_apps = config.hide_apps.len(),
        "app visibility lists loaded"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(LifecycleError::Runtime)?;

    let lifecycle = Lifecycle::new(config, CommandRunner::default());
    let (done_tx, done_rx) = mpsc::channel();
    let worker = std::thread::Builder::new()
        .name("curtain-lifecycle".to_string())
        .spawn(move || {
            let termination = runtime.block_on(async {
                let interrupt = InterruptListener::install();
                lifecycle.run(bindings, &interrupt).await
            });
            let _ = done_tx.send(termination);
        })
        .map_err(LifecycleError::Runtime)?;

    let termination = event_loop::pump_until(&done_rx, hotkeys_active);
    if worker.join().is_err() {
        tracing::error!("lifecycle thread panicked");
    }

    // Claimed combinations stay held until the lifecycle is over.
    drop(registry);
    termination.ok_or(LifecycleError::Worker)
}

#[cfg(feature = "global-hotkey")]
fn system_backend(
    config: &Config,
    dispatch: KeyDispatch,
) -> Result<Box<dyn HotkeyBackend>, LifecycleError> {
    if config.hotkeys.is_empty() {
        return Ok(Box::new(NoHotkeys));
    }
    Ok(Box::new(crate::hotkey::GlobalHotkeyBackend::new(dispatch)?))
}

#[cfg(not(feature = "global-hotkey"))]
fn system_backend(
    _config: &Config,
    _dispatch: KeyDispatch,
) -> Result<Box<dyn HotkeyBackend>, LifecycleError> {
    Ok(Box::new(NoHotkeys))
}

/// Install the fmt subscriber. `RUST_LOG` overrides the default `info` level.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}
