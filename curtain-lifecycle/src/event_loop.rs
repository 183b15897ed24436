//! Keeps the platform event loop turning on the thread that owns the
//! hot-key manager.
//!
//! Windows posts hot-key messages to the queue of the thread that created
//! the manager, and macOS delivers them through the main thread's event
//! loop. Elsewhere the backend runs its own listener and nothing is pumped.

use std::sync::mpsc::Receiver;

/// Block until `done` yields a value. With `hotkeys_active`, platform events
/// are dispatched while waiting. `None` if the sender hung up empty-handed.
pub(crate) fn pump_until<T>(done: &Receiver<T>, hotkeys_active: bool) -> Option<T> {
    if hotkeys_active {
        platform::pump_until(done)
    } else {
        done.recv().ok()
    }
}

#[cfg(windows)]
mod platform {
    use std::sync::mpsc::{Receiver, RecvTimeoutError};
    use std::time::Duration;

    use windows_sys::Win32::UI::WindowsAndMessaging::{
        DispatchMessageW, PeekMessageW, TranslateMessage, MSG, PM_REMOVE,
    };

    const PUMP_INTERVAL: Duration = Duration::from_millis(50);

    pub(super) fn pump_until<T>(done: &Receiver<T>) -> Option<T> {
        loop {
            drain_messages();
            match done.recv_timeout(PUMP_INTERVAL) {
                Ok(value) => return Some(value),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
    }

    fn drain_messages() {
        // SAFETY: MSG is plain data and only this thread's queue is read.
        unsafe {
            let mut msg: MSG = std::mem::zeroed();
            while PeekMessageW(&mut msg, std::ptr::null_mut(), 0, 0, PM_REMOVE) != 0 {
                TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
        }
    }
}

#[cfg(target_os = "macos")]
mod platform {
    use std::os::raw::c_char;
    use std::sync::mpsc::{Receiver, TryRecvError};
    use std::time::Duration;

    use objc::rc::autoreleasepool;
    use objc::runtime::{Object, BOOL, YES};
    use objc::{class, msg_send, sel, sel_impl};

    #[link(name = "AppKit", kind = "framework")]
    extern "C" {}

    const PUMP_INTERVAL: Duration = Duration::from_millis(50);
    const NS_EVENT_MASK_ANY: usize = usize::MAX;
    const NS_ACTIVATION_POLICY_PROHIBITED: isize = 2;
    const DEFAULT_RUN_LOOP_MODE: &[u8] = b"kCFRunLoopDefaultMode\0";

    /// Must run on the main thread.
    pub(super) fn pump_until<T>(done: &Receiver<T>) -> Option<T> {
        // SAFETY: plain NSApplication messages, sent from the main thread.
        let app: *mut Object = unsafe {
            let app: *mut Object = msg_send![class!(NSApplication), sharedApplication];
            let _: BOOL = msg_send![app, setActivationPolicy: NS_ACTIVATION_POLICY_PROHIBITED];
            let _: () = msg_send![app, finishLaunching];
            app
        };

        loop {
            // SAFETY: `app` is the shared application for the process lifetime.
            autoreleasepool(|| unsafe { dispatch_next_event(app) });
            match done.try_recv() {
                Ok(value) => return Some(value),
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => return None,
            }
        }
    }

    /// Wait up to one interval for an event and hand it to the application.
    unsafe fn dispatch_next_event(app: *mut Object) {
        let until: *mut Object = msg_send![
            class!(NSDate),
            dateWithTimeIntervalSinceNow: PUMP_INTERVAL.as_secs_f64()
        ];
        let mode: *mut Object = msg_send![
            class!(NSString),
            stringWithUTF8String: DEFAULT_RUN_LOOP_MODE.as_ptr().cast::<c_char>()
        ];
        let event: *mut Object = msg_send![
            app,
            nextEventMatchingMask: NS_EVENT_MASK_ANY
            untilDate: until
            inMode: mode
            dequeue: YES
        ];
        if !event.is_null() {
            let _: () = msg_send![app, sendEvent: event];
        }
    }
}

#[cfg(not(any(windows, target_os = "macos")))]
mod platform {
    use std::sync::mpsc::Receiver;

    pub(super) fn pump_until<T>(done: &Receiver<T>) -> Option<T> {
        done.recv().ok()
    }
}
