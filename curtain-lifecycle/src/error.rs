use thiserror::Error;

/// A key combination could not be claimed. Fatal: nothing has been started yet.
#[derive(Debug, Error)]
#[error("register hotkey {combination} failed: {reason}")]
pub struct RegistrationError {
    pub combination: String,
    pub reason: String,
}

/// Error surface for lifecycle setup.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error("failed to start lifecycle runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("lifecycle thread exited without a result")]
    Worker,
}

pub(crate) fn registration_err(
    combination: impl Into<String>,
    reason: impl ToString,
) -> RegistrationError {
    RegistrationError {
        combination: combination.into(),
        reason: reason.to_string(),
    }
}
