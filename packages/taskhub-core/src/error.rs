use thiserror::Error;

/// Failure taxonomy for the device-authorization flow.
///
/// Variant identity is load-bearing for the polling loop:
/// `AuthorizationPending` drives silent backoff, `Poll` drives a visible
/// warning with continued polling, and `GrantRequest` ends the attempt
/// outright.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Could not obtain a device authorization grant. Fatal to the attempt;
    /// the caller must re-invoke to retry.
    #[error("failed to request device authorization: {0}")]
    GrantRequest(String),

    /// The user has not finished signing in yet. Expected while polling.
    #[error("authorization pending")]
    AuthorizationPending,

    /// Unexpected failure while polling for the token.
    #[error("token poll failed: {0}")]
    Poll(String),

    /// The grant's window elapsed before sign-in completed.
    #[error("device authorization expired before sign-in completed")]
    TimedOut,

    /// The session file could not be read or written.
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
