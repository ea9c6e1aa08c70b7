//! Session expiry policy consulted before authenticated requests.
//!
//! The predicates are pure functions of the session store contents and the
//! current time. A token within five minutes of expiry is treated as
//! already expired so in-flight requests do not race the deadline; a token
//! within an hour of expiry triggers a best-effort background refresh.

use crate::api::DeviceAuthApi;
use crate::auth::device_flow::{LoginMode, run_login};
use crate::auth::session::SessionStore;
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};

/// Tokens expiring within this margin count as already expired.
fn expiry_margin() -> Duration {
    Duration::minutes(5)
}

/// Refresh is attempted once the token is within this window of expiry.
fn refresh_window() -> Duration {
    Duration::hours(1)
}

// A present expiry implies a present token; the store writes them together.
fn authenticated_at(expiry: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match expiry {
        Some(expires_at) => expires_at - now > expiry_margin(),
        None => false,
    }
}

fn refresh_due_at(expiry: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match expiry {
        Some(expires_at) => expires_at - now < refresh_window(),
        None => false,
    }
}

pub fn is_authenticated(store: &SessionStore) -> Result<bool> {
    Ok(authenticated_at(store.expiry()?, Utc::now()))
}

pub fn needs_refresh(store: &SessionStore) -> Result<bool> {
    Ok(refresh_due_at(store.expiry()?, Utc::now()))
}

/// Gate for authenticated commands. Prints the sign-in instruction when the
/// session is missing or expired; callers abort before doing any work.
pub fn require_authenticated(store: &SessionStore) -> Result<bool> {
    let authenticated = is_authenticated(store)?;
    if !authenticated {
        eprintln!("Not signed in. Run 'taskhub login' to authenticate.");
    }
    Ok(authenticated)
}

/// Best-effort background refresh ahead of an authenticated request.
///
/// Only fires while the current token is still usable. A failed refresh is
/// downgraded to a warning and the request proceeds with the existing,
/// soon-to-expire token rather than being blocked.
pub async fn refresh_if_needed<G: DeviceAuthApi>(gateway: &G, store: &SessionStore) -> Result<()> {
    if needs_refresh(store)? && is_authenticated(store)? {
        tracing::debug!("Session expires soon, attempting background refresh");
        if let Err(e) = run_login(gateway, store, LoginMode::Background).await {
            tracing::warn!("Background session refresh failed: {}", e);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{DeviceGrant, TokenGrant};
    use crate::error::AuthError;
    use std::fs;

    fn store_with_expiry(dir: &tempfile::TempDir, expires_at: DateTime<Utc>) -> SessionStore {
        let path = dir.path().join("session.json");
        fs::write(
            &path,
            format!(
                r#"{{"auth":{{"token":"tok-old","expires_at":"{}"}}}}"#,
                expires_at.to_rfc3339()
            ),
        )
        .unwrap();
        SessionStore::at_path(path)
    }

    struct FailingGateway;

    impl DeviceAuthApi for FailingGateway {
        async fn request_device_grant(&self) -> Result<DeviceGrant, AuthError> {
            Err(AuthError::GrantRequest("connection refused".to_string()))
        }

        async fn poll_for_token(&self, _device_code: &str) -> Result<TokenGrant, AuthError> {
            Err(AuthError::AuthorizationPending)
        }
    }

    struct GrantingGateway;

    impl DeviceAuthApi for GrantingGateway {
        async fn request_device_grant(&self) -> Result<DeviceGrant, AuthError> {
            Ok(DeviceGrant {
                device_code: "dc-1".to_string(),
                user_code: "ABCD-1234".to_string(),
                verification_uri: "https://example.test/device".to_string(),
                expires_in: 600,
                interval: Some(5),
            })
        }

        async fn poll_for_token(&self, _device_code: &str) -> Result<TokenGrant, AuthError> {
            Ok(TokenGrant {
                token: "tok-fresh".to_string(),
                user: None,
            })
        }
    }

    struct UnreachableGateway;

    impl DeviceAuthApi for UnreachableGateway {
        async fn request_device_grant(&self) -> Result<DeviceGrant, AuthError> {
            panic!("refresh should not have been attempted");
        }

        async fn poll_for_token(&self, _device_code: &str) -> Result<TokenGrant, AuthError> {
            panic!("refresh should not have been attempted");
        }
    }

    #[test]
    fn no_token_is_unauthenticated() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::at_path(dir.path().join("session.json"));
        assert!(!is_authenticated(&store).unwrap());
        assert!(!needs_refresh(&store).unwrap());
    }

    #[test]
    fn fresh_token_is_authenticated() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_expiry(&dir, Utc::now() + Duration::hours(24));
        assert!(is_authenticated(&store).unwrap());
        assert!(!needs_refresh(&store).unwrap());
    }

    #[test]
    fn token_inside_margin_counts_as_expired() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_expiry(&dir, Utc::now() + Duration::minutes(3));
        assert!(!is_authenticated(&store).unwrap());
        assert!(needs_refresh(&store).unwrap());
    }

    #[test]
    fn token_inside_refresh_window_is_still_usable() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_expiry(&dir, Utc::now() + Duration::minutes(30));
        assert!(is_authenticated(&store).unwrap());
        assert!(needs_refresh(&store).unwrap());
    }

    #[test]
    fn needs_refresh_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_expiry(&dir, Utc::now() + Duration::minutes(30));
        let first = needs_refresh(&store).unwrap();
        assert_eq!(first, needs_refresh(&store).unwrap());
        assert_eq!(first, needs_refresh(&store).unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_replaces_token_inside_window() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_expiry(&dir, Utc::now() + Duration::minutes(30));

        refresh_if_needed(&GrantingGateway, &store).await.unwrap();

        assert_eq!(store.token().unwrap().as_deref(), Some("tok-fresh"));
        let expiry = store.expiry().unwrap().unwrap();
        assert!(expiry - Utc::now() > Duration::hours(23));
    }

    #[tokio::test]
    async fn failed_refresh_keeps_existing_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_expiry(&dir, Utc::now() + Duration::minutes(30));

        refresh_if_needed(&FailingGateway, &store).await.unwrap();

        assert_eq!(store.token().unwrap().as_deref(), Some("tok-old"));
    }

    #[tokio::test]
    async fn fresh_session_skips_refresh() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_expiry(&dir, Utc::now() + Duration::hours(24));

        refresh_if_needed(&UnreachableGateway, &store).await.unwrap();
    }

    #[tokio::test]
    async fn expired_session_skips_background_refresh() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_expiry(&dir, Utc::now() + Duration::minutes(3));

        // Inside the hard-expiry margin the guard must not refresh
        // silently; the user is told to sign in instead.
        refresh_if_needed(&UnreachableGateway, &store).await.unwrap();
        assert!(!require_authenticated(&store).unwrap());
    }
}
