//! Durable session state.
//!
//! A single JSON record under the user's config directory holds the bearer
//! token, its client-assumed expiry, the signed-in identity, and the active
//! project selection. The token and expiry are always written together by
//! `store_session`; either both are present or neither is.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Client-assumed token lifetime. The token endpoint does not report an
/// expiry, so every stored session is stamped with now + 24h.
fn token_lifetime() -> Duration {
    Duration::hours(24)
}

/// Identity snapshot captured at login. Display only; never consulted for
/// authorization decisions and not re-validated against the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// The project selection made with `taskhub project use`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveProject {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AuthRecord {
    token: String,
    expires_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<UserIdentity>,
}

/// On-disk layout of the session file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SessionFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    active_project: Option<ActiveProject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    auth: Option<AuthRecord>,
}

/// Get the taskhub config directory
fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
        .context("Failed to find config directory")?;
    Ok(config_dir.join("taskhub"))
}

/// Handle to the persisted session file.
///
/// Cheap to clone; constructed once and injected into the login flow, the
/// guard, and the API client so tests can substitute a temp-backed store.
/// No network or prompting side effects, pure data access.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Open the store at its default location, creating the config
    /// directory if it does not exist yet.
    pub fn open_default() -> Result<Self> {
        let config_dir = get_config_dir()?;
        if !config_dir.exists() {
            fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
        }
        Ok(Self {
            path: config_dir.join("session.json"),
        })
    }

    /// Open a store backed by an explicit file path.
    pub fn at_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn token(&self) -> Result<Option<String>> {
        Ok(self.read()?.auth.map(|a| a.token))
    }

    pub fn expiry(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.read()?.auth.map(|a| a.expires_at))
    }

    pub fn user(&self) -> Result<Option<UserIdentity>> {
        Ok(self.read()?.auth.and_then(|a| a.user))
    }

    /// Store a freshly obtained token, stamping it with the assumed
    /// lifetime. Replaces any previous auth record wholesale; the active
    /// project selection is untouched.
    pub fn store_session(&self, token: &str, user: Option<UserIdentity>) -> Result<()> {
        let mut state = self.read()?;
        let expires_at = Utc::now() + token_lifetime();
        state.auth = Some(AuthRecord {
            token: token.to_string(),
            expires_at,
            user,
        });
        self.write(&state)?;
        tracing::debug!("Session stored, expires at {}", expires_at);
        Ok(())
    }

    /// Remove the auth record entirely. Clearing an absent session is a
    /// no-op, not an error.
    pub fn clear_session(&self) -> Result<()> {
        let mut state = self.read()?;
        if state.auth.take().is_some() {
            self.write(&state)?;
            tracing::debug!("Session cleared");
        }
        Ok(())
    }

    pub fn active_project(&self) -> Result<Option<ActiveProject>> {
        Ok(self.read()?.active_project)
    }

    pub fn set_active_project(&self, project: Option<ActiveProject>) -> Result<()> {
        let mut state = self.read()?;
        state.active_project = project;
        self.write(&state)
    }

    fn read(&self) -> Result<SessionFile> {
        if !self.path.exists() {
            return Ok(SessionFile::default());
        }
        let content = fs::read_to_string(&self.path).context("Failed to read session file")?;
        serde_json::from_str(&content).context("Failed to parse session file")
    }

    /// Write the record via a temp file and rename so a crash mid-write
    /// leaves the previous session intact.
    fn write(&self, state: &SessionFile) -> Result<()> {
        let json = serde_json::to_string_pretty(state).context("Failed to serialize session")?;
        let tmp = self.path.with_extension("json.tmp");

        // Set restrictive permissions on Unix before writing
        #[cfg(unix)]
        {
            use std::io::Write;
            use std::os::unix::fs::OpenOptionsExt;
            let file = fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600) // Owner read/write only
                .open(&tmp)
                .context("Failed to create session file")?;
            let mut file = std::io::BufWriter::new(file);
            file.write_all(json.as_bytes())
                .context("Failed to write session file")?;
            file.flush().context("Failed to flush session file")?;
        }

        #[cfg(not(unix))]
        {
            fs::write(&tmp, &json).context("Failed to write session file")?;
        }

        fs::rename(&tmp, &self.path).context("Failed to replace session file")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, SessionStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::at_path(dir.path().join("session.json"));
        (dir, store)
    }

    fn identity(email: &str) -> UserIdentity {
        UserIdentity {
            id: "u-1".to_string(),
            email: email.to_string(),
            name: Some("Test User".to_string()),
        }
    }

    #[test]
    fn store_then_read_round_trips() {
        let (_dir, store) = temp_store();
        store
            .store_session("tok-1", Some(identity("dev@example.com")))
            .unwrap();

        assert_eq!(store.token().unwrap().as_deref(), Some("tok-1"));
        assert_eq!(store.user().unwrap(), Some(identity("dev@example.com")));

        let expiry = store.expiry().unwrap().unwrap();
        let expected = Utc::now() + Duration::hours(24);
        assert!((expiry - expected).num_seconds().abs() < 5);
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let (_dir, store) = temp_store();
        assert!(store.token().unwrap().is_none());
        assert!(store.expiry().unwrap().is_none());
        assert!(store.user().unwrap().is_none());
        assert!(store.active_project().unwrap().is_none());
    }

    #[test]
    fn relogin_overwrites_wholesale() {
        let (_dir, store) = temp_store();
        store
            .store_session("tok-1", Some(identity("old@example.com")))
            .unwrap();
        store.store_session("tok-2", None).unwrap();

        assert_eq!(store.token().unwrap().as_deref(), Some("tok-2"));
        // Omitting the user clears the previous snapshot, no partial merge.
        assert!(store.user().unwrap().is_none());
    }

    #[test]
    fn clear_is_idempotent() {
        let (_dir, store) = temp_store();
        store.clear_session().unwrap();

        store.store_session("tok-1", None).unwrap();
        store.clear_session().unwrap();
        assert!(store.token().unwrap().is_none());
        assert!(store.expiry().unwrap().is_none());

        store.clear_session().unwrap();
    }

    #[test]
    fn active_project_survives_login_and_logout() {
        let (_dir, store) = temp_store();
        let project = ActiveProject {
            id: "p-1".to_string(),
            name: "Website".to_string(),
        };
        store.set_active_project(Some(project.clone())).unwrap();

        store.store_session("tok-1", None).unwrap();
        assert_eq!(store.active_project().unwrap(), Some(project.clone()));

        store.clear_session().unwrap();
        assert_eq!(store.active_project().unwrap(), Some(project));
    }
}
