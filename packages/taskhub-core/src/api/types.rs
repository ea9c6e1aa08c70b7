//! Wire types for the Taskhub API.

use crate::auth::UserIdentity;
use serde::{Deserialize, Serialize};

/// Device authorization grant. Ephemeral, scoped to one login attempt;
/// discarded once a token is obtained or the `expires_in` window elapses.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceGrant {
    /// Opaque identifier the client polls with. Never shown to the user.
    pub device_code: String,
    /// Short code the user enters on the verification page.
    pub user_code: String,
    /// URL the user must open to approve the sign-in.
    pub verification_uri: String,
    /// Seconds until this grant itself expires (distinct from the eventual
    /// token's lifetime).
    pub expires_in: u64,
    /// Server-suggested minimum seconds between polls.
    pub interval: Option<u64>,
}

/// Successful token poll payload.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    #[serde(alias = "access_token")]
    pub token: String,
    pub user: Option<UserIdentity>,
}

#[derive(Debug, Serialize)]
pub struct TokenPollRequest {
    pub device_code: String,
    pub grant_type: String,
}

/// Error body returned by the token endpoint on HTTP 400. The `error` field
/// is what distinguishes the expected `authorization_pending` state from
/// real failures.
#[derive(Debug, Deserialize)]
pub struct TokenErrorBody {
    pub error: String,
    pub error_description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NewProject {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    /// Due date as the server formats it (YYYY-MM-DD); passed through.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NewTask {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<String>,
}

/// Partial update; only the set fields are sent.
#[derive(Debug, Default, Serialize)]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<String>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.status.is_none() && self.priority.is_none() && self.due.is_none()
    }
}
