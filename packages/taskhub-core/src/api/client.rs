use crate::api::config::load_api_config;
use crate::api::types::{DeviceGrant, TokenErrorBody, TokenGrant, TokenPollRequest};
use crate::auth::SessionStore;
use crate::error::AuthError;
use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Device-authorization surface of the API.
///
/// Split out as a trait so the login flow and the session guard can be
/// driven by a scripted gateway in tests.
#[allow(async_fn_in_trait)]
pub trait DeviceAuthApi {
    async fn request_device_grant(&self) -> Result<DeviceGrant, AuthError>;
    async fn poll_for_token(&self, device_code: &str) -> Result<TokenGrant, AuthError>;
}

/// HTTP client for the Taskhub API.
///
/// Attaches `Authorization: Bearer <token>` to every request whenever the
/// injected session store holds a token; callers decide whether the session
/// is fresh enough (see `auth::guard`).
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    store: SessionStore,
}

impl ApiClient {
    /// Build a client against the configured endpoint.
    pub fn new(store: SessionStore) -> Self {
        let config = load_api_config();
        Self::with_base_url(config.api_url, store)
    }

    /// Build a client against an explicit base URL.
    pub fn with_base_url(base_url: impl Into<String>, store: SessionStore) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
            store,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn bearer(&self) -> Option<String> {
        match self.store.token() {
            Ok(token) => token,
            Err(e) => {
                tracing::debug!("Could not read session for bearer token: {}", e);
                None
            }
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let mut req = self.http.get(self.url(path));
        if let Some(token) = self.bearer() {
            req = req.bearer_auth(token);
        }
        let resp = req
            .send()
            .await
            .with_context(|| format!("Request to {} failed", path))?;
        Self::decode(resp, path).await
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let mut req = self.http.post(self.url(path)).json(body);
        if let Some(token) = self.bearer() {
            req = req.bearer_auth(token);
        }
        let resp = req
            .send()
            .await
            .with_context(|| format!("Request to {} failed", path))?;
        Self::decode(resp, path).await
    }

    pub async fn put<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let mut req = self.http.put(self.url(path)).json(body);
        if let Some(token) = self.bearer() {
            req = req.bearer_auth(token);
        }
        let resp = req
            .send()
            .await
            .with_context(|| format!("Request to {} failed", path))?;
        Self::decode(resp, path).await
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        let mut req = self.http.delete(self.url(path));
        if let Some(token) = self.bearer() {
            req = req.bearer_auth(token);
        }
        let resp = req
            .send()
            .await
            .with_context(|| format!("Request to {} failed", path))?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("Server returned error: {} - {}", status, body));
        }
        Ok(())
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response, path: &str) -> Result<T> {
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("Server returned error: {} - {}", status, body));
        }
        resp.json::<T>()
            .await
            .with_context(|| format!("Failed to parse response from {}", path))
    }
}

impl DeviceAuthApi for ApiClient {
    async fn request_device_grant(&self) -> Result<DeviceGrant, AuthError> {
        let url = self.url("/auth/device/code");
        let resp = self
            .http
            .post(&url)
            .send()
            .await
            .map_err(|e| AuthError::GrantRequest(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(AuthError::GrantRequest(format!(
                "Server returned error: {}",
                resp.status()
            )));
        }

        resp.json::<DeviceGrant>()
            .await
            .map_err(|e| AuthError::GrantRequest(format!("Failed to parse device grant response: {}", e)))
    }

    async fn poll_for_token(&self, device_code: &str) -> Result<TokenGrant, AuthError> {
        let url = self.url("/auth/device/token");
        let resp = self
            .http
            .post(&url)
            .json(&TokenPollRequest {
                device_code: device_code.to_string(),
                grant_type: "urn:ietf:params:oauth:grant-type:device_code".to_string(),
            })
            .send()
            .await
            .map_err(|e| AuthError::Poll(e.to_string()))?;

        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| AuthError::Poll(format!("Failed to read token response: {}", e)))?;
        classify_token_response(status, &body)
    }
}

/// Map a token-endpoint response to the flow's error taxonomy.
///
/// The pending state arrives as a 400 with a discriminating error field;
/// a 400 whose body does not parse is a real failure, not a pending
/// signal, so it reaches the warn-and-retry path instead of backing off
/// silently.
fn classify_token_response(status: u16, body: &str) -> Result<TokenGrant, AuthError> {
    match status {
        200 => serde_json::from_str::<TokenGrant>(body)
            .map_err(|e| AuthError::Poll(format!("Failed to parse token response: {}", e))),
        400 => match serde_json::from_str::<TokenErrorBody>(body) {
            Ok(err) if err.error == "authorization_pending" => {
                Err(AuthError::AuthorizationPending)
            }
            Ok(err) => Err(AuthError::Poll(format!(
                "{}: {}",
                err.error,
                err.error_description.unwrap_or_default()
            ))),
            Err(_) => Err(AuthError::Poll(format!(
                "Unrecognized error response: {}",
                body
            ))),
        },
        status => Err(AuthError::Poll(format!("Server returned error: {}", status))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_is_distinguished_from_other_400s() {
        let err = classify_token_response(400, r#"{"error":"authorization_pending"}"#).unwrap_err();
        assert!(matches!(err, AuthError::AuthorizationPending));

        let err = classify_token_response(
            400,
            r#"{"error":"access_denied","error_description":"user declined"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, AuthError::Poll(_)));
    }

    #[test]
    fn malformed_400_body_is_a_poll_failure() {
        let err = classify_token_response(400, "<html>bad gateway</html>").unwrap_err();
        assert!(matches!(err, AuthError::Poll(_)));
    }

    #[test]
    fn success_body_parses_token_and_identity() {
        let grant = classify_token_response(
            200,
            r#"{"token":"T","user":{"id":"u-1","email":"dev@example.com"}}"#,
        )
        .unwrap();
        assert_eq!(grant.token, "T");
        assert_eq!(grant.user.unwrap().email, "dev@example.com");
    }

    #[test]
    fn server_errors_map_to_poll() {
        let err = classify_token_response(502, "").unwrap_err();
        assert!(matches!(err, AuthError::Poll(_)));
    }
}
