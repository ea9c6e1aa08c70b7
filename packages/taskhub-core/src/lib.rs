//! Taskhub Core Library
//!
//! This crate provides the core functionality for the Taskhub CLI:
//! - Device-flow authentication (grant request, polling with backoff)
//! - Session persistence (token, expiry, identity, active project)
//! - Expiry policy and silent background refresh
//! - HTTP client for the Taskhub API
//!
//! # Example
//!
//! ```no_run
//! use taskhub_core::api::types::Project;
//! use taskhub_core::{ApiClient, LoginMode, SessionStore, run_login};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = SessionStore::open_default()?;
//!     let client = ApiClient::new(store.clone());
//!
//!     // Sign in using the device flow
//!     let signed_in = run_login(&client, &store, LoginMode::Interactive).await?;
//!
//!     if signed_in {
//!         let projects: Vec<Project> = client.get("/projects").await?;
//!         println!("{} projects", projects.len());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod error;

// Re-export commonly used types
pub use api::{ApiClient, DeviceAuthApi};
pub use auth::{LoginMode, SessionStore, UserIdentity, run_login};
pub use error::AuthError;
