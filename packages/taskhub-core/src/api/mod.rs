//! HTTP plumbing for the Taskhub service.
//!
//! Provides the API client, endpoint configuration, and wire types.

mod client;
pub mod config;
pub mod types;

pub use client::{ApiClient, DeviceAuthApi};
pub use config::{ApiEndpointConfig, ConfigSource, load_api_config};
