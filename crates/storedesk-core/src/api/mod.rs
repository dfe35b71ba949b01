//! REST API client module for the back-office backend.
//!
//! This module provides the `ApiClient`, which doubles as the request
//! authenticator: every outgoing call picks up the current bearer token
//! from the credential store.

pub mod client;
pub mod envelope;
pub mod error;

pub use client::ApiClient;
pub use envelope::{ApiEnvelope, Payload, SUCCESS_CODE};
pub use error::ApiError;
