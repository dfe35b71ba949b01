//! storedesk-core: session core and API client for the storedesk back office.
//!
//! The pieces fit together like this: [`auth::LoginFlow`] exchanges a
//! username and password for a bearer token and keeps it in the
//! [`auth::CredentialStore`]; [`auth::SessionGate`] reads the store before
//! every protected [`routes::Route`] renders; [`api::ApiClient`] reads it
//! on every outgoing request and attaches the token.

pub mod api;
pub mod auth;
pub mod config;
pub mod listing;
pub mod media;
pub mod models;
pub mod routes;
pub mod utils;

pub use api::{ApiClient, ApiError};
pub use auth::{CredentialStore, LoginFlow, Navigation, SessionGate, SessionState};
pub use config::Config;
pub use routes::{Resource, Route};
