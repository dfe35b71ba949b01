//! Login: exchange an identifier and secret for a token, keep it, and pick
//! the landing page.
//!
//! Every failure leaves the credential store empty and produces a message
//! meant for the user.

use thiserror::Error;
use tracing::{error, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::routes::Route;

use super::store::{CredentialStore, StoreError};
use super::token::{decode_claims, MalformedCredential, TokenClaims};

/// Shown when the backend gives no message of its own
const GENERIC_FAILURE: &str = "Login failed";

#[derive(Error, Debug)]
pub enum LoginError {
    #[error("Username and password required")]
    MissingInput,

    #[error("Login rejected: {}", message.as_deref().unwrap_or(GENERIC_FAILURE))]
    ExchangeRejected { message: Option<String> },

    #[error("Could not reach the server: {0}")]
    ExchangeUnreachable(#[source] ApiError),

    #[error("No token received from the server")]
    MissingTokenInResponse,

    #[error("Invalid token: {0}")]
    InvalidCredential(#[from] MalformedCredential),

    #[error("Could not store credential: {0}")]
    Storage(#[from] StoreError),
}

impl LoginError {
    /// Text to show the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            LoginError::ExchangeRejected { message } => message
                .clone()
                .unwrap_or_else(|| GENERIC_FAILURE.to_string()),
            LoginError::MissingInput => "Username and password required".to_string(),
            LoginError::ExchangeUnreachable(_) => {
                "Could not reach the server, please try again".to_string()
            }
            LoginError::MissingTokenInResponse => "No token received from the server".to_string(),
            LoginError::InvalidCredential(_) => "Invalid token received from the server".to_string(),
            LoginError::Storage(_) => "Could not save the login on this device".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub destination: Route,
    pub claims: TokenClaims,
}

pub struct LoginFlow {
    api: ApiClient,
    store: CredentialStore,
}

impl LoginFlow {
    pub fn new(api: ApiClient, store: CredentialStore) -> Self {
        Self { api, store }
    }

    /// Run one login attempt.
    pub async fn login(&self, identifier: &str, secret: &str) -> Result<LoginOutcome, LoginError> {
        // Both inputs must be non-blank; the secret itself is sent untrimmed
        let identifier = identifier.trim();
        if identifier.is_empty() || secret.trim().is_empty() {
            return Err(LoginError::MissingInput);
        }

        // No stale token may survive a fresh attempt, in either layer
        self.store.clear()?;

        match self.exchange(identifier, secret).await {
            Ok(outcome) => {
                info!(destination = %outcome.destination, "Login successful");
                Ok(outcome)
            }
            Err(e) => {
                error!(error = %e, "Login failed");
                if let Err(clear_err) = self.store.clear() {
                    warn!(error = %clear_err, "Failed to clear credential after failed login");
                }
                Err(e)
            }
        }
    }

    async fn exchange(&self, identifier: &str, secret: &str) -> Result<LoginOutcome, LoginError> {
        let envelope = self
            .api
            .exchange_credentials(identifier, secret)
            .await
            .map_err(Self::classify)?;

        if !envelope.is_success() {
            return Err(LoginError::ExchangeRejected {
                message: envelope.message.filter(|m| !m.trim().is_empty()),
            });
        }

        let token = envelope
            .data
            .as_ref()
            .and_then(|data| data.as_str())
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(LoginError::MissingTokenInResponse)?;

        let claims = decode_claims(token)?;
        self.store.set(token)?;

        Ok(LoginOutcome {
            destination: Route::landing(claims.roles.is_admin()),
            claims,
        })
    }

    fn classify(err: ApiError) -> LoginError {
        if err.is_transport() {
            LoginError::ExchangeUnreachable(err)
        } else {
            LoginError::ExchangeRejected {
                message: err.server_message(),
            }
        }
    }
}
