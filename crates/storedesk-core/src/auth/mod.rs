//! Authentication module: the session core of the back office.
//!
//! This module provides:
//! - `decode_claims`: bearer token payload decoding (expiry and roles)
//! - `CredentialStore`: two-layer (in-memory + durable) token holder
//! - `SessionGate`: per-navigation guard for protected routes
//! - `LoginFlow`: credential exchange and post-login routing
//!
//! Session state is derived on every gate evaluation and never persisted.

pub mod gate;
pub mod login;
pub mod store;
pub mod token;

pub use gate::{Clock, FixedClock, Navigation, SessionGate, SessionState, SystemClock};
pub use login::{LoginError, LoginFlow, LoginOutcome};
pub use store::{
    CredentialStore, DurableSlot, FileSlot, KeyringSlot, MemorySlot, StoreError, TOKEN_SLOT_NAME,
};
pub use token::{decode_claims, MalformedCredential, Roles, TokenClaims, ADMIN_ROLE};
