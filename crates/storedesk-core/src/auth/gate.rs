//! Session gate evaluated before any protected route renders.
//!
//! Session state is never stored. Each evaluation reads the credential store
//! and decodes the token again, so a token replaced or cleared elsewhere is
//! seen on the next navigation.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::routes::{Route, LOGIN_ROUTE};

use super::store::CredentialStore;
use super::token::{decode_claims, TokenClaims};

/// Source of the current wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a given instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Returns `None` when `secs` is outside chrono's representable range.
    pub fn at_epoch_seconds(secs: i64) -> Option<Self> {
        DateTime::<Utc>::from_timestamp(secs, 0).map(Self)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No credential, or one that failed to decode.
    Unauthenticated,
    /// A well-formed credential whose expiry has passed.
    Expired,
    Valid(TokenClaims),
}

impl SessionState {
    pub fn is_valid(&self) -> bool {
        matches!(self, SessionState::Valid(_))
    }
}

/// Outcome of guarding a navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Render(Route),
    Redirect(Route),
}

pub struct SessionGate<C = SystemClock> {
    store: CredentialStore,
    clock: C,
}

impl SessionGate<SystemClock> {
    pub fn new(store: CredentialStore) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<C: Clock> SessionGate<C> {
    pub fn with_clock(store: CredentialStore, clock: C) -> Self {
        Self { store, clock }
    }

    /// Derive the session state from the stored credential.
    ///
    /// Malformed and expired credentials are cleared from the store.
    pub fn evaluate(&self) -> SessionState {
        let Some(token) = self.store.get() else {
            debug!("No credential present");
            return SessionState::Unauthenticated;
        };

        let claims = match decode_claims(&token) {
            Ok(claims) => claims,
            Err(e) => {
                warn!(error = %e, "Discarding malformed credential");
                self.discard();
                return SessionState::Unauthenticated;
            }
        };

        let now = self.clock.now();
        if claims.is_expired_at(now) {
            info!(expired_at = %claims.expires_at, "Credential expired");
            self.discard();
            return SessionState::Expired;
        }

        SessionState::Valid(claims)
    }

    /// Decide whether `route` may render.
    ///
    /// Public routes render without touching the store. Protected routes
    /// render only for a valid session; everything else redirects to sign-in.
    pub fn guard(&self, route: Route) -> Navigation {
        if !route.is_protected() {
            return Navigation::Render(route);
        }

        match self.evaluate() {
            SessionState::Valid(_) => Navigation::Render(route),
            state => {
                debug!(route = %route, ?state, "Redirecting to sign-in");
                Navigation::Redirect(LOGIN_ROUTE)
            }
        }
    }

    fn discard(&self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear credential");
        }
    }
}
