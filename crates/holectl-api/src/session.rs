// Session store for the v6 API
//
// Holds at most one session id and its expiry instant. Token and expiry
// live in a single `Option<Session>` behind one lock, so readers always
// see a pair that was written together.

use std::fmt;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use secrecy::SecretString;
use tracing::{debug, trace};

/// Session lifetime assumed when the auth response does not state one.
pub const DEFAULT_VALIDITY: Duration = Duration::from_secs(300);

/// Upper bound on a server-reported session lifetime.
pub const MAX_VALIDITY: Duration = Duration::from_secs(24 * 60 * 60);

struct Session {
    token: SecretString,
    expires_at: Instant,
}

/// Cached v6 session credentials.
#[derive(Default)]
pub struct SessionStore {
    session: RwLock<Option<Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` only if a token is stored and `now` is before its expiry.
    pub fn is_valid(&self, now: Instant) -> bool {
        self.valid_token(now).is_some()
    }

    /// The stored token, whether or not it has expired.
    pub fn token(&self) -> Option<SecretString> {
        let guard = self.session.read().expect("session lock poisoned");
        guard.as_ref().map(|s| s.token.clone())
    }

    /// The stored token if it is still valid at `now`, checked atomically.
    pub fn valid_token(&self, now: Instant) -> Option<SecretString> {
        let guard = self.session.read().expect("session lock poisoned");
        guard
            .as_ref()
            .filter(|s| now < s.expires_at)
            .map(|s| s.token.clone())
    }

    /// When the stored session expires.
    pub fn expires_at(&self) -> Option<Instant> {
        let guard = self.session.read().expect("session lock poisoned");
        guard.as_ref().map(|s| s.expires_at)
    }

    /// Replace the stored session. Last writer wins.
    pub fn set(&self, token: SecretString, validity: Duration, now: Instant) {
        let expires_at = now
            .checked_add(validity)
            .unwrap_or_else(|| now + DEFAULT_VALIDITY);
        *self.session.write().expect("session lock poisoned") = Some(Session { token, expires_at });
        debug!(validity_secs = validity.as_secs(), "session stored");
    }

    /// Drop the stored session.
    pub fn invalidate(&self) {
        let had = self
            .session
            .write()
            .expect("session lock poisoned")
            .take()
            .is_some();
        if had {
            trace!("session invalidated");
        }
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("has_session", &self.token().is_some())
            .field("expires_at", &self.expires_at())
            .finish()
    }
}

/// Turn the `validity` field of an auth response into a lifetime.
///
/// Missing, zero, negative, or non-finite values fall back to
/// [`DEFAULT_VALIDITY`]; anything longer than [`MAX_VALIDITY`] is capped.
pub fn validity_from_secs(validity: Option<f64>) -> Duration {
    match validity {
        Some(secs) if secs.is_finite() && secs > 0.0 => Duration::try_from_secs_f64(secs)
            .map_or(MAX_VALIDITY, |d| d.min(MAX_VALIDITY)),
        _ => DEFAULT_VALIDITY,
    }
}
