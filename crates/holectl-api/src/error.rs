use thiserror::Error;

use crate::generation::Generation;

/// Top-level error type for the `holectl-api` crate.
///
/// Covers every failure mode of both API generations: transport,
/// authentication, HTTP status, and response shape. Every variant is
/// plain data (no live `reqwest::Error`) so failures can be cloned into
/// composite reports, and no variant ever carries a credential or a
/// session token. `holectl-core` wraps these into user-facing failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// Connection refused, DNS failure, or no route to the host.
    #[error("Network error - cannot reach Pi-hole at {host}")]
    NetworkUnreachable { host: String },

    /// The request did not complete within the transport timeout.
    #[error("Timeout connecting to Pi-hole at {host} (after {timeout_secs}s)")]
    Timeout { host: String, timeout_secs: u64 },

    /// Any other transport failure (request building, body decoding, ...).
    #[error("HTTP transport error: {0}")]
    Transport(String),

    /// The host could not be turned into a request URL.
    #[error("Invalid URL for host {host}: {reason}")]
    InvalidUrl { host: String, reason: String },

    // ── Authentication ──────────────────────────────────────────────
    /// The legacy API rejected the API key, or the session-based API
    /// rejected the session token of an operation request.
    #[error("Authentication failed - check your App Password/API Key ({generation} API)")]
    AuthenticationFailed { generation: Generation },

    /// `/api/auth` answered 401: the password is wrong.
    #[error("Authentication failed - wrong App Password")]
    InvalidCredential,

    /// `/api/auth` answered 200 but carried no session id.
    #[error("No session ID in authentication response")]
    NoSessionInResponse,

    // ── HTTP / data ─────────────────────────────────────────────────
    /// Any non-200 status not covered above.
    #[error("{}", http_message(*generation, *status, excerpt.as_deref()))]
    Http {
        generation: Generation,
        status: u16,
        excerpt: Option<String>,
    },

    /// HTTP 200 with a legacy status body that lacks a usable `status` field.
    #[error("No status field in response")]
    MissingStatusField,

    /// HTTP 200 with a body that is not the expected JSON.
    #[error("Failed to parse {generation} response: {message}")]
    Malformed {
        generation: Generation,
        message: String,
    },
}

fn http_message(generation: Generation, status: u16, excerpt: Option<&str>) -> String {
    match excerpt {
        Some(body) if !body.is_empty() => format!("{generation} HTTP {status}: {body}"),
        _ => format!("{generation} HTTP {status}"),
    }
}

/// Coarse failure classes shared by both API generations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NetworkUnreachable,
    Timeout,
    AuthenticationFailed,
    HttpError,
    MalformedResponse,
}

impl Error {
    /// Classify this error into the shared taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NetworkUnreachable { .. } | Self::Transport(_) | Self::InvalidUrl { .. } => {
                ErrorKind::NetworkUnreachable
            }
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::AuthenticationFailed { .. }
            | Self::InvalidCredential
            | Self::NoSessionInResponse => ErrorKind::AuthenticationFailed,
            Self::Http { .. } => ErrorKind::HttpError,
            Self::MissingStatusField | Self::Malformed { .. } => ErrorKind::MalformedResponse,
        }
    }

    /// Returns `true` if the failure happened before any response arrived.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::NetworkUnreachable | ErrorKind::Timeout
        )
    }

    /// Returns `true` if the credential (or session) was rejected.
    pub fn is_auth(&self) -> bool {
        self.kind() == ErrorKind::AuthenticationFailed
    }

    /// HTTP status code, if the failure came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::AuthenticationFailed { .. } | Self::InvalidCredential => Some(401),
            _ => None,
        }
    }

    /// How actionable this error is for an end user. Higher is more specific.
    ///
    /// A rejected credential says more than a wrong-shaped response, which
    /// says more than a host that never answered.
    pub fn specificity(&self) -> u8 {
        match self.kind() {
            ErrorKind::AuthenticationFailed => 3,
            ErrorKind::HttpError | ErrorKind::MalformedResponse => 2,
            ErrorKind::NetworkUnreachable | ErrorKind::Timeout => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_message_includes_excerpt_when_present() {
        let err = Error::Http {
            generation: Generation::SessionBased,
            status: 400,
            excerpt: Some("bad request".into()),
        };
        assert_eq!(err.to_string(), "v6 HTTP 400: bad request");

        let err = Error::Http {
            generation: Generation::Legacy,
            status: 500,
            excerpt: None,
        };
        assert_eq!(err.to_string(), "v5 HTTP 500");
    }

    #[test]
    fn auth_failures_share_a_kind() {
        assert!(Error::InvalidCredential.is_auth());
        assert!(Error::NoSessionInResponse.is_auth());
        assert!(
            Error::AuthenticationFailed {
                generation: Generation::Legacy
            }
            .is_auth()
        );
        assert_eq!(Error::MissingStatusField.kind(), ErrorKind::MalformedResponse);
    }

    #[test]
    fn specificity_ranks_auth_over_transport() {
        let unreachable = Error::NetworkUnreachable {
            host: "10.0.0.5".into(),
        };
        assert!(Error::InvalidCredential.specificity() > unreachable.specificity());
        assert!(Error::MissingStatusField.specificity() > unreachable.specificity());
        assert!(unreachable.is_transient());
    }
}
