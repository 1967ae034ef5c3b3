// ── Core error types ──
//
// What callers of the negotiator see. A single adapter failure never
// escapes on its own: it is either recovered by the other generation or
// folded into a `CompositeFailure` together with the other attempt.

use std::fmt::Write as _;

use holectl_api::{ErrorKind, Generation};
use thiserror::Error;

use crate::model::Operation;

/// One generation's failed try at an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub generation: Generation,
    pub error: holectl_api::Error,
}

/// Unified error type for the core crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    // ── Input errors (raised before any I/O) ─────────────────────────
    #[error("Pi-hole IP address is empty")]
    InvalidHost,

    #[error("App Password/API Key is empty")]
    InvalidCredential,

    // ── Negotiation ──────────────────────────────────────────────────
    /// Every generation was tried and every one failed.
    #[error("{}", composite_message(*operation, attempts))]
    CompositeFailure {
        operation: Operation,
        /// In the order they were tried.
        attempts: Vec<Attempt>,
    },

    // ── Setup ────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// The attempt whose error is reported to the user: the most specific
    /// one, with ties going to whichever was tried first.
    pub fn cause(&self) -> Option<&Attempt> {
        match self {
            Self::CompositeFailure { attempts, .. } => most_specific(attempts),
            _ => None,
        }
    }

    /// Failure class of the reported cause, if any network work happened.
    pub fn kind(&self) -> Option<ErrorKind> {
        self.cause().map(|a| a.error.kind())
    }

    /// `true` for input errors caught before any request was sent.
    pub fn is_input(&self) -> bool {
        matches!(self, Self::InvalidHost | Self::InvalidCredential)
    }

    /// `true` when the reported cause is a rejected credential or session.
    pub fn is_auth(&self) -> bool {
        self.cause().is_some_and(|a| a.error.is_auth())
    }

    /// `true` when no attempt got any response from the host.
    pub fn is_unreachable(&self) -> bool {
        match self {
            Self::CompositeFailure { attempts, .. } => {
                !attempts.is_empty() && attempts.iter().all(|a| a.error.is_transient())
            }
            _ => false,
        }
    }
}

fn most_specific(attempts: &[Attempt]) -> Option<&Attempt> {
    attempts.iter().fold(None, |best: Option<&Attempt>, attempt| match best {
        Some(b) if b.error.specificity() >= attempt.error.specificity() => Some(b),
        _ => Some(attempt),
    })
}

fn composite_message(operation: Operation, attempts: &[Attempt]) -> String {
    let mut msg = format!(
        "{}\nCheck IP address and App Password.\n\nDetails:\n",
        operation.headline()
    );
    match most_specific(attempts) {
        Some(cause) => {
            let _ = write!(msg, "{}", cause.error);
        }
        None => msg.push_str("no API generation was tried"),
    }
    msg
}

// ── Conversion from setup-time API errors ────────────────────────────

impl From<holectl_api::Error> for CoreError {
    fn from(err: holectl_api::Error) -> Self {
        CoreError::Config {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn unreachable(generation: Generation) -> Attempt {
        Attempt {
            generation,
            error: holectl_api::Error::NetworkUnreachable {
                host: "10.0.0.5".into(),
            },
        }
    }

    #[test]
    fn composite_prefers_auth_over_transport() {
        let err = CoreError::CompositeFailure {
            operation: Operation::Enable,
            attempts: vec![
                unreachable(Generation::Legacy),
                Attempt {
                    generation: Generation::SessionBased,
                    error: holectl_api::Error::InvalidCredential,
                },
            ],
        };

        assert_eq!(err.cause().map(|a| a.generation), Some(Generation::SessionBased));
        assert_eq!(err.kind(), Some(ErrorKind::AuthenticationFailed));
        assert!(err.is_auth());
        assert!(!err.is_unreachable());
        assert_eq!(
            err.to_string(),
            "Failed to enable blocking.\nCheck IP address and App Password.\n\nDetails:\n\
             Authentication failed - wrong App Password"
        );
    }

    #[test]
    fn composite_tie_goes_to_first_attempt() {
        let err = CoreError::CompositeFailure {
            operation: Operation::Status,
            attempts: vec![
                unreachable(Generation::SessionBased),
                unreachable(Generation::Legacy),
            ],
        };

        assert_eq!(err.cause().map(|a| a.generation), Some(Generation::SessionBased));
        assert!(err.is_unreachable());
        assert!(!err.is_auth());
        assert!(err.to_string().starts_with("Cannot connect to Pi-hole.\n"));
        assert!(err.to_string().ends_with("cannot reach Pi-hole at 10.0.0.5"));
    }

    #[test]
    fn input_errors_have_no_cause() {
        assert!(CoreError::InvalidHost.is_input());
        assert!(!CoreError::InvalidHost.is_unreachable());
        assert_eq!(CoreError::InvalidCredential.cause(), None);
        assert_eq!(CoreError::InvalidHost.to_string(), "Pi-hole IP address is empty");
    }
}
