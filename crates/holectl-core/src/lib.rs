// holectl-core: API generation negotiation between holectl-api and consumers (CLI).

pub mod config;
pub mod error;
pub mod model;
pub mod negotiator;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::ClientConfig;
pub use error::{Attempt, CoreError};
pub use model::{
    Acknowledgement, CanonicalStatus, Generation, Operation, PreferredGeneration, format_remaining,
};
pub use negotiator::Negotiator;

pub use holectl_api::ErrorKind;
