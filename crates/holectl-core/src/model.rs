// ── Domain model ──
//
// Result shapes come straight from holectl-api; this module adds the
// negotiation state and a few presentation helpers.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

pub use holectl_api::{Acknowledgement, CanonicalStatus, Generation};

/// Which API generation last completed an operation.
///
/// Starts as `Unknown`, which tries the legacy API first.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum PreferredGeneration {
    #[default]
    Unknown,
    Legacy,
    SessionBased,
}

impl PreferredGeneration {
    /// Generations in the order they should be tried.
    pub fn try_order(self) -> [Generation; 2] {
        match self {
            Self::SessionBased => [Generation::SessionBased, Generation::Legacy],
            Self::Unknown | Self::Legacy => [Generation::Legacy, Generation::SessionBased],
        }
    }

    pub fn generation(self) -> Option<Generation> {
        match self {
            Self::Unknown => None,
            Self::Legacy => Some(Generation::Legacy),
            Self::SessionBased => Some(Generation::SessionBased),
        }
    }
}

impl From<Generation> for PreferredGeneration {
    fn from(generation: Generation) -> Self {
        match generation {
            Generation::Legacy => Self::Legacy,
            Generation::SessionBased => Self::SessionBased,
        }
    }
}

/// A top-level operation, as reported in failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Operation {
    Status,
    Enable,
    Disable,
}

impl Operation {
    /// First line of the user-facing message when every generation failed.
    pub fn headline(self) -> &'static str {
        match self {
            Self::Status => "Cannot connect to Pi-hole.",
            Self::Enable => "Failed to enable blocking.",
            Self::Disable => "Failed to disable blocking.",
        }
    }
}

/// Human-readable countdown for a temporary disable.
pub fn format_remaining(seconds: u64) -> String {
    match seconds {
        0 => "Disabled".to_owned(),
        s if s < 60 => format!("{s}s"),
        s if s < 3600 => format!("{}m {}s", s / 60, s % 60),
        s => format!("{}h {}m", s / 3600, (s % 3600) / 60),
    }
}
