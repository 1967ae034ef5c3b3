// Pi-hole API generations
//
// A Pi-hole host speaks exactly one of two incompatible control APIs:
// the v5 query-parameter API under `/admin/api.php`, or the v6
// session-based REST API under `/api/`.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Which Pi-hole control API an adapter talks to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Generation {
    /// v5: `GET /admin/api.php?...&auth=<key>`.
    #[strum(to_string = "v5", serialize = "legacy")]
    Legacy,
    /// v6: `POST /api/auth` then `sid`-authenticated REST calls.
    #[strum(to_string = "v6", serialize = "session-based")]
    SessionBased,
}

impl Generation {
    /// The other generation, used as the fallback.
    pub fn other(self) -> Self {
        match self {
            Self::Legacy => Self::SessionBased,
            Self::SessionBased => Self::Legacy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_as_pihole_version() {
        assert_eq!(Generation::Legacy.to_string(), "v5");
        assert_eq!(Generation::SessionBased.to_string(), "v6");
    }

    #[test]
    fn parses_both_names() {
        assert_eq!("v6".parse::<Generation>(), Ok(Generation::SessionBased));
        assert_eq!("legacy".parse::<Generation>(), Ok(Generation::Legacy));
    }

    #[test]
    fn other_flips() {
        assert_eq!(Generation::Legacy.other(), Generation::SessionBased);
        assert_eq!(Generation::SessionBased.other(), Generation::Legacy);
    }
}
