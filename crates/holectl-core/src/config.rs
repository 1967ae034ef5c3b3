// ── Runtime client configuration ──
//
// How to talk to a Pi-hole, not where it is. Host and credential are
// passed per call. The CLI builds a `ClientConfig` from its profile and
// hands it in; core never reads config files.

use std::time::Duration;

use holectl_api::TransportConfig;
use holectl_api::transport::DEFAULT_TIMEOUT;

/// Tuning for a [`Negotiator`](crate::Negotiator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Per-request timeout applied to every HTTP call.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn transport_config(&self) -> TransportConfig {
        TransportConfig::default().with_timeout(self.timeout)
    }
}
