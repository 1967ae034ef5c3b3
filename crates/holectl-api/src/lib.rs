// holectl-api: Async Rust client for the Pi-hole control APIs (v5 legacy + v6 session-based)

pub mod adapter;
pub mod endpoint;
pub mod error;
pub mod generation;
pub mod legacy;
pub mod model;
pub mod redact;
pub mod session;
pub mod session_api;
pub mod transport;

pub use adapter::BlockingApi;
pub use error::{Error, ErrorKind};
pub use generation::Generation;
pub use legacy::{LegacyAction, LegacyClient};
pub use model::{Acknowledgement, CanonicalStatus};
pub use session::SessionStore;
pub use session_api::SessionClient;
pub use transport::{HttpRequest, HttpResponse, HttpTransport, Transport, TransportConfig};
