// The operation surface both API generations implement
//
// The negotiator in `holectl-core` is written once against this trait;
// `LegacyClient` and `SessionClient` each supply their own URL shapes,
// encodings, and response mapping.

use std::future::Future;

use secrecy::SecretString;

use crate::error::Error;
use crate::generation::Generation;
use crate::model::{Acknowledgement, CanonicalStatus};

/// Query and toggle Pi-hole blocking through one API generation.
///
/// `credential` is the v5 API key or the v6 password, depending on the
/// implementation. Failures come back as values; implementations never
/// panic on a bad response.
pub trait BlockingApi: Send + Sync {
    /// The generation this adapter speaks.
    fn generation(&self) -> Generation;

    /// Current blocking state.
    fn get_status(
        &self,
        host: &str,
        credential: &SecretString,
    ) -> impl Future<Output = Result<CanonicalStatus, Error>> + Send;

    /// Turn blocking on.
    fn enable(
        &self,
        host: &str,
        credential: &SecretString,
    ) -> impl Future<Output = Result<Acknowledgement, Error>> + Send;

    /// Turn blocking off for `seconds`; `0` means until re-enabled.
    fn disable(
        &self,
        host: &str,
        credential: &SecretString,
        seconds: u64,
    ) -> impl Future<Output = Result<Acknowledgement, Error>> + Send;
}
