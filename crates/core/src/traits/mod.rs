//! Backend capability traits
//!
//! Every external provider (cloud service, local sidecar, degraded stub)
//! sits behind one of these traits. The router only ever talks to trait
//! objects; concrete backends live in the pipeline crate.

mod generate;
mod speech;
mod translate;

pub use generate::{PromptTurn, ResponseGenerator};
pub use speech::{Synthesizer, Transcriber, Transcript};
pub use translate::{Translation, Translator};

use crate::capability::{Availability, BackendTier};
use async_trait::async_trait;

/// Common surface shared by all backend implementations
///
/// `probe()` must be idempotent and side-effect-free beyond the
/// availability check itself: re-probing with an unchanged environment
/// yields the same answer. It never errors - a broken backend is reported
/// as unavailable with a reason, not as a failure.
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    /// Stable identifier used in capability maps, turn records, and logs
    fn id(&self) -> &str;

    /// Cloud or local, which is what mode filtering keys on
    fn tier(&self) -> BackendTier;

    /// Check whether this backend is currently usable
    async fn probe(&self) -> Availability;
}
