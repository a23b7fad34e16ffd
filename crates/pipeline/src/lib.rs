//! Capability registry, service router, and concrete backends
//!
//! This crate owns the system's central correctness property: a
//! user-visible operation fails only when every viable backend for the
//! selected mode has failed or is unavailable.
//!
//! - [`registry`] probes which backends are usable and builds the
//!   process-wide [`polyglot_core::CapabilityMap`]
//! - [`router`] executes operations with strict sequential fallback
//! - [`backends`] holds the concrete cloud/sidecar/stub implementations

pub mod backends;
pub mod error;
pub mod registry;
pub mod router;

pub use backends::BackendSet;
pub use error::{BackendAttempt, RouteError, Routed};
pub use registry::CapabilityRegistry;
pub use router::{RouterConfig, ServiceRouter};
