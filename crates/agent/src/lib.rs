//! Conversation engine for the multilingual assistant
//!
//! Orchestrates each turn: receive input, classify intent, route
//! translation/generation/speech through the service router, produce a
//! response, update the bounded context window, persist the turn record,
//! and feed analytics. A turn always completes: router failures degrade
//! the response text, they never abort the turn.

pub mod analytics;
pub mod context;
pub mod engine;
pub mod session;

pub use analytics::{AnalyticsAggregator, AnalyticsSnapshot};
pub use context::{ContextError, ContextStore};
pub use engine::{
    ConversationEngine, EngineConfig, TurnInput, TurnOutcome, TurnRequest, TurnResult,
};
pub use session::{SessionDefaults, SessionManager};
