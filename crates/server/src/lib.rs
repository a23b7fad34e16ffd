//! HTTP server for the multilingual assistant
//!
//! Thin presentation layer: settings, state construction, and REST
//! routes. All conversation semantics live in `polyglot-agent`.

pub mod http;
pub mod settings;
pub mod state;

pub use http::create_router;
pub use settings::{load_settings, Settings};
pub use state::AppState;
