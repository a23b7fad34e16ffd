//! Server settings
//!
//! Layered configuration: built-in defaults, then an optional
//! `polyglot.toml`, then `POLYGLOT__*` environment variables (double
//! underscore separates sections, e.g. `POLYGLOT__SERVER__PORT=9000`).
//! A missing or broken config file falls back to defaults so the binary
//! always starts; what it can actually do is decided by the capability
//! probe, not by configuration.

use config::{Config, ConfigError, Environment, File};
use polyglot_core::{Language, Mode};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub engine: EngineSettings,

    #[serde(default)]
    pub backends: BackendsConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed CORS origins; empty list falls back to localhost
    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_true")]
    pub cors_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            cors_enabled: true,
        }
    }
}

/// Defaults applied to newly created sessions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_target_language")]
    pub target_language: Language,

    /// Translation source; unset means backends auto-detect
    #[serde(default)]
    pub source_language: Option<Language>,

    #[serde(default)]
    pub mode: Mode,

    /// Context window size (completed turns kept per session)
    #[serde(default = "default_window")]
    pub window: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            target_language: default_target_language(),
            source_language: None,
            mode: Mode::default(),
            window: default_window(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Exchanges handed to the generator as prompt context
    #[serde(default = "default_prompt_window")]
    pub prompt_window: usize,

    /// Deadline for each individual backend attempt
    #[serde(default = "default_attempt_timeout_ms")]
    pub attempt_timeout_ms: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            prompt_window: default_prompt_window(),
            attempt_timeout_ms: default_attempt_timeout_ms(),
        }
    }
}

/// Which backends get registered, and in what order
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BackendsConfig {
    /// Cloud tier; registered first so `auto` mode is cloud-first
    #[serde(default)]
    pub cloud: Option<CloudConfig>,

    #[serde(default)]
    pub sidecar: SidecarConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudConfig {
    pub base_url: String,

    /// Bearer credential; without it every cloud backend probes unavailable
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_cloud_timeout_ms")]
    pub timeout_ms: u64,

    /// Conversational model fallback chain, fastest first
    #[serde(default = "default_generator_models")]
    pub generator_models: Vec<String>,
}

/// Localhost sidecar services wrapping locally installed models
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SidecarConfig {
    #[serde(default)]
    pub stt: Option<SidecarStt>,

    #[serde(default)]
    pub tts: Option<SidecarEndpoint>,

    #[serde(default)]
    pub translate: Option<SidecarEndpoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SidecarStt {
    pub base_url: String,

    /// Recognizer model directory; probed for existence at refresh
    #[serde(default)]
    pub model_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SidecarEndpoint {
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Append-only turn history (JSON lines)
    #[serde(default = "default_history_path")]
    pub history_path: PathBuf,

    /// Plain-text translation log
    #[serde(default = "default_translations_path")]
    pub translations_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            history_path: default_history_path(),
            translations_path: default_translations_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_json: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_true() -> bool {
    true
}

fn default_target_language() -> Language {
    Language::English
}

fn default_window() -> usize {
    10
}

fn default_prompt_window() -> usize {
    5
}

fn default_attempt_timeout_ms() -> u64 {
    30_000
}

fn default_cloud_timeout_ms() -> u64 {
    30_000
}

fn default_generator_models() -> Vec<String> {
    vec![
        "fast".to_string(),
        "large".to_string(),
        "experimental".to_string(),
    ]
}

fn default_history_path() -> PathBuf {
    PathBuf::from("data/chat_history.jsonl")
}

fn default_translations_path() -> PathBuf {
    PathBuf::from("data/translations.txt")
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Load settings from the optional config file plus environment overrides
pub fn load_settings(path: Option<&str>) -> Result<Settings, ConfigError> {
    Config::builder()
        .add_source(File::with_name(path.unwrap_or("polyglot")).required(false))
        .add_source(Environment::with_prefix("POLYGLOT").separator("__"))
        .build()?
        .try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_usable() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.session.target_language, Language::English);
        assert_eq!(settings.session.mode, Mode::Auto);
        assert!(settings.backends.cloud.is_none());
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let settings = load_settings(Some("/nonexistent/polyglot")).unwrap();
        assert_eq!(settings.engine.prompt_window, 5);
        assert_eq!(settings.engine.attempt_timeout_ms, 30_000);
    }

    #[test]
    fn test_cloud_section_deserializes() {
        let toml = r#"
            [backends.cloud]
            base_url = "https://api.example.com"
            api_key = "secret"
            generator_models = ["fast", "large"]
        "#;
        let settings: Settings = Config::builder()
            .add_source(File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        let cloud = settings.backends.cloud.unwrap();
        assert_eq!(cloud.base_url, "https://api.example.com");
        assert_eq!(cloud.generator_models, vec!["fast", "large"]);
        assert_eq!(cloud.timeout_ms, 30_000);
    }
}
