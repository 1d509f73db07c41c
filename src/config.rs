//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `LEDGERLENS_CONFIG`
//! environment variable.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `LEDGERLENS_` override YAML values
//! 3. **PORT** - Special case: overrides `port` if set
//! 4. **GEMINI_API_KEY** - Special case: overrides `gemini.api_key` if set
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `LEDGERLENS_GEMINI__MODEL=gemini-1.5-pro` sets the `gemini.model` field.

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use url::Url;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "LEDGERLENS_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    /// Useful for CI/CD pipelines to catch config errors before deployment.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// This is the root configuration structure loaded from YAML and environment variables.
/// All fields have defaults defined in the `Default` implementation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Raw GEMINI_API_KEY capture; moved into `gemini.api_key` during load
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gemini_api_key: Option<String>,
    /// Generative-language API configuration
    pub gemini: GeminiConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Maximum accepted upload size in bytes. Unset means no limit, matching the
    /// behavior of the service this replaces. Axum's default 2 MB cap would
    /// otherwise reject larger spreadsheets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_upload_bytes: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            gemini_api_key: None,
            gemini: GeminiConfig::default(),
            cors: CorsConfig::default(),
            max_upload_bytes: None,
        }
    }
}

/// Configuration for the outbound generative-language API.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeminiConfig {
    /// API key sent as the `key` query parameter. Usually set via GEMINI_API_KEY.
    pub api_key: String,
    /// Base URL of the generative-language API. Overridable so tests can point
    /// the provider at a local mock server.
    pub base_url: Url,
    /// Model name interpolated into the generateContent path
    pub model: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: Url::parse("https://generativelanguage.googleapis.com/").expect("default base URL is valid"),
            model: "gemini-1.5-flash".to_string(),
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Origins allowed to call the API. Defaults to the wildcard origin.
    pub allowed_origins: Vec<CorsOrigin>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![CorsOrigin::Wildcard],
        }
    }
}

/// A single allowed CORS origin: either the `*` wildcard or a specific URL.
#[derive(Debug, Clone, PartialEq)]
pub enum CorsOrigin {
    Wildcard,
    Url(Url),
}

impl Serialize for CorsOrigin {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CorsOrigin::Wildcard => serializer.serialize_str("*"),
            CorsOrigin::Url(url) => serializer.serialize_str(url.as_str()),
        }
    }
}

impl<'de> Deserialize<'de> for CorsOrigin {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s == "*" {
            Ok(CorsOrigin::Wildcard)
        } else {
            Url::parse(&s).map(CorsOrigin::Url).map_err(serde::de::Error::custom)
        }
    }
}

impl Config {
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let mut config: Self = Self::figment(args).extract()?;

        // if GEMINI_API_KEY is set, it wins over the config file
        if let Some(key) = config.gemini_api_key.take() {
            config.gemini.api_key = key;
        }

        if config.gemini.api_key.is_empty() {
            return Err(figment::Error::from(
                "gemini.api_key must be set (e.g. via the GEMINI_API_KEY environment variable)".to_string(),
            ));
        }

        Ok(config)
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables can still override specific values
            .merge(Env::prefixed("LEDGERLENS_").split("__"))
            // Common PORT and GEMINI_API_KEY patterns
            .merge(Env::raw().only(&["PORT"]))
            .merge(Env::raw().only(&["GEMINI_API_KEY"]).map(|_| "gemini_api_key".into()))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
