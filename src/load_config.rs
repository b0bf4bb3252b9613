//! `load_config` module: Loads an optional static YAML config file and injects the API key from the
//! environment, producing the fully merged [`AppConfig`].
//!
//! # Responsibilities
//! - Parse the user-supplied YAML file into intermediate, fully defaulted section structs
//! - Map those sections onto the core's strongly typed configs (`SyncConfig`, `ModelConfig`, `PollPolicy`)
//! - Inject `GOOGLE_API_KEY` from the environment; a missing key fails here, at startup
//!
//! Every key is optional; with no file at all the defaults describe a `books/` folder of PDFs
//! answered by `gemini-1.5-flash`.
//!
//! # Errors
//! All errors in this module use `anyhow::Error` and are surfaced at the CLI boundary.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use neuro_rag_core::config::{ModelConfig, SyncConfig};
use neuro_rag_core::contract::GenerationConfig;
use neuro_rag_core::upload::PollPolicy;
use serde::Deserialize;
use tracing::{error, info, warn};

pub const API_KEY_VAR: &str = "GOOGLE_API_KEY";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Everything the CLI needs to run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub sync: SyncConfig,
    pub model: ModelConfig,
    pub poll: PollPolicy,
    pub api: ApiConfig,
}

/// Connection settings for the Gemini REST API.
#[derive(Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: String,
    pub request_timeout: Duration,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    documents: DocumentsSection,
    model: ModelSection,
    upload: UploadSection,
    api: ApiSection,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct DocumentsSection {
    books_dir: PathBuf,
    extension: String,
}

impl Default for DocumentsSection {
    fn default() -> Self {
        let defaults = SyncConfig::default();
        Self {
            books_dir: defaults.books_dir,
            extension: defaults.extension,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ModelSection {
    name: String,
    temperature: f32,
    top_p: f32,
    top_k: u32,
}

impl Default for ModelSection {
    fn default() -> Self {
        let defaults = ModelConfig::default();
        Self {
            name: defaults.name,
            temperature: defaults.generation.temperature,
            top_p: defaults.generation.top_p,
            top_k: defaults.generation.top_k,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct UploadSection {
    poll_interval_secs: u64,
    max_wait_secs: u64,
}

impl Default for UploadSection {
    fn default() -> Self {
        let defaults = PollPolicy::default();
        Self {
            poll_interval_secs: defaults.interval.as_secs(),
            max_wait_secs: defaults.max_wait.as_secs(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ApiSection {
    base_url: String,
    timeout_secs: u64,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 120,
        }
    }
}

/// Loads the optional YAML config file (no secrets) and injects the API key from the environment.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let raw = match path {
        Some(path_ref) => read_raw_config(path_ref)?,
        None => {
            info!("No config file given, using defaults");
            RawConfig::default()
        }
    };

    let api_key = match std::env::var(API_KEY_VAR) {
        Ok(key) if !key.trim().is_empty() => {
            info!("{API_KEY_VAR} found in env");
            key
        }
        Ok(_) => {
            error!("{API_KEY_VAR} environment variable is empty");
            anyhow::bail!("{API_KEY_VAR} environment variable is empty");
        }
        Err(e) => {
            error!(error = ?e, "{API_KEY_VAR} environment variable not set");
            return Err(anyhow::anyhow!(
                "{API_KEY_VAR} environment variable not set: {e}"
            ));
        }
    };

    if raw.upload.poll_interval_secs == 0 {
        error!("upload.poll_interval_secs is zero");
        anyhow::bail!("upload.poll_interval_secs must be greater than zero");
    }
    if raw.upload.max_wait_secs < raw.upload.poll_interval_secs {
        error!(
            max_wait_secs = raw.upload.max_wait_secs,
            poll_interval_secs = raw.upload.poll_interval_secs,
            "upload.max_wait_secs is shorter than one poll interval"
        );
        anyhow::bail!(
            "upload.max_wait_secs ({}) must be at least upload.poll_interval_secs ({})",
            raw.upload.max_wait_secs,
            raw.upload.poll_interval_secs
        );
    }

    let config = AppConfig {
        sync: SyncConfig {
            books_dir: raw.documents.books_dir,
            extension: raw.documents.extension.trim_start_matches('.').to_string(),
        },
        model: ModelConfig {
            name: raw.model.name,
            generation: GenerationConfig {
                temperature: raw.model.temperature,
                top_p: raw.model.top_p,
                top_k: raw.model.top_k,
            },
        },
        poll: PollPolicy {
            interval: Duration::from_secs(raw.upload.poll_interval_secs),
            max_wait: Duration::from_secs(raw.upload.max_wait_secs),
        },
        api: ApiConfig {
            base_url: raw.api.base_url.trim_end_matches('/').to_string(),
            api_key,
            request_timeout: Duration::from_secs(raw.api.timeout_secs),
        },
    };

    if config.model.generation != GenerationConfig::default() {
        warn!(
            generation = ?config.model.generation,
            defaults = ?GenerationConfig::default(),
            "Overriding the default generation parameters"
        );
    }

    config.sync.trace_loaded();
    config.model.trace_loaded();
    info!(
        base_url = %config.api.base_url,
        poll_interval = ?config.poll.interval,
        max_wait = ?config.poll.max_wait,
        "Config loaded and merged successfully"
    );
    Ok(config)
}

fn read_raw_config(path_ref: &Path) -> Result<RawConfig> {
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    // An empty file deserializes to unit, not to a struct.
    if config_content.trim().is_empty() {
        return Ok(RawConfig::default());
    }

    match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            Ok(conf)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML: {e}"))
        }
    }
}
