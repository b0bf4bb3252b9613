use std::path::PathBuf;

use tracing::{debug, info};

use crate::contract::GenerationConfig;

/// Where to look for documents and which ones count.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    pub books_dir: PathBuf,
    /// Extension without the dot, matched case-insensitively.
    pub extension: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            books_dir: PathBuf::from("books"),
            extension: "pdf".to_string(),
        }
    }
}

impl SyncConfig {
    pub fn trace_loaded(&self) {
        info!(
            books_dir = %self.books_dir.display(),
            extension = %self.extension,
            "Loaded SyncConfig"
        );
        debug!(?self, "SyncConfig loaded (full debug)");
    }
}

/// The hosted model questions are sent to.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub name: String,
    pub generation: GenerationConfig,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "gemini-1.5-flash".to_string(),
            generation: GenerationConfig::default(),
        }
    }
}

impl ModelConfig {
    pub fn trace_loaded(&self) {
        info!(
            model = %self.name,
            temperature = self.generation.temperature,
            top_p = self.generation.top_p,
            top_k = self.generation.top_k,
            "Loaded ModelConfig"
        );
    }
}
