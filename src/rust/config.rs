use std::env;
use std::path::PathBuf;

use crate::classifier::{ModelInputType, TextNormalization, DEFAULT_SEQUENCE_LENGTH};
use crate::runtime::RuntimeConfig;

pub const ARTIFACTS_ENV: &str = "EMOCLASS_ARTIFACTS";
pub const DEFAULT_VOCABULARY_FILE: &str = "tokenizer_health.json";
pub const DEFAULT_MODEL_FILE: &str = "model.onnx";
/// Largest accepted request body, in bytes.
pub const DEFAULT_MAX_PAYLOAD_SIZE: usize = 4 * 1024 * 1024;

/// Everything the server needs to bind and to load its resources.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_payload_size: usize,
    pub vocabulary_path: PathBuf,
    pub model_path: PathBuf,
    pub sequence_length: usize,
    pub normalization: TextNormalization,
    pub input_type: ModelInputType,
    pub runtime: RuntimeConfig,
    /// Load resources before accepting connections instead of on first request
    pub preload: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let artifacts = default_artifacts_dir();
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            max_payload_size: DEFAULT_MAX_PAYLOAD_SIZE,
            vocabulary_path: artifacts.join(DEFAULT_VOCABULARY_FILE),
            model_path: artifacts.join(DEFAULT_MODEL_FILE),
            sequence_length: DEFAULT_SEQUENCE_LENGTH,
            normalization: TextNormalization::default(),
            input_type: ModelInputType::default(),
            runtime: RuntimeConfig::default(),
            preload: false,
        }
    }
}

/// Returns the directory holding the vocabulary and model artifacts
pub fn default_artifacts_dir() -> PathBuf {
    // 1. Check environment variable
    if let Ok(path) = env::var(ARTIFACTS_ENV) {
        return PathBuf::from(path);
    }

    // 2. `public/` under the working directory
    if let Ok(cwd) = env::current_dir() {
        return cwd.join("public");
    }

    // 3. Relative fallback
    PathBuf::from("public")
}
