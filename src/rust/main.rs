use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::info;

use emotion_classifier::config::{
    default_artifacts_dir, DEFAULT_MAX_PAYLOAD_SIZE, DEFAULT_MODEL_FILE, DEFAULT_VOCABULARY_FILE,
};
use emotion_classifier::{
    server, ArtifactLoader, ModelInputType, ResourceProvider, RuntimeConfig, ServerConfig,
    TextNormalization, DEFAULT_SEQUENCE_LENGTH,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind
    #[arg(long, env = "EMOCLASS_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "EMOCLASS_PORT", default_value_t = 3000)]
    port: u16,

    /// Largest accepted request body in bytes
    #[arg(long, env = "EMOCLASS_MAX_PAYLOAD_SIZE", default_value_t = DEFAULT_MAX_PAYLOAD_SIZE)]
    max_payload_size: usize,

    /// Vocabulary artifact (defaults to <artifacts>/tokenizer_health.json)
    #[arg(long, env = "EMOCLASS_VOCABULARY")]
    vocabulary: Option<PathBuf>,

    /// ONNX model (defaults to <artifacts>/model.onnx)
    #[arg(long, env = "EMOCLASS_MODEL")]
    model: Option<PathBuf>,

    /// Number of ids fed to the model
    #[arg(long, env = "EMOCLASS_SEQUENCE_LENGTH", default_value_t = DEFAULT_SEQUENCE_LENGTH)]
    sequence_length: usize,

    /// Text clean-up before splitting: verbatim or keras-filters
    #[arg(long, env = "EMOCLASS_NORMALIZATION", default_value_t = TextNormalization::Verbatim)]
    normalization: TextNormalization,

    /// Element type of the model input: float32 or int64
    #[arg(long, env = "EMOCLASS_INPUT_TYPE", default_value_t = ModelInputType::Float32)]
    input_type: ModelInputType,

    /// ONNX Runtime intra-op threads (0 lets the runtime decide)
    #[arg(long, default_value_t = 0)]
    intra_threads: usize,

    /// ONNX Runtime inter-op threads (0 lets the runtime decide)
    #[arg(long, default_value_t = 0)]
    inter_threads: usize,

    /// Load the vocabulary and model before accepting requests
    #[arg(long, env = "EMOCLASS_PRELOAD")]
    preload: bool,
}

impl Args {
    fn into_config(self) -> ServerConfig {
        let artifacts = default_artifacts_dir();
        ServerConfig {
            host: self.host,
            port: self.port,
            max_payload_size: self.max_payload_size,
            vocabulary_path: self
                .vocabulary
                .unwrap_or_else(|| artifacts.join(DEFAULT_VOCABULARY_FILE)),
            model_path: self.model.unwrap_or_else(|| artifacts.join(DEFAULT_MODEL_FILE)),
            sequence_length: self.sequence_length,
            normalization: self.normalization,
            input_type: self.input_type,
            runtime: RuntimeConfig {
                inter_threads: self.inter_threads,
                intra_threads: self.intra_threads,
                ..RuntimeConfig::default()
            },
            preload: self.preload,
        }
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    emotion_classifier::init_logger();
    let config = Args::parse().into_config();

    info!("=== Starting Emotion Classifier ===");
    info!("Vocabulary: {:?}", config.vocabulary_path);
    info!("Model: {:?} ({} input)", config.model_path, config.input_type);

    let provider = ResourceProvider::new(ArtifactLoader::new(&config));
    if config.preload {
        provider
            .get()
            .await
            .context("Failed to preload classifier resources")?;
    }

    server::startup(config, provider)
        .await
        .context("HTTP server stopped with an error")?;
    Ok(())
}
