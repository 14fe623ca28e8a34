//! Emotional-state text classifier backed by an ONNX sequence model.
//!
//! Text is lowercased, split on whitespace, mapped through a word vocabulary
//! (unknown words become 0), padded or truncated to 100 ids and scored by the
//! model. The label with the highest score wins, ties going to the earlier
//! label.
//!
//! # Basic Usage
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use emotion_classifier::Classifier;
//!
//! let classifier = Classifier::builder()
//!     .with_vocabulary_file("public/tokenizer_health.json")?
//!     .with_onnx_model("public/model.onnx")?
//!     .build()?;
//!
//! let result = classifier.predict("I feel fine today")?;
//! println!("Predicted label: {}", result.label());
//! # Ok(())
//! # }
//! ```
//!
//! # Serving
//!
//! [`server::startup`] exposes the classifier over HTTP. Resources are
//! loaded once, on first use, through a [`ResourceProvider`]:
//!
//! ```rust,no_run
//! use emotion_classifier::{server, ArtifactLoader, ResourceProvider, ServerConfig};
//!
//! #[actix_web::main]
//! async fn main() -> std::io::Result<()> {
//!     let config = ServerConfig::default();
//!     let provider = ResourceProvider::new(ArtifactLoader::new(&config));
//!     server::startup(config, provider).await
//! }
//! ```

pub mod classifier;
pub mod config;
pub mod resources;
mod runtime;
pub mod server;

pub use classifier::{
    ClassificationResult, Classifier, ClassifierBuilder, ClassifierError, ClassifierInfo,
    EncodedSequence, Encoder, LabelSet, ModelInputType, OnnxModel, ScoreModel, TextNormalization,
    VocabularyIndex, DEFAULT_SEQUENCE_LENGTH, EMOTION_LABELS, UNKNOWN_ID,
};
pub use config::ServerConfig;
pub use resources::{ArtifactLoader, ResourceLoader, ResourceProvider};
pub use runtime::{create_session_builder, RuntimeConfig};
pub use server::ServiceError;

/// Initialises `env_logger`, logging at `info` unless `RUST_LOG` says otherwise.
pub fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
