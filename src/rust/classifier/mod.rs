mod error;
mod vocabulary;
mod encoder;
mod labels;
mod model;
mod classifier;
pub mod builder;

pub use error::ClassifierError;
pub use vocabulary::{VocabularyIndex, UNKNOWN_ID};
pub use encoder::{EncodedSequence, Encoder, TextNormalization, DEFAULT_SEQUENCE_LENGTH};
pub use labels::{ClassificationResult, LabelSet, EMOTION_LABELS};
pub use model::{ModelInputType, OnnxModel, ScoreModel};
pub use classifier::Classifier;
pub use builder::ClassifierBuilder;

/// Information about the current state and configuration of a classifier
#[derive(Debug, Clone)]
pub struct ClassifierInfo {
    /// Path to the ONNX model file, if the model was loaded from one
    pub model_path: Option<String>,
    /// Path to the vocabulary artifact, if it was loaded from one
    pub vocabulary_path: Option<String>,
    /// Number of words in the vocabulary
    pub vocabulary_size: usize,
    /// Fixed length every input is padded or truncated to
    pub sequence_length: usize,
    /// Text clean-up applied before splitting
    pub normalization: TextNormalization,
    /// Labels in model output order
    pub labels: Vec<String>,
}
