use ort::Error as OrtError;
use std::fmt;

/// Represents the different types of errors that can occur in the classification pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifierError {
    /// The vocabulary artifact is missing, unreadable or malformed
    VocabularyError(String),
    /// Error occurred while building or running the tokenizer
    TokenizerError(String),
    /// Error occurred while loading the ONNX model or preparing the runtime
    ModelError(String),
    /// Error occurred during the build phase
    BuildError(String),
    /// The model failed or returned an unusable score vector for a request
    InferenceError(String),
    /// Error occurred due to invalid input parameters
    ValidationError(String),
}

impl fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VocabularyError(msg) => write!(f, "Vocabulary error: {}", msg),
            Self::TokenizerError(msg) => write!(f, "Tokenizer error: {}", msg),
            Self::ModelError(msg) => write!(f, "Model error: {}", msg),
            Self::BuildError(msg) => write!(f, "Build error: {}", msg),
            Self::InferenceError(msg) => write!(f, "Inference error: {}", msg),
            Self::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for ClassifierError {}

impl From<OrtError> for ClassifierError {
    fn from(err: OrtError) -> Self {
        ClassifierError::ModelError(err.to_string())
    }
}
