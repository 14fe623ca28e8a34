use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::info;
use ndarray::Array2;
use ort::session::Session;
use ort::tensor::{IntoTensorElementType, PrimitiveTensorElementType};
use ort::value::Tensor;

use super::encoder::EncodedSequence;
use super::error::ClassifierError;
use crate::runtime::{create_session_builder, RuntimeConfig};

/// A pre-trained model mapping one encoded sequence to one score per label.
///
/// Implementations are shared across requests and may be called from
/// several threads at once, so they must not keep per-call state. Failures
/// are reported as `InferenceError`; an implementation never substitutes a
/// default score vector.
pub trait ScoreModel: Send + Sync {
    fn scores(&self, sequence: &EncodedSequence) -> Result<Vec<f32>, ClassifierError>;
}

/// Element type of the model's input tensor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ModelInputType {
    /// Keras exports keep the float input of the training graph
    #[default]
    Float32,
    Int64,
}

impl FromStr for ModelInputType {
    type Err = ClassifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "float32" | "f32" => Ok(Self::Float32),
            "int64" | "i64" => Ok(Self::Int64),
            other => Err(ClassifierError::ValidationError(format!(
                "Unknown model input type '{}' (expected 'float32' or 'int64')",
                other
            ))),
        }
    }
}

impl fmt::Display for ModelInputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float32 => write!(f, "float32"),
            Self::Int64 => write!(f, "int64"),
        }
    }
}

/// Runs an ONNX export of the sequence model through ONNX Runtime.
///
/// # Model Input Format
/// - first declared input: ids, shape [batch_size=1, sequence_length]
///
/// # Model Output Format
/// - first output: scores, shape [batch_size=1, num_labels]
#[derive(Debug)]
pub struct OnnxModel {
    model_path: PathBuf,
    session: Session,
    input_name: String,
    input_type: ModelInputType,
}

impl OnnxModel {
    /// Loads the model and validates its input/output structure.
    ///
    /// # Errors
    /// - `ModelError` if the file does not exist
    /// - `ModelError` if ONNX Runtime cannot build a session from it
    /// - `ModelError` if the model declares no inputs or no outputs
    pub fn from_file(
        path: impl AsRef<Path>,
        input_type: ModelInputType,
        runtime_config: &RuntimeConfig,
    ) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ClassifierError::ModelError(format!(
                "Model file not found: {}",
                path.display()
            )));
        }

        let session = create_session_builder(runtime_config)?
            .commit_from_file(path)
            .map_err(|e| {
                ClassifierError::ModelError(format!("Failed to load {}: {}", path.display(), e))
            })?;

        Self::validate_model(&session)?;
        let input_name = session.inputs[0].name.clone();
        info!(
            "Model loaded from {:?} (input '{}' as {})",
            path, input_name, input_type
        );

        Ok(Self {
            model_path: path.to_path_buf(),
            session,
            input_name,
            input_type,
        })
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn input_name(&self) -> &str {
        &self.input_name
    }

    fn validate_model(session: &Session) -> Result<(), ClassifierError> {
        if session.inputs.is_empty() {
            return Err(ClassifierError::ModelError(
                "Model must have at least 1 input for the id sequence".to_string(),
            ));
        }
        if session.outputs.is_empty() {
            return Err(ClassifierError::ModelError(
                "Model must have at least 1 output for the label scores".to_string(),
            ));
        }
        Ok(())
    }

    /// Feeds `ids` as a `[1, len]` tensor and flattens the first output.
    fn run<T>(&self, ids: Vec<T>) -> Result<Vec<f32>, ClassifierError>
    where
        T: PrimitiveTensorElementType + IntoTensorElementType + fmt::Debug + Clone + 'static,
    {
        let input_array = Array2::from_shape_vec((1, ids.len()), ids).map_err(|e| {
            ClassifierError::InferenceError(format!("Failed to create input array: {}", e))
        })?;
        let input_dyn = input_array.into_dyn();
        let input_ids = input_dyn.as_standard_layout();

        let mut input_tensors = HashMap::new();
        input_tensors.insert(
            self.input_name.as_str(),
            Tensor::from_array(&input_ids).map_err(|e| {
                ClassifierError::InferenceError(format!("Failed to create input tensor: {}", e))
            })?,
        );

        let outputs = self
            .session
            .run(input_tensors)
            .map_err(|e| ClassifierError::InferenceError(format!("Failed to run model: {}", e)))?;
        let output_tensor = outputs[0].try_extract_tensor::<f32>().map_err(|e| {
            ClassifierError::InferenceError(format!("Failed to extract output tensor: {}", e))
        })?;
        Ok(output_tensor.iter().copied().collect())
    }
}

impl ScoreModel for OnnxModel {
    fn scores(&self, sequence: &EncodedSequence) -> Result<Vec<f32>, ClassifierError> {
        let ids = sequence.ids().iter();
        match self.input_type {
            ModelInputType::Float32 => self.run(ids.map(|&id| id as f32).collect()),
            ModelInputType::Int64 => self.run(ids.map(|&id| i64::from(id)).collect()),
        }
    }
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<OnnxModel>();
    }
};
