use std::fmt;
use std::path::Path;
use std::sync::Arc;

use log::info;

use super::classifier::Classifier;
use super::encoder::{Encoder, TextNormalization, DEFAULT_SEQUENCE_LENGTH};
use super::error::ClassifierError;
use super::labels::LabelSet;
use super::model::{ModelInputType, OnnxModel, ScoreModel};
use super::vocabulary::VocabularyIndex;
use crate::runtime::RuntimeConfig;

/// A builder for constructing a Classifier with a fluent interface.
pub struct ClassifierBuilder {
    vocabulary: Option<VocabularyIndex>,
    vocabulary_path: Option<String>,
    model: Option<Arc<dyn ScoreModel>>,
    model_path: Option<String>,
    labels: LabelSet,
    sequence_length: usize,
    normalization: TextNormalization,
    input_type: ModelInputType,
    runtime_config: RuntimeConfig,
}

impl Default for ClassifierBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ClassifierBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassifierBuilder")
            .field("vocabulary_path", &self.vocabulary_path)
            .field("has_vocabulary", &self.vocabulary.is_some())
            .field("model_path", &self.model_path)
            .field("has_model", &self.model.is_some())
            .field("labels", &self.labels)
            .field("sequence_length", &self.sequence_length)
            .field("normalization", &self.normalization)
            .field("input_type", &self.input_type)
            .field("runtime_config", &self.runtime_config)
            .finish()
    }
}

impl ClassifierBuilder {
    /// Creates a new empty ClassifierBuilder with the emotion labels, a
    /// sequence length of 100 and verbatim text handling.
    pub fn new() -> Self {
        Self {
            vocabulary: None,
            vocabulary_path: None,
            model: None,
            model_path: None,
            labels: LabelSet::emotions(),
            sequence_length: DEFAULT_SEQUENCE_LENGTH,
            normalization: TextNormalization::Verbatim,
            input_type: ModelInputType::default(),
            runtime_config: RuntimeConfig::default(),
        }
    }

    /// Sets the runtime configuration used by [`with_onnx_model`](Self::with_onnx_model).
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Sets the tensor element type used by [`with_onnx_model`](Self::with_onnx_model).
    pub fn with_input_type(mut self, input_type: ModelInputType) -> Self {
        self.input_type = input_type;
        self
    }

    pub fn with_sequence_length(mut self, sequence_length: usize) -> Self {
        self.sequence_length = sequence_length;
        self
    }

    pub fn with_normalization(mut self, normalization: TextNormalization) -> Self {
        self.normalization = normalization;
        self
    }

    /// Replaces the default emotion labels. The order must match the model output.
    pub fn with_labels(mut self, labels: LabelSet) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_vocabulary(mut self, vocabulary: VocabularyIndex) -> Result<Self, ClassifierError> {
        if self.vocabulary.is_some() {
            return Err(ClassifierError::BuildError("Vocabulary already set".to_string()));
        }
        self.vocabulary = Some(vocabulary);
        Ok(self)
    }

    /// Loads the vocabulary artifact at `path`.
    ///
    /// # Errors
    /// - `BuildError` if a vocabulary is already set
    /// - `VocabularyError` if the file is missing or malformed
    pub fn with_vocabulary_file(self, path: impl AsRef<Path>) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        let vocabulary = VocabularyIndex::from_file(path)?;
        let mut builder = self.with_vocabulary(vocabulary)?;
        builder.vocabulary_path = Some(path.to_string_lossy().to_string());
        Ok(builder)
    }

    pub fn with_model(self, model: impl ScoreModel + 'static) -> Result<Self, ClassifierError> {
        self.with_shared_model(Arc::new(model))
    }

    pub fn with_shared_model(mut self, model: Arc<dyn ScoreModel>) -> Result<Self, ClassifierError> {
        if self.model.is_some() {
            return Err(ClassifierError::BuildError("Model already set".to_string()));
        }
        self.model = Some(model);
        Ok(self)
    }

    /// Loads an ONNX model using the configured runtime settings and input type.
    ///
    /// # Errors
    /// - `BuildError` if a model is already set
    /// - `ModelError` if the file is missing or ONNX Runtime rejects it
    pub fn with_onnx_model(self, path: impl AsRef<Path>) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        if self.model.is_some() {
            return Err(ClassifierError::BuildError("Model already set".to_string()));
        }
        let model = OnnxModel::from_file(path, self.input_type, &self.runtime_config)?;
        let mut builder = self.with_model(model)?;
        builder.model_path = Some(path.to_string_lossy().to_string());
        Ok(builder)
    }

    /// Builds and returns the final Classifier instance
    ///
    /// # Errors
    /// - `BuildError` if no vocabulary or no model was set
    /// - `ValidationError` if the sequence length is zero
    pub fn build(self) -> Result<Classifier, ClassifierError> {
        let vocabulary = self
            .vocabulary
            .ok_or_else(|| ClassifierError::BuildError("Vocabulary must be set".to_string()))?;
        let model = self
            .model
            .ok_or_else(|| ClassifierError::BuildError("Model must be set".to_string()))?;

        let encoder = Encoder::new(&vocabulary, self.sequence_length, self.normalization)?;
        info!(
            "Classifier ready: {} vocabulary entries, {} labels, sequence length {}, {} text",
            vocabulary.len(),
            self.labels.len(),
            self.sequence_length,
            self.normalization
        );

        Ok(Classifier {
            encoder,
            model,
            labels: self.labels,
            vocabulary_size: vocabulary.len(),
            vocabulary_path: self.vocabulary_path,
            model_path: self.model_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::EncodedSequence;

    struct ConstantModel;

    impl ScoreModel for ConstantModel {
        fn scores(&self, _: &EncodedSequence) -> Result<Vec<f32>, ClassifierError> {
            Ok(vec![0.0, 0.0, 1.0, 0.0, 0.0])
        }
    }

    fn vocabulary() -> VocabularyIndex {
        vec![("angry", 1)].into_iter().collect()
    }

    #[test]
    fn test_missing_parts() {
        let result = ClassifierBuilder::new().with_model(ConstantModel).unwrap().build();
        assert!(matches!(result, Err(ClassifierError::BuildError(_))));

        let result = ClassifierBuilder::new().with_vocabulary(vocabulary()).unwrap().build();
        assert!(matches!(result, Err(ClassifierError::BuildError(_))));
    }

    #[test]
    fn test_duplicate_parts() {
        let builder = ClassifierBuilder::new().with_vocabulary(vocabulary()).unwrap();
        assert!(builder.with_vocabulary(vocabulary()).is_err());

        let builder = ClassifierBuilder::new().with_model(ConstantModel).unwrap();
        assert!(builder.with_model(ConstantModel).is_err());
    }

    #[test]
    fn test_zero_sequence_length() {
        let result = ClassifierBuilder::new()
            .with_vocabulary(vocabulary())
            .unwrap()
            .with_model(ConstantModel)
            .unwrap()
            .with_sequence_length(0)
            .build();
        assert!(matches!(result, Err(ClassifierError::ValidationError(_))));
    }

    #[test]
    fn test_custom_labels_must_match_model() {
        let classifier = ClassifierBuilder::new()
            .with_vocabulary(vocabulary())
            .unwrap()
            .with_model(ConstantModel)
            .unwrap()
            .with_labels(LabelSet::new(vec!["calm", "upset"]).unwrap())
            .build()
            .unwrap();
        assert!(matches!(
            classifier.predict("angry"),
            Err(ClassifierError::InferenceError(_))
        ));
    }

    #[test]
    fn test_vocabulary_file_errors_propagate() {
        let dir = tempfile::tempdir().unwrap();
        let result = ClassifierBuilder::new().with_vocabulary_file(dir.path().join("nope.json"));
        assert!(matches!(result, Err(ClassifierError::VocabularyError(_))));
    }

    #[test]
    fn test_vocabulary_file_records_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokenizer.json");
        std::fs::write(&path, r#"{"word_index": {"angry": 1}}"#).unwrap();
        let classifier = ClassifierBuilder::new()
            .with_vocabulary_file(&path)
            .unwrap()
            .with_model(ConstantModel)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(classifier.info().vocabulary_path, Some(path.to_string_lossy().to_string()));
        assert_eq!(classifier.predict("angry").unwrap().label(), "anger");
    }
}
