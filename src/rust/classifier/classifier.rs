use std::fmt;
use std::sync::Arc;

use log::debug;

use super::encoder::{EncodedSequence, Encoder};
use super::error::ClassifierError;
use super::labels::{ClassificationResult, LabelSet};
use super::model::ScoreModel;

/// The inference pipeline: encode, run the model, resolve the label.
///
/// # Thread Safety
///
/// The encoder and label set are immutable after build and the model sits
/// behind `Arc<dyn ScoreModel>` (which is `Send + Sync`), so one classifier
/// can serve concurrent requests through an `Arc`:
/// ```rust,no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use emotion_classifier::Classifier;
/// use std::sync::Arc;
/// use std::thread;
///
/// let classifier = Arc::new(Classifier::builder()
///     .with_vocabulary_file("public/tokenizer_health.json")?
///     .with_onnx_model("public/model.onnx")?
///     .build()?);
///
/// let classifier_clone = Arc::clone(&classifier);
/// thread::spawn(move || {
///     classifier_clone.predict("i feel fine today").unwrap();
/// });
/// # Ok(())
/// # }
/// ```
pub struct Classifier {
    pub(crate) encoder: Encoder,
    pub(crate) model: Arc<dyn ScoreModel>,
    pub(crate) labels: LabelSet,
    pub(crate) vocabulary_size: usize,
    pub(crate) vocabulary_path: Option<String>,
    pub(crate) model_path: Option<String>,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<Classifier>();
    }
};

impl fmt::Debug for Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Classifier")
            .field("labels", &self.labels)
            .field("sequence_length", &self.encoder.sequence_length())
            .field("normalization", &self.encoder.normalization())
            .field("vocabulary_size", &self.vocabulary_size)
            .field("model_path", &self.model_path)
            .finish()
    }
}

impl Classifier {
    /// Creates a new ClassifierBuilder for fluent construction
    pub fn builder() -> super::builder::ClassifierBuilder {
        super::builder::ClassifierBuilder::new()
    }

    /// Returns information about the classifier's current state
    pub fn info(&self) -> super::ClassifierInfo {
        super::ClassifierInfo {
            model_path: self.model_path.clone(),
            vocabulary_path: self.vocabulary_path.clone(),
            vocabulary_size: self.vocabulary_size,
            sequence_length: self.encoder.sequence_length(),
            normalization: self.encoder.normalization(),
            labels: self.labels.iter().map(str::to_string).collect(),
        }
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    pub fn encode(&self, text: &str) -> Result<EncodedSequence, ClassifierError> {
        self.encoder.encode(text)
    }

    /// Runs the model on an already encoded sequence and resolves the label.
    ///
    /// Any model failure comes back as `InferenceError`.
    pub fn classify(&self, sequence: &EncodedSequence) -> Result<ClassificationResult, ClassifierError> {
        let scores = self.model.scores(sequence).map_err(|e| match e {
            ClassifierError::InferenceError(_) => e,
            other => ClassifierError::InferenceError(other.to_string()),
        })?;
        self.labels.resolve(&scores)
    }

    /// Predicts the emotional-state label of `text`.
    ///
    /// Blank text is valid input: it encodes to an all-padding sequence and
    /// still gets a prediction.
    ///
    /// # Example
    /// ```rust,no_run
    /// # use emotion_classifier::Classifier;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// # let classifier = Classifier::builder()
    /// #     .with_vocabulary_file("public/tokenizer_health.json")?
    /// #     .with_onnx_model("public/model.onnx")?
    /// #     .build()?;
    /// let result = classifier.predict("I feel fine today")?;
    /// println!("Predicted label: {}", result.label());
    /// for (label, score) in result.scores() {
    ///     println!("{}: {:.2}", label, score);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn predict(&self, text: &str) -> Result<ClassificationResult, ClassifierError> {
        let sequence = self.encode(text)?;
        if sequence.is_blank() {
            debug!("No tokens in input, classifying an all-zero sequence");
        } else {
            debug!("Encoded {} tokens into {} ids", sequence.token_count(), sequence.len());
        }
        self.classify(&sequence)
    }
}
