use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use log::{error, info};
use tokio::sync::OnceCell;

use crate::classifier::{Classifier, ClassifierError, ModelInputType, TextNormalization};
use crate::config::ServerConfig;
use crate::runtime::RuntimeConfig;

/// Produces a ready [`Classifier`]. Called from a blocking thread.
pub trait ResourceLoader: Send + Sync {
    fn load(&self) -> Result<Classifier, ClassifierError>;
}

/// Loads the vocabulary artifact and the ONNX model from disk.
#[derive(Debug, Clone)]
pub struct ArtifactLoader {
    vocabulary_path: PathBuf,
    model_path: PathBuf,
    sequence_length: usize,
    normalization: TextNormalization,
    input_type: ModelInputType,
    runtime: RuntimeConfig,
}

impl ArtifactLoader {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            vocabulary_path: config.vocabulary_path.clone(),
            model_path: config.model_path.clone(),
            sequence_length: config.sequence_length,
            normalization: config.normalization,
            input_type: config.input_type,
            runtime: config.runtime.clone(),
        }
    }
}

impl ResourceLoader for ArtifactLoader {
    fn load(&self) -> Result<Classifier, ClassifierError> {
        info!("Loading vocabulary from {:?}", self.vocabulary_path);
        info!("Loading model from {:?}", self.model_path);
        Classifier::builder()
            .with_runtime_config(self.runtime.clone())
            .with_input_type(self.input_type)
            .with_sequence_length(self.sequence_length)
            .with_normalization(self.normalization)
            .with_vocabulary_file(&self.vocabulary_path)?
            .with_onnx_model(&self.model_path)?
            .build()
    }
}

/// Process-wide, lazily loaded classifier.
///
/// The first caller runs the loader on the blocking pool; concurrent callers
/// wait on that same load. A failed load caches nothing, so the error goes
/// back to every waiting caller and the next call tries again.
pub struct ResourceProvider {
    loader: Arc<dyn ResourceLoader>,
    classifier: OnceCell<Arc<Classifier>>,
}

impl fmt::Debug for ResourceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceProvider")
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl ResourceProvider {
    pub fn new(loader: impl ResourceLoader + 'static) -> Self {
        Self {
            loader: Arc::new(loader),
            classifier: OnceCell::new(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.classifier.initialized()
    }

    /// Returns the shared classifier, loading it first if needed.
    pub async fn get(&self) -> Result<Arc<Classifier>, ClassifierError> {
        let classifier = self
            .classifier
            .get_or_try_init(|| async {
                let loader = Arc::clone(&self.loader);
                let start = Instant::now();
                let classifier = tokio::task::spawn_blocking(move || loader.load())
                    .await
                    .map_err(|e| {
                        ClassifierError::BuildError(format!("Resource loading task failed: {}", e))
                    })?
                    .map_err(|e| {
                        error!("Failed to load classifier resources: {}", e);
                        e
                    })?;
                info!("Classifier resources loaded in {:.2?}", start.elapsed());
                Ok::<_, ClassifierError>(Arc::new(classifier))
            })
            .await?;
        Ok(Arc::clone(classifier))
    }
}
