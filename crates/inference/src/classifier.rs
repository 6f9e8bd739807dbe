use crate::backend::{InferenceBackend, ModelInfo};
use crate::labels::LabelSet;
use crate::postprocessing::{PostProcessor, PostprocessError};
use common::span;
use preprocess::{Preprocess, PreprocessError, PreprocessResult};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error(transparent)]
    Preprocess(#[from] PreprocessError),

    #[error("inference failed: {0:#}")]
    Inference(anyhow::Error),

    #[error(transparent)]
    Postprocess(#[from] PostprocessError),
}

/// Response body of a successful classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub label: String,
    pub confidence: f32,
    pub index: usize,
}

/// Immutable image → label pipeline shared by every request.
pub struct Classifier {
    preprocessor: Box<dyn Preprocess>,
    backend: Box<dyn InferenceBackend>,
    postprocessor: PostProcessor,
    labels: LabelSet,
}

impl Classifier {
    pub fn new(
        preprocessor: impl Preprocess + 'static,
        backend: impl InferenceBackend + 'static,
        postprocessor: PostProcessor,
        labels: LabelSet,
    ) -> Self {
        Self {
            preprocessor: Box::new(preprocessor),
            backend: Box::new(backend),
            postprocessor,
            labels,
        }
    }

    /// Load the ONNX model and label file named by `config`.
    #[cfg(feature = "ort-backend")]
    pub fn load(config: &crate::InferenceConfig) -> anyhow::Result<Self> {
        use crate::backend::ort::OrtBackend;
        use anyhow::Context;
        use preprocess::CpuPreProcessor;

        let labels = LabelSet::from_file(&config.labels_path)?;
        let preprocessor = CpuPreProcessor::new(config.preprocess.clone())
            .context("invalid preprocessing configuration")?;
        let backend = OrtBackend::load_model_with_provider(
            &config.model_path,
            config.execution_provider,
            &config.input_shape(),
        )?;

        Ok(Self::new(
            preprocessor,
            backend,
            PostProcessor::new(config.output_kind),
            labels,
        ))
    }

    /// Run one image through decode, encode, inference and top-1 selection.
    ///
    /// Every stage error is returned unmodified; nothing is retried.
    pub fn classify(&self, bytes: &[u8]) -> Result<ClassificationResult, ClassifyError> {
        let _s = span!("classify");

        let PreprocessResult {
            tensor,
            orig_width,
            orig_height,
        } = self.preprocessor.preprocess(bytes)?;

        tracing::trace!(
            orig_width,
            orig_height,
            input_shape = ?tensor.shape(),
            "Image preprocessed"
        );

        let raw = {
            let _infer_span = span!("model_inference");
            self.backend.infer(&tensor).map_err(ClassifyError::Inference)?
        };

        if raw.len() != self.labels.len() {
            tracing::debug!(
                outputs = raw.len(),
                labels = self.labels.len(),
                "Model output length differs from label count"
            );
        }

        let top = self.postprocessor.decode(&raw)?;

        Ok(ClassificationResult {
            label: self.labels.resolve(top.index).into_owned(),
            confidence: top.confidence,
            index: top.index,
        })
    }

    pub fn info(&self) -> ModelInfo {
        self.backend.info()
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }
}
