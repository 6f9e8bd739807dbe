use super::{InferenceBackend, ModelInfo};
use crate::config::ExecutionProvider;
use anyhow::Context;
use ndarray::{Array, IxDyn};
use ort::{
    session::{Session, builder::GraphOptimizationLevel},
    value::TensorRef,
};
use std::path::Path;
use std::sync::Mutex;

/// ONNX Runtime backend.
///
/// `Session::run` needs exclusive access, so concurrent requests take turns
/// on the session while preprocessing and postprocessing stay parallel.
pub struct OrtBackend {
    session: Mutex<Session>,
    info: ModelInfo,
}

impl OrtBackend {
    /// Load model with specified execution provider
    pub fn load_model_with_provider(
        path: &str,
        provider: ExecutionProvider,
        input_shape: &[usize],
    ) -> anyhow::Result<Self> {
        // Initialize ORT environment (idempotent)
        let _ = ort::init().commit();

        let mut builder = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?;

        match provider {
            ExecutionProvider::Cuda => {
                tracing::info!("Initializing ONNX Runtime with CUDA execution provider");
                builder = builder.with_execution_providers([
                    ort::execution_providers::CUDAExecutionProvider::default()
                        .with_device_id(0)
                        .build()
                        .error_on_failure(),
                ])?;
            }
            ExecutionProvider::Cpu => {
                tracing::info!("Initializing ONNX Runtime with CPU execution provider");
            }
        }

        let session = builder
            .commit_from_file(path)
            .with_context(|| format!("failed to load ONNX model from {}", path))?;

        let name = Path::new(path)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string());

        tracing::info!(model = %name, "Model loaded from {}", path);

        Ok(Self {
            session: Mutex::new(session),
            info: ModelInfo {
                name,
                backend: "ort".to_string(),
                input_shape: input_shape.to_vec(),
            },
        })
    }
}

impl InferenceBackend for OrtBackend {
    fn infer(&self, input: &Array<f32, IxDyn>) -> anyhow::Result<Vec<f32>> {
        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("ONNX Runtime session lock poisoned"))?;

        let outputs = session.run(ort::inputs![TensorRef::from_array_view(input.view())?])?;
        let scores = outputs[0].try_extract_array::<f32>()?;

        tracing::trace!(output_shape = ?scores.shape(), "Model output");

        Ok(scores.iter().copied().collect())
    }

    fn info(&self) -> ModelInfo {
        self.info.clone()
    }
}
