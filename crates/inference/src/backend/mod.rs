use ndarray::{Array, IxDyn};
use serde::{Deserialize, Serialize};

#[cfg(feature = "ort-backend")]
pub mod ort;

#[cfg(any(test, feature = "testing"))]
pub mod mock;

/// Metadata describing a loaded model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Human-readable name of the model.
    pub name: String,
    /// Backend used for inference (e.g. "ort", "mock").
    pub backend: String,
    /// Input shape the model is fed (e.g. `[1, 224, 224, 3]`).
    pub input_shape: Vec<usize>,
}

/// Opaque inference engine: one input tensor in, one flat score vector out.
///
/// Implementations are shared across request threads once loaded.
pub trait InferenceBackend: Send + Sync {
    /// Run inference on a batch-of-one input tensor.
    ///
    /// Returns the first model output flattened in row-major order; for a
    /// classifier that is one score per class.
    fn infer(&self, input: &Array<f32, IxDyn>) -> anyhow::Result<Vec<f32>>;

    /// Return metadata about the loaded model.
    fn info(&self) -> ModelInfo;
}
