pub mod backend;
pub mod classifier;
pub mod config;
pub mod labels;
pub mod postprocessing;

// Re-export commonly used types for convenience
pub use backend::{InferenceBackend, ModelInfo};
pub use classifier::{ClassificationResult, Classifier, ClassifyError};
pub use config::{ExecutionProvider, InferenceConfig, ModelPreset};
pub use labels::LabelSet;
pub use postprocessing::{OutputKind, PostProcessor, PostprocessError, Top1};
