use super::{InferenceBackend, ModelInfo};
use ndarray::{Array, IxDyn};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Backend returning a fixed output, recording how it was called.
pub struct MockBackend {
    output: Vec<f32>,
    failure: Option<String>,
    calls: Arc<AtomicUsize>,
    last_input_shape: Arc<Mutex<Option<Vec<usize>>>>,
}

impl MockBackend {
    pub fn new(output: Vec<f32>) -> Self {
        Self {
            output,
            failure: None,
            calls: Arc::new(AtomicUsize::new(0)),
            last_input_shape: Arc::new(Mutex::new(None)),
        }
    }

    /// A backend whose every run fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::new(Vec::new())
        }
    }

    /// Shared handle on the call count, still readable after the backend
    /// has been moved into a classifier.
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    pub fn input_shape_probe(&self) -> Arc<Mutex<Option<Vec<usize>>>> {
        Arc::clone(&self.last_input_shape)
    }
}

impl InferenceBackend for MockBackend {
    fn infer(&self, input: &Array<f32, IxDyn>) -> anyhow::Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut shape) = self.last_input_shape.lock() {
            *shape = Some(input.shape().to_vec());
        }

        match &self.failure {
            Some(message) => anyhow::bail!("{}", message),
            None => Ok(self.output.clone()),
        }
    }

    fn info(&self) -> ModelInfo {
        ModelInfo {
            name: "mock".to_string(),
            backend: "mock".to_string(),
            input_shape: Vec::new(),
        }
    }
}
