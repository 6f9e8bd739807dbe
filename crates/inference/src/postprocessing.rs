use std::str::FromStr;
use thiserror::Error;

/// Entries may stray this far outside [0, 1] and still count as probabilities.
pub const DISTRIBUTION_RANGE_TOLERANCE: f32 = 0.001;
/// Allowed distance of the entry sum from 1.0 for a probability vector.
pub const DISTRIBUTION_SUM_TOLERANCE: f32 = 0.05;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PostprocessError {
    #[error("model produced an empty output vector")]
    EmptyOutput,

    #[error("model output contains a non-finite value at index {index}")]
    NonFiniteOutput { index: usize },
}

/// What the model's output vector is declared to contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputKind {
    /// Decide per output with [`looks_like_distribution`].
    #[default]
    Auto,
    /// Already softmaxed; used as-is.
    Probabilities,
    /// Raw scores; always softmaxed.
    Logits,
}

impl FromStr for OutputKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "probabilities" | "probs" | "softmax" => Ok(Self::Probabilities),
            "logits" | "scores" => Ok(Self::Logits),
            other => Err(format!(
                "{} is not a supported output kind. Use `auto`, `probabilities` or `logits`.",
                other
            )),
        }
    }
}

/// Heuristic: every entry within `[-0.001, 1.001]` and the sum within 0.05 of 1.
///
/// A logit vector can pass this by accident (e.g. `[0.2, 0.3, 0.5]`); set
/// [`OutputKind`] explicitly for models where that matters.
pub fn looks_like_distribution(values: &[f32]) -> bool {
    if values.is_empty() {
        return false;
    }

    let lo = -DISTRIBUTION_RANGE_TOLERANCE;
    let hi = 1.0 + DISTRIBUTION_RANGE_TOLERANCE;
    if !values.iter().all(|&v| (lo..=hi).contains(&v)) {
        return false;
    }

    let sum: f32 = values.iter().sum();
    (sum - 1.0).abs() <= DISTRIBUTION_SUM_TOLERANCE
}

/// Numerically stable softmax: the maximum is subtracted before exponentiating.
pub fn softmax(values: &[f32]) -> Vec<f32> {
    if values.is_empty() {
        return Vec::new();
    }

    let max_val = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = values.iter().map(|v| (v - max_val).exp()).collect();
    let sum: f32 = exps.iter().sum();

    exps.into_iter().map(|e| e / sum).collect()
}

/// Index and value of the maximum; ties resolve to the lowest index.
pub fn argmax(values: &[f32]) -> Option<(usize, f32)> {
    let (&first, rest) = values.split_first()?;

    let mut best = (0, first);
    for (i, &v) in rest.iter().enumerate() {
        if v > best.1 {
            best = (i + 1, v);
        }
    }

    Some(best)
}

/// Winning class of a single output vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Top1 {
    pub index: usize,
    pub confidence: f32,
    /// Whether softmax was applied to the raw output
    pub normalized: bool,
    pub probabilities: Vec<f32>,
}

#[derive(Debug, Clone, Default)]
pub struct PostProcessor {
    pub output_kind: OutputKind,
}

impl PostProcessor {
    pub fn new(output_kind: OutputKind) -> Self {
        Self { output_kind }
    }

    /// Turn a raw model output into a probability distribution and pick the top class.
    #[tracing::instrument(level = "debug", skip(self, raw), fields(classes = raw.len()))]
    pub fn decode(&self, raw: &[f32]) -> Result<Top1, PostprocessError> {
        if raw.is_empty() {
            return Err(PostprocessError::EmptyOutput);
        }
        if let Some(index) = raw.iter().position(|v| !v.is_finite()) {
            return Err(PostprocessError::NonFiniteOutput { index });
        }

        let needs_softmax = match self.output_kind {
            OutputKind::Auto => !looks_like_distribution(raw),
            OutputKind::Probabilities => false,
            OutputKind::Logits => true,
        };

        let probabilities = if needs_softmax {
            softmax(raw)
        } else {
            raw.to_vec()
        };

        let (index, confidence) = argmax(&probabilities).ok_or(PostprocessError::EmptyOutput)?;

        tracing::debug!(index, confidence, normalized = needs_softmax, "Top-1 class");

        Ok(Top1 {
            index,
            confidence: confidence.clamp(0.0, 1.0),
            normalized: needs_softmax,
            probabilities,
        })
    }
}
