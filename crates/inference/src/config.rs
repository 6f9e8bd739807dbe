use crate::postprocessing::OutputKind;
use common::{env_or, parse_env_or};
use preprocess::{
    NormalizationSpec, PreprocessConfig, ResizeMode, TensorLayout,
    config::{IMAGENET_MEAN, IMAGENET_STD, SYMMETRIC_OFFSET, SYMMETRIC_SCALE},
};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionProvider {
    Cpu,
    Cuda,
}

impl FromStr for ExecutionProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cpu" => Ok(Self::Cpu),
            "cuda" | "gpu" => Ok(Self::Cuda),
            other => Err(format!(
                "{} is not a supported execution provider. Use either `cpu` or `cuda`.",
                other
            )),
        }
    }
}

/// Known model input conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelPreset {
    /// Channel-last, `(v - 127) / 128`
    Mobilenet,
    /// Channel-first, ImageNet mean/std
    Imagenet,
}

impl ModelPreset {
    pub fn preprocess_config(&self) -> PreprocessConfig {
        match self {
            ModelPreset::Mobilenet => PreprocessConfig::mobilenet(),
            ModelPreset::Imagenet => PreprocessConfig::imagenet(),
        }
    }
}

impl FromStr for ModelPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mobilenet" | "tensorflow" => Ok(Self::Mobilenet),
            "imagenet" | "resnet" | "torchvision" => Ok(Self::Imagenet),
            other => Err(format!(
                "{} is not a supported model preset. Use either `mobilenet` or `imagenet`.",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub model_path: String,
    pub labels_path: String,
    pub preprocess: PreprocessConfig,
    pub output_kind: OutputKind,
    pub execution_provider: ExecutionProvider,
}

impl InferenceConfig {
    /// Load configuration from environment variables with sensible defaults
    ///
    /// `MODEL_PRESET` picks the layout and normalization; `TENSOR_LAYOUT`,
    /// `NORMALIZATION` and the `NORM_*` parameters override single parts of it.
    pub fn from_env() -> anyhow::Result<Self> {
        let model_path = env_or("MODEL_PATH", "models/model.onnx");
        let labels_path = env_or("LABELS_PATH", "models/labels.txt");

        let preset: ModelPreset = parse_env_or("MODEL_PRESET", ModelPreset::Mobilenet)?;
        let defaults = preset.preprocess_config();

        let input_width = parse_env_or("INPUT_WIDTH", defaults.input_size.0)?;
        let input_height = parse_env_or("INPUT_HEIGHT", defaults.input_size.1)?;
        let layout: TensorLayout = parse_env_or("TENSOR_LAYOUT", defaults.layout)?;
        let resize_mode: ResizeMode = parse_env_or("RESIZE_MODE", defaults.resize_mode)?;
        let normalization = normalization_from_env(&defaults.normalization)?;

        let preprocess = PreprocessConfig {
            input_size: (input_width, input_height),
            layout,
            normalization,
            resize_mode,
        };
        preprocess.validate()?;

        let output_kind = parse_env_or("OUTPUT_KIND", OutputKind::Auto)?;
        let execution_provider = parse_env_or("EXECUTION_PROVIDER", ExecutionProvider::Cpu)?;

        Ok(Self {
            model_path,
            labels_path,
            preprocess,
            output_kind,
            execution_provider,
        })
    }

    /// Input tensor shape implied by the preprocessing declaration.
    pub fn input_shape(&self) -> Vec<usize> {
        let (width, height) = self.preprocess.input_size;
        self.preprocess
            .layout
            .shape(height as usize, width as usize)
            .to_vec()
    }
}

fn normalization_from_env(preset: &NormalizationSpec) -> anyhow::Result<NormalizationSpec> {
    let preset_kind = match preset {
        NormalizationSpec::Symmetric { .. } => "symmetric",
        NormalizationSpec::Standardize { .. } => "standardize",
        NormalizationSpec::UnitScale => "unit",
    };

    match env_or("NORMALIZATION", preset_kind).to_lowercase().as_str() {
        "symmetric" => Ok(NormalizationSpec::Symmetric {
            offset: parse_env_or("NORM_OFFSET", SYMMETRIC_OFFSET)?,
            scale: parse_env_or("NORM_SCALE", SYMMETRIC_SCALE)?,
        }),
        "standardize" | "imagenet" => Ok(NormalizationSpec::Standardize {
            mean: triple_from_env("NORM_MEAN", IMAGENET_MEAN)?,
            std: triple_from_env("NORM_STD", IMAGENET_STD)?,
        }),
        "unit" | "unit-scale" => Ok(NormalizationSpec::UnitScale),
        other => anyhow::bail!(
            "{} is not a supported normalization. Use `symmetric`, `standardize` or `unit`.",
            other
        ),
    }
}

fn triple_from_env(key: &str, default: [f32; 3]) -> anyhow::Result<[f32; 3]> {
    match std::env::var(key) {
        Ok(raw) => parse_triple(&raw).map_err(|e| anyhow::anyhow!("invalid {}: {}", key, e)),
        Err(_) => Ok(default),
    }
}

/// Parse `"0.485, 0.456, 0.406"` into one value per RGB channel.
pub fn parse_triple(raw: &str) -> Result<[f32; 3], String> {
    let values = raw
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f32>()
                .map_err(|e| format!("{:?}: {}", part.trim(), e))
        })
        .collect::<Result<Vec<_>, _>>()?;

    <[f32; 3]>::try_from(values.as_slice())
        .map_err(|_| format!("expected 3 comma-separated values, got {}", values.len()))
}
