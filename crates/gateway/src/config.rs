use common::{Environment, env_or, parse_env_or};
use inference::InferenceConfig;
use std::env;

const DEFAULT_BODY_LIMIT_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub environment: Environment,
    pub addr: String,
    pub body_limit_bytes: usize,
    /// Load the model before accepting traffic instead of on the first request
    pub eager_load: bool,
    pub otel_endpoint: Option<String>,
    pub inference: InferenceConfig,
}

impl GatewayConfig {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> anyhow::Result<Self> {
        let environment = Environment::from_env();

        let addr = env_or("GATEWAY_ADDR", "0.0.0.0:8080");

        let body_limit_bytes = parse_env_or("GATEWAY_BODY_LIMIT_BYTES", DEFAULT_BODY_LIMIT_BYTES)?;

        let eager_load = parse_env_or("GATEWAY_EAGER_LOAD", true)?;

        let otel_endpoint = env::var("OTEL_ENDPOINT").ok().filter(|s| !s.is_empty());

        let inference = InferenceConfig::from_env()?;

        Ok(Self {
            environment,
            addr,
            body_limit_bytes,
            eager_load,
            otel_endpoint,
            inference,
        })
    }
}
