pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod routes;
pub mod state;

pub use config::GatewayConfig;
pub use error::ApiError;
pub use routes::{router, serve};
pub use state::{AppState, ClassifierCell};
