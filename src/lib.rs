pub mod config;
pub mod handlers;
pub mod lifecycle;
pub mod models;
pub mod observability;
pub mod services;

pub use config::{Config, ConfigError};
pub use handlers::{create_app, AppState};
pub use lifecycle::{LifecycleController, LifecycleState, RunningServer};
pub use observability::{init_observability, shutdown_observability, Metrics, OperationTracer};
