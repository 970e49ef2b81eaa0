pub mod api;
pub mod cli;
pub mod config;

pub use api::{ApiError, Client, ResultExt, RetryConfig};
pub use config::{ClientConfig, ConfigOverrides};
