pub mod app_config;
pub mod config;
pub mod games;
pub mod identity;
pub mod results;

pub use app_config::{AppConfig, ClientConfig, Environment, RelayConfig};
pub use config::{
    load_app_config, load_app_config_from_env, load_client_config, load_relay_config,
};
pub use games::GameId;
pub use results::{retain_valid, sort_by_game_order, CanonicalResult};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
