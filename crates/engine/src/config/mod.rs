mod loader;
mod validation;

pub use loader::{config_dir_from_env, load_config, ConfigError, EngineConfig};
pub use validation::validate;
