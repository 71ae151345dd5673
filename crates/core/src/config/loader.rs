use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::{Path, PathBuf};

use super::{types::Config, ConfigError};

/// Prefix of environment variable overrides. Nested keys are separated by
/// `__`, e.g. `AUDIOCONVERT_BATCH__POOL_SIZE=4`.
pub const ENV_PREFIX: &str = "AUDIOCONVERT_";

/// Names a configuration file when no path is passed explicitly.
pub const CONFIG_PATH_ENV: &str = "AUDIOCONVERT_CONFIG";

/// Load configuration: built-in defaults, then the TOML file (if any), then
/// environment variable overrides.
///
/// With `path` unset, `AUDIOCONVERT_CONFIG` is consulted; without either,
/// only defaults and the environment apply.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));
    load_layered(path.as_deref(), ENV_PREFIX)
}

fn load_layered(path: Option<&Path>, env_prefix: &str) -> Result<Config, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));

    if let Some(path) = path {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        figment = figment.merge(Toml::file(path));
    }

    figment
        .merge(Env::prefixed(env_prefix).ignore(&["config"]).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}
