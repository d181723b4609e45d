//! Layered configuration loading.
//!
//! Sources, lowest precedence first:
//! 1. An optional `warden.{toml,yaml,json}` in the working directory, or the
//!    explicitly given file (which must then exist)
//! 2. `WARDEN_*` environment variables, e.g. `WARDEN_API_BASE_URL`

use std::path::Path;

use config::{Config, Environment, File};
use tracing::debug;
use warden_application::{ClientConfig, ConfigError};

const ENV_PREFIX: &str = "WARDEN";
const DEFAULT_FILE_STEM: &str = "warden";

/// Loads and validates the client configuration.
///
/// # Errors
///
/// Returns [`ConfigError::Load`] when a source cannot be read or does not
/// deserialize, and [`ConfigError::Invalid`] when validation fails.
pub fn load_config(path: Option<&Path>) -> Result<ClientConfig, ConfigError> {
    let file = path.map_or_else(
        || File::with_name(DEFAULT_FILE_STEM).required(false),
        |path| File::from(path).required(true),
    );

    let config: ClientConfig = Config::builder()
        .add_source(file)
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("public_paths"),
        )
        .build()
        .and_then(Config::try_deserialize)
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    config.validate()?;
    debug!(api_base_url = %config.api_base_url, "configuration loaded");
    Ok(config)
}
