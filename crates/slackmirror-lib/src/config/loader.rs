use super::Config;
use crate::error::MirrorError;
use config::{Config as ConfigBuilder, Environment, File};

pub const ENV_PREFIX: &str = "SLACKMIRROR";

/// Loads defaults, then the optional config file, then `SLACKMIRROR_*`
/// environment overrides (`SLACKMIRROR_DOWNLOAD__RATE_LIMIT_KBPS=200`).
pub fn load_config(config_path: Option<&str>) -> Result<Config, MirrorError> {
    let mut builder = ConfigBuilder::builder();
    if let Some(config_path) = config_path {
        builder = builder.add_source(File::with_name(config_path));
    }
    let config_builder = builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    config_builder.try_deserialize().map_err(Into::into)
}
