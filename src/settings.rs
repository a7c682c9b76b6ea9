// config lets you read a separate config file
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

use crate::error::Result;
use crate::valueobject::DecodePolicy;

/// Runtime settings for casting.
///
/// Read from an optional file and from `VALUECAST_*` environment variables,
/// e.g. `VALUECAST_DECODE_POLICY=reject`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub decode_policy: DecodePolicy,
}

impl Settings {
    pub fn load(path: &str) -> Result<Settings> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("VALUECAST"))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
    pub fn from_toml(text: &str) -> Result<Settings> {
        let settings = Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}
