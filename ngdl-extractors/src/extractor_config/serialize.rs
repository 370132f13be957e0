use ngdl_common::{
    log::debug,
    serde::{self, Deserialize},
};
use std::fs::{read_to_string, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::ExtractorOptions;
use crate::error::ExtractorError;

pub const SAMPLE_CONFIG_TOML: &str = include_str!("sample.toml");

#[derive(Debug, Default, Deserialize)]
#[serde(crate = "self::serde")]
struct Config {
    #[serde(default)]
    newgrounds: ExtractorOptions,
}

/// Parses the `[newgrounds]` table of a config file.
pub fn options_from_str(contents: &str) -> Result<ExtractorOptions, ExtractorError> {
    let config: Config = toml::from_str(contents)?;
    debug!("Extractor options: {:?}", config.newgrounds);
    Ok(config.newgrounds)
}

/// Reads the options file at `path`, writing the sample config there first if it does not exist.
pub fn read_options_file(path: &Path) -> Result<ExtractorOptions, ExtractorError> {
    if !path.exists() {
        let mut sample_toml = File::create(path)?;
        sample_toml.write_all(SAMPLE_CONFIG_TOML.as_bytes())?;
        debug!("Wrote sample config to {}", path.display());
    }

    let contents = read_to_string(path)?;
    options_from_str(&contents)
}

/// Default location of the options file, `config.toml` inside [`config_dir`](ngdl_common::config_dir).
pub fn default_options_path() -> Result<PathBuf, ExtractorError> {
    Ok(ngdl_common::config_dir()?.join("config.toml"))
}
