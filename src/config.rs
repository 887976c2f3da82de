//! Configuration file handling.
//!
//! Loaded from an explicit path, or from `qrstamp.toml` in the working directory when present.
//! Every field has a default, so an empty file is valid.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::capacity::{ErrorCorrectionLevel, OverflowPolicy};
use crate::compose::check_canvas_size;
use crate::error::{Error, Result};

pub const DEFAULT_FILE_NAME: &str = "qrstamp.toml";
pub const DEFAULT_PREVIEW_SIZE: u32 = 400;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Side of the preview image in pixels.
    pub preview_size: u32,
    /// Level used when none is given on the command line.
    pub error_correction: ErrorCorrectionLevel,
    pub overflow: OverflowPolicy,
    pub output_dir: PathBuf,
    pub icon: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            preview_size: DEFAULT_PREVIEW_SIZE,
            error_correction: ErrorCorrectionLevel::Medium,
            overflow: OverflowPolicy::Clamp,
            output_dir: PathBuf::from("generated"),
            icon: None,
        }
    }
}

impl Config {
    /// Loads configuration from `path`, or from [`DEFAULT_FILE_NAME`] when `path` is `None`.
    ///
    /// A missing default file yields the defaults. A missing explicit file, or any file that
    /// cannot be parsed, is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_FILE_NAME), false),
        };

        if !explicit && !path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|source| Error::Io {
            path: path.clone(),
            source,
        })?;
        Config::parse(&content).map_err(|message| Error::Config { path, message })
    }

    fn parse(content: &str) -> std::result::Result<Self, String> {
        let config: Config = toml::from_str(content).map_err(|e| e.message().to_owned())?;
        if check_canvas_size(config.preview_size).is_err() {
            return Err(format!(
                "preview_size must be between 1 and 16384, got {}",
                config.preview_size
            ));
        }
        Ok(config)
    }
}
