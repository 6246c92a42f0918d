use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{AppError, AppResult, ConfigError};

use super::types::SuiteFile;

/// Tried in order when no suite path is given.
pub const DEFAULT_SUITE_FILES: [&str; 2] = ["apiload.toml", "apiload.json"];

/// Loads the suite at `path`, or the first default file that exists.
///
/// # Errors
///
/// Returns an error when no suite is found or it cannot be read or parsed.
pub fn load_suite(path: Option<&str>) -> AppResult<SuiteFile> {
    if let Some(path) = path {
        return load_suite_file(&PathBuf::from(path));
    }
    let found = DEFAULT_SUITE_FILES
        .iter()
        .map(PathBuf::from)
        .find(|candidate| candidate.exists())
        .ok_or_else(|| AppError::config(ConfigError::SuiteNotFound))?;
    load_suite_file(&found)
}

/// # Errors
///
/// Returns an error when the file cannot be read, has an unsupported
/// extension, or does not parse.
pub fn load_suite_file(path: &Path) -> AppResult<SuiteFile> {
    debug!("Loading suite {}", path.display());
    let content = std::fs::read_to_string(path).map_err(|err| {
        AppError::config(ConfigError::ReadConfig {
            path: path.to_path_buf(),
            source: err,
        })
    })?;
    let mut suite: SuiteFile = match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(&content).map_err(|err| {
            AppError::config(ConfigError::ParseToml {
                path: path.to_path_buf(),
                source: err,
            })
        }),
        Some("json") => serde_json::from_str(&content).map_err(|err| {
            AppError::config(ConfigError::ParseJson {
                path: path.to_path_buf(),
                source: err,
            })
        }),
        Some(ext) => Err(AppError::config(ConfigError::UnsupportedExtension {
            ext: ext.to_owned(),
        })),
        None => Err(AppError::config(ConfigError::MissingExtension)),
    }?;
    if suite.name.is_none() {
        suite.name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map(str::to_owned);
    }
    Ok(suite)
}
