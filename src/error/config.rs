use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read suite '{path}': {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML suite '{path}': {source}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to parse JSON suite '{path}': {source}")]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Unsupported suite extension '{ext}'. Use .toml or .json.")]
    UnsupportedExtension { ext: String },
    #[error("Suite file must have .toml or .json extension.")]
    MissingExtension,
    #[error("No suite file given and neither apiload.toml nor apiload.json exists.")]
    SuiteNotFound,
    #[error("Suite has no requests.")]
    NoRequests,
    #[error("Suite has no request named '{name}'.")]
    UnknownRequest { name: String },
    #[error("Load mode '{mode}' needs '{field}' (set it in the suite or on the command line).")]
    MissingLoadField {
        mode: &'static str,
        field: &'static str,
    },
}
