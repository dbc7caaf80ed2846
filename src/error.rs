use std::path::PathBuf;
use thiserror::Error;

/// The main error type for mtdata operations.
#[derive(Debug, Error)]
pub enum MtdataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A malformed language-pair or dataset-id string.
    #[error("{message}")]
    Format {
        input: String,
        message: String,
        #[source]
        source: Option<Box<MtdataError>>,
    },

    /// Several invalid ids (bad shape or unknown language), collected from one argument list.
    #[error("{} invalid dataset id(s):{}", .0.len(), render_list(.0))]
    FormatErrors(Vec<MtdataError>),

    #[error("Unknown language code '{code}'")]
    UnknownLanguage { code: String },

    #[error("Invalid dataset id field {field}='{value}': {message}")]
    InvalidIdField {
        field: &'static str,
        value: String,
        message: String,
    },

    #[error("{0}")]
    Usage(String),

    #[error("Dataset '{did}' not found in the catalog")]
    NotFound { did: String },

    #[error("Failed to retrieve '{url}' for {did}: {message}")]
    Retrieval {
        did: String,
        url: String,
        message: String,
    },

    #[error("Failed to prepare {did}: {message}")]
    Prepare { did: String, message: String },

    #[error("Failed to parse catalog source {path}: {message}")]
    CatalogParse { path: PathBuf, message: String },

    #[error("Invalid catalog entry '{did}': {message}")]
    CatalogInvalid { did: String, message: String },

    #[error("Failed to write index {path}: {source}")]
    IndexWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl MtdataError {
    pub(crate) fn format(input: &str, message: impl Into<String>) -> Self {
        MtdataError::Format {
            input: input.to_string(),
            message: message.into(),
            source: None,
        }
    }
}

fn render_list(errors: &[MtdataError]) -> String {
    errors.iter().map(|e| format!("\n  - {e}")).collect()
}
