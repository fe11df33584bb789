use std::path::PathBuf;

use thiserror::Error;

use crate::data::CodecError;

#[derive(Debug, Error)]
pub enum DiagnoseError {
    #[error("{0}")]
    Config(String),

    #[error("Failed to read file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse event at file {path:?}: {source}")]
    Codec {
        path: PathBuf,
        #[source]
        source: CodecError,
    },
}

impl DiagnoseError {
    pub fn config(message: impl Into<String>) -> Self {
        DiagnoseError::Config(message.into())
    }
}

pub type Result<T> = std::result::Result<T, DiagnoseError>;
