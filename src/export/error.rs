//! Export error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::export::xml::XmlError;
use crate::export::{ExportFormat, RenderState};

/// Error while exporting or cleaning one format.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("existing project file {} is not valid XML", path.display())]
    MalformedDocument {
        path: PathBuf,
        #[source]
        source: XmlError,
    },

    #[error("I/O error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{format} export cannot go from {from} to {to}")]
    InvalidTransition {
        format: ExportFormat,
        from: RenderState,
        to: RenderState,
    },
}

impl ExportError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ExportError::Io {
            path: path.into(),
            source,
        }
    }
}
