// crates/pmc-rs-export/src/error.rs

use std::path::PathBuf;

use pmc_rs::{NodeKind, PmError};
use pmc_rs_smdx::SmdxError;
use thiserror::Error;
use uuid::Uuid;

/// Errors raised while exporting a project.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Model(#[from] PmError),

    #[error(transparent)]
    Smdx(#[from] SmdxError),

    /// A CAN signal reaches past the bits of its message.
    #[error(
        "signal {path} occupies bits [{}, {}] outside message bits [{}, {}]",
        signal_range.0, signal_range.1, message_range.0, message_range.1
    )]
    SignalOutsideMessage {
        path: String,
        message_range: (i64, i64),
        signal_range: (i64, i64),
    },

    /// A registry has no builder for a node kind it was asked to build.
    #[error("{registry} exporter has no builder for {kind:?}")]
    NoBuilder { registry: &'static str, kind: NodeKind },

    /// A point or signal is not linked to a parameter.
    #[error("{kind:?} {uuid} has no parameter")]
    MissingParameter { uuid: Uuid, kind: NodeKind },

    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Template error: {0}")]
    TemplateParse(#[from] Box<handlebars::TemplateError>),

    #[error("Template render error: {0}")]
    TemplateRender(#[from] handlebars::RenderError),

    #[error("Value set {path}: {detail}")]
    ValueSet { path: PathBuf, detail: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Format(#[from] std::fmt::Error),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
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

impl From<handlebars::TemplateError> for ExportError {
    fn from(e: handlebars::TemplateError) -> Self {
        ExportError::TemplateParse(Box::new(e))
    }
}

pub type Result<T> = std::result::Result<T, ExportError>;
