use std::path::PathBuf;

use thiserror::Error;

use orbit_core::errors::ApplicationError;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("template error: {0}")]
    Template(String),
    #[error("conversion error: {0}")]
    Conversion(String),
    #[error("archive error: {0}")]
    Archive(String),
    #[error("required asset is missing: `{0}`")]
    MissingAsset(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<tera::Error> for DocumentError {
    fn from(error: tera::Error) -> Self {
        Self::Template(render_chain(&error))
    }
}

impl From<zip::result::ZipError> for DocumentError {
    fn from(error: zip::result::ZipError) -> Self {
        Self::Archive(error.to_string())
    }
}

impl From<DocumentError> for ApplicationError {
    fn from(error: DocumentError) -> Self {
        ApplicationError::Document(error.to_string())
    }
}

/// Tera hides the interesting part of a render failure in the source chain.
fn render_chain(error: &tera::Error) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
