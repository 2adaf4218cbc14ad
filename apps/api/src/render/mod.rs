//! Resume and cover-letter rendering. Both HTML (and from it PDF) and DOCX are
//! produced from the same `Document`.

pub mod docx;
pub mod document;
pub mod handlers;
pub mod pdf;
pub mod templates;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Unknown template '{0}'")]
    TemplateNotFound(String),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("PDF rendering failed: {0}")]
    Pdf(String),

    #[error("DOCX rendering failed: {0}")]
    Docx(String),
}
