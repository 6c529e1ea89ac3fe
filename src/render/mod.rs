use std::io::Write;
use std::path::Path;
use thiserror::Error;

pub mod docx;
pub mod html;
pub mod pdf;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{stage} failed: {message}")]
pub struct RenderError {
    pub stage: &'static str,
    pub message: String,
}

impl RenderError {
    pub fn new(stage: &'static str, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}

/// Converts Markdown straight into a DOCX file at `output`.
pub trait DocxRenderer {
    fn render(&self, markdown: &str, output: &Path) -> Result<(), RenderError>;
}

/// Streams HTML into a PDF written to `sink`.
///
/// Failures are collected in the returned status rather than aborting, so
/// `sink` may hold a partial document when the status reports an error.
pub trait PdfRenderer {
    fn render(&self, html: &str, sink: &mut dyn Write) -> RenderStatus;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderStatus {
    errors: Vec<String>,
}

impl RenderStatus {
    pub fn push_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn is_err(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn into_result(self, stage: &'static str) -> Result<(), RenderError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(RenderError::new(stage, self.errors.join("; ")))
        }
    }
}
