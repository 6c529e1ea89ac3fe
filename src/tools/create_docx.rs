use super::{BuildError, DocumentBuilder, GenerationResult, ensure_output_dir, written};
use crate::mcp::contracts::OUTPUT_DIR;
use crate::render::DocxRenderer;
use crate::render::docx::MarkdownDocxRenderer;
use crate::validate::ValidatedParams;
use std::path::PathBuf;
use tracing::debug;

const EXTENSION: &str = ".docx";

pub struct DocxBuilder<R = MarkdownDocxRenderer> {
    output_dir: PathBuf,
    renderer: R,
}

impl DocxBuilder {
    pub fn new() -> Self {
        Self::with_renderer(OUTPUT_DIR, MarkdownDocxRenderer)
    }
}

impl<R: DocxRenderer> DocxBuilder<R> {
    pub fn with_renderer(output_dir: impl Into<PathBuf>, renderer: R) -> Self {
        Self {
            output_dir: output_dir.into(),
            renderer,
        }
    }
}

impl<R: DocxRenderer> DocumentBuilder for DocxBuilder<R> {
    fn build(&self, params: &ValidatedParams) -> Result<GenerationResult, BuildError> {
        let output_path = self.output_dir.join(normalize_filename(&params.filename));
        ensure_output_dir(output_path.parent().unwrap_or(self.output_dir.as_path()))?;

        self.renderer.render(&params.text_content, &output_path)?;
        debug!(path = %output_path.display(), "docx written");

        let message = format!("DOCX file created at: {}", output_path.display());
        written(output_path, message)
    }
}

/// Appends `.docx` unless the name already ends with it, in any case.
pub fn normalize_filename(filename: &str) -> String {
    if filename.to_ascii_lowercase().ends_with(EXTENSION) {
        filename.to_string()
    } else {
        format!("{filename}{EXTENSION}")
    }
}
