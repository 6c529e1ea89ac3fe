use super::{BuildError, DocumentBuilder, GenerationResult, ensure_output_dir, written};
use crate::mcp::contracts::OUTPUT_DIR;
use crate::render::PdfRenderer;
use crate::render::html::markdown_to_html;
use crate::render::pdf::HtmlPdfRenderer;
use crate::validate::ValidatedParams;
use std::fs::{self, File};
use std::path::PathBuf;
use tracing::{debug, warn};

const UNTITLED: &str = "untitled_document";

pub struct PdfBuilder<R = HtmlPdfRenderer> {
    output_dir: PathBuf,
    renderer: R,
}

impl PdfBuilder {
    pub fn new() -> Self {
        Self::with_renderer(OUTPUT_DIR, HtmlPdfRenderer)
    }
}

impl<R: PdfRenderer> PdfBuilder<R> {
    pub fn with_renderer(output_dir: impl Into<PathBuf>, renderer: R) -> Self {
        Self {
            output_dir: output_dir.into(),
            renderer,
        }
    }
}

impl<R: PdfRenderer> DocumentBuilder for PdfBuilder<R> {
    fn build(&self, params: &ValidatedParams) -> Result<GenerationResult, BuildError> {
        let output_path = self.output_dir.join(&params.filename);
        ensure_output_dir(output_path.parent().unwrap_or(self.output_dir.as_path()))?;

        let html = markdown_to_html(&params.text_content);
        let status = {
            let mut file = File::create(&output_path).map_err(|source| BuildError::OpenOutput {
                path: output_path.display().to_string(),
                source,
            })?;
            self.renderer.render(&html, &mut file)
        };

        if status.is_err() {
            warn!(errors = ?status.errors(), "pdf renderer reported errors");
        }
        if let Err(err) = status.into_result("render pdf") {
            // the renderer may have streamed part of a document before failing
            if let Err(remove_err) = fs::remove_file(&output_path) {
                warn!(
                    path = %output_path.display(),
                    error = %remove_err,
                    "failed to remove incomplete pdf"
                );
            }
            return Err(err.into());
        }
        debug!(path = %output_path.display(), "pdf written");

        let message = format!(
            "PDF file created from Markdown at: {}",
            output_path.display()
        );
        written(output_path, message)
    }
}

/// Derives `<title>.pdf` from the first level-one or level-two heading.
pub fn filename_from_title(markdown: &str) -> String {
    let title = markdown
        .lines()
        .map(str::trim)
        .find_map(|line| {
            line.strip_prefix("# ")
                .or_else(|| line.strip_prefix("## "))
        })
        .map(|title| title.trim().replace(' ', "_").to_lowercase())
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| UNTITLED.to_string());
    format!("{title}.pdf")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RenderStatus;
    use std::io::Write;
    use tempfile::tempdir;

    fn params(filename: &str, text: &str) -> ValidatedParams {
        ValidatedParams {
            filename: filename.to_string(),
            text_content: text.to_string(),
        }
    }

    #[test]
    fn filename_is_used_as_is() {
        let dir = tempdir().expect("tempdir");
        let builder = PdfBuilder::with_renderer(dir.path(), HtmlPdfRenderer);
        let result = builder
            .build(&params("x", "# Title\n\nBody"))
            .expect("result");
        assert_eq!(result.output_path, dir.path().join("x"));
        assert!(result.bytes_len > 0);
        let bytes = fs::read(&result.output_path).expect("read");
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn creates_missing_output_directory() {
        let dir = tempdir().expect("tempdir");
        let output_dir = dir.path().join("output");
        let builder = PdfBuilder::with_renderer(&output_dir, HtmlPdfRenderer);
        builder
            .build(&params("report.pdf", ""))
            .expect("result");
        assert!(output_dir.join("report.pdf").is_file());
    }

    struct PartialRenderer;

    impl PdfRenderer for PartialRenderer {
        fn render(&self, _html: &str, sink: &mut dyn Write) -> RenderStatus {
            let mut status = RenderStatus::default();
            if let Err(err) = sink.write_all(b"%PDF-1.3\n") {
                status.push_error(err.to_string());
            }
            status.push_error("unsupported element");
            status
        }
    }

    #[test]
    fn failed_render_removes_partial_file() {
        let dir = tempdir().expect("tempdir");
        let builder = PdfBuilder::with_renderer(dir.path(), PartialRenderer);
        let err = builder
            .build(&params("half.pdf", "text"))
            .expect_err("error");
        assert!(matches!(err, BuildError::Render(_)));
        assert_eq!(err.to_string(), "render pdf failed: unsupported element");
        assert!(!dir.path().join("half.pdf").exists());
    }

    #[test]
    fn title_from_first_heading() {
        assert_eq!(
            filename_from_title("intro\n# My Story \n## Later"),
            "my_story.pdf"
        );
        assert_eq!(
            filename_from_title("## Second Level\n# First"),
            "second_level.pdf"
        );
        assert_eq!(filename_from_title("no headings here"), "untitled_document.pdf");
        assert_eq!(filename_from_title("#hashtag only"), "untitled_document.pdf");
    }
}
