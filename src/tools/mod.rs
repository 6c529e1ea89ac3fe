use crate::render::RenderError;
use crate::validate::ValidatedParams;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod create_docx;
pub mod create_pdf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub output_path: PathBuf,
    pub message: String,
    pub bytes_len: u64,
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to create output directory {path}: {source}")]
    OutputDir {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to open {path} for writing: {source}")]
    OpenOutput {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to inspect {path} after writing: {source}")]
    Inspect {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Produces one document from validated arguments.
pub trait DocumentBuilder {
    fn build(&self, params: &ValidatedParams) -> Result<GenerationResult, BuildError>;
}

fn ensure_output_dir(dir: &Path) -> Result<(), BuildError> {
    fs::create_dir_all(dir).map_err(|source| BuildError::OutputDir {
        path: dir.display().to_string(),
        source,
    })
}

fn written(output_path: PathBuf, message: String) -> Result<GenerationResult, BuildError> {
    let metadata = fs::metadata(&output_path).map_err(|source| BuildError::Inspect {
        path: output_path.display().to_string(),
        source,
    })?;
    Ok(GenerationResult {
        output_path,
        message,
        bytes_len: metadata.len(),
    })
}
