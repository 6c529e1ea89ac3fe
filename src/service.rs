use crate::mcp::contracts::{self, ToolDescriptor};
use crate::mcp::errors::ToolError;
use crate::tools::create_docx::DocxBuilder;
use crate::tools::create_pdf::PdfBuilder;
use crate::tools::{BuildError, DocumentBuilder, GenerationResult};
use crate::validate::validate;
use serde_json::Value;
use tracing::{info, warn};

/// A server exposing exactly one schema-described tool.
///
/// Calls are independent: nothing is cached or retried between them.
pub struct ToolService {
    server_name: &'static str,
    descriptor: ToolDescriptor,
    builder: Box<dyn DocumentBuilder>,
}

impl ToolService {
    pub fn new(
        server_name: &'static str,
        descriptor: ToolDescriptor,
        builder: impl DocumentBuilder + 'static,
    ) -> Self {
        Self {
            server_name,
            descriptor,
            builder: Box::new(builder),
        }
    }

    pub fn docx() -> Self {
        Self::new(contracts::SERVER_DOCX, contracts::CREATE_DOCX, DocxBuilder::new())
    }

    pub fn pdf() -> Self {
        Self::new(contracts::SERVER_PDF, contracts::CREATE_PDF, PdfBuilder::new())
    }

    pub fn server_name(&self) -> &'static str {
        self.server_name
    }

    pub fn list_tools(&self) -> &[ToolDescriptor] {
        std::slice::from_ref(&self.descriptor)
    }

    pub fn call_tool(&self, name: &str, args: &Value) -> Result<GenerationResult, ToolError> {
        if name != self.descriptor.name {
            warn!(tool = name, "call for unknown tool");
            return Err(ToolError::unknown_tool(name));
        }

        let params = validate(self.descriptor.params, args).map_err(|err| {
            warn!(tool = name, error = %err, "rejected tool arguments");
            ToolError::invalid_params(format!("invalid parameters: {err}"))
        })?;

        let result = self.builder.build(&params).map_err(|err| {
            warn!(tool = name, error = %err, "document generation failed");
            let message = format!("document generation failed: {err}");
            match err {
                BuildError::Render(_) => ToolError::render(message),
                _ => ToolError::internal(message),
            }
        })?;

        info!(
            tool = name,
            path = %result.output_path.display(),
            bytes = result.bytes_len,
            "document generated"
        );
        Ok(result)
    }
}
