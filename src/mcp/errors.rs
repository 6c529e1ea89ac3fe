use thiserror::Error;

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Arguments did not match the tool's schema.
    InvalidParams,
    /// No tool with the requested name is registered.
    UnknownTool,
    /// The document renderer failed or reported an error status.
    RenderError,
    /// File-system failure while building the document.
    InternalError,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidParams => "invalid_params",
            ErrorKind::UnknownTool => "unknown_tool",
            ErrorKind::RenderError => "render_error",
            ErrorKind::InternalError => "internal_error",
        }
    }

    /// JSON-RPC error code reported to the caller.
    pub fn code(self) -> i64 {
        match self {
            ErrorKind::InvalidParams | ErrorKind::UnknownTool => INVALID_PARAMS,
            ErrorKind::RenderError | ErrorKind::InternalError => INTERNAL_ERROR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ToolError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ToolError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidParams, message)
    }

    pub fn unknown_tool(name: &str) -> Self {
        Self::new(ErrorKind::UnknownTool, format!("unknown tool: {name}"))
    }

    pub fn render(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RenderError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalError, message)
    }
}
