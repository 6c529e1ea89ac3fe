use serde_json::{Value, json};

pub mod contracts;
pub mod errors;

use crate::tools::GenerationResult;
use errors::ToolError;

pub fn initialize_result(server_name: &str) -> Value {
    json!({
        "protocolVersion": contracts::PROTOCOL_VERSION,
        "capabilities": {
            "tools": {}
        },
        "serverInfo": {
            "name": server_name,
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

pub fn tool_definitions(descriptors: &[contracts::ToolDescriptor]) -> Vec<Value> {
    descriptors.iter().map(|tool| tool.to_json()).collect()
}

/// Wraps a generated document as a single text content item.
pub fn tool_result(result: &GenerationResult) -> Value {
    json!({
        "content": [{"type": "text", "text": result.message}],
        "structuredContent": {
            "path": result.output_path.to_string_lossy(),
            "bytes_len": result.bytes_len
        },
        "isError": false
    })
}

pub fn success_response(id: Value, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
}

pub fn error_response(id: Value, code: i64, message: impl Into<String>, data: Option<Value>) -> Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(data) = data
        && let Some(obj) = error.as_object_mut()
    {
        obj.insert("data".to_string(), data);
    }

    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": error
    })
}

pub fn tool_error_response(id: Value, err: &ToolError) -> Value {
    error_response(
        id,
        err.kind.code(),
        err.message.clone(),
        Some(json!({"kind": err.kind.as_str()})),
    )
}
