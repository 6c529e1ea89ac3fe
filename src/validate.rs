use crate::mcp::contracts::{PARAM_FILENAME, PARAM_TEXT_CONTENT, ParamKind, ParamSpec};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Component, Path};
use thiserror::Error;

/// Arguments accepted by both document builders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedParams {
    pub filename: String,
    pub text_content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("arguments must be an object")]
    NotAnObject,
    #[error("{field} is required")]
    Missing { field: &'static str },
    #[error("{field} must be a string")]
    NotAString { field: &'static str },
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
    #[error("{field} must be a relative name inside the output directory")]
    EscapesOutputDir { field: &'static str },
}

/// Checks `args` against `params` before anything touches the disk.
///
/// Keys not declared in `params` are ignored.
pub fn validate(params: &[ParamSpec], args: &Value) -> Result<ValidatedParams, ValidationError> {
    let obj = args.as_object().ok_or(ValidationError::NotAnObject)?;

    let mut fields = HashMap::new();
    for param in params {
        let value = obj
            .get(param.name)
            .ok_or(ValidationError::Missing { field: param.name })?;
        let text = value
            .as_str()
            .ok_or(ValidationError::NotAString { field: param.name })?;
        if param.kind == ParamKind::FileName {
            check_file_name(param.name, text)?;
        }
        fields.insert(param.name, text.to_string());
    }

    let mut take = |field: &'static str| {
        fields
            .remove(field)
            .ok_or(ValidationError::Missing { field })
    };
    Ok(ValidatedParams {
        filename: take(PARAM_FILENAME)?,
        text_content: take(PARAM_TEXT_CONTENT)?,
    })
}

fn check_file_name(field: &'static str, name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::Empty { field });
    }
    let contained = Path::new(name)
        .components()
        .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
    if !contained {
        return Err(ValidationError::EscapesOutputDir { field });
    }
    Ok(())
}
