use serde_json::{Map, Value, json};

pub const TOOL_CREATE_DOCX: &str = "create_docx";
pub const TOOL_CREATE_PDF: &str = "create_pdf";

pub const SERVER_DOCX: &str = "docx-generator";
pub const SERVER_PDF: &str = "pdf-generator";

pub const PROTOCOL_VERSION: &str = "2025-11-25";

/// Relative directory every generated document is written under.
pub const OUTPUT_DIR: &str = "output";

pub const PARAM_FILENAME: &str = "filename";
pub const PARAM_TEXT_CONTENT: &str = "text_content";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Any string, including the empty one.
    Text,
    /// Non-empty relative path that stays inside the output directory.
    FileName,
}

/// A required string parameter accepted by a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: ParamKind,
}

/// Static metadata advertised through `tools/list`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub params: &'static [ParamSpec],
}

impl ToolDescriptor {
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        for param in self.params {
            properties.insert(
                param.name.to_string(),
                json!({
                    "type": "string",
                    "title": title_case(param.name),
                    "description": param.description
                }),
            );
        }
        let required: Vec<&str> = self.params.iter().map(|param| param.name).collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required
        })
    }

    pub fn to_json(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": self.input_schema()
        })
    }
}

pub const CREATE_DOCX: ToolDescriptor = ToolDescriptor {
    name: TOOL_CREATE_DOCX,
    description: "Create an editable DOCX file from Markdown text.",
    params: &[
        ParamSpec {
            name: PARAM_FILENAME,
            description: "Name of the DOCX file to create (e.g. 'report.docx').",
            kind: ParamKind::FileName,
        },
        ParamSpec {
            name: PARAM_TEXT_CONTENT,
            description: "Markdown text to write into the file.",
            kind: ParamKind::Text,
        },
    ],
};

pub const CREATE_PDF: ToolDescriptor = ToolDescriptor {
    name: TOOL_CREATE_PDF,
    description: "Create a PDF file from Markdown text and save it.",
    params: &[
        ParamSpec {
            name: PARAM_FILENAME,
            description: "Name of the PDF file to create (e.g. 'report.pdf'). Must end with .pdf",
            kind: ParamKind::FileName,
        },
        ParamSpec {
            name: PARAM_TEXT_CONTENT,
            description: "Markdown text to render into the PDF file.",
            kind: ParamKind::Text,
        },
    ],
};

fn title_case(name: &str) -> String {
    name.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
