use std::io::{BufRead, BufReader, Write};
use std::process::{Command, Stdio};
use tempfile::tempdir;

fn list_tools(service: &str) -> Result<Vec<serde_json::Value>, Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let mut child = Command::new(env!("CARGO_BIN_EXE_mcp-docgen"))
        .args(["serve", "--stdio", "--service", service])
        .current_dir(dir.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()?;

    let mut stdin = child.stdin.take().expect("stdin available");
    let mut stdout = BufReader::new(child.stdout.take().expect("stdout available"));

    let request = serde_json::json!({
        "jsonrpc": "2.0",
        "id": 2,
        "method": "tools/list",
        "params": {}
    });
    let serialized = serde_json::to_string(&request)?;
    writeln!(stdin, "{serialized}")?;
    stdin.flush()?;

    let mut line = String::new();
    stdout.read_line(&mut line)?;
    let _ = child.kill();

    let response: serde_json::Value = serde_json::from_str(line.trim())?;
    let tools = response
        .get("result")
        .and_then(|value| value.get("tools"))
        .and_then(|value| value.as_array())
        .expect("tools array present")
        .clone();
    Ok(tools)
}

fn assert_schema(tool: &serde_json::Value) {
    let schema = tool.get("inputSchema").expect("inputSchema present");
    assert_eq!(schema.get("type").and_then(|v| v.as_str()), Some("object"));
    for field in ["filename", "text_content"] {
        let property = schema
            .get("properties")
            .and_then(|value| value.get(field))
            .expect("property present");
        assert_eq!(property.get("type").and_then(|v| v.as_str()), Some("string"));
        assert!(property.get("description").and_then(|v| v.as_str()).is_some());
    }
    assert_eq!(
        schema.get("required"),
        Some(&serde_json::json!(["filename", "text_content"]))
    );
}

#[test]
fn docx_service_lists_create_docx() -> Result<(), Box<dyn std::error::Error>> {
    let tools = list_tools("docx")?;
    assert_eq!(tools.len(), 1);
    assert_eq!(
        tools[0].get("name").and_then(|v| v.as_str()),
        Some("create_docx")
    );
    assert_schema(&tools[0]);
    Ok(())
}

#[test]
fn pdf_service_lists_create_pdf() -> Result<(), Box<dyn std::error::Error>> {
    let tools = list_tools("pdf")?;
    assert_eq!(tools.len(), 1);
    assert_eq!(
        tools[0].get("name").and_then(|v| v.as_str()),
        Some("create_pdf")
    );
    assert_schema(&tools[0]);
    Ok(())
}
