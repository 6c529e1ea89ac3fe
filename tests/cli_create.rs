use std::fs;
use std::process::Command;
use tempfile::tempdir;

#[test]
fn cli_create_pdf_names_file_after_heading() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("story.md");
    fs::write(&input, "Intro line\n\n# The Long Road\n\nOnce upon a time.\n")?;

    let output = Command::new(env!("CARGO_BIN_EXE_mcp-docgen"))
        .args(["create-pdf", "--input", input.to_string_lossy().as_ref()])
        .current_dir(dir.path())
        .output()?;

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("output/the_long_road.pdf"));
    assert!(dir.path().join("output").join("the_long_road.pdf").is_file());
    Ok(())
}

#[test]
fn cli_create_docx_prints_structured_content() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;

    let output = Command::new(env!("CARGO_BIN_EXE_mcp-docgen"))
        .args(["create-docx", "--filename", "memo", "--text", "# Memo", "--json"])
        .current_dir(dir.path())
        .output()?;

    assert!(output.status.success());
    let structured: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(
        structured.get("path").and_then(|v| v.as_str()),
        Some("output/memo.docx")
    );
    assert!(dir.path().join("output").join("memo.docx").is_file());
    Ok(())
}

#[test]
fn cli_rejects_escaping_filename() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;

    let output = Command::new(env!("CARGO_BIN_EXE_mcp-docgen"))
        .args(["create-docx", "--filename", "../memo", "--text", "body"])
        .current_dir(dir.path())
        .output()?;

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains("filename"));
    assert!(!dir.path().join("memo.docx").exists());
    Ok(())
}
