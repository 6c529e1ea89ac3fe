use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::{Map, Value, json};
use std::fs;
use std::io::{self, BufRead, Write};
use std::process;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

mod mcp;
mod render;
mod service;
mod tools;
mod validate;

use mcp::contracts::{PARAM_FILENAME, PARAM_TEXT_CONTENT, TOOL_CREATE_DOCX, TOOL_CREATE_PDF};
use service::ToolService;

#[derive(Parser)]
#[command(name = "mcp-docgen")]
#[command(
    version,
    about = "Generate DOCX and PDF documents from Markdown over MCP"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ServiceArg {
    Docx,
    Pdf,
}

impl ServiceArg {
    fn service(self) -> ToolService {
        match self {
            ServiceArg::Docx => ToolService::docx(),
            ServiceArg::Pdf => ToolService::pdf(),
        }
    }
}

#[derive(Args, Clone)]
#[command(
    group(
        clap::ArgGroup::new("source")
            .required(true)
            .multiple(false)
            .args(["text", "input"])
    )
)]
struct MarkdownArgs {
    /// Markdown text to render
    #[arg(long)]
    text: Option<String>,
    /// Path to a Markdown file to render
    #[arg(long)]
    input: Option<String>,
    /// Output JSON structuredContent
    #[arg(long)]
    json: bool,
}

#[derive(Args, Clone)]
struct CreateDocxArgs {
    /// Output file name under output/ (.docx is appended when missing)
    #[arg(long)]
    filename: String,
    #[command(flatten)]
    source: MarkdownArgs,
}

#[derive(Args, Clone)]
struct CreatePdfArgs {
    /// Output file name under output/ (defaults to the first heading)
    #[arg(long)]
    filename: Option<String>,
    #[command(flatten)]
    source: MarkdownArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP stdio server
    Serve {
        /// Serve MCP over stdio (NDJSON)
        #[arg(long)]
        stdio: bool,
        /// Which document generator to expose
        #[arg(long, value_enum)]
        service: ServiceArg,
    },
    /// Create a DOCX file from Markdown
    CreateDocx(CreateDocxArgs),
    /// Create a PDF file from Markdown
    CreatePdf(CreatePdfArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing()?;

    match cli.command {
        Commands::Serve { stdio, service } => {
            if stdio {
                run_stdio_server(&service.service())
            } else {
                anyhow::bail!("only --stdio transport is supported")
            }
        }
        Commands::CreateDocx(args) => run_create_docx(args),
        Commands::CreatePdf(args) => run_create_pdf(args),
    }
}

/// Logs go to stderr; stdout carries protocol frames.
fn init_tracing() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("Failed to create env filter: {e}"))?;
    let fmt_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    Ok(())
}

fn run_create_docx(args: CreateDocxArgs) -> Result<()> {
    let markdown = read_markdown(&args.source)?;
    let arguments = tool_arguments(args.filename, markdown);
    let response =
        tool_call_response(&ToolService::docx(), json!(0), TOOL_CREATE_DOCX, &arguments);
    print_tool_response(response, args.source.json)
}

fn run_create_pdf(args: CreatePdfArgs) -> Result<()> {
    let markdown = read_markdown(&args.source)?;
    let filename = args
        .filename
        .unwrap_or_else(|| tools::create_pdf::filename_from_title(&markdown));
    let arguments = tool_arguments(filename, markdown);
    let response =
        tool_call_response(&ToolService::pdf(), json!(0), TOOL_CREATE_PDF, &arguments);
    print_tool_response(response, args.source.json)
}

fn read_markdown(source: &MarkdownArgs) -> Result<String> {
    match (&source.text, &source.input) {
        (Some(text), _) => Ok(text.clone()),
        (None, Some(path)) => {
            fs::read_to_string(path).with_context(|| format!("failed to read {path}"))
        }
        (None, None) => anyhow::bail!("either --text or --input is required"),
    }
}

fn tool_arguments(filename: String, markdown: String) -> Value {
    let mut map = Map::new();
    map.insert(PARAM_FILENAME.to_string(), json!(filename));
    map.insert(PARAM_TEXT_CONTENT.to_string(), json!(markdown));
    Value::Object(map)
}

fn print_tool_response(response: Value, json_output: bool) -> Result<()> {
    if let Some(error) = response.get("error") {
        let message = error
            .get("message")
            .and_then(|value| value.as_str())
            .unwrap_or("tool error");
        eprintln!("{message}");
        process::exit(1);
    }

    let result = response.get("result").cloned().unwrap_or_else(|| json!({}));
    if json_output {
        let structured = result
            .get("structuredContent")
            .cloned()
            .unwrap_or_else(|| json!({}));
        let output = serde_json::to_string_pretty(&structured)?;
        println!("{output}");
        return Ok(());
    }

    let text = result
        .get("content")
        .and_then(|value| value.as_array())
        .and_then(|arr| arr.first())
        .and_then(|value| value.get("text"))
        .and_then(|value| value.as_str())
        .unwrap_or("");
    println!("{text}");
    Ok(())
}

fn run_stdio_server(service: &ToolService) -> Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let reader = stdin.lock().lines();
    let mut writer = io::BufWriter::new(stdout.lock());
    tracing::info!(server = service.server_name(), "serving MCP over stdio");

    for line in reader {
        let line = line.context("failed to read stdin")?;
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Value>(&line) {
            Ok(request) => handle_request(service, &request),
            Err(err) => {
                tracing::warn!(error = %err, "discarding malformed request");
                Some(mcp::error_response(
                    Value::Null,
                    mcp::errors::PARSE_ERROR,
                    format!("parse error: {err}"),
                    None,
                ))
            }
        };

        if let Some(response) = response {
            let serialized =
                serde_json::to_string(&response).context("failed to serialize response")?;
            writeln!(writer, "{serialized}").context("failed to write response")?;
            writer.flush().context("failed to flush response")?;
        }
    }

    tracing::info!("stdin closed, shutting down");
    Ok(())
}

/// Returns `None` for notifications, which never get a reply.
fn handle_request(service: &ToolService, request: &Value) -> Option<Value> {
    if !request.is_object() {
        return Some(mcp::error_response(
            Value::Null,
            mcp::errors::INVALID_REQUEST,
            "request must be a JSON object",
            None,
        ));
    }
    let method = request.get("method").and_then(|value| value.as_str());
    let id = request.get("id").cloned()?;

    let response = match method {
        Some("initialize") => {
            mcp::success_response(id, mcp::initialize_result(service.server_name()))
        }
        Some("ping") => mcp::success_response(id, json!({})),
        Some("tools/list") => mcp::success_response(
            id,
            json!({ "tools": mcp::tool_definitions(service.list_tools()) }),
        ),
        Some("tools/call") => handle_tool_call(service, id, request),
        Some(other) => mcp::error_response(
            id,
            mcp::errors::METHOD_NOT_FOUND,
            format!("method not found: {other}"),
            None,
        ),
        None => mcp::error_response(
            id,
            mcp::errors::INVALID_REQUEST,
            "request method must be a string",
            None,
        ),
    };
    Some(response)
}

fn handle_tool_call(service: &ToolService, id: Value, request: &Value) -> Value {
    let params = request.get("params");
    let Some(params) = params.and_then(|value| value.as_object()) else {
        let err = mcp::errors::ToolError::invalid_params("params must be an object");
        return mcp::tool_error_response(id, &err);
    };

    let name = params.get("name").and_then(|value| value.as_str());
    let Some(name) = name else {
        let err = mcp::errors::ToolError::invalid_params("params.name must be a string");
        return mcp::tool_error_response(id, &err);
    };

    let args = params
        .get("arguments")
        .cloned()
        .unwrap_or_else(|| json!({}));

    tool_call_response(service, id, name, &args)
}

fn tool_call_response(service: &ToolService, id: Value, name: &str, args: &Value) -> Value {
    match service.call_tool(name, args) {
        Ok(result) => mcp::success_response(id, mcp::tool_result(&result)),
        Err(err) => mcp::tool_error_response(id, &err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notifications_get_no_reply() {
        let service = ToolService::docx();
        let request = json!({"jsonrpc": "2.0", "method": "notifications/initialized"});
        assert!(handle_request(&service, &request).is_none());
    }

    #[test]
    fn non_object_requests_are_invalid() {
        let service = ToolService::docx();
        for request in [json!([{"jsonrpc": "2.0", "id": 1, "method": "ping"}]), json!(7)] {
            let response = handle_request(&service, &request).expect("response");
            assert_eq!(response["id"], Value::Null);
            assert_eq!(response["error"]["code"], mcp::errors::INVALID_REQUEST);
        }
    }

    #[test]
    fn unknown_methods_are_rejected() {
        let service = ToolService::pdf();
        let request = json!({"jsonrpc": "2.0", "id": 4, "method": "resources/list"});
        let response = handle_request(&service, &request).expect("response");
        assert_eq!(response["error"]["code"], mcp::errors::METHOD_NOT_FOUND);
    }

    #[test]
    fn ping_returns_empty_result() {
        let service = ToolService::pdf();
        let request = json!({"jsonrpc": "2.0", "id": "p", "method": "ping"});
        let response = handle_request(&service, &request).expect("response");
        assert_eq!(response["result"], json!({}));
    }

    #[test]
    fn tool_call_without_params_is_invalid() {
        let service = ToolService::docx();
        let request = json!({"jsonrpc": "2.0", "id": 9, "method": "tools/call"});
        let response = handle_request(&service, &request).expect("response");
        assert_eq!(response["error"]["code"], mcp::errors::INVALID_PARAMS);
        assert_eq!(response["error"]["data"]["kind"], "invalid_params");
    }
}
