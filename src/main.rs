use clap::{Arg, Command};
use once_cell::sync::Lazy;
use regex::Regex;
use std::process;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod mcp;
mod tools;
mod utils;

use mcp::server::McpServer;
use tools::pdf_download_tool::PdfDownloadTool;

const BOX_WIDTH: usize = 60; // Total width including borders
const CONTENT_WIDTH: usize = BOX_WIDTH - 4; // "║  " on the left, "  ║" on the right

static ANSI_ESCAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").expect("valid ANSI escape regex"));

/// Prints the startup banner to stderr.
/// Empty strings become blank rows; anything else is centered.
fn print_box(lines: &[&str]) {
    eprintln!("\n\x1b[36m╔{}╗", "═".repeat(BOX_WIDTH - 2));
    for line in lines {
        eprintln!("{}", box_row(line));
    }
    eprintln!("╚{}╝\x1b[0m\n", "═".repeat(BOX_WIDTH - 2));
}

/// Formats one banner row, re-applying the border colour after the content.
fn box_row(line: &str) -> String {
    // Blank separator row
    if line.is_empty() {
        return format!("║{}║", " ".repeat(BOX_WIDTH - 2));
    }

    // Padding is computed from what the terminal shows, not from the raw bytes
    let visible_len = strip_ansi_codes(line).chars().count();
    if visible_len >= CONTENT_WIDTH {
        // Overlong rows push the right border out rather than being cut
        return format!("║  {}\x1b[36m  ║", line);
    }

    let total_padding = CONTENT_WIDTH - visible_len;
    let left_padding = total_padding / 2;
    format!(
        "║  {}{}{}\x1b[36m║",
        " ".repeat(left_padding),
        line,
        " ".repeat(total_padding - left_padding)
    )
}

/// Removes CSI colour sequences such as `\x1b[1m` or `\x1b[0;31m`.
fn strip_ansi_codes(text: &str) -> std::borrow::Cow<'_, str> {
    ANSI_ESCAPE.replace_all(text, "")
}

fn cli() -> Command {
    Command::new("mcp-drive-pdf")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A Model Context Protocol server that extracts text from Google Drive PDFs")
        .long_about(
            "This MCP server provides the following tool:\n\
            - pdf-download: Download a PDF from a Google Drive sharing link and return its text as markdown",
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .help("Suppress the startup banner and log errors only (for MCP clients)")
                .action(clap::ArgAction::SetTrue),
        )
}

#[tokio::main]
async fn main() {
    let matches = cli().get_matches();
    let quiet = matches.get_flag("quiet");

    // Logs go to stderr only; stdout is reserved for JSON-RPC
    let default_level = if quiet { "error" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if !quiet {
        print_box(&[
            "",
            "\x1b[1m\x1b[31m MCP-Drive-PDF: Google Drive PDF Reader \x1b[0m",
            "",
            "\x1b[0m Model Context Protocol server for PDF text extraction \x1b[0m",
            "",
        ]);
    }

    let pdf_tool = match PdfDownloadTool::new() {
        Ok(tool) => tool,
        Err(e) => {
            error!("Failed to create HTTP client: {}", e);
            process::exit(1);
        }
    };

    info!("Starting MCP server...");

    let mut server = McpServer::new(pdf_tool);
    if let Err(e) = server.start().await {
        error!("Failed to start server: {}", e);
        process::exit(1);
    }
}
