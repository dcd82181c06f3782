use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::mcp::types::{CallToolResult, ToolAnnotations, ToolDefinition};
use crate::utils::drive_fetch::{DriveFetcher, FetchConfig};
use crate::utils::drive_pdf::{download_drive_pdf, render_result, DrivePdfError};

pub static PDF_DOWNLOAD_TOOL_DEFINITION: Lazy<ToolDefinition> = Lazy::new(|| ToolDefinition {
    name: "pdf-download".to_string(),
    description: "Downloads and extracts text from PDF files on Google Drive. \
        Use for processing contract documents and legal agreements from cloud storage."
        .to_string(),
    input_schema: json!({
        "type": "object",
        "properties": {
            "url": {
                "type": "string",
                "description": "Google Drive sharing URL to download PDF from"
            }
        },
        "required": ["url"]
    }),
    annotations: Some(ToolAnnotations {
        title: Some("PDF Download Tool".to_string()),
        read_only_hint: Some(true),
        open_world_hint: Some(true),
    }),
});

#[derive(Debug, Deserialize)]
struct PdfDownloadParams {
    url: String,
}

pub struct PdfDownloadTool {
    fetcher: DriveFetcher,
}

impl PdfDownloadTool {
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_config(FetchConfig::default())
    }

    pub fn with_config(config: FetchConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            fetcher: DriveFetcher::new(config)?,
        })
    }

    /// Downloads the PDF behind `url`. `Ok` carries the markdown document,
    /// `Err` the `**...:**`-prefixed message; both are the text handed to the
    /// caller.
    pub async fn run(&self, url: &str) -> Result<String, String> {
        info!("Downloading PDF from Google Drive URL: {}", url);

        let result = download_drive_pdf(url, &self.fetcher).await;
        match &result {
            Ok(content) => info!("Extracted {} page(s) of text from {}", content.pages.len(), url),
            Err(DrivePdfError::Validation(e)) => warn!("Rejected URL {}: {}", url, e),
            Err(e) => error!("Error downloading PDF from {}: {}", url, e),
        }

        let text = render_result(&result);
        match result {
            Ok(_) => Ok(text),
            Err(_) => Err(text),
        }
    }

    pub async fn execute(&self, arguments: Option<serde_json::Value>) -> CallToolResult {
        let params = match arguments {
            Some(args) => match serde_json::from_value::<PdfDownloadParams>(args) {
                Ok(params) => params,
                Err(e) => {
                    error!("Invalid PDF download parameters: {}", e);
                    return CallToolResult::error(format!("Invalid parameters: {}", e));
                }
            },
            None => {
                return CallToolResult::error("Missing required parameters");
            }
        };

        match self.run(&params.url).await {
            Ok(text) => CallToolResult::success(text),
            Err(text) => CallToolResult::error(text),
        }
    }
}
