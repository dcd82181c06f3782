use anyhow::Result;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, error, info, warn};

use super::transport::{LineTransport, StdioTransport};
use super::types::*;
use crate::tools::pdf_download_tool::{PdfDownloadTool, PDF_DOWNLOAD_TOOL_DEFINITION};

const PROTOCOL_VERSION: &str = "2024-11-05";

pub struct McpServer<R = tokio::io::Stdin, W = tokio::io::Stdout> {
    transport: LineTransport<R, W>,
    pdf_tool: PdfDownloadTool,
    initialized: bool,
}

impl McpServer {
    pub fn new(pdf_tool: PdfDownloadTool) -> Self {
        Self::with_transport(StdioTransport::new(), pdf_tool)
    }
}

impl<R, W> McpServer<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn with_transport(transport: LineTransport<R, W>, pdf_tool: PdfDownloadTool) -> Self {
        Self {
            transport,
            pdf_tool,
            initialized: false,
        }
    }

    pub async fn start(&mut self) -> Result<()> {
        info!("MCP server started and listening on stdio");

        loop {
            match self.transport.read_message().await? {
                Some(message) => match message {
                    McpMessage::Request(request) => {
                        let response = self.handle_request(request).await;
                        self.transport.write_response(response).await?;
                    }
                    McpMessage::Notification(notification) => {
                        self.handle_notification(notification).await;
                    }
                    McpMessage::Malformed(e) => {
                        warn!("Skipping malformed message: {}", e);
                        self.transport.write_response(e.to_response()).await?;
                    }
                },
                None => {
                    info!("Client disconnected");
                    break;
                }
            }
        }

        Ok(())
    }

    async fn handle_request(&mut self, request: McpRequest) -> McpResponse {
        let id = Self::ensure_valid_id(request.id.clone());

        match request.method.as_str() {
            "initialize" => self.handle_initialize(request).await,
            "tools/list" => self.handle_list_tools(request).await,
            "tools/call" => self.handle_call_tool(request).await,
            "ping" => Self::result_response(id, serde_json::json!({})),
            _ => McpResponse::failure(id, METHOD_NOT_FOUND, "Method not found"),
        }
    }

    async fn handle_notification(&mut self, notification: McpNotification) {
        debug!("Received notification: {}", notification.method);

        match notification.method.as_str() {
            "notifications/initialized" => {
                info!("Client initialization completed");
                self.initialized = true;
            }
            "notifications/cancelled" => {
                // Downloads run to completion or to their fetch timeout
                debug!("Request cancelled notification received");
            }
            _ => {
                warn!("Unknown notification method: {}", notification.method);
            }
        }
    }

    fn ensure_valid_id(id: Option<serde_json::Value>) -> serde_json::Value {
        match id {
            Some(value) => match value {
                serde_json::Value::Null => serde_json::Value::String("0".to_string()),
                _ => value,
            },
            None => serde_json::Value::String("0".to_string()),
        }
    }

    fn result_response<T: Serialize>(id: serde_json::Value, result: T) -> McpResponse {
        match serde_json::to_value(result) {
            Ok(value) => McpResponse::success(id, value),
            Err(e) => {
                error!("Failed to serialize result: {}", e);
                McpResponse::failure(id, INTERNAL_ERROR, format!("Internal error: {}", e))
            }
        }
    }

    async fn handle_initialize(&mut self, request: McpRequest) -> McpResponse {
        let id = Self::ensure_valid_id(request.id.clone());

        match request.params {
            Some(params) => match serde_json::from_value::<InitializeParams>(params) {
                Ok(init_params) => {
                    debug!(
                        "Initialize from client {} {}",
                        init_params.client_info.name, init_params.client_info.version
                    );
                    let result = InitializeResult {
                        protocol_version: PROTOCOL_VERSION.to_string(),
                        server_info: ServerInfo {
                            name: "Google Drive PDF Download MCP".to_string(),
                            version: env!("CARGO_PKG_VERSION").to_string(),
                            description: Some(
                                "A Model Context Protocol server that extracts text from PDF files shared on Google Drive"
                                    .to_string(),
                            ),
                        },
                        capabilities: ServerCapabilities {
                            tools: Some(ToolsCapability {
                                list_changed: Some(false),
                            }),
                            logging: Some(serde_json::json!({})),
                        },
                    };

                    Self::result_response(id, result)
                }
                Err(e) => McpResponse::failure(id, INVALID_PARAMS, format!("Invalid params: {}", e)),
            },
            None => McpResponse::failure(id, INVALID_PARAMS, "Missing params"),
        }
    }

    async fn handle_list_tools(&self, request: McpRequest) -> McpResponse {
        let result = ListToolsResult {
            tools: vec![PDF_DOWNLOAD_TOOL_DEFINITION.clone()],
        };

        Self::result_response(Self::ensure_valid_id(request.id), result)
    }

    async fn handle_call_tool(&self, request: McpRequest) -> McpResponse {
        let id = Self::ensure_valid_id(request.id.clone());

        match request.params {
            Some(params) => match serde_json::from_value::<CallToolParams>(params) {
                Ok(call_params) => {
                    if !self.initialized {
                        debug!("tools/call received before client initialization completed");
                    }
                    let result = self.execute_tool(call_params).await;
                    Self::result_response(id, result)
                }
                Err(e) => McpResponse::failure(id, INVALID_PARAMS, format!("Invalid params: {}", e)),
            },
            None => McpResponse::failure(id, INVALID_PARAMS, "Missing params"),
        }
    }

    async fn execute_tool(&self, params: CallToolParams) -> CallToolResult {
        match params.name.as_str() {
            "pdf-download" => self.pdf_tool.execute(params.arguments).await,
            _ => CallToolResult::error(format!("Tool not found: {}", params.name)),
        }
    }
}
