use anyhow::Result;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};
use tracing::{debug, error};

use super::types::{FrameError, McpMessage, McpNotification, McpRequest, McpResponse};

/// Newline-delimited JSON-RPC over an arbitrary byte pipe.
pub struct LineTransport<R, W> {
    reader: FramedRead<BufReader<R>, LinesCodec>,
    writer: FramedWrite<W, LinesCodec>,
}

/// Transport bound to the process stdin/stdout; stdout is reserved for protocol frames.
pub type StdioTransport = LineTransport<tokio::io::Stdin, tokio::io::Stdout>;

impl StdioTransport {
    pub fn new() -> Self {
        LineTransport::from_io(tokio::io::stdin(), tokio::io::stdout())
    }
}

impl<R, W> LineTransport<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn from_io(reader: R, writer: W) -> Self {
        Self {
            reader: FramedRead::new(BufReader::new(reader), LinesCodec::new()),
            writer: FramedWrite::new(writer, LinesCodec::new()),
        }
    }

    /// Returns `Ok(None)` on EOF. A line that does not parse comes back as
    /// [`McpMessage::Malformed`]; only a failing byte stream is an `Err`.
    pub async fn read_message(&mut self) -> Result<Option<McpMessage>> {
        match self.reader.next().await {
            Some(Ok(line)) => {
                debug!("Received: {}", line);
                Ok(Some(parse_message(&line).unwrap_or_else(McpMessage::Malformed)))
            }
            Some(Err(e)) => {
                error!("Error reading from transport: {}", e);
                Err(anyhow::anyhow!("Transport error: {}", e))
            }
            None => {
                debug!("EOF reached");
                Ok(None)
            }
        }
    }

    pub async fn write_response(&mut self, response: McpResponse) -> Result<()> {
        let json = serde_json::to_string(&response)?;
        debug!("Sending: {}", json);

        self.writer.send(json).await?;

        Ok(())
    }
}

/// Classifies one JSON-RPC line: objects carrying `id` are requests, the rest notifications.
pub fn parse_message(line: &str) -> std::result::Result<McpMessage, FrameError> {
    let value = serde_json::from_str::<serde_json::Value>(line).map_err(|e| {
        error!("Failed to parse JSON: {}", e);
        FrameError::Parse(e.to_string())
    })?;

    let id = match value.as_object() {
        Some(obj) => obj.get("id").cloned(),
        None => {
            error!("Invalid JSON-RPC message structure");
            return Err(FrameError::InvalidRequest {
                id: None,
                reason: "message is not a JSON object".to_string(),
            });
        }
    };

    if id.is_some() {
        serde_json::from_value::<McpRequest>(value)
            .map(McpMessage::Request)
            .map_err(|e| {
                error!("Failed to parse request: {}", e);
                FrameError::InvalidRequest {
                    id,
                    reason: e.to_string(),
                }
            })
    } else {
        serde_json::from_value::<McpNotification>(value)
            .map(McpMessage::Notification)
            .map_err(|e| {
                error!("Failed to parse notification: {}", e);
                FrameError::InvalidRequest {
                    id: None,
                    reason: e.to_string(),
                }
            })
    }
}
