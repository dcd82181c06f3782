use bytes::Bytes;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::{redirect, Client};
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

use crate::utils::drive_url::DRIVE_DOWNLOAD_BASE;

// Drive rejects some default client identifiers, so present as a browser
pub const BROWSER_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const MAX_REDIRECTS: usize = 10;

pub const PDF_LIMIT_BYTES: u64 = 500 * 1024 * 1024; // 500 MiB

#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Direct-download endpoint the file id is appended to
    pub download_base: String,
    pub timeout: Duration,
    pub user_agent: String,
    pub max_body_bytes: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            download_base: DRIVE_DOWNLOAD_BASE.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: BROWSER_UA.to_string(),
            max_body_bytes: PDF_LIMIT_BYTES,
        }
    }
}

/// Response body of a successful download, kept in the buffer reqwest filled
#[derive(Debug, Clone)]
pub struct FetchedFile {
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

/// Single-shot HTTP downloader. Cloning shares the underlying connection pool.
#[derive(Debug, Clone)]
pub struct DriveFetcher {
    client: Client,
    config: FetchConfig,
}

impl DriveFetcher {
    pub fn new(config: FetchConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.timeout)
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Issues one GET and buffers the whole body. Any final status outside
    /// 200-299 is returned as an error; nothing is retried.
    pub async fn fetch(&self, url: &Url) -> Result<FetchedFile, reqwest::Error> {
        info!(target: "drive_fetch", url = %url, "Starting HTTP fetch");

        let response = self
            .client
            .get(url.as_str())
            .header(USER_AGENT, self.config.user_agent.as_str())
            .send()
            .await
            .map_err(|e| {
                warn!(target: "drive_fetch", url = %url, timeout = e.is_timeout(), "HTTP transport error: {}", e);
                e
            })?;

        let response = response.error_for_status().map_err(|e| {
            warn!(target: "drive_fetch", url = %url, status = ?e.status(), "HTTP non-success status");
            e
        })?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .map(|s| s.to_string());

        let bytes = response.bytes().await.map_err(|e| {
            warn!(target: "drive_fetch", url = %url, "Body read failed: {}", e);
            e
        })?;

        info!(target: "drive_fetch", url = %url, size = bytes.len(), ct = ?content_type, "HTTP fetch completed");

        Ok(FetchedFile {
            bytes,
            content_type,
        })
    }
}
