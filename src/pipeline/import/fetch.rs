use std::time::Duration;

use url::Url;

use super::ImportError;

/// Retrieves the raw payload behind a URL.
pub trait UrlFetcher {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>, ImportError>;
}

/// Blocking HTTP(S) fetcher.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl HttpFetcher {
    pub fn new(timeout_secs: u64) -> Result<Self, ImportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("crumbler/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ImportError::Fetch {
                url: String::new(),
                reason: e.to_string(),
            })?;

        Ok(Self { client, timeout_secs })
    }
}

impl UrlFetcher for HttpFetcher {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>, ImportError> {
        tracing::info!(url = %url, "Fetching URL");

        let response = self.client.get(url.as_str()).send().map_err(|e| {
            let reason = if e.is_connect() {
                "connection failed".to_string()
            } else if e.is_timeout() {
                format!("request timed out after {}s", self.timeout_secs)
            } else {
                e.to_string()
            };
            ImportError::Fetch {
                url: url.to_string(),
                reason,
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImportError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().map_err(|e| ImportError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(bytes.to_vec())
    }
}
