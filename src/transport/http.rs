//! reqwest-backed transport

use super::{Transport, TransportError};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

const USER_AGENT: &str = concat!("poly-odds/", env!("CARGO_PKG_VERSION"));

/// Transport over a real HTTP client with a per-request timeout
pub struct HttpTransport {
    base_url: String,
    client: Client,
}

impl HttpTransport {
    /// Build a transport against `base_url` with the given request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { base_url, client })
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn classify(error: reqwest::Error) -> TransportError {
        if error.is_timeout() {
            TransportError::Timeout(error.to_string())
        } else if error.is_decode() {
            TransportError::Decode(error.to_string())
        } else {
            TransportError::Connection(error.to_string())
        }
    }
}

/// Cap an error body for the `Status` variant without splitting a multibyte
/// character
fn truncated(body: &str, max_bytes: usize) -> String {
    let mut end = max_bytes.min(body.len());
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    body[..end].to_string()
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<serde_json::Value, TransportError> {
        let url = self.url_for(path);
        tracing::debug!(url = %url, "GET");

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(Self::classify)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: truncated(body.trim(), 200),
            });
        }

        response.json().await.map_err(Self::classify)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_and_path_join_without_double_slash() {
        let transport =
            HttpTransport::new("https://gamma-api.polymarket.com/", Duration::from_secs(5))
                .unwrap();
        assert_eq!(
            transport.url_for("/markets"),
            "https://gamma-api.polymarket.com/markets"
        );
        assert_eq!(
            transport.url_for("markets"),
            "https://gamma-api.polymarket.com/markets"
        );
    }

    #[test]
    fn error_body_truncation_respects_char_boundaries() {
        // 100 euro signs = 300 bytes; byte 200 falls inside a character
        let body = "€".repeat(100);
        let capped = truncated(&body, 200);
        assert_eq!(capped, "€".repeat(66));
        assert_eq!(capped.len(), 198);

        assert_eq!(truncated("short", 200), "short");
        assert_eq!(truncated(&"a".repeat(300), 200).len(), 200);
        assert_eq!(truncated("", 200), "");
    }
}
