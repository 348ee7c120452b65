//! HTTP transport abstraction so provider clients can be tested offline.

use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

use crate::error::MapError;

const USER_AGENT: &str = concat!("regionmap/", env!("CARGO_PKG_VERSION"));

/// Raw response as seen by provider clients. The status code is kept for
/// diagnostics only; callers classify by content type.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_image(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.trim_start().to_ascii_lowercase().starts_with("image"))
    }

    /// Body as text, truncated for log and error messages.
    pub fn body_snippet(&self, max: usize) -> String {
        String::from_utf8_lossy(&self.body).chars().take(max).collect()
    }
}

/// Blocking GET with query parameters.
pub trait HttpTransport: Send + Sync {
    /// Only network-level failures are errors; any HTTP status is returned
    /// as a response.
    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<HttpResponse, MapError>;
}

impl<T: HttpTransport + ?Sized> HttpTransport for Arc<T> {
    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<HttpResponse, MapError> {
        (**self).get(url, query)
    }
}

/// Transport backed by a blocking reqwest client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, MapError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| MapError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<HttpResponse, MapError> {
        trace!(url, params = query.len(), "GET");

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .map_err(|e| MapError::Transport(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response
            .bytes()
            .map_err(|e| MapError::Transport(format!("Failed to read response body: {}", e)))?
            .to_vec();

        Ok(HttpResponse {
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Recorded request: URL and query pairs.
    pub type Recorded = (String, Vec<(String, String)>);

    /// Replays queued responses in order and records every request.
    #[derive(Default)]
    pub struct MockTransport {
        responses: Mutex<VecDeque<Result<HttpResponse, MapError>>>,
        pub requests: Mutex<Vec<Recorded>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push(&self, response: Result<HttpResponse, MapError>) -> &Self {
            self.responses.lock().unwrap().push_back(response);
            self
        }

        pub fn push_json(&self, body: &str) -> &Self {
            self.push(Ok(HttpResponse {
                status: 200,
                content_type: Some("application/json;charset=UTF-8".to_string()),
                body: body.as_bytes().to_vec(),
            }))
        }

        pub fn push_png(&self, bytes: &[u8]) -> &Self {
            self.push(Ok(HttpResponse {
                status: 200,
                content_type: Some("image/png".to_string()),
                body: bytes.to_vec(),
            }))
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        pub fn request(&self, index: usize) -> Recorded {
            self.requests.lock().unwrap()[index].clone()
        }
    }

    impl HttpTransport for MockTransport {
        fn get(&self, url: &str, query: &[(&str, String)]) -> Result<HttpResponse, MapError> {
            self.requests.lock().unwrap().push((
                url.to_string(),
                query
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
            ));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(MapError::Transport("no response queued".to_string())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(content_type: Option<&str>) -> HttpResponse {
        HttpResponse {
            status: 200,
            content_type: content_type.map(str::to_string),
            body: b"{\"status\":\"0\"}".to_vec(),
        }
    }

    #[test]
    fn test_is_image() {
        assert!(response(Some("image/png")).is_image());
        assert!(response(Some("IMAGE/JPEG")).is_image());
        assert!(!response(Some("application/json")).is_image());
        assert!(!response(None).is_image());
    }

    #[test]
    fn test_body_snippet() {
        assert_eq!(response(None).body_snippet(5), "{\"sta");
    }
}
