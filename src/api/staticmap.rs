use tracing::{debug, warn};

use super::ProviderStatus;
use super::http::{HttpResponse, HttpTransport};
use crate::domain::{MapImage, MapRequestParams};
use crate::error::MapError;

pub const STATIC_MAP_URL: &str = "https://restapi.amap.com/v3/staticmap";

/// Static map image client. One GET per call, no retries.
pub struct StaticMapClient<T: HttpTransport> {
    transport: T,
    key: String,
    endpoint: String,
    max_url_length: usize,
    overhead: usize,
}

impl<T: HttpTransport> StaticMapClient<T> {
    pub fn new(
        transport: T,
        key: impl Into<String>,
        max_url_length: usize,
        overhead: usize,
    ) -> Self {
        Self {
            transport,
            key: key.into(),
            endpoint: STATIC_MAP_URL.to_string(),
            max_url_length,
            overhead,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetch one map image.
    ///
    /// Success is decided by the response content type, not the HTTP
    /// status: the provider answers some failures with 200 and a JSON body.
    pub fn fetch(&self, params: &MapRequestParams) -> Result<MapImage, MapError> {
        let length = params.estimated_length(&self.endpoint, self.overhead);
        if length > self.max_url_length {
            return Err(MapError::RequestTooLarge {
                length,
                ceiling: self.max_url_length,
            });
        }

        debug!(
            size = %params.size,
            zoom = ?params.zoom(),
            has_paths = params.paths().is_some(),
            estimated_length = length,
            "requesting static map"
        );

        let response = self.transport.get(&self.endpoint, &params.to_query(&self.key))?;
        classify(response)
    }
}

fn classify(response: HttpResponse) -> Result<MapImage, MapError> {
    if response.is_image() {
        return Ok(MapImage {
            content_type: response.content_type.unwrap_or_default(),
            bytes: response.body,
        });
    }

    if let Ok(status) = serde_json::from_slice::<ProviderStatus>(&response.body) {
        let err = status.to_error();
        warn!(%err, "static map request rejected");
        return Err(err);
    }

    Err(MapError::InvalidResponse(format!(
        "HTTP {} with content type {:?}: {}",
        response.status,
        response.content_type.as_deref().unwrap_or("none"),
        response.body_snippet(200)
    )))
}
