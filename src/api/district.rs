use serde::Deserialize;
use tracing::{debug, info};

use super::ProviderStatus;
use super::http::HttpTransport;
use crate::domain::{Coordinate, Region};
use crate::error::MapError;

pub const DISTRICT_URL: &str = "https://restapi.amap.com/v3/config/district";

/// Resolves a free-text region name to a region with its boundary.
pub trait RegionResolver {
    fn resolve(&self, name: &str) -> Result<Region, MapError>;
}

#[derive(Debug, Deserialize)]
struct DistrictResponse {
    #[serde(flatten)]
    status: ProviderStatus,
    #[serde(default)]
    districts: Vec<DistrictEntry>,
}

#[derive(Debug, Deserialize)]
struct DistrictEntry {
    name: String,
    #[serde(default)]
    adcode: String,
    #[serde(default)]
    center: String,
    #[serde(default)]
    level: Option<String>,
    #[serde(default)]
    polyline: Option<String>,
}

/// District search against the AMap web service.
///
/// Requests `extensions=all` so the first match carries its boundary
/// polyline.
pub struct AmapDistrictResolver<T: HttpTransport> {
    transport: T,
    key: String,
    url: String,
}

impl<T: HttpTransport> AmapDistrictResolver<T> {
    pub fn new(transport: T, key: impl Into<String>) -> Self {
        Self {
            transport,
            key: key.into(),
            url: DISTRICT_URL.to_string(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

impl<T: HttpTransport> RegionResolver for AmapDistrictResolver<T> {
    fn resolve(&self, name: &str) -> Result<Region, MapError> {
        let query = [
            ("key", self.key.clone()),
            ("keywords", name.to_string()),
            ("subdistrict", "1".to_string()),
            ("extensions", "all".to_string()),
        ];

        let response = self.transport.get(&self.url, &query)?;
        let region = parse_district_response(&response.body, name)?;

        info!(
            name = %region.name,
            adcode = %region.adcode,
            has_boundary = region.polyline.is_some(),
            "resolved region"
        );
        Ok(region)
    }
}

fn parse_district_response(body: &[u8], query: &str) -> Result<Region, MapError> {
    let response: DistrictResponse = serde_json::from_slice(body).map_err(|e| {
        MapError::InvalidResponse(format!("Failed to parse district response: {}", e))
    })?;

    response.status.check()?;

    let entry = response
        .districts
        .into_iter()
        .next()
        .ok_or_else(|| MapError::RegionNotFound(query.to_string()))?;

    debug!(
        name = %entry.name,
        polyline_len = entry.polyline.as_deref().map_or(0, str::len),
        "district entry"
    );

    Ok(Region {
        center: Coordinate::parse(&entry.center),
        polyline: entry.polyline.filter(|p| !p.trim().is_empty()),
        name: entry.name,
        adcode: entry.adcode,
        level: entry.level,
    })
}
