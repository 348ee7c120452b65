pub mod district;
pub mod http;
pub mod staticmap;

pub use district::{AmapDistrictResolver, DISTRICT_URL, RegionResolver};
pub use http::{HttpResponse, HttpTransport, ReqwestTransport};
pub use staticmap::{STATIC_MAP_URL, StaticMapClient};

use serde::{Deserialize, Deserializer};

use crate::error::MapError;

/// Status envelope shared by every AMap web service response.
#[derive(Debug, Deserialize)]
pub(crate) struct ProviderStatus {
    status: String,
    #[serde(default)]
    info: String,
    #[serde(default, deserialize_with = "code_from_string_or_number")]
    infocode: u32,
}

impl ProviderStatus {
    /// `status` is "1" on success and "0" otherwise.
    pub(crate) fn check(&self) -> Result<(), MapError> {
        if self.status == "1" {
            Ok(())
        } else {
            Err(self.to_error())
        }
    }

    pub(crate) fn to_error(&self) -> MapError {
        MapError::Provider {
            code: self.infocode,
            message: if self.info.is_empty() {
                "unknown provider error".to_string()
            } else {
                self.info.clone()
            },
        }
    }
}

fn code_from_string_or_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Code {
        Number(u32),
        Text(String),
    }

    Ok(match Code::deserialize(deserializer)? {
        Code::Number(n) => n,
        Code::Text(s) => s.trim().parse().unwrap_or(0),
    })
}
