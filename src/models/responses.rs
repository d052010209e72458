use serde::Serialize;

use crate::models::location::LocationRecord;

/// Body of a successful ingestion.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
    pub success: bool,
    pub message: &'static str,
    pub redirect_url: Option<String>,
}

impl IngestResponse {
    pub fn stored(redirect_url: Option<String>) -> Self {
        Self {
            success: true,
            message: "Location stored successfully",
            redirect_url,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LocationListing {
    pub count: usize,
    pub locations: Vec<LocationRecord>,
}

impl From<Vec<LocationRecord>> for LocationListing {
    fn from(locations: Vec<LocationRecord>) -> Self {
        Self {
            count: locations.len(),
            locations,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub count: u64,
}
