use std::net::IpAddr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr, PickFirst};
use uuid::Uuid;

use crate::models::error::AppError;

/// A stored geolocation observation.
///
/// `id`, `ip_address` and `created_at` are always assigned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRecord {
    pub id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
    pub timestamp: DateTime<Utc>,
    pub user_agent: Option<String>,
    pub ip_address: IpAddr,
    pub created_at: DateTime<Utc>,
}

/// Observation as submitted by the browser.
///
/// Numbers may arrive either as JSON numbers or as numeric strings. Any other
/// field in the body (`ipAddress`, `createdAt`, ...) is ignored.
#[serde_as]
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingLocation {
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub latitude: Option<f64>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub longitude: Option<f64>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub accuracy: Option<f64>,
    pub timestamp: Option<String>,
    pub user_agent: Option<String>,
}

/// Validation policy applied to incoming observations.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationPolicy {
    pub enforce_coordinate_bounds: bool,
}

impl IncomingLocation {
    /// Validates the observation and enriches it with server-side metadata.
    pub fn into_record(
        self,
        policy: ValidationPolicy,
        ip_address: IpAddr,
        created_at: DateTime<Utc>,
    ) -> Result<LocationRecord, AppError> {
        let (latitude, longitude) = match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => (lat, lon),
            _ => {
                return Err(AppError::BadRequest(
                    "Missing required fields: latitude and longitude".to_string(),
                ))
            }
        };

        check_finite("latitude", latitude)?;
        check_finite("longitude", longitude)?;
        if let Some(accuracy) = self.accuracy {
            check_finite("accuracy", accuracy)?;
        }

        if policy.enforce_coordinate_bounds {
            check_bounds(latitude, longitude)?;
        }

        let timestamp = match self.timestamp.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => parse_timestamp(raw)?,
            _ => created_at,
        };

        Ok(LocationRecord {
            id: Uuid::new_v4(),
            latitude,
            longitude,
            accuracy: self.accuracy,
            timestamp,
            user_agent: self.user_agent,
            ip_address,
            created_at,
        })
    }
}

fn check_finite(field: &str, value: f64) -> Result<(), AppError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("{field} must be a finite number")))
    }
}

fn check_bounds(latitude: f64, longitude: f64) -> Result<(), AppError> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(AppError::OutOfRange(format!(
            "latitude {latitude} is outside [-90, 90]"
        )));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(AppError::OutOfRange(format!(
            "longitude {longitude} is outside [-180, 180]"
        )));
    }
    Ok(())
}

/// Parses an ISO-8601 instant. Values without an offset are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, AppError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    Err(AppError::MalformedTimestamp(raw.to_string()))
}
