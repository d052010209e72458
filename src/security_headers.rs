use std::sync::Arc;

use axum::extract::State;
use axum::http::header::{self, HeaderName};
use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;

use crate::config::SecurityConfig;
use crate::models::error::StartupError;

/// Baseline response headers added to every response that does not already set them.
#[derive(Debug, Clone)]
pub struct SecurityHeaders {
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl SecurityHeaders {
    pub fn from_config(config: &SecurityConfig) -> Result<Self, StartupError> {
        let permissions_policy =
            HeaderValue::from_str(&config.permissions_policy).map_err(|e| {
                StartupError::InvalidConfig {
                    message: format!("Invalid permissions policy: {e}"),
                }
            })?;

        let headers = vec![
            (
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ),
            (header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY")),
            (
                header::REFERRER_POLICY,
                HeaderValue::from_static("no-referrer"),
            ),
            (
                header::STRICT_TRANSPORT_SECURITY,
                HeaderValue::from_static("max-age=63072000; includeSubDomains"),
            ),
            (
                header::CONTENT_SECURITY_POLICY,
                HeaderValue::from_static("default-src 'self'"),
            ),
            (
                HeaderName::from_static("cross-origin-opener-policy"),
                HeaderValue::from_static("same-origin"),
            ),
            (
                HeaderName::from_static("permissions-policy"),
                permissions_policy,
            ),
        ];

        Ok(Self { headers })
    }

    pub fn iter(&self) -> impl Iterator<Item = &(HeaderName, HeaderValue)> {
        self.headers.iter()
    }
}

pub async fn apply<B>(
    State(security): State<Arc<SecurityHeaders>>,
    req: Request<B>,
    next: Next<B>,
) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    for (name, value) in security.iter() {
        if !headers.contains_key(name) {
            headers.insert(name.clone(), value.clone());
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn includes_configured_permissions_policy() {
        let headers = SecurityHeaders::from_config(&SecurityConfig {
            permissions_policy: "geolocation=(self)".to_string(),
        })
        .unwrap();
        let policy = headers
            .iter()
            .find(|(name, _)| name.as_str() == "permissions-policy")
            .map(|(_, value)| value.clone());
        assert_eq!(policy, Some(HeaderValue::from_static("geolocation=(self)")));
    }

    #[test]
    fn rejects_unencodable_policy() {
        let result = SecurityHeaders::from_config(&SecurityConfig {
            permissions_policy: "geolocation=()\n".to_string(),
        });
        assert!(result.is_err());
    }
}
