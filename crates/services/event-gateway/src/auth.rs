//! HTTP Basic authentication
//!
//! Two independent checks run as axum middleware: the global credentials on
//! every ingest route, and the HIKVision credentials on `/hikvision/alarm`.
//! Each check is skipped when its credentials are not configured.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use subtle::ConstantTimeEq;

use crate::api::AppState;

const REALM: &str = "Basic realm=\"NVR API\"";

/// Credentials presented in an `Authorization: Basic` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl BasicCredentials {
    /// Parse an `Authorization` header value; `None` for anything that is not
    /// well-formed Basic credentials
    pub fn parse(value: &str) -> Option<Self> {
        let (scheme, encoded) = value.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return None;
        }

        let decoded = STANDARD.decode(encoded.trim()).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (username, password) = decoded.split_once(':')?;

        Some(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(Self::parse)
    }

    /// Constant-time comparison against the expected pair
    pub fn matches(&self, username: &str, password: &str) -> bool {
        let user_ok = self.username.as_bytes().ct_eq(username.as_bytes());
        let pass_ok = self.password.as_bytes().ct_eq(password.as_bytes());
        (user_ok & pass_ok).into()
    }
}

/// Rejected request
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Unauthorized")]
    Missing,

    #[error("Unauthorized for HIKVision integration")]
    Hikvision,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::Missing => (
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, HeaderValue::from_static(REALM))],
                self.to_string(),
            )
                .into_response(),
            AuthError::Hikvision => (StatusCode::UNAUTHORIZED, self.to_string()).into_response(),
        }
    }
}

fn check(headers: &HeaderMap, username: &str, password: &str) -> bool {
    BasicCredentials::from_headers(headers)
        .map(|creds| creds.matches(username, password))
        .unwrap_or(false)
}

/// Global Basic auth, enforced when both `auth_username` and `auth_password` are set
pub async fn require_basic_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let config = &state.config;
    if config.auth_enabled()
        && !check(request.headers(), &config.auth_username, &config.auth_password)
    {
        tracing::warn!(path = %request.uri().path(), "Rejected request: invalid credentials");
        return AuthError::Missing.into_response();
    }

    next.run(request).await
}

/// HIKVision Basic auth, enforced when `hik_enabled` and `hik_username` is set
pub async fn require_hikvision_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let config = &state.config;
    if config.hik_auth_enabled()
        && !check(request.headers(), &config.hik_username, &config.hik_password)
    {
        tracing::warn!("Rejected HIKVision alarm: invalid credentials");
        return AuthError::Hikvision.into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(raw: &str) -> String {
        format!("Basic {}", STANDARD.encode(raw))
    }

    #[test]
    fn test_parse_credentials() {
        let creds = BasicCredentials::parse(&encode("admin:s3cr:et")).unwrap();
        assert_eq!(creds.username, "admin");
        assert_eq!(creds.password, "s3cr:et");

        let lower = BasicCredentials::parse(&encode("admin:").replace("Basic", "basic")).unwrap();
        assert_eq!(lower.password, "");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(BasicCredentials::parse("Bearer abc").is_none());
        assert!(BasicCredentials::parse("Basic !!!").is_none());
        assert!(BasicCredentials::parse(&encode("no-colon")).is_none());
        assert!(BasicCredentials::parse("Basic").is_none());
    }

    #[test]
    fn test_matches() {
        let creds = BasicCredentials::parse(&encode("admin:secret")).unwrap();
        assert!(creds.matches("admin", "secret"));
        assert!(!creds.matches("admin", "secret2"));
        assert!(!creds.matches("root", "secret"));
    }

    #[test]
    fn test_from_headers() {
        let mut headers = HeaderMap::new();
        assert!(BasicCredentials::from_headers(&headers).is_none());

        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&encode("hik:pass")).unwrap(),
        );
        assert!(check(&headers, "hik", "pass"));
        assert!(!check(&headers, "hik", "other"));
    }

    #[test]
    fn test_error_responses() {
        let response = AuthError::Missing.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers().get(header::WWW_AUTHENTICATE).unwrap(), REALM);

        let response = AuthError::Hikvision.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
    }
}
