// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};

use crate::error::{AppError, Result};
use crate::models::ApiConfig;

/// Create a configured asynchronous HTTP client.
///
/// The bearer token, when configured, is attached to every request.
pub fn create_async_client(config: &ApiConfig) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    if let Some(token) = config.auth_token.as_deref().filter(|t| !t.is_empty()) {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| AppError::config(format!("invalid auth token: {e}")))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .default_headers(headers)
        .build()?;
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_client_with_and_without_token() {
        let mut config = ApiConfig::default();
        assert!(create_async_client(&config).is_ok());

        config.auth_token = Some("abc.def".into());
        assert!(create_async_client(&config).is_ok());
    }

    #[test]
    fn rejects_token_with_control_characters() {
        let config = ApiConfig {
            auth_token: Some("bad\ntoken".into()),
            ..ApiConfig::default()
        };
        assert!(matches!(
            create_async_client(&config),
            Err(AppError::Config(_))
        ));
    }
}
