//! Shared HTTP plumbing for the news search providers.

use std::time::Duration;

use crate::config::ConfigError;

use super::ProviderError;

/// User agent sent to news APIs. Google News rejects blank agents.
pub(crate) const USER_AGENT: &str = concat!("veracity/", env!("CARGO_PKG_VERSION"));

/// Build a client whose own timeout backs up the adapter deadline.
pub(crate) fn build_client(id: &str, timeout: Duration) -> Result<reqwest::Client, ConfigError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| ConfigError::ProviderInit {
            id: id.to_string(),
            reason: e.to_string(),
        })
}

/// Map a transport error, keeping timeouts distinct.
pub(crate) fn transport_error(e: reqwest::Error, timeout: Duration) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(timeout)
    } else {
        ProviderError::Http(e.to_string())
    }
}

/// Turn 429 and other non-2xx statuses into errors.
///
/// The error message is the first 200 characters of the body.
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs);
        return Err(ProviderError::RateLimited { retry_after });
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::Api {
            status: status.as_u16(),
            message: veracity_core::normalize::truncate_chars(body.trim(), 200).to_string(),
        });
    }

    Ok(response)
}

/// Read `options[key]` as a positive integer, else `default`.
pub(crate) fn option_usize(options: &serde_json::Value, key: &str, default: usize) -> usize {
    options[key]
        .as_u64()
        .filter(|v| *v > 0)
        .map(|v| v as usize)
        .unwrap_or(default)
}

/// Read `options[key]` as a string, else `default`.
pub(crate) fn option_str(options: &serde_json::Value, key: &str, default: &str) -> String {
    options[key].as_str().unwrap_or(default).to_string()
}

/// Reject a `base_url` option that is not http(s).
pub(crate) fn validate_base_url(options: &serde_json::Value) -> Result<(), ConfigError> {
    if let Some(url) = options["base_url"].as_str() {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::Invalid(format!(
                "base_url must start with http:// or https://, got '{}'",
                url
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_helpers() {
        let options = serde_json::json!({ "max_results": 3, "hl": "en-US", "zero": 0 });
        assert_eq!(option_usize(&options, "max_results", 10), 3);
        assert_eq!(option_usize(&options, "zero", 10), 10);
        assert_eq!(option_usize(&options, "missing", 10), 10);
        assert_eq!(option_str(&options, "hl", "en-IN"), "en-US");
        assert_eq!(option_str(&serde_json::Value::Null, "hl", "en-IN"), "en-IN");
    }

    #[test]
    fn test_validate_base_url() {
        assert!(validate_base_url(&serde_json::json!({ "base_url": "ftp://x" })).is_err());
        assert!(validate_base_url(&serde_json::json!({ "base_url": "https://x" })).is_ok());
        assert!(validate_base_url(&serde_json::Value::Null).is_ok());
    }
}
