//! Rate-limited, retrying HTTP client for the management API

use crate::config::{Auth, ClientConfig};
use hemmer_config_generator_common::{FetchError, GeneratorError, ManagementApi, Record, Result};
use reqwest::blocking::{Client, ClientBuilder, RequestBuilder};
use reqwest::StatusCode;
use serde_json::Value;
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Blocking management API client
///
/// Every request waits out the configured minimum interval since the previous
/// one, then is retried with exponential backoff on transport errors and
/// HTTP 429.
pub struct ApiClient {
    http: Client,
    config: ClientConfig,
    last_request: Mutex<Option<Instant>>,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = ClientBuilder::new()
            .timeout(config.request_timeout)
            .danger_accept_invalid_certs(config.insecure_skip_verify)
            .user_agent(concat!("hemmer-config-generator/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GeneratorError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            config,
            last_request: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Query the API version from the about endpoint
    ///
    /// Returns `None` when the response has no such field.
    pub fn api_version(
        &self,
        about_path: &str,
        version_field: &str,
    ) -> std::result::Result<Option<String>, FetchError> {
        let url = self.config.root_url(about_path);
        let body = self.get_json(&url)?;
        let (records, _) = unwrap_envelope(&url, body)?;

        Ok(records
            .first()
            .and_then(|r| r.get(version_field))
            .and_then(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            }))
    }

    /// Enforce the minimum interval between requests
    fn rate_limit(&self) {
        let mut last = self
            .last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.config.request_min_interval {
                thread::sleep(self.config.request_min_interval - elapsed);
            }
        }
        *last = Some(Instant::now());
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.auth {
            Auth::Bearer(token) => request.bearer_auth(token),
            Auth::Basic { username, password } => request.basic_auth(username, Some(password)),
        }
    }

    /// GET a URL and parse the JSON body, retrying where it makes sense
    fn get_json(&self, url: &str) -> std::result::Result<Value, FetchError> {
        let attempts = self.config.retries.saturating_add(1);
        let mut wait = self.config.retry_min_interval;
        let mut last_failure = String::new();

        for attempt in 1..=attempts {
            self.rate_limit();
            debug!("GET {} (attempt {}/{})", url, attempt, attempts);

            match self.authorize(self.http.get(url)).send() {
                Err(e) => {
                    last_failure = e.to_string();
                    warn!("GET {} failed: {}", url, last_failure);
                }
                Ok(response) => {
                    let status = response.status();
                    match status {
                        StatusCode::TOO_MANY_REQUESTS => {
                            last_failure = format!("status {}", status);
                            debug!("GET {} throttled", url);
                        }
                        StatusCode::NOT_FOUND => return Err(FetchError::NotFound),
                        // the API reports object errors as 400 with a JSON body
                        StatusCode::OK | StatusCode::BAD_REQUEST => {
                            let text = response.text().map_err(|e| {
                                FetchError::Other(format!("Failed to read response from {}: {}", url, e))
                            })?;
                            return serde_json::from_str(&text).map_err(|e| {
                                FetchError::Other(format!(
                                    "Could not parse response from {}: {}; body was:\n{}",
                                    url, e, text
                                ))
                            });
                        }
                        _ => {
                            let body = response.text().unwrap_or_default();
                            return Err(FetchError::Other(format!(
                                "Unexpected status {} from GET {}, body:\n{}",
                                status, url, body
                            )));
                        }
                    }
                }
            }

            if attempt < attempts {
                thread::sleep(wait);
                wait = backoff(wait, self.config.retry_max_interval);
            }
        }

        Err(FetchError::Other(format!(
            "GET {} failed after {} attempt(s): {}",
            url, attempts, last_failure
        )))
    }
}

impl ManagementApi for ApiClient {
    fn fetch(&self, path: &str) -> std::result::Result<Vec<Record>, FetchError> {
        let mut url = self.config.object_url(path);
        let mut records = Vec::new();

        loop {
            let body = self.get_json(&url)?;
            let (page, next) = unwrap_envelope(&url, body)?;
            records.extend(page);

            match next {
                Some(next) => url = self.absolute(&next),
                None => break,
            }
        }

        debug!("{} record(s) at {}", records.len(), path);
        Ok(records)
    }
}

impl ApiClient {
    fn absolute(&self, uri: &str) -> String {
        if uri.starts_with("http://") || uri.starts_with("https://") {
            uri.to_string()
        } else {
            self.config.root_url(uri)
        }
    }
}

/// Split a response into its records and the next page URI
fn unwrap_envelope(
    url: &str,
    body: Value,
) -> std::result::Result<(Vec<Record>, Option<String>), FetchError> {
    let meta = body.get("meta");
    let error = meta.and_then(|m| m.get("error"));

    if let Some(error) = error {
        let status = error.get("status").and_then(Value::as_str).unwrap_or_default();
        if status == "NOT_FOUND" {
            return Err(FetchError::NotFound);
        }
        let description = error
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default();
        return Err(FetchError::Other(format!(
            "Request to {} failed: {} {}",
            url, description, status
        )));
    }

    let next = meta
        .and_then(|m| m.get("paging"))
        .and_then(|p| p.get("nextPageUri"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from);

    let records = match body.get("data") {
        Some(Value::Object(record)) => vec![record.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::Object(record) => Ok(record.clone()),
                other => Err(FetchError::Other(format!(
                    "Expected objects in data from {}, found {}",
                    url, other
                ))),
            })
            .collect::<std::result::Result<_, _>>()?,
        Some(Value::Null) | None => {
            return Err(FetchError::Other(format!("Response from {} has no data", url)))
        }
        Some(other) => {
            return Err(FetchError::Other(format!(
                "Unexpected data from {}: {}",
                url, other
            )))
        }
    };

    Ok((records, next))
}

/// Next retry wait: doubled, capped at `max`
fn backoff(wait: Duration, max: Duration) -> Duration {
    wait.saturating_mul(2).min(max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_single_and_list() {
        let (records, next) =
            unwrap_envelope("u", json!({"data": {"name": "a"}, "meta": {"responseCode": 200}}))
                .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(next, None);

        let (records, next) = unwrap_envelope(
            "u",
            json!({"data": [{"name": "a"}, {"name": "b"}],
                   "meta": {"paging": {"nextPageUri": "/next?cursor=x"}}}),
        )
        .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(next.as_deref(), Some("/next?cursor=x"));
    }

    #[test]
    fn test_envelope_not_found_status() {
        let err = unwrap_envelope(
            "u",
            json!({"meta": {"error": {"status": "NOT_FOUND", "description": "no"}, "responseCode": 400}}),
        )
        .unwrap_err();
        assert_eq!(err, FetchError::NotFound);

        let err = unwrap_envelope(
            "u",
            json!({"meta": {"error": {"status": "UNAUTHORIZED", "description": "bad creds"}}}),
        )
        .unwrap_err();
        assert!(matches!(err, FetchError::Other(m) if m.contains("bad creds")));
    }

    #[test]
    fn test_backoff_caps_at_max() {
        let max = Duration::from_secs(30);
        assert_eq!(backoff(Duration::from_secs(3), max), Duration::from_secs(6));
        assert_eq!(backoff(Duration::from_secs(20), max), max);
        assert_eq!(backoff(Duration::MAX, Duration::MAX), Duration::MAX);
    }
}
