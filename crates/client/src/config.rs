//! Connection settings for the management API client

use hemmer_config_generator_common::{GeneratorError, Result};
use std::time::Duration;

pub const DEFAULT_RETRIES: u32 = 10;
pub const DEFAULT_RETRY_MIN_INTERVAL: Duration = Duration::from_secs(3);
pub const DEFAULT_RETRY_MAX_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_REQUEST_MIN_INTERVAL: Duration = Duration::from_millis(100);

/// Credentials sent with every request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Auth {
    Bearer(String),
    Basic { username: String, password: String },
}

impl Auth {
    /// Pick the credentials to use; a bearer token wins over basic auth
    pub fn from_credentials(
        username: Option<String>,
        password: Option<String>,
        bearer_token: Option<String>,
    ) -> Result<Self> {
        match (bearer_token.filter(|t| !t.is_empty()), username.filter(|u| !u.is_empty())) {
            (Some(token), _) => Ok(Auth::Bearer(token)),
            (None, Some(username)) => Ok(Auth::Basic {
                username,
                password: password.unwrap_or_default(),
            }),
            (None, None) => Err(GeneratorError::Config(
                "either a username or a bearer token must be provided".to_string(),
            )),
        }
    }
}

/// Everything needed to talk to one management API endpoint
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Scheme, host and port (e.g., "https://broker:1943")
    pub url: String,
    /// Prefix of every object path (e.g., "/SEMP/v2/config")
    pub base_path: String,
    pub auth: Auth,
    /// Extra attempts after the first on transport errors and HTTP 429
    pub retries: u32,
    pub retry_min_interval: Duration,
    pub retry_max_interval: Duration,
    pub request_timeout: Duration,
    /// Minimum spacing between consecutive requests
    pub request_min_interval: Duration,
    pub insecure_skip_verify: bool,
}

impl ClientConfig {
    pub fn new(url: impl Into<String>, base_path: impl Into<String>, auth: Auth) -> Self {
        Self {
            url: url.into(),
            base_path: base_path.into(),
            auth,
            retries: DEFAULT_RETRIES,
            retry_min_interval: DEFAULT_RETRY_MIN_INTERVAL,
            retry_max_interval: DEFAULT_RETRY_MAX_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            request_min_interval: DEFAULT_REQUEST_MIN_INTERVAL,
            insecure_skip_verify: false,
        }
    }

    /// URL of an object path under the base path
    pub fn object_url(&self, path: &str) -> String {
        format!("{}{}{}", self.url.trim_end_matches('/'), self.base_path, path)
    }

    /// URL of a path directly under the connection URL
    pub fn root_url(&self, path: &str) -> String {
        format!("{}{}", self.url.trim_end_matches('/'), path)
    }
}

/// Parse a duration like `100ms`, `3s`, `1m` or `1h`
///
/// Supported units are `ns`, `us`, `ms`, `s`, `m` and `h`; a bare `0` is
/// also accepted. Fractions are allowed (`1.5s`).
///
/// # Examples
///
/// ```
/// use hemmer_config_generator_client::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("100ms").unwrap(), Duration::from_millis(100));
/// assert_eq!(parse_duration("1m").unwrap(), Duration::from_secs(60));
/// ```
pub fn parse_duration(text: &str) -> Result<Duration> {
    let invalid = || GeneratorError::Config(format!("invalid duration '{}'", text));

    let text = text.trim();
    if text == "0" {
        return Ok(Duration::ZERO);
    }

    let split = text
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .ok_or_else(invalid)?;
    let (number, unit) = text.split_at(split);

    let nanos_per_unit: u64 = match unit {
        "ns" => 1,
        "us" | "µs" => 1_000,
        "ms" => 1_000_000,
        "s" => 1_000_000_000,
        "m" => 60_000_000_000,
        "h" => 3_600_000_000_000,
        _ => return Err(invalid()),
    };

    if let Ok(whole) = number.parse::<u64>() {
        return whole
            .checked_mul(nanos_per_unit)
            .map(Duration::from_nanos)
            .ok_or_else(invalid);
    }

    let fractional: f64 = number.parse().map_err(|_| invalid())?;
    Duration::try_from_secs_f64(fractional * nanos_per_unit as f64 / 1e9).map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("3s").unwrap(), Duration::from_secs(3));
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("1m").unwrap(), Duration::from_secs(60));
        assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7200));
        assert_eq!(parse_duration("100ms").unwrap(), Duration::from_millis(100));
        assert_eq!(parse_duration("250us").unwrap(), Duration::from_micros(250));
        assert_eq!(parse_duration("1.5s").unwrap(), Duration::from_millis(1500));
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("ms").is_err());
        assert!(parse_duration("5d").is_err());
        assert!(parse_duration("-1s").is_err());
    }

    #[test]
    fn test_bearer_token_preferred() {
        let auth = Auth::from_credentials(
            Some("admin".into()),
            Some("secret".into()),
            Some("tok".into()),
        )
        .unwrap();
        assert_eq!(auth, Auth::Bearer("tok".into()));

        let auth = Auth::from_credentials(Some("admin".into()), None, Some(String::new())).unwrap();
        assert_eq!(
            auth,
            Auth::Basic {
                username: "admin".into(),
                password: String::new()
            }
        );

        assert!(matches!(
            Auth::from_credentials(None, Some("secret".into()), None),
            Err(GeneratorError::Config(_))
        ));
    }

    #[test]
    fn test_urls() {
        let config = ClientConfig::new("http://localhost:8080/", "/SEMP/v2/config", Auth::Bearer("t".into()));
        assert_eq!(
            config.object_url("/msgVpns/default"),
            "http://localhost:8080/SEMP/v2/config/msgVpns/default"
        );
        assert_eq!(config.root_url("/SEMP/v2/about/api"), "http://localhost:8080/SEMP/v2/about/api");
    }
}
