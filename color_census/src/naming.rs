// THEORY:
// The `naming` module resolves recovered colors to human-readable names by
// querying TheColorAPI over HTTP. It is the only part of the library that
// touches the network, which keeps the compute stages synchronous and pure.
//
// Key principles:
// 1.  **One Call Per Color:** The service names a single hex code per request,
//     so a census of `k` colors costs `k` sequential lookups, answered in the
//     same order the colors were given.
// 2.  **Bounded Waiting:** Every request carries a timeout. A stalled service
//     surfaces as an error instead of hanging an analysis run.
// 3.  **Classified Failures:** Transport problems, non-success status codes
//     and bodies that do not hold a name are reported as distinct
//     `NamingError` variants so callers can tell an outage from a bad reply.

use crate::core_modules::hex::clean_hex;
use crate::error::NamingError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Identification endpoint of TheColorAPI.
pub const NAMING_ENDPOINT: &str = "https://www.thecolorapi.com/id";

const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Configuration for the naming client, allowing for tunable behavior.
#[derive(Debug, Clone)]
pub struct NamingConfig {
    /// Base URL queried for color names.
    pub endpoint: String,
    /// Budget for one lookup, connection included.
    pub timeout: Duration,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            endpoint: NAMING_ENDPOINT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// The fields of a naming response the census cares about.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedColor {
    pub name: ColorName,
    pub rgb: ColorValue,
    pub hsl: ColorValue,
    pub hsv: ColorValue,
    pub image: Swatch,
}

/// Name block of a naming response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorName {
    /// Human-readable name, e.g. `Cerulean`.
    pub value: String,
    /// Hex code of the named color the queried one is closest to.
    pub closest_named_hex: String,
    /// Whether the queried color carries that name exactly.
    pub exact_match_name: bool,
}

/// One color-space rendering, preformatted by the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorValue {
    /// Display string, e.g. `rgb(2, 164, 211)`.
    pub value: String,
}

/// Swatch images the service renders for the color.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Swatch {
    /// URL of the unlabeled swatch.
    pub bare: String,
}

/// HTTP client for the naming service.
#[derive(Debug, Clone)]
pub struct NamingClient {
    http: reqwest::Client,
    endpoint: String,
}

impl NamingClient {
    /// Builds a client honoring the configured endpoint and timeout.
    pub fn new(config: &NamingConfig) -> Result<Self, NamingError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
        })
    }

    /// Names one color. The hex code may carry a leading '#' in any case.
    pub async fn lookup(&self, hex: &str) -> Result<NamedColor, NamingError> {
        let response = self.http.get(self.request_url(hex)).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NamingError::Status {
                code: status.as_u16(),
            });
        }
        let body = response.text().await?;
        parse_named_color(&body)
    }

    /// Names every color in order. Stops at the first failure.
    pub async fn lookup_all(&self, hexes: &[String]) -> Result<Vec<NamedColor>, NamingError> {
        let mut named = Vec::with_capacity(hexes.len());
        for hex in hexes {
            named.push(self.lookup(hex).await?);
        }
        Ok(named)
    }

    fn request_url(&self, hex: &str) -> String {
        format!("{}?format=json&hex={}", self.endpoint, clean_hex(hex))
    }
}

/// Extracts the named-color fields from a raw response body.
pub fn parse_named_color(body: &str) -> Result<NamedColor, NamingError> {
    serde_json::from_str(body).map_err(NamingError::Malformed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CERULEAN_BODY: &str = r##"{
        "hex": { "value": "#02A4D3", "clean": "02A4D3" },
        "rgb": {
            "fraction": { "r": 0.00784, "g": 0.64313, "b": 0.82745 },
            "r": 2, "g": 164, "b": 211,
            "value": "rgb(2, 164, 211)"
        },
        "hsl": {
            "fraction": { "h": 0.53748, "s": 0.98122, "l": 0.41764 },
            "h": 193, "s": 98, "l": 42,
            "value": "hsl(193, 98%, 42%)"
        },
        "hsv": {
            "fraction": { "h": 0.53748, "s": 0.99052, "v": 0.82745 },
            "h": 193, "s": 99, "v": 83,
            "value": "hsv(193, 99%, 83%)"
        },
        "name": {
            "value": "Cerulean",
            "closest_named_hex": "#02A4D3",
            "exact_match_name": true,
            "distance": 0
        },
        "cmyk": {
            "fraction": { "c": 0.99052, "m": 0.22274, "y": 0, "k": 0.17254 },
            "value": "cmyk(99, 22, 0, 17)",
            "c": 99, "m": 22, "y": 0, "k": 17
        },
        "XYZ": {
            "fraction": { "X": 0.38053, "Y": 0.52261, "Z": 0.82419 },
            "value": "XYZ(38, 52, 82)",
            "X": 38, "Y": 52, "Z": 82
        },
        "image": {
            "bare": "https://www.thecolorapi.com/id?format=svg&named=false&hex=02A4D3",
            "named": "https://www.thecolorapi.com/id?format=svg&hex=02A4D3"
        },
        "contrast": { "value": "#ffffff" },
        "_links": { "self": { "href": "/id?hex=02A4D3" } },
        "_embedded": {}
    }"##;

    #[test]
    fn parses_a_full_service_response() {
        let named = parse_named_color(CERULEAN_BODY).unwrap();
        assert_eq!(named.name.value, "Cerulean");
        assert_eq!(named.name.closest_named_hex, "#02A4D3");
        assert!(named.name.exact_match_name);
        assert_eq!(named.rgb.value, "rgb(2, 164, 211)");
        assert_eq!(named.hsl.value, "hsl(193, 98%, 42%)");
        assert_eq!(named.hsv.value, "hsv(193, 99%, 83%)");
        assert!(named.image.bare.contains("format=svg"));
    }

    #[test]
    fn missing_name_key_classifies_as_malformed() {
        let body = r##"{ "hex": { "value": "#02A4D3" } }"##;
        let err = parse_named_color(body).unwrap_err();
        assert!(matches!(err, NamingError::Malformed(_)));
    }

    #[test]
    fn non_json_body_classifies_as_malformed() {
        let err = parse_named_color("service is down for maintenance").unwrap_err();
        assert!(matches!(err, NamingError::Malformed(_)));
    }

    #[test]
    fn hash_prefix_does_not_change_the_query() {
        let client = NamingClient::new(&NamingConfig::default()).unwrap();
        assert_eq!(client.request_url("#AbCdEf"), client.request_url("abcdef"));
        assert!(client.request_url("#AbCdEf").ends_with("hex=abcdef"));
        assert!(client.request_url("02a4d3").contains("format=json"));
    }

    #[tokio::test]
    async fn unreachable_service_classifies_as_unavailable() {
        let config = NamingConfig {
            endpoint: "http://127.0.0.1:9/id".to_string(),
            timeout: Duration::from_millis(200),
        };
        let client = NamingClient::new(&config).unwrap();
        let err = client.lookup("#02a4d3").await.unwrap_err();
        assert!(matches!(err, NamingError::Unavailable(_)));
    }
}
