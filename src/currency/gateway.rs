use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use super::CurrencyCode;
use crate::domain::Money;

/// Default upper bound on a single rate-provider call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Failures of a conversion request.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// The gateway lacks its credential or endpoint. No request was sent.
    #[error("Exchange rate API is not configured: {0}")]
    Configuration(&'static str),

    /// The request could not complete (DNS, connect, timeout, reset).
    #[error("Error while calling the exchange rate API: {0}")]
    Transport(#[source] reqwest::Error),

    /// The provider answered, but not with a usable conversion.
    #[error("Failed to fetch exchange rate: {0}")]
    Upstream(String),
}

/// Rate provider settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub api_key: Option<String>,
    /// Base URL, e.g. `https://v6.exchangerate-api.com/v6/`.
    pub base_url: Option<String>,
    pub timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PairConversion {
    conversion_result: f64,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    #[serde(rename = "error-type")]
    error_type: String,
}

/// Converts amounts through the exchange-rate provider's pair endpoint.
///
/// One request per call: no retries and no rate caching. The provider's
/// `conversion_result` is returned as-is, without rounding to the target
/// currency's precision.
pub struct CurrencyGateway {
    client: reqwest::Client,
    config: GatewayConfig,
}

impl CurrencyGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, ConversionError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .build()
            .map_err(|error| {
                warn!(error = %error, "failed to build HTTP client");
                ConversionError::Configuration("HTTP client could not be built")
            })?;
        Ok(Self { client, config })
    }

    /// Build the pair-conversion URL. Fails before any I/O when the gateway
    /// is not configured.
    pub fn request_url(
        &self,
        amount: Money,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Result<String, ConversionError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(ConversionError::Configuration(
                "API key is not set in the environment variables",
            ))?;
        let base_url = self
            .config
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or(ConversionError::Configuration(
                "API URL is not set in the environment variables",
            ))?;

        Ok(format!(
            "{}/{}/pair/{}/{}/{}",
            base_url.trim_end_matches('/'),
            api_key,
            from,
            to,
            amount.normalize()
        ))
    }

    /// Convert `amount` from one currency to another.
    #[instrument(skip(self), fields(from = %from, to = %to, amount = %amount))]
    pub async fn convert(
        &self,
        amount: Money,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Result<f64, ConversionError> {
        let url = self.request_url(amount, from, to)?;

        // The URL carries the API key, keep it out of error messages
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|error| ConversionError::Transport(error.without_url()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| ConversionError::Transport(error.without_url()))?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ProviderError>(&body)
                .map(|e| format!("HTTP code {} ({})", status.as_u16(), e.error_type))
                .unwrap_or_else(|_| format!("HTTP code {}", status.as_u16()));
            warn!(status = status.as_u16(), "rate provider rejected request");
            return Err(ConversionError::Upstream(detail));
        }

        let conversion: PairConversion = serde_json::from_str(&body).map_err(|error| {
            ConversionError::Upstream(format!("Invalid response from the API: {}", error))
        })?;

        debug!(result = conversion.conversion_result, "conversion received");
        Ok(conversion.conversion_result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn code(s: &str) -> CurrencyCode {
        s.parse().unwrap()
    }

    fn gateway(api_key: Option<&str>, base_url: Option<&str>) -> CurrencyGateway {
        CurrencyGateway::new(GatewayConfig {
            api_key: api_key.map(String::from),
            base_url: base_url.map(String::from),
            timeout: Duration::from_millis(200),
        })
        .unwrap()
    }

    #[test]
    fn test_new_needs_no_credentials() {
        let gw = CurrencyGateway::new(GatewayConfig::default());
        assert!(gw.is_ok());
    }

    #[test]
    fn test_request_url() {
        let gw = gateway(Some("secret"), Some("https://rates.example/v6/"));
        let url = gw
            .request_url(Decimal::new(10050, 2), &code("DKK"), &code("USD"))
            .unwrap();
        assert_eq!(url, "https://rates.example/v6/secret/pair/DKK/USD/100.5");
    }

    #[test]
    fn test_request_url_without_trailing_slash() {
        let gw = gateway(Some("secret"), Some("https://rates.example/v6"));
        let url = gw
            .request_url(Decimal::new(100, 0), &code("USD"), &code("DKK"))
            .unwrap();
        assert_eq!(url, "https://rates.example/v6/secret/pair/USD/DKK/100");
    }

    #[test]
    fn test_missing_key_is_configuration_error() {
        let gw = gateway(None, Some("https://rates.example/v6/"));
        let err = gw
            .request_url(Decimal::ONE, &code("DKK"), &code("USD"))
            .unwrap_err();
        assert!(matches!(err, ConversionError::Configuration(_)));
    }

    #[test]
    fn test_blank_key_is_configuration_error() {
        let gw = gateway(Some("   "), Some("https://rates.example/v6/"));
        let err = gw
            .request_url(Decimal::ONE, &code("DKK"), &code("USD"))
            .unwrap_err();
        assert!(matches!(err, ConversionError::Configuration(_)));
    }

    #[test]
    fn test_missing_url_is_configuration_error() {
        let gw = gateway(Some("secret"), None);
        let err = gw
            .request_url(Decimal::ONE, &code("DKK"), &code("USD"))
            .unwrap_err();
        assert!(matches!(err, ConversionError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_convert_without_key_sends_nothing() {
        // TEST-NET-1 is unroutable; reaching the network would time out, not
        // fail with a configuration error
        let gw = gateway(None, Some("http://192.0.2.1:80/"));
        let err = gw
            .convert(Decimal::ONE, &code("DKK"), &code("USD"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConversionError::Configuration(_)));
    }
}
