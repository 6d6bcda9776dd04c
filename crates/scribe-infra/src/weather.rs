//! Open-Meteo forecast adapter.

use scribe_core::weather::ForecastClient;
use scribe_types::error::ForecastError;

const DEFAULT_BASE_URL: &str = "https://api.open-meteo.com";

/// Forecast client backed by the Open-Meteo API.
pub struct OpenMeteoClient {
    client: reqwest::Client,
    base_url: String,
}

impl OpenMeteoClient {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn forecast_url(&self, latitude: f64, longitude: f64) -> String {
        format!(
            "{}/v1/forecast?latitude={latitude}&longitude={longitude}&current=temperature_2m&hourly=temperature_2m&daily=sunrise,sunset&timezone=auto",
            self.base_url
        )
    }
}

impl Default for OpenMeteoClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ForecastClient for OpenMeteoClient {
    async fn fetch(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<serde_json::Value, ForecastError> {
        let response = self
            .client
            .get(self.forecast_url(latitude, longitude))
            .send()
            .await
            .map_err(|e| ForecastError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ForecastError::Http(format!("HTTP {status}: {body}")));
        }

        response
            .json()
            .await
            .map_err(|e| ForecastError::Deserialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forecast_url_query_parameters() {
        let client = OpenMeteoClient::new();
        let url = client.forecast_url(52.52, 13.405);
        assert!(url.starts_with("https://api.open-meteo.com/v1/forecast?"));
        assert!(url.contains("latitude=52.52"));
        assert!(url.contains("longitude=13.405"));
        assert!(url.contains("current=temperature_2m"));
        assert!(url.contains("daily=sunrise,sunset"));
        assert!(url.contains("timezone=auto"));
    }
}
