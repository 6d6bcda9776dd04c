//! Weather forecast port.

use scribe_types::error::ForecastError;

/// Port for the external weather API.
///
/// Returns the raw forecast payload; the tool result passes it to the model
/// unmodified. Implementations live in scribe-infra.
pub trait ForecastClient: Send + Sync {
    fn fetch(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> impl std::future::Future<Output = Result<serde_json::Value, ForecastError>> + Send;
}
