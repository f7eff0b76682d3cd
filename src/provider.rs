//! Open-Meteo forecast client.
//!
//! The provider's payload is consumed, not modelled: [`RawForecastResponse`]
//! keeps the `current` and `daily` blocks as loose JSON and the normalizer
//! decides what is usable.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::ProviderCfg;
use crate::error::{EngineError, EngineResult, FetchError};

const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,apparent_temperature,weather_code,wind_speed_10m,pressure_msl,visibility,dew_point_2m";
const DAILY_FIELDS: &str = "weather_code,temperature_2m_max,temperature_2m_min,uv_index_max,precipitation_probability_max,wind_speed_10m_max";

/// Provider payload as received.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawForecastResponse {
    #[serde(default)]
    pub current: Option<Value>,
    #[serde(default)]
    pub daily: Option<Value>,
    #[serde(default)]
    pub timezone: Option<Value>,
}

impl RawForecastResponse {
    pub fn from_json(body: &str) -> EngineResult<Self> {
        serde_json::from_str(body).map_err(|e| EngineError::MalformedInput(e.to_string()))
    }

    pub fn from_value(value: Value) -> EngineResult<Self> {
        serde_json::from_value(value).map_err(|e| EngineError::MalformedInput(e.to_string()))
    }
}

#[derive(Clone)]
pub struct ForecastClient {
    client: Client,
    base_url: String,
    forecast_days: u8,
}

impl ForecastClient {
    pub fn new(cfg: &ProviderCfg) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: cfg.base_url.clone(),
            forecast_days: cfg.forecast_days,
        })
    }

    pub async fn fetch(&self, latitude: f64, longitude: f64) -> Result<RawForecastResponse, FetchError> {
        let lat = latitude.to_string();
        let lon = longitude.to_string();
        let days = self.forecast_days.to_string();
        debug!(%lat, %lon, "requesting forecast");

        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("latitude", lat.as_str()),
                ("longitude", lon.as_str()),
                ("current", CURRENT_FIELDS),
                ("daily", DAILY_FIELDS),
                ("forecast_days", days.as_str()),
                ("timezone", "auto"),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        resp.json::<RawForecastResponse>().await.map_err(decode_error)
    }
}

/// A body that arrived but does not parse is bad data, not a transport failure.
fn decode_error(err: reqwest::Error) -> FetchError {
    if err.is_decode() {
        FetchError::Data(EngineError::MalformedInput(err.to_string()))
    } else {
        FetchError::Transport(err)
    }
}
