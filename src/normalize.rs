//! Turns a provider payload into a fallback-safe snapshot and daily series.

use chrono::{Days, NaiveDate};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{EngineError, EngineResult};
use crate::provider::RawForecastResponse;
use crate::weather_code::WeatherCode;

/// Current conditions ("now").
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct NormalizedWeatherSnapshot {
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub wind_kmh: f64,
    pub pressure_hpa: f64,
    pub visibility_m: f64,
    pub dew_point_c: f64,
    pub apparent_temperature_c: f64,
    pub weather_code: WeatherCode,
}

/// One day of the daily forecast.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct DailySample {
    pub date: Option<NaiveDate>,
    pub weather_code: WeatherCode,
    pub temp_max_c: f64,
    pub temp_min_c: f64,
    pub precip_prob_max_pct: f64,
    pub uv_index_max: f64,
    pub wind_max_kmh: f64,
}

impl DailySample {
    /// The substitute used for any day the provider did not report.
    pub fn fallback_for(snapshot: &NormalizedWeatherSnapshot) -> Self {
        Self {
            date: None,
            weather_code: snapshot.weather_code,
            temp_max_c: snapshot.temperature_c,
            temp_min_c: snapshot.temperature_c,
            precip_prob_max_pct: 0.0,
            uv_index_max: 0.0,
            wind_max_kmh: snapshot.wind_kmh,
        }
    }
}

/// Daily forecast indexed by day offset (0 = today). Never empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyForecastSeries {
    days: Vec<DailySample>,
    #[serde(skip)]
    fallback: DailySample,
    /// Last maximum the provider actually sent, before any substitution.
    #[serde(skip)]
    last_reported_max: Option<f64>,
}

impl DailyForecastSeries {
    /// An empty `days` list is replaced by a single fallback day. The given
    /// days count as reported; the fallback does not.
    pub fn new(mut days: Vec<DailySample>, fallback: DailySample) -> Self {
        let last_reported_max = days.last().map(|d| d.temp_max_c);
        if days.is_empty() {
            days.push(fallback);
        }
        Self { days, fallback, last_reported_max }
    }

    /// Override which maximum counts as the last reported one.
    pub fn with_last_reported_max(mut self, max_c: Option<f64>) -> Self {
        self.last_reported_max = max_c;
        self
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// Always false: a series holds at least one day. Kept alongside `len`.
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// The last `temperature_2m_max` value the provider sent, if any.
    pub fn last_reported_max(&self) -> Option<f64> {
        self.last_reported_max
    }

    pub fn days(&self) -> &[DailySample] {
        &self.days
    }

    /// The day at `offset`, or the fallback day when the provider's horizon is shorter.
    pub fn day(&self, offset: usize) -> DailySample {
        match self.days.get(offset) {
            Some(day) => *day,
            None => {
                let date = self.days[0]
                    .date
                    .and_then(|d| d.checked_add_days(Days::new(offset as u64)));
                DailySample { date, ..self.fallback }
            }
        }
    }
}

/// Normalize a provider payload.
///
/// Only a missing `current` object is fatal. Malformed scalars read as 0 and
/// missing daily entries fall back to today's value of the same field.
pub fn normalize(raw: &RawForecastResponse) -> EngineResult<(NormalizedWeatherSnapshot, DailyForecastSeries)> {
    let current = raw
        .current
        .as_ref()
        .and_then(Value::as_object)
        .ok_or_else(|| EngineError::MalformedInput("payload has no current conditions".into()))?;

    let snapshot = NormalizedWeatherSnapshot {
        temperature_c: scalar(current, "temperature_2m"),
        humidity_pct: scalar(current, "relative_humidity_2m"),
        wind_kmh: scalar(current, "wind_speed_10m"),
        pressure_hpa: scalar(current, "pressure_msl"),
        visibility_m: scalar(current, "visibility"),
        dew_point_c: scalar(current, "dew_point_2m"),
        apparent_temperature_c: scalar(current, "apparent_temperature"),
        weather_code: to_code(number(current.get("weather_code"))),
    };

    let daily = raw.daily.as_ref().and_then(Value::as_object);
    let codes = column(daily, "weather_code");
    let max = column(daily, "temperature_2m_max");
    let min = column(daily, "temperature_2m_min");
    let precip = column(daily, "precipitation_probability_max");
    let uv = column(daily, "uv_index_max");
    let wind = column(daily, "wind_speed_10m_max");
    let dates = date_column(daily);

    let len = [codes.len(), max.len(), min.len(), precip.len(), uv.len(), wind.len(), dates.len(), 1]
        .into_iter()
        .max()
        .unwrap_or(1);

    let mut fallback = DailySample::fallback_for(&snapshot);
    fallback.precip_prob_max_pct = precip.first().copied().flatten().unwrap_or(0.0);
    fallback.uv_index_max = uv.first().copied().flatten().unwrap_or(0.0);
    let origin = dates.first().copied().flatten();
    let last_reported_max = max.iter().rev().find_map(|v| *v);

    let mut substituted = 0usize;
    let mut days = Vec::with_capacity(len);
    for i in 0..len {
        let mut pick = |col: &[Option<f64>], default: f64| fill(col, i, default, &mut substituted);
        let code = pick(codes.as_slice(), f64::from(fallback.weather_code.0));
        days.push(DailySample {
            date: dates
                .get(i)
                .copied()
                .flatten()
                .or_else(|| origin.and_then(|d| d.checked_add_days(Days::new(i as u64)))),
            weather_code: to_code(Some(code)),
            temp_max_c: pick(max.as_slice(), fallback.temp_max_c),
            temp_min_c: pick(min.as_slice(), fallback.temp_min_c),
            precip_prob_max_pct: pick(precip.as_slice(), fallback.precip_prob_max_pct),
            uv_index_max: pick(uv.as_slice(), fallback.uv_index_max),
            wind_max_kmh: pick(wind.as_slice(), fallback.wind_max_kmh),
        });
    }

    if substituted > 0 {
        warn!(substituted, days = len, "daily forecast incomplete, used today's values");
    }

    let series = DailyForecastSeries::new(days, fallback).with_last_reported_max(last_reported_max);
    Ok((snapshot, series))
}

fn fill(col: &[Option<f64>], i: usize, default: f64, substituted: &mut usize) -> f64 {
    match col.get(i).copied().flatten() {
        Some(v) => v,
        None => {
            *substituted += 1;
            default
        }
    }
}

fn number(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|v| v.is_finite())
}

fn scalar(obj: &Map<String, Value>, key: &str) -> f64 {
    number(obj.get(key)).unwrap_or(0.0)
}

fn to_code(value: Option<f64>) -> WeatherCode {
    match value {
        Some(v) if (0.0..=255.0).contains(&v) => WeatherCode(v.round() as u8),
        _ => WeatherCode::default(),
    }
}

fn column(daily: Option<&Map<String, Value>>, key: &str) -> Vec<Option<f64>> {
    match daily.and_then(|d| d.get(key)) {
        Some(Value::Array(items)) => items.iter().map(|v| number(Some(v))).collect(),
        _ => Vec::new(),
    }
}

fn date_column(daily: Option<&Map<String, Value>>) -> Vec<Option<NaiveDate>> {
    match daily.and_then(|d| d.get("time")) {
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| v.as_str().and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()))
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawForecastResponse {
        RawForecastResponse::from_value(value).unwrap()
    }

    #[test]
    fn missing_current_is_malformed() {
        let payload = raw(json!({ "daily": { "temperature_2m_max": [30.0] } }));
        assert!(matches!(normalize(&payload), Err(EngineError::MalformedInput(_))));

        let payload = raw(json!({ "current": 12 }));
        assert!(matches!(normalize(&payload), Err(EngineError::MalformedInput(_))));
    }

    #[test]
    fn malformed_scalars_read_as_zero() {
        let payload = raw(json!({
            "current": {
                "temperature_2m": "31.5",
                "relative_humidity_2m": "wet",
                "wind_speed_10m": null,
                "weather_code": 61
            }
        }));
        let (snap, series) = normalize(&payload).unwrap();
        assert_eq!(snap.temperature_c, 31.5);
        assert_eq!(snap.humidity_pct, 0.0);
        assert_eq!(snap.wind_kmh, 0.0);
        assert_eq!(snap.pressure_hpa, 0.0);
        assert_eq!(snap.weather_code, WeatherCode(61));
        assert_eq!(series.len(), 1);
        assert_eq!(series.day(0).temp_max_c, 31.5);
    }

    #[test]
    fn short_arrays_are_padded_with_today() {
        let payload = raw(json!({
            "current": { "temperature_2m": 22.0, "wind_speed_10m": 9.0, "weather_code": 2 },
            "daily": {
                "time": ["2024-06-01", "2024-06-02", "2024-06-03"],
                "temperature_2m_max": [25.0, 27.0],
                "precipitation_probability_max": [40, null, 80],
                "weather_code": [3, 61, 95]
            }
        }));
        let (_, series) = normalize(&payload).unwrap();
        assert_eq!(series.len(), 3);

        let day2 = series.day(2);
        assert_eq!(day2.temp_max_c, 22.0);
        assert_eq!(day2.weather_code, WeatherCode(95));
        assert_eq!(series.day(1).precip_prob_max_pct, 40.0);
        assert_eq!(series.day(1).wind_max_kmh, 9.0);
    }

    #[test]
    fn offsets_past_the_horizon_use_fallback_day() {
        let payload = raw(json!({
            "current": { "temperature_2m": 18.0, "weather_code": 1 },
            "daily": { "time": ["2024-06-01"], "temperature_2m_max": [20.0] }
        }));
        let (_, series) = normalize(&payload).unwrap();
        let far = series.day(5);
        assert_eq!(far.temp_max_c, 18.0);
        assert_eq!(far.weather_code, WeatherCode(1));
        assert_eq!(far.date, NaiveDate::from_ymd_opt(2024, 6, 6));
    }

    #[test]
    fn last_reported_max_ignores_substituted_days() {
        let payload = raw(json!({
            "current": { "temperature_2m": 10.0 },
            "daily": {
                "time": ["2024-06-01", "2024-06-02", "2024-06-03", "2024-06-04", "2024-06-05"],
                "temperature_2m_max": [30.0, 32.0]
            }
        }));
        let (_, series) = normalize(&payload).unwrap();
        assert_eq!(series.len(), 5);
        assert_eq!(series.day(4).temp_max_c, 10.0);
        assert_eq!(series.last_reported_max(), Some(32.0));
        assert!(!series.is_empty());

        let payload = raw(json!({
            "current": { "temperature_2m": 10.0 },
            "daily": { "time": ["2024-06-01", "2024-06-02"] }
        }));
        let (_, series) = normalize(&payload).unwrap();
        assert_eq!(series.last_reported_max(), None);
    }
}
