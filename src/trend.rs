//! Synthetic temperature trend for charts.
//!
//! The series is a bounded random walk seeded from the last daily maximum.
//! It is NOT historical data and must not be presented as such.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::normalize::DailyForecastSeries;

/// Largest change (°C) between two adjacent points.
pub const MAX_STEP_C: f64 = 2.0;

/// Seed used when no daily maximum is available.
pub const DEFAULT_SEED_C: f64 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendHorizon {
    #[serde(rename = "15")]
    FifteenDays,
    #[serde(rename = "30")]
    ThirtyDays,
}

impl TrendHorizon {
    pub fn days(self) -> usize {
        match self {
            TrendHorizon::FifteenDays => 15,
            TrendHorizon::ThirtyDays => 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub label: String,
    pub temperature_c: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSeries {
    pub horizon: TrendHorizon,
    pub synthetic: bool,
    pub points: Vec<TrendPoint>,
}

/// The last daily maximum the provider reported, or [`DEFAULT_SEED_C`].
pub fn seed_from(series: &DailyForecastSeries) -> f64 {
    series
        .last_reported_max()
        .filter(|t| t.is_finite())
        .unwrap_or(DEFAULT_SEED_C)
}

/// Walk `horizon` points from the series' last daily maximum.
pub fn generate<R: Rng + ?Sized>(series: &DailyForecastSeries, horizon: TrendHorizon, rng: &mut R) -> TrendSeries {
    generate_from_seed(seed_from(series), horizon, rng)
}

pub fn generate_from_seed<R: Rng + ?Sized>(seed_c: f64, horizon: TrendHorizon, rng: &mut R) -> TrendSeries {
    let mut last = seed_c.round();
    let points = (1..=horizon.days())
        .map(|i| {
            let step: f64 = rng.gen_range(-MAX_STEP_C..=MAX_STEP_C);
            last = (last + step).round();
            TrendPoint {
                label: format!("Day {i}"),
                temperature_c: last,
            }
        })
        .collect();

    TrendSeries {
        horizon,
        synthetic: true,
        points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{normalize, DailySample, NormalizedWeatherSnapshot};
    use crate::provider::RawForecastResponse;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    #[test]
    fn lengths_match_the_horizon() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(generate_from_seed(24.0, TrendHorizon::FifteenDays, &mut rng).points.len(), 15);
        assert_eq!(generate_from_seed(24.0, TrendHorizon::ThirtyDays, &mut rng).points.len(), 30);
    }

    #[test]
    fn first_point_stays_near_the_seed() {
        let mut rng = StdRng::seed_from_u64(11);
        let trend = generate_from_seed(31.0, TrendHorizon::FifteenDays, &mut rng);
        assert!((trend.points[0].temperature_c - 31.0).abs() <= MAX_STEP_C);
        assert_eq!(trend.points[0].label, "Day 1");
        assert_eq!(trend.points[14].label, "Day 15");
        assert!(trend.synthetic);
    }

    #[test]
    fn same_seed_same_walk() {
        let a = generate_from_seed(20.0, TrendHorizon::ThirtyDays, &mut StdRng::seed_from_u64(3));
        let b = generate_from_seed(20.0, TrendHorizon::ThirtyDays, &mut StdRng::seed_from_u64(3));
        assert_eq!(a, b);
    }

    #[test]
    fn seed_is_last_reported_maximum() {
        let raw = RawForecastResponse::from_value(json!({
            "current": { "temperature_2m": 10.0 },
            "daily": {
                "time": ["2024-06-01", "2024-06-02", "2024-06-03", "2024-06-04", "2024-06-05"],
                "temperature_2m_max": [30.0, 32.0]
            }
        }))
        .unwrap();
        let (_, series) = normalize(&raw).unwrap();
        assert_eq!(seed_from(&series), 32.0);
    }

    #[test]
    fn seed_defaults_without_reported_maxima() {
        let raw = RawForecastResponse::from_value(json!({
            "current": { "temperature_2m": 10.0 },
            "daily": { "time": ["2024-06-01", "2024-06-02"] }
        }))
        .unwrap();
        let (_, series) = normalize(&raw).unwrap();
        assert_eq!(seed_from(&series), DEFAULT_SEED_C);

        let now = NormalizedWeatherSnapshot { temperature_c: 10.0, ..Default::default() };
        let bare = DailyForecastSeries::new(vec![], DailySample::fallback_for(&now));
        assert_eq!(seed_from(&bare), DEFAULT_SEED_C);
    }
}
