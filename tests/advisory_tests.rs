//! Advisory engine integration tests
//!
//! Covers:
//! - Risk scenarios (rainy day scores high, calm day stays stable)
//! - Crop suitability scenarios (mixed window, ideal window)
//! - Tier boundaries, suitability range, trend step bound, locale fallback

use agro_advisory::messages::Category;
use agro_advisory::risk::TierThresholds;
use agro_advisory::suitability::{assess, builtin_catalog, Advice, CropProfile};
use agro_advisory::trend::{generate, generate_from_seed, MAX_STEP_C};
use agro_advisory::{
    normalize, AdvisoryEngine, DailyForecastSeries, MessageBank, NormalizedWeatherSnapshot, RawForecastResponse,
    RiskTier, ScoringConfig, SuitabilityTier, TrendHorizon, VariantSource,
};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;

fn wheat() -> CropProfile {
    builtin_catalog()
        .into_iter()
        .find(|c| c.key == "wheat")
        .unwrap()
}

/// Today's conditions plus day-1 values; days 2 and 3 fall back to today.
fn forecast(
    temp: f64,
    humidity: f64,
    wind: f64,
    precip_day1: f64,
    code_day1: u8,
    max_day1: f64,
) -> (NormalizedWeatherSnapshot, DailyForecastSeries) {
    let raw = RawForecastResponse::from_value(json!({
        "current": {
            "temperature_2m": temp,
            "relative_humidity_2m": humidity,
            "wind_speed_10m": wind,
            "weather_code": 1
        },
        "daily": {
            "time": ["2024-05-10", "2024-05-11"],
            "weather_code": [1, code_day1],
            "temperature_2m_max": [temp, max_day1],
            "temperature_2m_min": [temp - 8.0, max_day1 - 8.0],
            "precipitation_probability_max": [0, precip_day1]
        }
    }))
    .unwrap();
    normalize(&raw).unwrap()
}

fn window_series(samples: [f64; 4]) -> (NormalizedWeatherSnapshot, DailyForecastSeries) {
    let raw = RawForecastResponse::from_value(json!({
        "current": { "temperature_2m": samples[0], "relative_humidity_2m": 50, "wind_speed_10m": 5 },
        "daily": { "temperature_2m_max": [samples[0], samples[1], samples[2], samples[3]] }
    }))
    .unwrap();
    normalize(&raw).unwrap()
}

// ============================================================================
// Scenario Tests
// ============================================================================

#[cfg(test)]
mod scenario_tests {
    use super::*;

    /// Humid, high rain chance, rain-class code: 2 + 2 + 2 = 6
    #[test]
    fn test_rainy_day_scores_high() {
        let engine = AdvisoryEngine::with_defaults().unwrap();
        let (now, series) = forecast(28.0, 85.0, 10.0, 70.0, 61, 28.0);

        assert_eq!(engine.scoring().score_day(&now, &series.day(1)), 6);

        let out = engine
            .predict(&now, &series, 3, "en", &mut VariantSource::ByOffset)
            .unwrap();
        assert_eq!(out[0].day_offset, 1);
        assert_eq!(out[0].tier, RiskTier::High);
        assert_eq!(out[0].rain_chance_pct, 70);
        assert_eq!(out[0].text, "Strong rain and storms possible.");
    }

    #[test]
    fn test_calm_day_is_stable() {
        let engine = AdvisoryEngine::with_defaults().unwrap();
        let (now, series) = forecast(28.0, 50.0, 10.0, 20.0, 1, 28.0);

        let out = engine
            .predict(&now, &series, 3, "en", &mut VariantSource::ByOffset)
            .unwrap();
        assert_eq!(out[0].score, 0);
        assert_eq!(out[0].tier, RiskTier::Stable);
        assert_eq!(out[0].confidence_pct, 70);
    }

    /// Days past the provider horizon reuse today's values and never panic
    #[test]
    fn test_long_horizon_uses_fallback_days() {
        let engine = AdvisoryEngine::with_defaults().unwrap();
        let (now, series) = forecast(28.0, 50.0, 10.0, 20.0, 1, 28.0);

        let out = engine
            .predict(&now, &series, 10, "en", &mut VariantSource::ByOffset)
            .unwrap();
        assert_eq!(out.len(), 10);
        let offsets: Vec<u32> = out.iter().map(|p| p.day_offset).collect();
        assert_eq!(offsets, (1..=10).collect::<Vec<_>>());
        assert_eq!(out[9].max_temp_c, 28);
        assert_eq!(out[9].date, chrono::NaiveDate::from_ymd_opt(2024, 5, 20));
    }

    /// Wheat 10-25 with samples 12, 26, 20, 9: two suitable days
    #[test]
    fn test_mixed_window_is_moderate_with_heat_and_cold_advice() {
        let a = assess(&wheat(), &[12.0, 26.0, 20.0, 9.0]);
        assert_eq!(a.suitable_day_count, 2);
        assert_eq!(a.tier, SuitabilityTier::Moderate);
        assert!(a.advice.contains(&Advice::HeatShade));
        assert!(a.advice.contains(&Advice::HeatIrrigation));
        assert!(a.advice.contains(&Advice::ColdCover));
        assert!(a.advice.contains(&Advice::ColdWatering));
        assert!(!a.advice.contains(&Advice::Stable));

        let engine = AdvisoryEngine::with_defaults().unwrap();
        let (now, series) = window_series([12.0, 26.0, 20.0, 9.0]);
        let report = engine.evaluate(&wheat(), &now, &series, "en").unwrap();
        assert_eq!(report.samples_c, [12.0, 26.0, 20.0, 9.0]);
        assert_eq!(report.suitable_day_count, 2);
        assert!(report.advisory_text.starts_with("Moderate suitability. Take caution.\n• "));
        assert!(report.advisory_text.contains("• Use shade nets to prevent heat stress."));
        assert!(report.advisory_text.contains("• Cover crops at night to prevent cold damage."));
    }

    #[test]
    fn test_ideal_window_is_excellent_and_stable() {
        let engine = AdvisoryEngine::with_defaults().unwrap();
        let (now, series) = window_series([18.0, 19.0, 18.0, 19.0]);
        let report = engine.evaluate(&wheat(), &now, &series, "en").unwrap();

        assert_eq!(report.suitable_day_count, 4);
        assert_eq!(report.tier, SuitabilityTier::Excellent);
        assert_eq!(report.advice, vec!["Weather stable, no special action needed.".to_string()]);
        assert_eq!(
            report.advisory_text,
            "Excellent conditions.\n• Weather stable, no special action needed."
        );
    }

    #[test]
    fn test_advice_is_localized() {
        let engine = AdvisoryEngine::with_defaults().unwrap();
        let (now, series) = window_series([18.0, 19.0, 18.0, 19.0]);
        let report = engine.evaluate(&wheat(), &now, &series, "bn").unwrap();
        assert_eq!(report.crop_name, "গম");
        assert_eq!(report.headline, "চমৎকার পরিস্থিতি।");
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn bands() -> TierThresholds {
        ScoringConfig::default().tiers
    }

    /// Strategy for temperatures a farm might see
    fn temperature_strategy() -> impl Strategy<Value = f64> {
        (-100i64..=450i64).prop_map(|n| n as f64 / 10.0) // -10.0 to 45.0°C
    }

    /// Strategy for locale tags, supported or not
    fn locale_strategy() -> impl Strategy<Value = String> {
        "[a-z]{2}(-[A-Z]{2})?"
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_tier_bands_are_exhaustive(score in -10i32..=20i32) {
            let tier = RiskTier::from_score(score, &bands());
            let expected = if score >= 5 {
                RiskTier::High
            } else if score >= 3 {
                RiskTier::Medium
            } else if score >= 1 {
                RiskTier::Mild
            } else {
                RiskTier::Stable
            };
            prop_assert_eq!(tier, expected);
        }

        #[test]
        fn prop_suitability_count_in_range_and_repeatable(
            t0 in temperature_strategy(),
            t1 in temperature_strategy(),
            t2 in temperature_strategy(),
            t3 in temperature_strategy()
        ) {
            let samples = [t0, t1, t2, t3];
            let crop = wheat();
            let first = assess(&crop, &samples);
            let second = assess(&crop, &samples);

            prop_assert!(first.suitable_day_count <= 4);
            prop_assert_eq!(first.tier, SuitabilityTier::from_count(first.suitable_day_count as usize));
            prop_assert_eq!(&first, &second);
            prop_assert!(!first.advice.is_empty());
        }

        #[test]
        fn prop_trend_length_and_step_bound(seed in any::<u64>(), start in temperature_strategy(), long in any::<bool>()) {
            let horizon = if long { TrendHorizon::ThirtyDays } else { TrendHorizon::FifteenDays };
            let trend = generate_from_seed(start, horizon, &mut StdRng::seed_from_u64(seed));

            prop_assert_eq!(trend.points.len(), horizon.days());
            for pair in trend.points.windows(2) {
                prop_assert!((pair[1].temperature_c - pair[0].temperature_c).abs() <= MAX_STEP_C);
                prop_assert_eq!(pair[1].temperature_c.fract(), 0.0);
            }
        }

        #[test]
        fn prop_trend_from_series_has_exact_length(seed in any::<u64>(), max in temperature_strategy()) {
            let (_, series) = window_series([max, max, max, max]);
            let trend = generate(&series, TrendHorizon::ThirtyDays, &mut StdRng::seed_from_u64(seed));
            prop_assert_eq!(trend.points.len(), 30);
            prop_assert!((trend.points[0].temperature_c - max.round()).abs() <= MAX_STEP_C);
        }

        #[test]
        fn prop_resolver_never_fails_for_any_locale(locale in locale_strategy(), variant in 0usize..10) {
            let bank = MessageBank::builtin().unwrap();
            for tier in ["stable", "mild", "medium", "high"] {
                prop_assert!(bank.resolve(&locale, Category::Risk, tier, variant).is_ok());
            }
            prop_assert!(bank.resolve(&locale, Category::Advice, "stable", variant).is_ok());
        }
    }
}
