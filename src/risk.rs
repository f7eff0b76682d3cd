//! Short-horizon precipitation/storm risk.
//!
//! Each forecast day gets an additive score from a handful of weighted
//! conditions; the score is then banded into a [`RiskTier`]. Weights,
//! thresholds and the confidence table are plain data in [`ScoringConfig`].

use chrono::NaiveDate;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::messages::{render, Category, MessageBank, MessageKey};
use crate::normalize::{DailyForecastSeries, DailySample, NormalizedWeatherSnapshot};
use crate::weather_code::{WeatherCode, RAIN_CLASS_CODE};

pub const DEFAULT_HORIZON_DAYS: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Stable,
    Mild,
    Medium,
    High,
}

impl RiskTier {
    /// Bands are evaluated high to low; a score equal to a threshold takes the upper tier.
    pub fn from_score(score: i32, bands: &TierThresholds) -> Self {
        if score >= bands.high {
            RiskTier::High
        } else if score >= bands.medium {
            RiskTier::Medium
        } else if score >= bands.mild {
            RiskTier::Mild
        } else {
            RiskTier::Stable
        }
    }
}

impl MessageKey for RiskTier {
    const CATEGORY: Category = Category::Risk;

    fn key(&self) -> &'static str {
        match self {
            RiskTier::Stable => "stable",
            RiskTier::Mild => "mild",
            RiskTier::Medium => "medium",
            RiskTier::High => "high",
        }
    }

    fn all_keys() -> &'static [&'static str] {
        &["stable", "mild", "medium", "high"]
    }
}

/// Condition-specific wording for the first stable variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StableNarrative {
    Hot,
    Cool,
    Dry,
}

impl MessageKey for StableNarrative {
    const CATEGORY: Category = Category::Risk;

    fn key(&self) -> &'static str {
        match self {
            StableNarrative::Hot => "stable_hot",
            StableNarrative::Cool => "stable_cool",
            StableNarrative::Dry => "stable_dry",
        }
    }

    fn all_keys() -> &'static [&'static str] {
        &["stable_hot", "stable_cool", "stable_dry"]
    }
}

/// Checked in order: hot, cool, dry. None of them means the plain stable text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StableNarrativeRules {
    /// Rounded day maximum, °C.
    pub hot_above: f64,
    /// Rounded day maximum, °C.
    pub cool_below: f64,
    /// Current relative humidity, percent.
    pub dry_below: f64,
}

impl StableNarrativeRules {
    pub fn classify(&self, max_temp_c: f64, humidity_pct: f64) -> Option<StableNarrative> {
        if max_temp_c > self.hot_above {
            Some(StableNarrative::Hot)
        } else if max_temp_c < self.cool_below {
            Some(StableNarrative::Cool)
        } else if humidity_pct < self.dry_below {
            Some(StableNarrative::Dry)
        } else {
            None
        }
    }
}

/// Adds `weight` when the observed value is strictly above `above`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub above: f64,
    pub weight: i32,
}

impl Threshold {
    fn points(&self, value: f64) -> i32 {
        if value > self.above { self.weight } else { 0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeRule {
    pub at_least: u8,
    pub weight: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierThresholds {
    pub high: i32,
    pub medium: i32,
    pub mild: i32,
}

/// Confidence is `tier base + per_point * score`, capped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceTable {
    pub stable: i32,
    pub mild: i32,
    pub medium: i32,
    pub high: i32,
    pub per_point: i32,
    pub cap: i32,
}

impl ConfidenceTable {
    pub fn confidence(&self, tier: RiskTier, score: i32) -> u8 {
        let base = match tier {
            RiskTier::Stable => self.stable,
            RiskTier::Mild => self.mild,
            RiskTier::Medium => self.medium,
            RiskTier::High => self.high,
        };
        (base + self.per_point * score.max(0)).clamp(0, self.cap.min(100)) as u8
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Current relative humidity, percent.
    pub humidity: Threshold,
    /// The day's maximum precipitation probability, percent.
    pub precipitation: Threshold,
    /// The day's maximum temperature minus the current temperature.
    pub temperature_rise: Threshold,
    /// Current wind speed, km/h.
    pub wind: Threshold,
    pub rain_code: CodeRule,
    pub tiers: TierThresholds,
    pub confidence: ConfidenceTable,
    pub stable_narrative: StableNarrativeRules,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            humidity: Threshold { above: 75.0, weight: 2 },
            precipitation: Threshold { above: 50.0, weight: 2 },
            temperature_rise: Threshold { above: 3.0, weight: 1 },
            wind: Threshold { above: 30.0, weight: 1 },
            rain_code: CodeRule { at_least: RAIN_CLASS_CODE, weight: 2 },
            tiers: TierThresholds { high: 5, medium: 3, mild: 1 },
            confidence: ConfidenceTable {
                stable: 70,
                mild: 75,
                medium: 80,
                high: 85,
                per_point: 2,
                cap: 99,
            },
            stable_narrative: StableNarrativeRules {
                hot_above: 32.0,
                cool_below: 15.0,
                dry_below: 40.0,
            },
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> EngineResult<()> {
        let t = &self.tiers;
        if !(t.high > t.medium && t.medium > t.mild) {
            return Err(EngineError::InvalidConfig(format!(
                "risk tier thresholds must descend strictly (high {}, medium {}, mild {})",
                t.high, t.medium, t.mild
            )));
        }
        let c = &self.confidence;
        if !(c.stable <= c.mild && c.mild <= c.medium && c.medium <= c.high) || c.per_point < 0 {
            return Err(EngineError::InvalidConfig(
                "confidence must not decrease with tier or score".into(),
            ));
        }
        if !(1..=100).contains(&c.cap) {
            return Err(EngineError::InvalidConfig(format!("confidence cap {} out of range", c.cap)));
        }
        let n = &self.stable_narrative;
        if n.cool_below > n.hot_above {
            return Err(EngineError::InvalidConfig(format!(
                "stable narrative cool bound {} is above hot bound {}",
                n.cool_below, n.hot_above
            )));
        }
        Ok(())
    }

    pub fn score_day(&self, snapshot: &NormalizedWeatherSnapshot, day: &DailySample) -> i32 {
        let code_points = if day.weather_code.0 >= self.rain_code.at_least {
            self.rain_code.weight
        } else {
            0
        };
        self.humidity.points(snapshot.humidity_pct)
            + self.precipitation.points(day.precip_prob_max_pct)
            + self.temperature_rise.points(day.temp_max_c - snapshot.temperature_c)
            + self.wind.points(snapshot.wind_kmh)
            + code_points
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskPrediction {
    pub day_offset: u32,
    pub date: Option<NaiveDate>,
    pub tier: RiskTier,
    pub score: i32,
    pub confidence_pct: u8,
    pub text: String,
    pub condition: &'static str,
    pub max_temp_c: i32,
    pub min_temp_c: i32,
    pub rain_chance_pct: i32,
}

/// How a phrasing variant is picked for each day.
pub enum VariantSource<'r> {
    /// `day_offset mod variant count`; reproducible.
    ByOffset,
    /// Drawn from the given generator.
    Random(&'r mut dyn RngCore),
}

impl VariantSource<'_> {
    fn pick(&mut self, day_offset: u32) -> usize {
        match self {
            VariantSource::ByOffset => day_offset as usize,
            VariantSource::Random(rng) => rng.next_u32() as usize,
        }
    }
}

pub struct RiskScorer<'a> {
    scoring: &'a ScoringConfig,
    bank: &'a MessageBank,
}

impl<'a> RiskScorer<'a> {
    pub fn new(scoring: &'a ScoringConfig, bank: &'a MessageBank) -> Self {
        Self { scoring, bank }
    }

    /// One prediction per day offset `1..=horizon_days`. A horizon of zero
    /// or less gives an empty list; days past the series use its fallback day.
    pub fn predict(
        &self,
        snapshot: &NormalizedWeatherSnapshot,
        series: &DailyForecastSeries,
        horizon_days: i32,
        locale: &str,
        variants: &mut VariantSource<'_>,
    ) -> EngineResult<Vec<RiskPrediction>> {
        let horizon = u32::try_from(horizon_days).unwrap_or(0);
        let mut out = Vec::with_capacity(horizon as usize);

        for offset in 1..=horizon {
            let day = series.day(offset as usize);
            let score = self.scoring.score_day(snapshot, &day);
            let tier = RiskTier::from_score(score, &self.scoring.tiers);
            let confidence_pct = self.scoring.confidence.confidence(tier, score);
            debug!(offset, score, ?tier, confidence_pct, "scored forecast day");

            let max_temp_c = day.temp_max_c.round() as i32;
            let min_temp_c = day.temp_min_c.round() as i32;
            let rain_chance_pct = day.precip_prob_max_pct.round() as i32;
            let template = self.template(snapshot, tier, max_temp_c, locale, variants.pick(offset))?;
            let text = render(
                template,
                &[
                    ("day", offset.to_string()),
                    ("max", max_temp_c.to_string()),
                    ("min", min_temp_c.to_string()),
                    ("rain", rain_chance_pct.to_string()),
                ],
            );

            out.push(RiskPrediction {
                day_offset: offset,
                date: day.date,
                tier,
                score,
                confidence_pct,
                text,
                condition: WeatherCode::description(day.weather_code),
                max_temp_c,
                min_temp_c,
                rain_chance_pct,
            });
        }
        Ok(out)
    }

    /// The stable tier's first variant is replaced by a hot, cool or dry
    /// narrative when the day calls for one.
    fn template(
        &self,
        snapshot: &NormalizedWeatherSnapshot,
        tier: RiskTier,
        max_temp_c: i32,
        locale: &str,
        variant: usize,
    ) -> EngineResult<&'a str> {
        if tier != RiskTier::Stable {
            return self.bank.resolve_key(locale, &tier, variant);
        }
        let stable = self.bank.variants_for(locale, RiskTier::CATEGORY, tier.key())?;
        let slot = variant % stable.len();
        let narrative = self
            .scoring
            .stable_narrative
            .classify(f64::from(max_temp_c), snapshot.humidity_pct);
        match narrative {
            Some(n) if slot == 0 => self.bank.resolve_key(locale, &n, 0),
            _ => Ok(stable[slot].as_str()),
        }
    }
}
