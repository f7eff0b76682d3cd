//! The advisory pipeline: normalize, score risk, assess crops, chart trends.

use rand::RngCore;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::EngineResult;
use crate::messages::{Category, MessageBank, MessageKey};
use crate::normalize::{normalize, DailyForecastSeries, DailySample, NormalizedWeatherSnapshot};
use crate::provider::RawForecastResponse;
use crate::risk::{
    RiskPrediction, RiskScorer, RiskTier, ScoringConfig, StableNarrative, VariantSource, DEFAULT_HORIZON_DAYS,
};
use crate::suitability::{builtin_catalog, validate_catalog, Advice, CropProfile, SuitabilityEvaluator, SuitabilityReport, SuitabilityTier};
use crate::trend::{generate, TrendHorizon, TrendSeries};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VariantMode {
    /// Variant index is the day offset.
    #[default]
    Deterministic,
    /// Variant index is drawn from the caller's generator.
    Flavored,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdvisoryReport {
    /// Locale the texts were rendered in after fallback.
    pub locale: String,
    pub snapshot: NormalizedWeatherSnapshot,
    pub condition: &'static str,
    pub icon: &'static str,
    pub daily: Vec<DailySample>,
    pub predictions: Vec<RiskPrediction>,
    pub suitability: Vec<SuitabilityReport>,
    pub trend_15: TrendSeries,
    pub trend_30: TrendSeries,
}

/// Process-wide, read-only configuration plus the pure engine operations.
#[derive(Debug, Clone)]
pub struct AdvisoryEngine {
    bank: MessageBank,
    scoring: ScoringConfig,
    crops: Vec<CropProfile>,
    horizon_days: i32,
}

/// Every (category, tier) pair the engine can ask the bank for.
pub fn required_messages() -> impl Iterator<Item = (Category, &'static str)> {
    let risk = RiskTier::all_keys().iter().map(|k| (RiskTier::CATEGORY, *k));
    let narrative = StableNarrative::all_keys().iter().map(|k| (StableNarrative::CATEGORY, *k));
    let suit = SuitabilityTier::all_keys().iter().map(|k| (SuitabilityTier::CATEGORY, *k));
    let advice = Advice::all_keys().iter().map(|k| (Advice::CATEGORY, *k));
    risk.chain(narrative).chain(suit).chain(advice)
}

impl AdvisoryEngine {
    /// Validates every table up front so resolution cannot fail later.
    pub fn new(bank: MessageBank, scoring: ScoringConfig, crops: Vec<CropProfile>, horizon_days: i32) -> EngineResult<Self> {
        bank.validate(required_messages())?;
        scoring.validate()?;
        validate_catalog(&crops)?;
        Ok(Self { bank, scoring, crops, horizon_days })
    }

    pub fn with_defaults() -> EngineResult<Self> {
        Self::new(MessageBank::builtin()?, ScoringConfig::default(), builtin_catalog(), DEFAULT_HORIZON_DAYS)
    }

    pub fn from_config(cfg: &Config) -> EngineResult<Self> {
        let bank = match &cfg.messages_path {
            Some(path) => {
                info!(path = %path.display(), "loading message bank");
                MessageBank::load(path)?
            }
            None => MessageBank::builtin()?,
        };
        let bank = bank.with_default_locale(&cfg.app.default_locale)?;
        let crops = cfg.crops.clone().unwrap_or_else(builtin_catalog);
        Self::new(bank, cfg.scoring.clone(), crops, cfg.app.horizon_days)
    }

    pub fn bank(&self) -> &MessageBank {
        &self.bank
    }

    pub fn scoring(&self) -> &ScoringConfig {
        &self.scoring
    }

    pub fn crops(&self) -> &[CropProfile] {
        &self.crops
    }

    pub fn horizon_days(&self) -> i32 {
        self.horizon_days
    }

    pub fn predict(
        &self,
        snapshot: &NormalizedWeatherSnapshot,
        series: &DailyForecastSeries,
        horizon_days: i32,
        locale: &str,
        variants: &mut VariantSource<'_>,
    ) -> EngineResult<Vec<RiskPrediction>> {
        RiskScorer::new(&self.scoring, &self.bank).predict(snapshot, series, horizon_days, locale, variants)
    }

    pub fn evaluate(
        &self,
        crop: &CropProfile,
        snapshot: &NormalizedWeatherSnapshot,
        series: &DailyForecastSeries,
        locale: &str,
    ) -> EngineResult<SuitabilityReport> {
        SuitabilityEvaluator::new(&self.bank).evaluate(crop, snapshot, series, locale)
    }

    /// Run the whole pipeline for one payload. `rng` drives the synthetic
    /// trends and, in flavored mode, the risk phrasing.
    pub fn advise<R: RngCore>(
        &self,
        raw: &RawForecastResponse,
        locale: &str,
        mode: VariantMode,
        rng: &mut R,
    ) -> EngineResult<AdvisoryReport> {
        if !self.bank.supports(locale) {
            warn!(locale, fallback = self.bank.default_locale(), "unsupported locale, using default");
        }
        let (snapshot, series) = normalize(raw)?;

        let predictions = {
            let mut variants = match mode {
                VariantMode::Deterministic => VariantSource::ByOffset,
                VariantMode::Flavored => VariantSource::Random(&mut *rng),
            };
            self.predict(&snapshot, &series, self.horizon_days, locale, &mut variants)?
        };
        let suitability = SuitabilityEvaluator::new(&self.bank).evaluate_all(&self.crops, &snapshot, &series, locale)?;

        Ok(AdvisoryReport {
            locale: self.bank.resolve_locale(locale).to_string(),
            condition: snapshot.weather_code.description(),
            icon: snapshot.weather_code.icon(),
            daily: series.days().to_vec(),
            predictions,
            suitability,
            trend_15: generate(&series, TrendHorizon::FifteenDays, rng),
            trend_30: generate(&series, TrendHorizon::ThirtyDays, rng),
            snapshot,
        })
    }
}
