//! Crop temperature suitability over a four-day window (today + 3).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::messages::{Category, MessageBank, MessageKey};
use crate::normalize::{DailyForecastSeries, NormalizedWeatherSnapshot};

/// Day-to-day swing (°C) between today and tomorrow that triggers the sudden-change bullet.
pub const SUDDEN_CHANGE_C: f64 = 6.0;

pub const WINDOW_DAYS: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropProfile {
    pub key: String,
    pub ideal_min_c: f64,
    pub ideal_max_c: f64,
    /// Display name per locale tag.
    #[serde(default)]
    pub names: BTreeMap<String, String>,
}

impl CropProfile {
    pub fn new(key: &str, ideal_min_c: f64, ideal_max_c: f64, names: &[(&str, &str)]) -> Self {
        Self {
            key: key.to_string(),
            ideal_min_c,
            ideal_max_c,
            names: names.iter().map(|(l, n)| (l.to_string(), n.to_string())).collect(),
        }
    }

    /// Name for `locale`, then its primary subtag, then `default_locale`, then the key.
    pub fn localized_name(&self, locale: &str, default_locale: &str) -> &str {
        let tag = locale.trim().replace('_', "-").to_lowercase();
        let primary = tag.split('-').next().unwrap_or_default();
        self.names
            .get(&tag)
            .or_else(|| self.names.get(primary))
            .or_else(|| self.names.get(default_locale))
            .map(String::as_str)
            .unwrap_or(&self.key)
    }

    pub fn contains(&self, temp_c: f64) -> bool {
        temp_c >= self.ideal_min_c && temp_c <= self.ideal_max_c
    }
}

/// wheat 10-25, rice 20-35, maize 15-30, sugarcane 20-38.
pub fn builtin_catalog() -> Vec<CropProfile> {
    vec![
        CropProfile::new("wheat", 10.0, 25.0, &[("en", "Wheat"), ("hi", "गेहूं"), ("pa", "ਗੰਹੂ"), ("bn", "গম")]),
        CropProfile::new("rice", 20.0, 35.0, &[("en", "Rice"), ("hi", "धान"), ("pa", "ਧਾਨ"), ("bn", "ধান")]),
        CropProfile::new("maize", 15.0, 30.0, &[("en", "Maize"), ("hi", "मक्का"), ("pa", "ਮੱਕੀ"), ("bn", "ভুট্টা")]),
        CropProfile::new("sugarcane", 20.0, 38.0, &[("en", "Sugarcane"), ("hi", "गन्ना"), ("pa", "ਗੰਨਾ"), ("bn", "আখ")]),
    ]
}

pub fn validate_catalog(catalog: &[CropProfile]) -> EngineResult<()> {
    if catalog.is_empty() {
        return Err(EngineError::InvalidConfig("crop catalog is empty".into()));
    }
    for (i, crop) in catalog.iter().enumerate() {
        if !(crop.ideal_min_c.is_finite() && crop.ideal_max_c.is_finite()) || crop.ideal_min_c > crop.ideal_max_c {
            return Err(EngineError::InvalidConfig(format!(
                "crop {} has an invalid ideal band {}..{}",
                crop.key, crop.ideal_min_c, crop.ideal_max_c
            )));
        }
        if catalog[..i].iter().any(|c| c.key == crop.key) {
            return Err(EngineError::InvalidConfig(format!("crop {} listed twice", crop.key)));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuitabilityTier {
    NotRecommended,
    Low,
    Moderate,
    Good,
    Excellent,
}

impl SuitabilityTier {
    pub fn from_count(suitable_days: usize) -> Self {
        match suitable_days {
            0 => SuitabilityTier::NotRecommended,
            1 => SuitabilityTier::Low,
            2 => SuitabilityTier::Moderate,
            3 => SuitabilityTier::Good,
            _ => SuitabilityTier::Excellent,
        }
    }
}

impl MessageKey for SuitabilityTier {
    const CATEGORY: Category = Category::Suitability;

    fn key(&self) -> &'static str {
        match self {
            SuitabilityTier::Excellent => "excellent",
            SuitabilityTier::Good => "good",
            SuitabilityTier::Moderate => "moderate",
            SuitabilityTier::Low => "low",
            SuitabilityTier::NotRecommended => "not_recommended",
        }
    }

    fn all_keys() -> &'static [&'static str] {
        &["excellent", "good", "moderate", "low", "not_recommended"]
    }
}

/// One advisory bullet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Advice {
    HeatShade,
    HeatIrrigation,
    ColdCover,
    ColdWatering,
    SuddenChange,
    Stable,
}

impl MessageKey for Advice {
    const CATEGORY: Category = Category::Advice;

    fn key(&self) -> &'static str {
        match self {
            Advice::HeatShade => "heat_shade",
            Advice::HeatIrrigation => "heat_irrigation",
            Advice::ColdCover => "cold_cover",
            Advice::ColdWatering => "cold_watering",
            Advice::SuddenChange => "sudden_change",
            Advice::Stable => "stable",
        }
    }

    fn all_keys() -> &'static [&'static str] {
        &["heat_shade", "heat_irrigation", "cold_cover", "cold_watering", "sudden_change", "stable"]
    }
}

/// Locale-free outcome of a window check.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub suitable_day_count: u8,
    pub tier: SuitabilityTier,
    pub advice: Vec<Advice>,
}

/// Today's current temperature followed by the next three daily maxima,
/// rounded to whole degrees. Missing days use the series fallback (today).
pub fn suitability_window(snapshot: &NormalizedWeatherSnapshot, series: &DailyForecastSeries) -> [f64; WINDOW_DAYS] {
    let mut samples = [snapshot.temperature_c.round(); WINDOW_DAYS];
    for (offset, sample) in samples.iter_mut().enumerate().skip(1) {
        *sample = series.day(offset).temp_max_c.round();
    }
    samples
}

pub fn assess(crop: &CropProfile, samples: &[f64; WINDOW_DAYS]) -> Assessment {
    let count = samples.iter().filter(|t| crop.contains(**t)).count();
    let hottest = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let coldest = samples.iter().copied().fold(f64::INFINITY, f64::min);

    let mut advice = Vec::new();
    if hottest > crop.ideal_max_c {
        advice.extend([Advice::HeatShade, Advice::HeatIrrigation]);
    }
    if coldest < crop.ideal_min_c {
        advice.extend([Advice::ColdCover, Advice::ColdWatering]);
    }
    if (samples[0] - samples[1]).abs() > SUDDEN_CHANGE_C {
        advice.push(Advice::SuddenChange);
    }
    if advice.is_empty() {
        advice.push(Advice::Stable);
    }

    Assessment {
        suitable_day_count: count as u8,
        tier: SuitabilityTier::from_count(count),
        advice,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuitabilityReport {
    pub crop_key: String,
    pub crop_name: String,
    pub samples_c: [f64; WINDOW_DAYS],
    pub suitable_day_count: u8,
    pub tier: SuitabilityTier,
    pub headline: String,
    pub advice: Vec<String>,
    pub advisory_text: String,
}

pub struct SuitabilityEvaluator<'a> {
    bank: &'a MessageBank,
}

impl<'a> SuitabilityEvaluator<'a> {
    pub fn new(bank: &'a MessageBank) -> Self {
        Self { bank }
    }

    pub fn evaluate(
        &self,
        crop: &CropProfile,
        snapshot: &NormalizedWeatherSnapshot,
        series: &DailyForecastSeries,
        locale: &str,
    ) -> EngineResult<SuitabilityReport> {
        let samples = suitability_window(snapshot, series);
        let assessment = assess(crop, &samples);

        let headline = self.bank.resolve_key(locale, &assessment.tier, 0)?.to_string();
        let advice = assessment
            .advice
            .iter()
            .map(|a| self.bank.resolve_key(locale, a, 0).map(str::to_string))
            .collect::<EngineResult<Vec<_>>>()?;

        let mut advisory_text = headline.clone();
        for bullet in &advice {
            advisory_text.push_str("\n• ");
            advisory_text.push_str(bullet);
        }

        Ok(SuitabilityReport {
            crop_key: crop.key.clone(),
            crop_name: crop.localized_name(locale, self.bank.default_locale()).to_string(),
            samples_c: samples,
            suitable_day_count: assessment.suitable_day_count,
            tier: assessment.tier,
            headline,
            advice,
            advisory_text,
        })
    }

    /// Reports in catalog order.
    pub fn evaluate_all(
        &self,
        catalog: &[CropProfile],
        snapshot: &NormalizedWeatherSnapshot,
        series: &DailyForecastSeries,
        locale: &str,
    ) -> EngineResult<Vec<SuitabilityReport>> {
        catalog
            .iter()
            .map(|crop| self.evaluate(crop, snapshot, series, locale))
            .collect()
    }
}
