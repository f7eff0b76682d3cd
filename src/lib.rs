//! Agronomic forecast and advisory engine.
//!
//! Turns a multi-day Open-Meteo forecast into a short-term risk narrative,
//! per-crop suitability advice and a synthetic trend series for charts.
//! Everything except [`provider`] and [`config`] loading is pure.

pub mod config;
pub mod engine;
pub mod error;
pub mod messages;
pub mod normalize;
pub mod provider;
pub mod risk;
pub mod session;
pub mod suitability;
pub mod trend;
pub mod weather_code;

pub use engine::{AdvisoryEngine, AdvisoryReport, VariantMode};
pub use error::{EngineError, EngineResult, FailureKind, FetchError};
pub use messages::{Category, MessageBank};
pub use normalize::{normalize, DailyForecastSeries, DailySample, NormalizedWeatherSnapshot};
pub use provider::{ForecastClient, RawForecastResponse};
pub use risk::{RiskPrediction, RiskTier, ScoringConfig, StableNarrative, VariantSource};
pub use session::{FetchState, FetchTicket, ForecastSession};
pub use suitability::{CropProfile, SuitabilityReport, SuitabilityTier};
pub use trend::{TrendHorizon, TrendPoint, TrendSeries};
pub use weather_code::WeatherCode;
