//! Locale-keyed message bank and resolver.
//!
//! Texts are data: `locale -> category -> tier -> [variants]`. Resolution
//! never mutates the bank and never fails for an unknown locale; it falls
//! back to the bank's default locale instead.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, EngineResult};

const BUILTIN_BANK: &str = include_str!("../assets/messages.yaml");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Risk,
    Suitability,
    Advice,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Risk => "risk",
            Category::Suitability => "suitability",
            Category::Advice => "advice",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tier (or advice bullet) that renders through the bank.
pub trait MessageKey {
    const CATEGORY: Category;

    fn key(&self) -> &'static str;

    /// Every key of this kind; used by startup validation.
    fn all_keys() -> &'static [&'static str];
}

type Tiers = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageBank {
    default_locale: String,
    locales: BTreeMap<String, BTreeMap<String, Tiers>>,
}

impl MessageBank {
    /// The bank shipped with the crate (en, hi, pa, bn).
    pub fn builtin() -> EngineResult<Self> {
        Self::from_yaml(BUILTIN_BANK)
    }

    pub fn from_yaml(text: &str) -> EngineResult<Self> {
        serde_yaml::from_str(text).map_err(|e| EngineError::InvalidConfig(format!("message bank: {e}")))
    }

    pub fn load(path: &Path) -> EngineResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| EngineError::InvalidConfig(format!("reading {}: {e}", path.display())))?;
        Self::from_yaml(&text)
    }

    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    pub fn locales(&self) -> impl Iterator<Item = &str> {
        self.locales.keys().map(String::as_str)
    }

    /// Replace the default locale. It must exist in the bank.
    pub fn with_default_locale(mut self, locale: &str) -> EngineResult<Self> {
        let tag = normalize_tag(locale);
        if !self.locales.contains_key(&tag) {
            return Err(EngineError::InvalidConfig(format!("default locale {tag} is not in the message bank")));
        }
        self.default_locale = tag;
        Ok(self)
    }

    /// The bank locale serving `locale`: exact tag, then primary subtag, then the default.
    pub fn resolve_locale(&self, locale: &str) -> &str {
        match self.lookup_locale(locale) {
            Some(key) => key,
            None => {
                debug!(locale, fallback = %self.default_locale, "locale not in message bank");
                &self.default_locale
            }
        }
    }

    /// Whether `locale` (or its primary subtag) has its own entry.
    pub fn supports(&self, locale: &str) -> bool {
        self.lookup_locale(locale).is_some()
    }

    fn lookup_locale(&self, locale: &str) -> Option<&str> {
        let tag = normalize_tag(locale);
        if let Some((key, _)) = self.locales.get_key_value(&tag) {
            return Some(key.as_str());
        }
        let primary = tag.split('-').next().unwrap_or_default();
        self.locales.get_key_value(primary).map(|(key, _)| key.as_str())
    }

    /// Pick variant `variant` (modulo the variant count) for the pair.
    pub fn resolve(&self, locale: &str, category: Category, tier: &str, variant: usize) -> EngineResult<&str> {
        let variants = self.variants_for(locale, category, tier)?;
        Ok(&variants[variant % variants.len()])
    }

    /// All variants serving the pair after locale fallback. Never empty.
    pub fn variants_for(&self, locale: &str, category: Category, tier: &str) -> EngineResult<&[String]> {
        let resolved = self.resolve_locale(locale);
        self.variants(resolved, category, tier)
            .or_else(|| self.variants(&self.default_locale, category, tier))
            .ok_or_else(|| EngineError::UnknownCategoryOrTier {
                locale: resolved.to_string(),
                category: category.to_string(),
                tier: tier.to_string(),
            })
    }

    pub fn resolve_key<K: MessageKey>(&self, locale: &str, key: &K, variant: usize) -> EngineResult<&str> {
        self.resolve(locale, K::CATEGORY, key.key(), variant)
    }

    fn variants(&self, locale: &str, category: Category, tier: &str) -> Option<&[String]> {
        self.locales
            .get(locale)?
            .get(category.as_str())?
            .get(tier)
            .map(Vec::as_slice)
            .filter(|v| !v.is_empty())
    }

    /// Startup check: the default locale covers every required pair and no
    /// configured pair is empty.
    pub fn validate<'a, I>(&self, required: I) -> EngineResult<()>
    where
        I: IntoIterator<Item = (Category, &'a str)>,
    {
        if !self.locales.contains_key(&self.default_locale) {
            return Err(EngineError::InvalidConfig(format!(
                "default locale {} is not in the message bank",
                self.default_locale
            )));
        }
        for (locale, categories) in &self.locales {
            for (category, tiers) in categories {
                if let Some((tier, _)) = tiers.iter().find(|(_, v)| v.is_empty()) {
                    return Err(EngineError::InvalidConfig(format!(
                        "{locale}/{category}/{tier} has no variants"
                    )));
                }
            }
        }
        for (category, tier) in required {
            if self.variants(&self.default_locale, category, tier).is_none() {
                return Err(EngineError::UnknownCategoryOrTier {
                    locale: self.default_locale.clone(),
                    category: category.to_string(),
                    tier: tier.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Fill `{name}` placeholders. Unknown placeholders are left as written.
pub fn render(template: &str, values: &[(&str, String)]) -> String {
    let mut out = template.to_string();
    for (name, value) in values {
        out = out.replace(&format!("{{{name}}}"), value);
    }
    out
}

fn normalize_tag(locale: &str) -> String {
    locale.trim().replace('_', "-").to_lowercase()
}
