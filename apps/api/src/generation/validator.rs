//! Parameter validation: turns a raw request payload into an immutable `GenerationRequest`.
//!
//! Pure: the result depends only on the payload, the injected catalog and the limits.
//! Runs before any model call, so a rejected request costs nothing upstream.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::generation::catalog::{CatalogOption, OptionCatalog};

pub const DEFAULT_TONE: &str = "professional";
pub const DEFAULT_AUDIENCE: &str = "general";
pub const DEFAULT_LENGTH: &str = "medium";
pub const DEFAULT_LANGUAGE: &str = "english";
pub const DEFAULT_VARIANT_COUNT: i64 = 3;
const MAX_LANGUAGE_CHARS: usize = 40;

/// Relative tolerance applied to a bucket's word range before a post is flagged.
pub const LENGTH_TOLERANCE_PERCENT: u32 = 20;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// Request payload as received on the wire. Everything except `topic` is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawGenerationRequest {
    #[serde(default)]
    pub topic: String,
    pub tone: Option<String>,
    pub audience: Option<String>,
    pub length: Option<String>,
    #[serde(alias = "post_count")]
    pub variant_count: Option<i64>,
    pub include_hashtags: Option<bool>,
    pub require_hashtags: Option<bool>,
    pub include_cta: Option<bool>,
    pub language: Option<String>,
}

/// Requested post length tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthBucket {
    Short,
    Medium,
    Long,
}

impl LengthBucket {
    /// Target word range the prompt asks for.
    pub fn target_words(self) -> (u32, u32) {
        match self {
            LengthBucket::Short => (50, 100),
            LengthBucket::Medium => (100, 200),
            LengthBucket::Long => (200, 350),
        }
    }

    /// Target range widened by `LENGTH_TOLERANCE_PERCENT` on both sides.
    /// medium → [80, 240].
    pub fn tolerance_band(self) -> (u32, u32) {
        let (min, max) = self.target_words();
        let low = min * (100 - LENGTH_TOLERANCE_PERCENT) / 100;
        let high = (max * (100 + LENGTH_TOLERANCE_PERCENT)).div_ceil(100);
        (low, high)
    }
}

impl FromStr for LengthBucket {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "short" => Ok(LengthBucket::Short),
            "medium" => Ok(LengthBucket::Medium),
            "long" => Ok(LengthBucket::Long),
            _ => Err(()),
        }
    }
}

impl fmt::Display for LengthBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LengthBucket::Short => "short",
            LengthBucket::Medium => "medium",
            LengthBucket::Long => "long",
        };
        f.write_str(name)
    }
}

/// A validated, normalized request. Never mutated after `validate` returns it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    pub topic: String,
    pub tone: CatalogOption,
    pub audience: CatalogOption,
    pub length: LengthBucket,
    pub variant_count: usize,
    pub include_hashtags: bool,
    pub require_hashtags: bool,
    pub include_cta: bool,
    pub language: String,
}

/// Bounds loaded from configuration.
#[derive(Debug, Clone, Copy)]
pub struct ValidationLimits {
    pub max_topic_chars: usize,
    pub max_variants: usize,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            max_topic_chars: 500,
            max_variants: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} cannot be empty")]
    EmptyInput { field: &'static str },

    #[error("{field} exceeds {max} characters (got {actual})")]
    InputTooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    #[error("unknown {field} '{value}'; allowed: {}", .allowed.join(", "))]
    UnknownEnumValue {
        field: &'static str,
        value: String,
        allowed: Vec<String>,
    },

    #[error("{field} must be between {min} and {max} (got {actual})")]
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
        actual: i64,
    },
}

// ────────────────────────────────────────────────────────────────────────────
// Validation
// ────────────────────────────────────────────────────────────────────────────

pub fn validate(
    raw: &RawGenerationRequest,
    catalog: &OptionCatalog,
    limits: &ValidationLimits,
) -> Result<GenerationRequest, ValidationError> {
    let topic = bounded_text("topic", &raw.topic, limits.max_topic_chars)?;

    let tone_value = raw.tone.as_deref().unwrap_or(DEFAULT_TONE);
    let tone = catalog
        .tone(tone_value)
        .cloned()
        .ok_or_else(|| unknown("tone", tone_value, catalog.tones()))?;

    let audience_value = raw.audience.as_deref().unwrap_or(DEFAULT_AUDIENCE);
    let audience = catalog
        .audience(audience_value)
        .cloned()
        .ok_or_else(|| unknown("audience", audience_value, catalog.audiences()))?;

    let length_value = raw.length.as_deref().unwrap_or(DEFAULT_LENGTH);
    let length = length_value
        .parse::<LengthBucket>()
        .map_err(|_| ValidationError::UnknownEnumValue {
            field: "length",
            value: length_value.to_string(),
            allowed: vec!["short".into(), "medium".into(), "long".into()],
        })?;

    let requested = raw.variant_count.unwrap_or(DEFAULT_VARIANT_COUNT);
    let max = limits.max_variants as i64;
    if !(1..=max).contains(&requested) {
        return Err(ValidationError::OutOfRange {
            field: "variant_count",
            min: 1,
            max,
            actual: requested,
        });
    }

    let language = bounded_text(
        "language",
        raw.language.as_deref().unwrap_or(DEFAULT_LANGUAGE),
        MAX_LANGUAGE_CHARS,
    )?
    .to_lowercase();

    let require_hashtags = raw.require_hashtags.unwrap_or(false);

    Ok(GenerationRequest {
        topic,
        tone,
        audience,
        length,
        variant_count: requested as usize,
        // Requiring hashtags implies asking for them.
        include_hashtags: raw.include_hashtags.unwrap_or(true) || require_hashtags,
        require_hashtags,
        include_cta: raw.include_cta.unwrap_or(true),
        language,
    })
}

fn bounded_text(field: &'static str, value: &str, max: usize) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyInput { field });
    }
    let actual = trimmed.chars().count();
    if actual > max {
        return Err(ValidationError::InputTooLong { field, max, actual });
    }
    Ok(trimmed.to_string())
}

fn unknown(field: &'static str, value: &str, options: &[CatalogOption]) -> ValidationError {
    ValidationError::UnknownEnumValue {
        field,
        value: value.to_string(),
        allowed: options.iter().map(|o| o.value.clone()).collect(),
    }
}
