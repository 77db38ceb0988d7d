//! Tone and audience catalog: the allowed enumerations for a generation request.
//!
//! Loaded once at startup (see `config.rs`) and shared read-only. The validator
//! receives it as a parameter; nothing in generation references a global list.

use serde::{Deserialize, Serialize};

/// A selectable option: the wire `value` and a human-readable `label`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogOption {
    pub value: String,
    pub label: String,
}

impl CatalogOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: normalize_key(&value.into()),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OptionCatalog {
    tones: Vec<CatalogOption>,
    audiences: Vec<CatalogOption>,
}

impl OptionCatalog {
    pub fn new(tones: Vec<CatalogOption>, audiences: Vec<CatalogOption>) -> Self {
        Self { tones, audiences }
    }

    pub fn tones(&self) -> &[CatalogOption] {
        &self.tones
    }

    pub fn audiences(&self) -> &[CatalogOption] {
        &self.audiences
    }

    /// Looks up a tone by value, ignoring case and surrounding/repeated whitespace.
    pub fn tone(&self, value: &str) -> Option<&CatalogOption> {
        find(&self.tones, value)
    }

    pub fn audience(&self, value: &str) -> Option<&CatalogOption> {
        find(&self.audiences, value)
    }
}

impl Default for OptionCatalog {
    fn default() -> Self {
        Self::new(default_tones(), default_audiences())
    }
}

fn find<'a>(options: &'a [CatalogOption], value: &str) -> Option<&'a CatalogOption> {
    let key = normalize_key(value);
    options.iter().find(|o| o.value == key)
}

/// Lower-cases and collapses internal whitespace: "  Engineering   Managers " → "engineering managers".
pub fn normalize_key(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub fn default_tones() -> Vec<CatalogOption> {
    vec![
        CatalogOption::new("professional", "Professional"),
        CatalogOption::new("casual", "Casual & Friendly"),
        CatalogOption::new("inspirational", "Inspirational"),
        CatalogOption::new("educational", "Educational"),
        CatalogOption::new("humorous", "Light & Humorous"),
        CatalogOption::new("thought-provoking", "Thought-Provoking"),
    ]
}

pub fn default_audiences() -> Vec<CatalogOption> {
    vec![
        CatalogOption::new("general", "General Professional"),
        CatalogOption::new("executives", "Executives & Leaders"),
        CatalogOption::new("entrepreneurs", "Entrepreneurs"),
        CatalogOption::new("tech-professionals", "Tech Professionals"),
        CatalogOption::new("engineering managers", "Engineering Managers"),
        CatalogOption::new("marketers", "Marketing Professionals"),
        CatalogOption::new("students", "Students & New Grads"),
        CatalogOption::new("consultants", "Consultants"),
        CatalogOption::new("salespeople", "Sales Professionals"),
    ]
}
