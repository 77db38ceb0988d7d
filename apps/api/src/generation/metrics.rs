//! Metrics: per-variant latency/token figures and their request-level aggregate.
//!
//! Pure aggregation: no clocks are read here. Durations come from the invoker
//! (model time only) and from the orchestrator (request wall clock).
//! Cost is `None` whenever token counts are missing, never zero.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::generation::invoker::ModelResponse;
use crate::llm_client::TokenUsage;

/// USD prices per million tokens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingTable {
    pub prompt_usd_per_mtok: f64,
    pub completion_usd_per_mtok: f64,
}

impl PricingTable {
    pub fn estimate(&self, usage: &TokenUsage) -> f64 {
        (usage.prompt_tokens as f64 * self.prompt_usd_per_mtok
            + usage.completion_tokens as f64 * self.completion_usd_per_mtok)
            / 1_000_000.0
    }
}

impl Default for PricingTable {
    fn default() -> Self {
        Self {
            prompt_usd_per_mtok: 3.0,
            completion_usd_per_mtok: 15.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantMetrics {
    pub variant_index: usize,
    pub duration_ms: u64,
    pub attempts: u32,
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub estimated_cost_usd: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationMetrics {
    pub model: String,
    /// max(request wall clock, slowest variant).
    pub total_duration_ms: u64,
    pub average_variant_duration_ms: u64,
    pub total_prompt_tokens: u64,
    pub total_completion_tokens: u64,
    pub total_tokens: u64,
    /// False if any variant lacked provider-reported usage.
    pub usage_complete: bool,
    pub estimated_cost_usd: Option<f64>,
    pub variants: Vec<VariantMetrics>,
}

#[derive(Debug, Clone)]
pub struct MetricsCollector {
    pricing: PricingTable,
    model: String,
}

impl MetricsCollector {
    pub fn new(pricing: PricingTable, model: impl Into<String>) -> Self {
        Self {
            pricing,
            model: model.into(),
        }
    }

    pub fn variant(&self, variant_index: usize, response: &ModelResponse) -> VariantMetrics {
        VariantMetrics {
            variant_index,
            duration_ms: response.duration.as_millis() as u64,
            attempts: response.attempts,
            prompt_tokens: response.usage.map(|u| u.prompt_tokens),
            completion_tokens: response.usage.map(|u| u.completion_tokens),
            estimated_cost_usd: response.usage.map(|u| self.pricing.estimate(&u)),
        }
    }

    pub fn record(&self, variants: Vec<VariantMetrics>, wall_clock: Duration) -> GenerationMetrics {
        let slowest = variants.iter().map(|v| v.duration_ms).max().unwrap_or(0);
        let summed_ms: u64 = variants.iter().map(|v| v.duration_ms).sum();
        let average = if variants.is_empty() {
            0
        } else {
            summed_ms / variants.len() as u64
        };

        let total_prompt_tokens: u64 = variants
            .iter()
            .filter_map(|v| v.prompt_tokens)
            .map(u64::from)
            .sum();
        let total_completion_tokens: u64 = variants
            .iter()
            .filter_map(|v| v.completion_tokens)
            .map(u64::from)
            .sum();

        let usage_complete = variants.iter().all(|v| v.estimated_cost_usd.is_some());
        let estimated_cost_usd = if usage_complete && !variants.is_empty() {
            Some(variants.iter().filter_map(|v| v.estimated_cost_usd).sum())
        } else {
            None
        };

        GenerationMetrics {
            model: self.model.clone(),
            total_duration_ms: (wall_clock.as_millis() as u64).max(slowest),
            average_variant_duration_ms: average,
            total_prompt_tokens,
            total_completion_tokens,
            total_tokens: total_prompt_tokens + total_completion_tokens,
            usage_complete,
            estimated_cost_usd,
            variants,
        }
    }
}
