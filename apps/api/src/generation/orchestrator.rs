//! Generation orchestrator: runs the full post generation pipeline for one request.
//!
//! Flow: validate → (build prompt → invoke model → assemble post) × variant_count
//!       → aggregate metrics → GenerationResult.
//!
//! Variant pipelines run concurrently on the request's own task (bounded by
//! `concurrency`); nothing is spawned. Dropping the returned future therefore
//! cancels every in-flight model call. Results keep variant order.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

use crate::generation::assembler::{assemble, AssemblyError, GeneratedPost};
use crate::generation::catalog::OptionCatalog;
use crate::generation::invoker::ModelInvoker;
use crate::generation::metrics::{GenerationMetrics, MetricsCollector, VariantMetrics};
use crate::generation::prompt_builder::build;
use crate::generation::validator::{
    validate, GenerationRequest, RawGenerationRequest, ValidationError, ValidationLimits,
};
use crate::llm_client::LlmError;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    Completed,
    PartiallyCompleted,
    Failed,
}

/// Why a single variant produced no post.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VariantError {
    #[error(transparent)]
    Model(#[from] LlmError),

    #[error(transparent)]
    Assembly(#[from] AssemblyError),
}

impl VariantError {
    pub fn kind(&self) -> &'static str {
        match self {
            VariantError::Model(e) => e.kind(),
            VariantError::Assembly(AssemblyError::MalformedOutput(_)) => "malformed_output",
        }
    }
}

/// Per-variant failure entry in the response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantFailure {
    pub variant_index: usize,
    pub kind: &'static str,
    pub message: String,
    #[serde(skip)]
    pub error: VariantError,
}

impl VariantFailure {
    fn new(variant_index: usize, error: VariantError) -> Self {
        Self {
            variant_index,
            kind: error.kind(),
            message: error.to_string(),
            error,
        }
    }
}

/// Response for a request that produced at least one post.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationResult {
    pub request_id: Uuid,
    pub status: GenerationStatus,
    /// Successful posts in variant order.
    pub posts: Vec<GeneratedPost>,
    /// One entry per failed variant; `posts.len() + failures.len() == variant_count`.
    pub failures: Vec<VariantFailure>,
    pub metrics: GenerationMetrics,
    pub request: GenerationRequest,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("all {failed} variants failed; first error (variant {}): {}", .first.variant_index, .first.message)]
    AllVariantsFailed {
        request_id: Uuid,
        first: VariantFailure,
        failed: usize,
    },
}

/// Result of one variant pipeline. `metrics` is set whenever the model answered.
struct VariantOutcome {
    post: Result<GeneratedPost, VariantFailure>,
    metrics: Option<VariantMetrics>,
}

// ────────────────────────────────────────────────────────────────────────────
// Orchestrator
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct GenerationOrchestrator {
    catalog: Arc<OptionCatalog>,
    limits: ValidationLimits,
    invoker: ModelInvoker,
    metrics: MetricsCollector,
    concurrency: usize,
}

impl GenerationOrchestrator {
    pub fn new(
        catalog: Arc<OptionCatalog>,
        limits: ValidationLimits,
        invoker: ModelInvoker,
        metrics: MetricsCollector,
        concurrency: usize,
    ) -> Self {
        Self {
            catalog,
            limits,
            invoker,
            metrics,
            concurrency: concurrency.max(1),
        }
    }

    pub fn catalog(&self) -> &OptionCatalog {
        &self.catalog
    }

    pub async fn generate(
        &self,
        raw: &RawGenerationRequest,
    ) -> Result<GenerationResult, GenerationError> {
        // Init: cheap rejection before any model call.
        let request = validate(raw, &self.catalog, &self.limits)?;
        let request_id = Uuid::new_v4();
        info!(
            %request_id,
            variants = request.variant_count,
            tone = %request.tone.value,
            length = %request.length,
            "Starting post generation"
        );

        // Dispatch + Collect. `buffered` preserves variant order.
        let started = Instant::now();
        let outcomes: Vec<VariantOutcome> =
            stream::iter(0..request.variant_count)
                .map(|index| self.run_variant(&request, index))
                .buffered(self.concurrency)
                .collect()
                .await;
        let wall_clock = started.elapsed();

        let mut posts = Vec::new();
        let mut variant_metrics = Vec::new();
        let mut failures = Vec::new();
        for outcome in outcomes {
            // Any variant that got a model response counts, even if assembly failed.
            variant_metrics.extend(outcome.metrics);
            match outcome.post {
                Ok(post) => posts.push(post),
                Err(failure) => failures.push(failure),
            }
        }

        let status = match (posts.is_empty(), failures.is_empty()) {
            (false, true) => GenerationStatus::Completed,
            (false, false) => GenerationStatus::PartiallyCompleted,
            (true, _) => GenerationStatus::Failed,
        };

        if status == GenerationStatus::Failed {
            let failed = failures.len();
            warn!(%request_id, failed, "All variants failed");
            // Non-empty: variant_count >= 1 and no post succeeded.
            let first = failures.swap_remove(0);
            return Err(GenerationError::AllVariantsFailed {
                request_id,
                first,
                failed,
            });
        }

        let metrics = self.metrics.record(variant_metrics, wall_clock);
        info!(
            %request_id,
            status = ?status,
            posts = posts.len(),
            failed = failures.len(),
            total_ms = metrics.total_duration_ms,
            tokens = metrics.total_tokens,
            cost_usd = ?metrics.estimated_cost_usd,
            "Post generation finished"
        );

        Ok(GenerationResult {
            request_id,
            status,
            posts,
            failures,
            metrics,
            request,
            generated_at: Utc::now(),
        })
    }

    /// One isolated variant pipeline. Any failure is captured and tagged with the index.
    async fn run_variant(&self, request: &GenerationRequest, index: usize) -> VariantOutcome {
        let spec = build(request, index);

        let response = match self.invoker.invoke(&spec).await {
            Ok(response) => response,
            Err(e) => {
                return VariantOutcome {
                    post: Err(self.fail(index, e.into())),
                    metrics: None,
                };
            }
        };

        VariantOutcome {
            post: assemble(&response, request, &spec).map_err(|e| self.fail(index, e.into())),
            metrics: Some(self.metrics.variant(index, &response)),
        }
    }

    fn fail(&self, index: usize, error: VariantError) -> VariantFailure {
        warn!(variant = index, kind = error.kind(), "Variant failed: {error}");
        VariantFailure::new(index, error)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
