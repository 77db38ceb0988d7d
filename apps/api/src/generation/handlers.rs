//! Axum route handlers for the Generation API.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::generation::catalog::CatalogOption;
use crate::generation::orchestrator::GenerationResult;
use crate::generation::validator::RawGenerationRequest;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct TonesResponse {
    pub tones: Vec<CatalogOption>,
}

#[derive(Debug, Serialize)]
pub struct AudiencesResponse {
    pub audiences: Vec<CatalogOption>,
}

/// POST /api/v1/posts/generate
///
/// Runs the generation pipeline. Partial success is still a 200: failed variants
/// are listed under `failures` next to the successful posts. A body that does not
/// deserialize is a 400 like any other validation failure.
pub async fn handle_generate(
    State(state): State<AppState>,
    payload: Result<Json<RawGenerationRequest>, JsonRejection>,
) -> Result<Json<GenerationResult>, AppError> {
    let Json(request) = payload?;
    let result = state.orchestrator.generate(&request).await?;
    Ok(Json(result))
}

/// GET /api/v1/tones
pub async fn handle_list_tones(State(state): State<AppState>) -> Json<TonesResponse> {
    Json(TonesResponse {
        tones: state.orchestrator.catalog().tones().to_vec(),
    })
}

/// GET /api/v1/audiences
pub async fn handle_list_audiences(State(state): State<AppState>) -> Json<AudiencesResponse> {
    Json(AudiencesResponse {
        audiences: state.orchestrator.catalog().audiences().to_vec(),
    })
}
