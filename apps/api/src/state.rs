use crate::generation::orchestrator::GenerationOrchestrator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Holds the catalog, model invoker and metrics collector. Cheap to clone.
    pub orchestrator: GenerationOrchestrator,
}
