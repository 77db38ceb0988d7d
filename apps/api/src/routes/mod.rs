pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::generation::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Generation API
        .route("/api/v1/posts/generate", post(handlers::handle_generate))
        .route("/api/v1/tones", get(handlers::handle_list_tones))
        .route("/api/v1/audiences", get(handlers::handle_list_audiences))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::generation::catalog::{default_audiences, default_tones, OptionCatalog};
    use crate::generation::invoker::{ModelInvoker, RetryPolicy, SamplingParams};
    use crate::generation::metrics::{MetricsCollector, PricingTable};
    use crate::generation::orchestrator::GenerationOrchestrator;
    use crate::generation::validator::ValidationLimits;
    use crate::llm_client::testing::{is_variant, sample_output, FakeModel, FakeReply};
    use crate::llm_client::LlmError;

    const TIMEOUT: Duration = Duration::from_secs(10);

    fn test_config() -> Config {
        Config {
            anthropic_api_key: "test-key".into(),
            port: 0,
            rust_log: "debug".into(),
            model_timeout: TIMEOUT,
            retry: RetryPolicy::default(),
            sampling: SamplingParams::default(),
            limits: ValidationLimits::default(),
            variant_concurrency: 5,
            pricing: PricingTable::default(),
            tones: default_tones(),
            audiences: default_audiences(),
        }
    }

    fn app(model: Arc<FakeModel>) -> Router {
        let config = test_config();
        let orchestrator = GenerationOrchestrator::new(
            Arc::new(OptionCatalog::new(config.tones.clone(), config.audiences.clone())),
            config.limits,
            ModelInvoker::new(model, config.model_timeout, config.retry, config.sampling),
            MetricsCollector::new(config.pricing, "fake-model"),
            config.variant_concurrency,
        );
        build_router(AppState { orchestrator })
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn generate(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/posts/generate")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn remote_work(variant_count: u32) -> Value {
        json!({
            "topic": "remote work tips",
            "tone": "professional",
            "audience": "engineering managers",
            "length": "medium",
            "variant_count": variant_count
        })
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(app(Arc::new(FakeModel::always(120))), get_request("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "postgen-api");
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_completed() {
        let model = Arc::new(FakeModel::always(150));
        let (status, body) = send(app(model.clone()), generate(remote_work(2))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "completed");
        assert_eq!(body["posts"].as_array().unwrap().len(), 2);
        assert_eq!(body["failures"].as_array().unwrap().len(), 0);
        assert_eq!(body["request"]["tone"]["value"], "professional");
        assert_eq!(body["request"]["length"], "medium");
        assert!(body["request_id"].is_string());
        assert!(body["metrics"]["estimated_cost_usd"].is_number());
        assert_eq!(body["posts"][0]["hashtags"][0], "#RemoteWork");
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_post_count_alias_is_accepted() {
        let model = Arc::new(FakeModel::always(150));
        let body = json!({ "topic": "remote work tips", "post_count": 3 });
        let (status, body) = send(app(model.clone()), generate(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["posts"].as_array().unwrap().len(), 3);
        assert_eq!(model.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_tone_is_400_without_model_calls() {
        let model = Arc::new(FakeModel::always(150));
        let mut request = remote_work(2);
        request["tone"] = json!("motivational");
        let (status, body) = send(app(model.clone()), generate(request)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["details"]["field"], "tone");
        assert!(body["error"]["details"]["allowed"]
            .as_array()
            .unwrap()
            .contains(&json!("professional")));
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wrongly_typed_fields_are_400_validation_errors() {
        for request in [
            json!({ "topic": "remote work tips", "variant_count": "two" }),
            json!({ "topic": "remote work tips", "tone": 5 }),
        ] {
            let model = Arc::new(FakeModel::always(150));
            let (status, body) = send(app(model.clone()), generate(request)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
            assert_eq!(body["error"]["details"]["field"], "body");
            assert!(body["error"]["message"].as_str().unwrap().contains("deserialize"));
            assert_eq!(model.calls(), 0);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_json_is_400() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/posts/generate")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"topic\": "))
            .unwrap();
        let (status, body) = send(app(Arc::new(FakeModel::always(150))), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test(start_paused = true)]
    async fn test_variant_count_out_of_range_is_400() {
        let model = Arc::new(FakeModel::always(150));
        let (status, body) = send(app(model.clone()), generate(remote_work(0))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["details"]["max"], 5);
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_success_is_200() {
        let model = Arc::new(FakeModel::new(|req, _| {
            if is_variant(req, 2) {
                FakeReply::Delayed(
                    Duration::from_secs(3600),
                    Box::new(FakeReply::Text(sample_output(150))),
                )
            } else {
                FakeReply::Text(sample_output(150))
            }
        }));
        let (status, body) = send(app(model), generate(remote_work(2))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "partially_completed");
        assert_eq!(body["posts"][0]["variant_index"], 0);
        assert_eq!(body["failures"][0]["variant_index"], 1);
        assert_eq!(body["failures"][0]["kind"], "timeout");
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_timeouts_is_504() {
        let model = Arc::new(FakeModel::new(|_, _| {
            FakeReply::Delayed(
                Duration::from_secs(3600),
                Box::new(FakeReply::Text(sample_output(150))),
            )
        }));
        let (status, body) = send(app(model), generate(remote_work(2))).await;

        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body["error"]["code"], "GENERATION_FAILED");
        assert_eq!(body["error"]["details"]["failed_variants"], 2);
        assert_eq!(body["error"]["details"]["first_error"]["kind"], "timeout");
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_upstream_failures_is_502() {
        let model = Arc::new(FakeModel::new(|_, _| {
            FakeReply::Fail(LlmError::Upstream {
                status: Some(400),
                message: "content blocked".into(),
            })
        }));
        let (status, body) = send(app(model), generate(remote_work(1))).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["details"]["first_error"]["kind"], "upstream");
    }

    #[tokio::test]
    async fn test_list_tones_and_audiences() {
        let (status, body) = send(
            app(Arc::new(FakeModel::always(120))),
            get_request("/api/v1/tones"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let tones = body["tones"].as_array().unwrap();
        assert_eq!(tones.len(), default_tones().len());
        assert_eq!(tones[0]["value"], "professional");

        let (status, body) = send(
            app(Arc::new(FakeModel::always(120))),
            get_request("/api/v1/audiences"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["audiences"]
            .as_array()
            .unwrap()
            .iter()
            .any(|a| a["value"] == "engineering managers"));
    }
}
