pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::evaluation::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/rubric", get(handlers::handle_get_rubric))
        .route("/api/v1/evaluate", post(handlers::handle_evaluate))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::evaluation::evaluator::InstructorEvaluator;
    use crate::evaluation::rubric::RubricTemplate;
    use crate::llm_client::LlmClient;
    use crate::retrieval::QueryClient;

    fn test_state(query_url: String, ollama: &MockServer) -> AppState {
        let llm = LlmClient::new(&ollama.uri()).unwrap();
        let rubric = Arc::new(RubricTemplate::load(None).unwrap());
        AppState {
            query_client: QueryClient::new(query_url),
            evaluator: InstructorEvaluator::new(llm, rubric),
        }
    }

    async fn mount_model_reply(ollama: &MockServer, content: &str) {
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": {"role": "assistant", "content": content},
                "done": true
            })))
            .expect(1)
            .mount(ollama)
            .await;
    }

    async fn call(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn evaluate_request(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/evaluate")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn system_prompt_sent(ollama: &MockServer) -> String {
        let requests = ollama.received_requests().await.unwrap();
        let body: Value = requests[0].body_json().unwrap();
        body["messages"][0]["content"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let ollama = MockServer::start().await;
        let router = build_router(test_state("http://127.0.0.1:1".into(), &ollama));
        let request = Request::get("/health").body(Body::empty()).unwrap();
        let (status, body) = call(router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_rubric_lists_seven_criteria() {
        let ollama = MockServer::start().await;
        let router = build_router(test_state("http://127.0.0.1:1".into(), &ollama));
        let request = Request::get("/api/v1/rubric").body(Body::empty()).unwrap();
        let (status, body) = call(router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["version"], "2024.1");
        assert_eq!(body["criteria"].as_array().unwrap().len(), 7);
        assert_eq!(body["scale"], json!({"min": 0, "max": 3}));
    }

    #[tokio::test]
    async fn test_evaluate_with_retrieved_context() {
        let query_service = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/query"))
            .and(body_json(json!({"query": "Dr. Jane Doe"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "context": ["Transcript snippet A.", "Transcript snippet B."]
            })))
            .expect(1)
            .mount(&query_service)
            .await;

        let ollama = MockServer::start().await;
        let reply = r#"{"judge_parameters": {"Positivity": "2 - upbeat"}, "final_output_matrix": {"Positivity": 2}}"#;
        mount_model_reply(&ollama, reply).await;

        let state = test_state(format!("{}/api/query", query_service.uri()), &ollama);
        let (status, body) = call(
            build_router(state),
            evaluate_request(json!({"instructor_name": "Dr. Jane Doe"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["context_status"], "retrieved");
        assert_eq!(body["raw_output"], reply);
        assert_eq!(body["structured"]["final_output_matrix"]["Positivity"], 2);
        assert_eq!(body["model"], "llama3");
        assert!(system_prompt_sent(&ollama)
            .await
            .contains("Transcript snippet A. Transcript snippet B."));
    }

    #[tokio::test]
    async fn test_evaluate_uses_explicit_query() {
        let query_service = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(json!({"query": "intro biology lecture"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"context": ["t"]})))
            .expect(1)
            .mount(&query_service)
            .await;

        let ollama = MockServer::start().await;
        mount_model_reply(&ollama, "{}").await;

        let state = test_state(format!("{}/api/query", query_service.uri()), &ollama);
        let (status, _) = call(
            build_router(state),
            evaluate_request(json!({
                "instructor_name": "Dr. Jane Doe",
                "query": "intro biology lecture"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_evaluate_degrades_when_query_service_fails() {
        let query_service = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&query_service)
            .await;

        let ollama = MockServer::start().await;
        mount_model_reply(&ollama, "Dr. Jane Doe is not present in the transcripts.").await;

        let state = test_state(format!("{}/api/query", query_service.uri()), &ollama);
        let (status, body) = call(
            build_router(state),
            evaluate_request(json!({"instructor_name": "Dr. Jane Doe"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["context_status"], "unavailable");
        assert_eq!(
            body["raw_output"],
            "Dr. Jane Doe is not present in the transcripts."
        );
        assert!(body["structured"].is_null());
        assert!(system_prompt_sent(&ollama)
            .await
            .contains("Here is your training data/context/transcripts - \n"));
    }

    #[tokio::test]
    async fn test_evaluate_degrades_when_query_service_unreachable() {
        let ollama = MockServer::start().await;
        mount_model_reply(&ollama, "not json at all").await;

        let state = test_state("http://127.0.0.1:1/api/query".into(), &ollama);
        let (status, body) = call(
            build_router(state),
            evaluate_request(json!({"instructor_name": "A"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["context_status"], "unavailable");
        assert_eq!(body["raw_output"], "not json at all");
    }

    #[tokio::test]
    async fn test_evaluate_not_provided_context_sends_sentinel_text() {
        let query_service = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"documents": []})))
            .mount(&query_service)
            .await;

        let ollama = MockServer::start().await;
        mount_model_reply(&ollama, "{}").await;

        let state = test_state(format!("{}/api/query", query_service.uri()), &ollama);
        let (_, body) = call(
            build_router(state),
            evaluate_request(json!({"instructor_name": "A"})),
        )
        .await;

        assert_eq!(body["context_status"], "not_provided");
        assert!(system_prompt_sent(&ollama)
            .await
            .contains("transcripts - No context provided"));
    }

    #[tokio::test]
    async fn test_evaluate_model_failure_is_bad_gateway() {
        let query_service = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"context": ["t"]})))
            .mount(&query_service)
            .await;

        let ollama = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "oom"})))
            .expect(1)
            .mount(&ollama)
            .await;

        let state = test_state(format!("{}/api/query", query_service.uri()), &ollama);
        let (status, body) = call(
            build_router(state),
            evaluate_request(json!({"instructor_name": "A"})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "MODEL_ERROR");
    }
}
