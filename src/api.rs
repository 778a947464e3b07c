//! HTTP surface for the legal assistant.
//!
//! - `POST /api/query` – Answer a question and return the structured answer.
//! - `POST /process-query` – Same pipeline wrapped in a `{status, data}` envelope.
//! - `GET /api/health` – Index readiness, chunk count, and model name.
//! - `GET /` and `POST /` – Server-rendered question form (see [`crate::web`]).
//! - `GET /commands` – Machine-readable command catalog for discovery.
//!
//! CORS is permissive so browser front ends on other origins can call the API.

use crate::agents::{AgentError, StructuredAnswer};
use crate::assistant::{AssistantApi, HealthReport, IndexHealth};
use crate::web;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the HTTP router around an assistant implementation.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: AssistantApi + 'static,
{
    Router::new()
        .route("/api/query", post(query::<S>))
        .route("/process-query", post(process_query::<S>))
        .route("/api/health", get(health::<S>))
        .route("/commands", get(get_commands))
        .route("/", get(web::index_page).post(web::answer_page::<S>))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Request body shared by the query endpoints.
#[derive(Deserialize)]
struct QueryRequest {
    /// The user's question.
    #[serde(default)]
    query: String,
}

fn validated(request: QueryRequest) -> Result<String, AppError> {
    let query = request.query.trim();
    if query.is_empty() {
        return Err(AppError::EmptyQuery);
    }
    Ok(query.to_string())
}

/// Answer a question with the bare structured answer.
async fn query<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<StructuredAnswer>, AppError>
where
    S: AssistantApi,
{
    let query = validated(request)?;
    tracing::info!(query_chars = query.chars().count(), "Query received");
    let answer = service.answer(&query).await?;
    Ok(Json(answer))
}

/// Success envelope for `POST /process-query`.
#[derive(Serialize)]
struct ProcessQueryResponse {
    status: &'static str,
    data: StructuredAnswer,
}

/// Answer a question inside the `{status, data}` envelope.
async fn process_query<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<ProcessQueryResponse>, Response>
where
    S: AssistantApi,
{
    let query = validated(request).map_err(IntoResponse::into_response)?;
    match service.answer(&query).await {
        Ok(data) => Ok(Json(ProcessQueryResponse {
            status: "success",
            data,
        })),
        Err(error) => {
            tracing::error!(error = %error, "Query processing failed");
            let body = json!({
                "detail": {
                    "status": "error",
                    "message": error.to_string(),
                    "data": StructuredAnswer::apology(),
                }
            });
            Err((StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response())
        }
    }
}

/// Response body for `GET /api/health`.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    index: IndexHealth,
    model: String,
    ingestion: crate::metrics::MetricsSnapshot,
}

/// Report service health.
async fn health<S>(State(service): State<Arc<S>>) -> Json<HealthResponse>
where
    S: AssistantApi,
{
    let HealthReport {
        index,
        model,
        ingestion,
    } = service.health().await;
    Json(HealthResponse {
        status: "healthy",
        index,
        model,
        ingestion,
    })
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery by tools and front ends.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "query",
                method: "POST",
                path: "/api/query",
                description: "Answer a legal question. Returns { simple_explanation, key_points, important_terms, warnings_and_deadlines, step_by_step_guide, sources }.",
                request_example: Some(json!({ "query": "How do I file a civil lawsuit?" })),
            },
            CommandDescriptor {
                name: "process_query",
                method: "POST",
                path: "/process-query",
                description: "Answer a legal question inside a { status, data } envelope; failures carry an apology answer under detail.data.",
                request_example: Some(json!({ "query": "What is anticipatory bail?" })),
            },
            CommandDescriptor {
                name: "health",
                method: "GET",
                path: "/api/health",
                description: "Report vector index readiness, indexed chunk count, and the language model in use.",
                request_example: None,
            },
            CommandDescriptor {
                name: "ask_form",
                method: "GET",
                path: "/",
                description: "HTML form for asking questions from a browser.",
                request_example: None,
            },
        ],
    })
}

enum AppError {
    EmptyQuery,
    Agent(AgentError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            Self::EmptyQuery => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Query must not be empty".to_string(),
            ),
            Self::Agent(error) => {
                tracing::error!(error = %error, "Query processing failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Error processing query: {error}"),
                )
            }
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

impl From<AgentError> for AppError {
    fn from(inner: AgentError) -> Self {
        Self::Agent(inner)
    }
}

#[cfg(test)]
mod tests {
    use super::{create_router, get_commands};
    use crate::agents::{AgentError, StructuredAnswer};
    use crate::assistant::{AssistantApi, HealthReport, IndexHealth};
    use crate::llm::LlmError;
    use crate::metrics::MetricsSnapshot;
    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode},
    };
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    struct StubAssistant {
        fail: bool,
        queries: Mutex<Vec<String>>,
    }

    impl StubAssistant {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                fail,
                queries: Mutex::new(Vec::new()),
            })
        }

        async fn recorded(&self) -> Vec<String> {
            self.queries.lock().await.clone()
        }
    }

    #[async_trait]
    impl AssistantApi for StubAssistant {
        async fn answer(&self, query: &str) -> Result<StructuredAnswer, AgentError> {
            self.queries.lock().await.push(query.to_string());
            if self.fail {
                return Err(AgentError::Llm(LlmError::ProviderUnavailable("offline".into())));
            }
            Ok(StructuredAnswer {
                key_points: vec!["File a plaint".into()],
                ..StructuredAnswer::explanation_only(format!("About: {query}"))
            })
        }

        async fn health(&self) -> HealthReport {
            HealthReport {
                index: IndexHealth {
                    ready: true,
                    chunks: 7,
                },
                model: "stub-model".into(),
                ingestion: MetricsSnapshot {
                    documents_indexed: 1,
                    documents_skipped: 0,
                    chunks_indexed: 7,
                },
            }
        }
    }

    async fn post_json(service: Arc<StubAssistant>, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = create_router(service)
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .expect("request"),
            )
            .await
            .expect("router response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        (status, serde_json::from_slice(&bytes).expect("json body"))
    }

    #[tokio::test]
    async fn query_returns_structured_answer() {
        let service = StubAssistant::new(false);
        let (status, body) = post_json(
            service.clone(),
            "/api/query",
            json!({ "query": "  How do I file a lawsuit?  " }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["simple_explanation"], "About: How do I file a lawsuit?");
        assert_eq!(body["key_points"], json!(["File a plaint"]));
        assert!(body["step_by_step_guide"].is_null());
        assert_eq!(service.recorded().await, vec!["How do I file a lawsuit?"]);
    }

    #[tokio::test]
    async fn empty_query_is_rejected_without_calling_the_pipeline() {
        let service = StubAssistant::new(false);
        let (status, body) = post_json(service.clone(), "/api/query", json!({ "query": "   " })).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["detail"], "Query must not be empty");
        assert!(service.recorded().await.is_empty());
    }

    #[tokio::test]
    async fn pipeline_failure_maps_to_500_detail() {
        let (status, body) =
            post_json(StubAssistant::new(true), "/api/query", json!({ "query": "q" })).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let detail = body["detail"].as_str().expect("detail string");
        assert!(detail.starts_with("Error processing query"));
    }

    #[tokio::test]
    async fn process_query_wraps_answer_in_envelope() {
        let (status, body) =
            post_json(StubAssistant::new(false), "/process-query", json!({ "query": "q" })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["data"]["simple_explanation"], "About: q");
    }

    #[tokio::test]
    async fn process_query_failure_carries_apology() {
        let (status, body) =
            post_json(StubAssistant::new(true), "/process-query", json!({ "query": "q" })).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"]["status"], "error");
        let apology: StructuredAnswer =
            serde_json::from_value(body["detail"]["data"].clone()).expect("apology answer");
        assert_eq!(apology, StructuredAnswer::apology());
    }

    #[tokio::test]
    async fn health_reports_index_and_model() {
        let response = create_router(StubAssistant::new(false))
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let body: Value = serde_json::from_slice(&bytes).expect("json body");
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["index"], json!({ "ready": true, "chunks": 7 }));
        assert_eq!(body["model"], "stub-model");
    }

    #[tokio::test]
    async fn commands_catalog_exposes_query_endpoint() {
        let commands = get_commands().await.0.commands;
        let query = commands
            .iter()
            .find(|cmd| cmd.name == "query")
            .expect("query command present");

        assert_eq!(query.method, "POST");
        assert_eq!(query.path, "/api/query");
        assert!(commands.iter().any(|cmd| cmd.path == "/api/health"));
    }

    #[tokio::test]
    async fn cors_allows_any_origin() {
        let response = create_router(StubAssistant::new(false))
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .header("origin", "http://localhost:8501")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .and_then(|value| value.to_str().ok()),
            Some("*")
        );
    }
}
