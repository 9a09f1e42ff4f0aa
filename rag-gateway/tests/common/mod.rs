use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use rag_gateway::config::GatewayConfig;
use rag_gateway::startup::Application;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub struct TestApp {
    pub address: String,
    pub upload_dir: String,
    pub rag: MockRag,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    /// Spawn the gateway against a fresh mock RAG service, letting the test
    /// adjust the configuration (rate limits, upload caps, upstream URL).
    pub async fn spawn_with(customize: impl FnOnce(&mut GatewayConfig)) -> Self {
        std::env::set_var("SESSION_SECRET", "test-session-secret");

        let rag = MockRag::spawn().await;
        let upload_dir = format!("target/test-uploads-{}", Uuid::new_v4());

        let mut config = GatewayConfig::load().expect("Failed to load configuration");
        config.common.port = 0; // Random port
        config.log_level = "error".to_string();
        config.upload.dir = upload_dir.clone();
        config.rag_service.url = rag.url.clone();
        customize(&mut config);

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");
        let port = app.port();

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        let address = format!("http://127.0.0.1:{}", port);

        // Wait for the server to be ready by polling the health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            upload_dir,
            rag,
        }
    }

    /// A client with its own cookie jar, i.e. its own gateway session.
    pub fn client(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to build client")
    }

    pub fn spooled_file_count(&self) -> usize {
        match std::fs::read_dir(&self.upload_dir) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }

    pub async fn cleanup(&self) {
        let _ = tokio::fs::remove_dir_all(&self.upload_dir).await;
    }
}

/// Recorded state of the mock upstream, for asserting what was (or was not)
/// forwarded.
#[derive(Clone, Default)]
pub struct MockState {
    pub hits: Arc<Mutex<Vec<String>>>,
    pub ask_bodies: Arc<Mutex<Vec<serde_json::Value>>>,
}

pub struct MockRag {
    pub url: String,
    state: MockState,
}

impl MockRag {
    pub async fn spawn() -> Self {
        Self::spawn_router(None).await
    }

    /// A mock that answers every relay endpoint with the given status.
    pub async fn spawn_failing(status: StatusCode) -> Self {
        Self::spawn_router(Some(status)).await
    }

    async fn spawn_router(fail_with: Option<StatusCode>) -> Self {
        let state = MockState::default();

        let router = match fail_with {
            Some(status) => {
                let handler = move || async move { (status, "upstream exploded") };
                Router::new()
                    .route("/upload", post(handler.clone()))
                    .route("/ask", post(handler.clone()))
                    .route("/summarize", post(handler.clone()))
                    .route("/compare", post(handler))
                    .route("/healthz", get(mock_healthz))
            }
            None => Router::new()
                .route("/upload", post(mock_upload))
                .route("/ask", post(mock_ask))
                .route("/summarize", post(mock_summarize))
                .route("/compare", post(mock_compare))
                .route("/healthz", get(mock_healthz))
                .with_state(state.clone()),
        };

        let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .expect("Failed to bind mock RAG listener");
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });

        MockRag {
            url: format!("http://127.0.0.1:{}", port),
            state,
        }
    }

    pub fn hits(&self) -> Vec<String> {
        self.state.hits.lock().unwrap().clone()
    }

    /// Chat-history lengths observed by the mock on each /ask call.
    pub fn ask_history_lens(&self) -> Vec<usize> {
        self.state
            .ask_bodies
            .lock()
            .unwrap()
            .iter()
            .map(|body| {
                body.get("chat_history")
                    .and_then(|h| h.as_array())
                    .map(|h| h.len())
                    .unwrap_or(0)
            })
            .collect()
    }
}

async fn mock_upload(State(state): State<MockState>, mut multipart: Multipart) -> impl IntoResponse {
    state.hits.lock().unwrap().push("/upload".to_string());

    let mut page_count = 0;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.bytes().await.is_ok() {
            page_count = 3;
        }
    }

    Json(json!({
        "message": "PDF uploaded and processed",
        "session_id": Uuid::new_v4().to_string(),
        "page_count": page_count,
    }))
}

async fn mock_ask(
    State(state): State<MockState>,
    Json(body): Json<serde_json::Value>,
) -> impl IntoResponse {
    state.hits.lock().unwrap().push("/ask".to_string());
    state.ask_bodies.lock().unwrap().push(body);

    Json(json!({
        "answer": "The total is 42.",
        "citations": [{ "page": 1, "source": "report.pdf" }],
    }))
}

async fn mock_summarize(
    State(state): State<MockState>,
    Json(_body): Json<serde_json::Value>,
) -> impl IntoResponse {
    state.hits.lock().unwrap().push("/summarize".to_string());
    Json(json!({ "summary": "A short summary." }))
}

async fn mock_compare(
    State(state): State<MockState>,
    Json(_body): Json<serde_json::Value>,
) -> impl IntoResponse {
    state.hits.lock().unwrap().push("/compare".to_string());
    Json(json!({ "comparison": "Document A is longer than document B." }))
}

async fn mock_healthz() -> impl IntoResponse {
    Json(json!({ "status": "healthy" }))
}
