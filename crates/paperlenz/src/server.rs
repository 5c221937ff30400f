//! HTTP service exposing the analysis and chat endpoints.
//!
//! | Method | Path                          | Body                       | Answer                   |
//! |--------|-------------------------------|----------------------------|--------------------------|
//! | POST   | `/functions/v1/analyze-paper` | [`AnalyzeRequest`]         | [`AnalyzeResponse`]      |
//! | POST   | `/chat`                       | `{"messages": [...]}`      | `{"content": "..."}`     |
//! | GET    | `/health`                     |                            | `{"status": "ok", ...}`  |
//!
//! Any origin may call the service; CORS preflights are answered by the CORS layer.

use std::net::SocketAddr;

use axum::{
  body::Bytes,
  extract::State,
  http::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    HeaderName, Method, StatusCode,
  },
  routing::{get, post},
  Json, Router,
};
use tokio::net::TcpListener;
use tower_http::{
  cors::{Any, CorsLayer},
  trace::TraceLayer,
};

use super::*;
use crate::{
  analyzer::{AnalyzeRequest, AnalyzeResponse, Analyzer},
  backend::ANALYZE_PATH,
  chat::complete_chat,
  llm::Message,
};

/// Body of a chat request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatPayload {
  /// Conversation so far, oldest first
  #[serde(default)]
  pub messages: Vec<Message>,
}

/// Body of a successful chat response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
  /// The assistant's answer
  pub content: String,
}

/// Body of a failed request outside the analysis endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
  /// What went wrong
  pub error: String,
}

/// Body of the health check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
  /// Always `ok`
  pub status:  String,
  /// Crate version
  pub version: String,
}

/// Shared handler state.
#[derive(Clone)]
struct AppState {
  /// Does the work of both POST endpoints
  analyzer: Arc<Analyzer>,
}

/// Builds the service router.
pub fn router(analyzer: Analyzer) -> Router {
  let cors = CorsLayer::new()
    .allow_origin(Any)
    .allow_methods([Method::POST, Method::OPTIONS])
    .allow_headers([
      AUTHORIZATION,
      HeaderName::from_static("x-client-info"),
      HeaderName::from_static("apikey"),
      CONTENT_TYPE,
    ]);

  Router::new()
    .route(&format!("/{ANALYZE_PATH}"), post(analyze_paper))
    .route("/chat", post(chat))
    .route("/health", get(health))
    .layer(cors)
    .layer(TraceLayer::new_for_http())
    .with_state(AppState { analyzer: Arc::new(analyzer) })
}

/// Serves requests on `listener` until the process ends.
pub async fn serve(listener: TcpListener, analyzer: Analyzer) -> Result<()> {
  if let Ok(addr) = listener.local_addr() {
    info!("Listening on http://{addr}");
  }
  axum::serve(listener, router(analyzer)).await?;
  Ok(())
}

/// Binds `addr` and serves requests on it.
pub async fn bind_and_serve(addr: SocketAddr, analyzer: Analyzer) -> Result<()> {
  let listener = TcpListener::bind(addr).await?;
  serve(listener, analyzer).await
}

/// `POST /functions/v1/analyze-paper`
async fn analyze_paper(
  State(state): State<AppState>,
  body: Bytes,
) -> (StatusCode, Json<AnalyzeResponse>) {
  let request: AnalyzeRequest = match serde_json::from_slice(&body) {
    Ok(request) => request,
    Err(e) => {
      debug!("Undecodable analysis request: {e}");
      return (
        StatusCode::BAD_REQUEST,
        Json(AnalyzeResponse::failure(format!("Invalid request body: {e}"))),
      );
    },
  };

  let (status, response) = state.analyzer.handle(&request).await;
  (status, Json(response))
}

/// `POST /chat`
async fn chat(
  State(state): State<AppState>,
  body: Bytes,
) -> std::result::Result<Json<ChatReply>, (StatusCode, Json<ErrorBody>)> {
  let payload: ChatPayload = serde_json::from_slice(&body).map_err(|e| {
    (StatusCode::BAD_REQUEST, Json(ErrorBody { error: format!("Invalid request body: {e}") }))
  })?;
  if payload.messages.is_empty() {
    return Err((StatusCode::BAD_REQUEST, Json(ErrorBody { error: "No messages".into() })));
  }

  match complete_chat(state.analyzer.llm(), &payload.messages).await {
    Ok(content) => Ok(Json(ChatReply { content })),
    Err(e) => {
      error!("Chat failed: {e}");
      Err((StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody { error: e.to_string() })))
    },
  }
}

/// `GET /health`
async fn health() -> Json<Health> {
  Json(Health { status: "ok".into(), version: env!("CARGO_PKG_VERSION").into() })
}
