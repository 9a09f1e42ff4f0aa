use crate::dtos::{AskRequest, CompareRequest, SummarizeRequest};
use crate::services::history;
use crate::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use gateway_core::error::AppError;
use tower_sessions::Session;
use validator::Validate;

/// Relay a question against one or more uploaded documents.
///
/// The session's accumulated chat history rides along with the question, and
/// a successful answer is appended to it, question first.
pub async fn ask(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<AskRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;

    let chat_history = history::chat_history(&session).await?;
    let response = state
        .rag_client
        .ask(&request.question, &request.session_ids, &chat_history)
        .await?;

    if let Some(answer) = response.get("answer").and_then(|v| v.as_str()) {
        history::append_exchange(&session, &request.question, answer).await?;
    }

    metrics::counter!("queries_relayed_total", "endpoint" => "ask").increment(1);
    Ok(Json(response))
}

pub async fn summarize(
    State(state): State<AppState>,
    Json(request): Json<SummarizeRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;

    let response = state.rag_client.summarize(&request.session_ids).await?;
    metrics::counter!("queries_relayed_total", "endpoint" => "summarize").increment(1);
    Ok(Json(response))
}

pub async fn compare(
    State(state): State<AppState>,
    Json(request): Json<CompareRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;

    let response = state.rag_client.compare(&request.session_ids).await?;
    metrics::counter!("queries_relayed_total", "endpoint" => "compare").increment(1);
    Ok(Json(response))
}
