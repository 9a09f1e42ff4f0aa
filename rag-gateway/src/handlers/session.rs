use crate::services::history;
use axum::{response::IntoResponse, Json};
use gateway_core::error::AppError;
use serde_json::json;
use tower_sessions::Session;

/// Reset the caller's chat history. Other sessions are untouched.
pub async fn clear_history(session: Session) -> Result<impl IntoResponse, AppError> {
    history::clear_history(&session).await?;
    Ok(Json(json!({ "message": "Chat history cleared" })))
}
