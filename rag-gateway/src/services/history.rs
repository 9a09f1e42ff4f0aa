//! Typed accessors for the cookie-bound session state.
//!
//! The session holds the upstream identifier of the most recent upload and
//! the running chat transcript. Everything is keyed by the caller's cookie,
//! so one caller's clear-history can never touch another session.

use crate::dtos::ChatMessage;
use gateway_core::error::AppError;
use tower_sessions::Session;

pub const SESSION_ID_KEY: &str = "rag_session_id";
pub const CHAT_HISTORY_KEY: &str = "chat_history";

pub async fn chat_history(session: &Session) -> Result<Vec<ChatMessage>, AppError> {
    Ok(session
        .get::<Vec<ChatMessage>>(CHAT_HISTORY_KEY)
        .await
        .map_err(session_error)?
        .unwrap_or_default())
}

/// Bind a freshly issued upstream session id to the caller's cookie session
/// and reset its chat history.
pub async fn bind_upload(session: &Session, session_id: &str) -> Result<(), AppError> {
    session
        .insert(SESSION_ID_KEY, session_id.to_string())
        .await
        .map_err(session_error)?;
    session
        .insert(CHAT_HISTORY_KEY, Vec::<ChatMessage>::new())
        .await
        .map_err(session_error)
}

/// Append a question/answer exchange, question first.
pub async fn append_exchange(
    session: &Session,
    question: &str,
    answer: &str,
) -> Result<(), AppError> {
    let mut history = chat_history(session).await?;
    history.push(ChatMessage::user(question));
    history.push(ChatMessage::assistant(answer));
    session
        .insert(CHAT_HISTORY_KEY, history)
        .await
        .map_err(session_error)
}

pub async fn clear_history(session: &Session) -> Result<(), AppError> {
    session
        .remove::<Vec<ChatMessage>>(CHAT_HISTORY_KEY)
        .await
        .map_err(session_error)?;
    Ok(())
}

fn session_error(err: tower_sessions::session::Error) -> AppError {
    AppError::InternalError(anyhow::anyhow!("session store: {}", err))
}
