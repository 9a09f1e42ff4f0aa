use crate::services::{history, SpooledFile};
use crate::AppState;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use gateway_core::error::AppError;
use std::path::Path;
use tower_sessions::Session;

/// Relay one uploaded PDF to the RAG service.
///
/// The file is validated before it touches the network, spooled to the
/// upload directory for the duration of the request, and removed on every
/// exit path by the [`SpooledFile`] guard.
pub async fn upload(
    State(state): State<AppState>,
    session: Session,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut file: Option<(String, SpooledFile, u64)> = None;

    while let Some(mut field) = multipart.next_field().await.map_err(|e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(format!(
                "File exceeds the {} byte upload limit",
                state.config.upload.max_bytes
            ))
        } else {
            AppError::BadRequest(anyhow::anyhow!("Failed to read multipart field: {}", e))
        }
    })? {
        // Any other field is treated as an advisory session hint and skipped.
        if field.name() != Some("file") {
            continue;
        }

        let original_name = field.file_name().unwrap_or("unnamed").to_string();
        let content_type = field.content_type().map(str::to_string);
        validate_upload(&original_name, content_type.as_deref())?;

        // The body is streamed to the spool chunk by chunk, never buffered
        // whole. An error mid-stream drops the guard and cleans up.
        let mut spooled = SpooledFile::create(Path::new(&state.config.upload.dir)).await?;
        let mut size: u64 = 0;
        while let Some(chunk) = field.chunk().await.map_err(|e| {
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                AppError::PayloadTooLarge(format!(
                    "File exceeds the {} byte upload limit",
                    state.config.upload.max_bytes
                ))
            } else {
                AppError::BadRequest(anyhow::anyhow!("Failed to read file bytes: {}", e))
            }
        })? {
            size += chunk.len() as u64;
            spooled.write_chunk(&chunk).await?;
        }
        spooled.finish().await?;

        file = Some((original_name, spooled, size));
        break;
    }

    let (original_name, spooled, size) = file
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("No file uploaded")))?;

    tracing::info!(
        file_name = %original_name,
        size,
        "Upload received, relaying to RAG service"
    );

    let relayed = state
        .rag_client
        .upload(spooled.path(), &original_name)
        .await;

    // Guard drops here regardless of the relay outcome; the spooled file is
    // gone before the response is produced.
    drop(spooled);

    let response = relayed?;

    history::bind_upload(&session, &response.session_id).await?;

    metrics::counter!("uploads_relayed_total").increment(1);
    tracing::info!(
        file_name = %original_name,
        session_id = %response.session_id,
        "Upload relayed successfully"
    );

    Ok(Json(response))
}

/// Policy check applied before spooling or forwarding anything.
fn validate_upload(original_name: &str, content_type: Option<&str>) -> Result<(), AppError> {
    if original_name.contains("..")
        || original_name.contains('/')
        || original_name.contains('\\')
    {
        return Err(AppError::BadRequest(anyhow::anyhow!("Invalid filename")));
    }

    let is_pdf_name = original_name.to_lowercase().ends_with(".pdf");
    let is_pdf_type = content_type == Some("application/pdf");
    if !is_pdf_name && !is_pdf_type {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Only PDF files are supported"
        )));
    }

    Ok(())
}
