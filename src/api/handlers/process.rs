use axum::{Json, extract::Multipart, extract::State};
use bytes::Bytes;

use crate::AppState;
use crate::api::models::process::ProcessFileResponse;
use crate::errors::{Error, Result};
use crate::extract::{self, DocumentKind};
use crate::reply;

/// Process a single uploaded document.
///
/// Accepts one file per request under the `file` multipart field, validates
/// its MIME type against the allow-list, extracts a bounded text excerpt,
/// forwards it to the extraction provider, and maps the reply into the
/// response body. A reply that is not valid JSON is not an error: it degrades
/// to the raw-text fallback with a 200 status.
pub async fn process_file(State(state): State<AppState>, mut multipart: Multipart) -> Result<Json<ProcessFileResponse>> {
    let mut upload: Option<(String, Bytes)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| Error::BadRequest {
        message: format!("Failed to parse multipart data: {}", e),
    })? {
        match field.name() {
            Some("file") => {
                let mime = field.content_type().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(|e| Error::BadRequest {
                    message: format!("Failed to read file upload: {}", e),
                })?;
                upload = Some((mime, data));
            }
            _ => {
                // Ignore unknown fields (forward compatibility)
            }
        }
    }

    let Some((mime, data)) = upload else {
        return Err(Error::BadRequest {
            message: "No file uploaded.".to_string(),
        });
    };

    // Validation happens before any extraction or upstream call
    let kind = DocumentKind::from_mime(&mime).ok_or_else(|| Error::BadRequest {
        message: "Invalid file type. Please upload an Excel, PDF, or image file.".to_string(),
    })?;

    tracing::debug!(mime = %mime, size_bytes = data.len(), "processing uploaded file");

    let excerpt = extract::excerpt(kind, data).await?;
    let raw_reply = state.provider.extract(&excerpt).await?;

    tracing::info!(raw_response = %raw_reply, "raw model reply");

    let parsed = reply::parse_reply(&raw_reply);
    if let reply::StructuredReply::Raw(_) = &parsed {
        tracing::warn!("model reply is not valid JSON, returning raw text instead");
    }

    Ok(Json(ProcessFileResponse::from(parsed)))
}
