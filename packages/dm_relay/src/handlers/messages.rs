use axum::{Json, extract::State, response::IntoResponse};
use serde::Deserialize;
use tracing::debug;

use crate::AppState;
use crate::error::{ApiError, require};
use crate::models::{HistoryEntry, Participants};

#[derive(Deserialize)]
pub struct AddMessageRequest {
    from: Option<String>,
    to: Option<String>,
    message: Option<String>,
    image: Option<String>,
}

/// Append one message to the history of `from` and `to`.
///
/// Independent of live delivery: the relay never writes history on its own.
pub async fn add_message_handler(
    State(state): State<AppState>,
    Json(req): Json<AddMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let from = require(req.from.as_deref(), "from")?;
    let to = require(req.to.as_deref(), "to")?;
    if from == to {
        return Err(ApiError::Invalid(
            "from and to must be different users".to_string(),
        ));
    }

    let participants = Participants::new(from, to);
    let stored = state
        .repository
        .append_message(
            from,
            &participants,
            req.message.as_deref(),
            req.image.as_deref().filter(|s| !s.is_empty()),
        )
        .await
        .map_err(|e| ApiError::internal("Failed to add message to the database", e))?;

    debug!(message = %stored.uuid, from = %from, to = %to, "Message stored");
    Ok(Json(serde_json::json!({ "msg": "Message added successfully." })))
}

#[derive(Deserialize)]
pub struct GetMessagesRequest {
    from: Option<String>,
    to: Option<String>,
}

/// Full conversation between `from` and `to`, oldest first, seen from `from`'s side.
pub async fn get_messages_handler(
    State(state): State<AppState>,
    Json(req): Json<GetMessagesRequest>,
) -> Result<Json<Vec<HistoryEntry>>, ApiError> {
    let from = require(req.from.as_deref(), "from")?;
    let to = require(req.to.as_deref(), "to")?;

    let history = state
        .repository
        .get_conversation_history(from, to)
        .await
        .map_err(|e| ApiError::internal("Failed to load messages", e))?;

    Ok(Json(
        history.iter().map(|m| m.history_entry(from)).collect(),
    ))
}
