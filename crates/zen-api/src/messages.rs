use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use uuid::Uuid;

use zen_db::{Constraint, constraint_violation};
use zen_types::api::{MessageCreated, MessageList, SendMessageRequest};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::extract::{PathId, ValidJson};
use crate::middleware::AuthUser;
use crate::{convert, run_blocking};

/// GET /api/messages/{user_id} — messages received by a user, newest first.
pub async fn get_messages(
    State(state): State<AppState>,
    PathId(receiver_id): PathId,
    Extension(_auth): Extension<AuthUser>,
) -> Result<Json<MessageList>, ApiError> {
    let rows =
        run_blocking(move || Ok(state.db.get_messages_for_receiver(&receiver_id.to_string())?))
            .await?;

    Ok(Json(MessageList {
        messages: convert::all(rows, convert::message)?,
    }))
}

/// POST /api/messages — the sender is always the authenticated caller.
pub async fn send_message(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ValidJson(req): ValidJson<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let message_id = Uuid::new_v4();

    let row = run_blocking(move || {
        state
            .db
            .insert_message(
                &message_id.to_string(),
                &auth.user_id.to_string(),
                &req.receiver_id.to_string(),
                &req.content,
            )
            .map_err(|e| match constraint_violation(&e) {
                Some(Constraint::ForeignKey) => ApiError::NotFound("Usuário não encontrado"),
                _ => ApiError::Internal(e),
            })
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageCreated {
            message: convert::message(row)?,
        }),
    ))
}
