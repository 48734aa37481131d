use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use uuid::Uuid;

use zen_db::{Constraint, constraint_violation};
use zen_types::api::{CreateReplyRequest, ReplyCreated, ReplyList};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::extract::{PathId, ValidJson};
use crate::middleware::AuthUser;
use crate::{convert, run_blocking};

/// GET /api/topics/{id}/replies — oldest first.
pub async fn list_replies(
    State(state): State<AppState>,
    PathId(topic_id): PathId,
    Extension(_auth): Extension<AuthUser>,
) -> Result<Json<ReplyList>, ApiError> {
    let rows = run_blocking(move || Ok(state.db.list_replies(&topic_id.to_string())?)).await?;

    Ok(Json(ReplyList {
        replies: convert::all(rows, convert::reply)?,
    }))
}

/// POST /api/topics/{id}/replies
pub async fn create_reply(
    State(state): State<AppState>,
    PathId(topic_id): PathId,
    Extension(auth): Extension<AuthUser>,
    ValidJson(req): ValidJson<CreateReplyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let reply_id = Uuid::new_v4();

    let row = run_blocking(move || {
        state
            .db
            .insert_reply(
                &reply_id.to_string(),
                &topic_id.to_string(),
                &auth.user_id.to_string(),
                &req.content,
            )
            .map_err(|e| match constraint_violation(&e) {
                Some(Constraint::ForeignKey) => ApiError::NotFound("Tópico não encontrado"),
                _ => ApiError::Internal(e),
            })
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ReplyCreated {
            message: "Resposta enviada com sucesso".into(),
            reply: convert::reply(row)?,
        }),
    ))
}
