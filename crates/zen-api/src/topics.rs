use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use uuid::Uuid;

use zen_db::{Constraint, constraint_violation};
use zen_types::api::{CreateTopicRequest, TopicCreated, TopicList};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::extract::{PathId, ValidJson};
use crate::middleware::AuthUser;
use crate::{convert, run_blocking};

/// GET /api/communities/{id}/topics — newest first, with reply counts.
pub async fn list_topics(
    State(state): State<AppState>,
    PathId(community_id): PathId,
    Extension(_auth): Extension<AuthUser>,
) -> Result<Json<TopicList>, ApiError> {
    let rows = run_blocking(move || Ok(state.db.list_topics(&community_id.to_string())?)).await?;

    Ok(Json(TopicList {
        topics: convert::all(rows, convert::topic)?,
    }))
}

/// POST /api/communities/{id}/topics
pub async fn create_topic(
    State(state): State<AppState>,
    PathId(community_id): PathId,
    Extension(auth): Extension<AuthUser>,
    ValidJson(req): ValidJson<CreateTopicRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let topic_id = Uuid::new_v4();

    let row = run_blocking(move || {
        state
            .db
            .insert_topic(
                &topic_id.to_string(),
                &community_id.to_string(),
                &auth.user_id.to_string(),
                req.title.trim(),
                &req.content,
            )
            .map_err(|e| match constraint_violation(&e) {
                Some(Constraint::ForeignKey) => ApiError::NotFound("Comunidade não encontrada"),
                _ => ApiError::Internal(e),
            })
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(TopicCreated {
            message: "Tópico criado com sucesso".into(),
            topic: convert::topic(row)?,
        }),
    ))
}
