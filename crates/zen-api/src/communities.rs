use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::info;
use uuid::Uuid;

use zen_types::api::{CommunityCreated, CommunityList, CreateCommunityRequest};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::extract::ValidJson;
use crate::middleware::AuthUser;
use crate::{convert, run_blocking};

/// GET /api/communities — newest first, with member and topic counts.
pub async fn list_communities(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthUser>,
) -> Result<Json<CommunityList>, ApiError> {
    let rows = run_blocking(move || Ok(state.db.list_communities()?)).await?;

    Ok(Json(CommunityList {
        communities: convert::all(rows, convert::community)?,
    }))
}

/// POST /api/communities — the creator joins in the same transaction.
pub async fn create_community(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ValidJson(req): ValidJson<CreateCommunityRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let community_id = Uuid::new_v4();
    let name = req.name.trim().to_string();

    let row = run_blocking(move || {
        Ok(state.db.create_community(
            &community_id.to_string(),
            &name,
            req.description.as_deref(),
            &auth.user_id.to_string(),
        )?)
    })
    .await?;

    info!(community_id = %community_id, user_id = %auth.user_id, "Community created");

    Ok((
        StatusCode::CREATED,
        Json(CommunityCreated {
            message: "Comunidade criada com sucesso".into(),
            community: convert::community(row)?,
        }),
    ))
}
