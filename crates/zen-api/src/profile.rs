use axum::{Extension, Json, body::Bytes, extract::State};
use tracing::info;

use zen_types::api::{ProfileResponse, UpdateProfileRequest};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::extract::{PathId, ValidJson};
use crate::middleware::AuthUser;
use crate::{convert, run_blocking, validation};

const USER_NOT_FOUND: &str = "Usuário não encontrado";

/// GET /api/profile/{id} — any authenticated caller may read any profile.
pub async fn get_profile(
    State(state): State<AppState>,
    PathId(user_id): PathId,
    Extension(_auth): Extension<AuthUser>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let row = run_blocking(move || Ok(state.db.get_profile(&user_id.to_string())?))
        .await?
        .ok_or(ApiError::NotFound(USER_NOT_FOUND))?;

    Ok(Json(ProfileResponse {
        message: None,
        user: convert::profile(row)?,
    }))
}

/// PUT /api/profile/{id} — owner only; overwrites bio and avatar. A
/// non-owner gets 403 whatever the body holds.
pub async fn update_profile(
    State(state): State<AppState>,
    PathId(user_id): PathId,
    Extension(auth): Extension<AuthUser>,
    body: Bytes,
) -> Result<Json<ProfileResponse>, ApiError> {
    validation::ensure_owner(auth.user_id, user_id)?;
    let ValidJson(req) = ValidJson::<UpdateProfileRequest>::from_bytes(&body)?;

    let row = run_blocking(move || {
        Ok(state.db.update_profile(
            &user_id.to_string(),
            req.bio.as_deref(),
            req.avatar_url.as_deref(),
        )?)
    })
    .await?
    .ok_or(ApiError::NotFound(USER_NOT_FOUND))?;

    info!(user_id = %user_id, "Profile updated");

    Ok(Json(ProfileResponse {
        message: Some("Perfil atualizado com sucesso".into()),
        user: convert::profile(row)?,
    }))
}
