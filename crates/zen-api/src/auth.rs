use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use zen_db::models::NewUser;
use zen_db::{Constraint, Database, constraint_violation};
use zen_types::api::{AuthResponse, LoginRequest, RegisterRequest};
use zen_types::models::AuthUser;

use crate::error::ApiError;
use crate::extract::ValidJson;
use crate::token::TokenService;
use crate::{convert, password, run_blocking, validation};

pub type AppState = Arc<AppStateInner>;

/// Process-wide services, built once by the entry point and shared by every handler.
pub struct AppStateInner {
    pub db: Database,
    pub tokens: TokenService,
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = req.email.trim().to_string();
    let username = req.username.trim().to_string();

    let taken = {
        let state = state.clone();
        let (email, username) = (email.clone(), username.clone());
        run_blocking(move || Ok(state.db.email_or_username_taken(&email, &username)?)).await?
    };
    if taken {
        return Err(ApiError::Conflict);
    }

    validation::ensure_min_age(req.birth_date, Utc::now().date_naive())?;

    let password_hash = password::hash_password(req.password).await?;
    let user_id = Uuid::new_v4();

    let row = {
        let state = state.clone();
        let first_name = req.first_name.trim().to_string();
        let last_name = req.last_name.trim().to_string();
        let birth_date = req.birth_date.format("%Y-%m-%d").to_string();
        run_blocking(move || {
            let id = user_id.to_string();
            state
                .db
                .create_user(&NewUser {
                    id: &id,
                    first_name: &first_name,
                    last_name: &last_name,
                    email: &email,
                    username: &username,
                    birth_date: &birth_date,
                    password_hash: &password_hash,
                })
                // Lost a race with a concurrent registration.
                .map_err(|e| match constraint_violation(&e) {
                    Some(Constraint::Unique) => ApiError::Conflict,
                    _ => ApiError::Internal(e),
                })
        })
        .await?
    };

    let user: AuthUser = convert::profile(row)?.into();
    let token = state.tokens.issue(user.id)?;
    info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "Usuário criado com sucesso".into(),
            token,
            user,
        }),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let creds = {
        let state = state.clone();
        let email = req.email.trim().to_string();
        run_blocking(move || Ok(state.db.get_credentials_by_email(&email)?)).await?
    };

    let Some(creds) = creds else {
        password::verify_unknown_account(req.password).await?;
        warn!("Login rejected: unknown account");
        return Err(ApiError::InvalidCredentials);
    };

    if !password::verify_password(req.password, creds.password).await? {
        warn!(user_id = %creds.id, "Login rejected: wrong password");
        return Err(ApiError::InvalidCredentials);
    }

    let id: Uuid = creds
        .id
        .parse()
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("corrupt user id '{}': {}", creds.id, e)))?;
    let token = state.tokens.issue(id)?;

    Ok(Json(AuthResponse {
        message: "Login realizado com sucesso".into(),
        token,
        user: AuthUser {
            id,
            first_name: creds.first_name,
            last_name: creds.last_name,
            email: creds.email,
            username: creds.username,
        },
    }))
}
