use axum::{
    Json, Router, middleware,
    routing::{get, post},
};
use serde_json::{Value, json};

use crate::auth::{self, AppState};
use crate::middleware::require_auth;
use crate::{communities, messages, profile, replies, topics};

/// All API routes. Everything except auth and health sits behind the guard.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/health", get(health));

    let protected_routes = Router::new()
        .route("/api/profile/{id}", get(profile::get_profile).put(profile::update_profile))
        .route("/api/messages", post(messages::send_message))
        .route("/api/messages/{user_id}", get(messages::get_messages))
        .route(
            "/api/communities",
            get(communities::list_communities).post(communities::create_community),
        )
        .route(
            "/api/communities/{id}/topics",
            get(topics::list_topics).post(topics::create_topic),
        )
        .route(
            "/api/topics/{id}/replies",
            get(replies::list_replies).post(replies::create_reply),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
