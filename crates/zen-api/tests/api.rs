use std::sync::Arc;

use axum::{
    Router,
    body::{Body, Bytes},
    http::{Method, Request, StatusCode, header},
};
use chrono::{Days, Duration, Months, NaiveDate, Utc};
use serde_json::{Value, json};
use tower::ServiceExt;

use zen_api::token::TokenService;
use zen_api::{AppState, AppStateInner, router};
use zen_db::Database;

const SECRET: &str = "test-signing-key-0123456789abcdef";

fn setup() -> (Router, AppState) {
    let state: AppState = Arc::new(AppStateInner {
        db: Database::open_in_memory().unwrap(),
        tokens: TokenService::new(SECRET.as_bytes(), Duration::hours(24)),
    });
    (router(state.clone()), state)
}

async fn send_raw(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Bytes) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    (status, bytes)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let (status, bytes) = send_raw(app, method, uri, token, body).await;
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn registration(username: &str, email: &str, birth_date: NaiveDate) -> Value {
    json!({
        "firstName": "Ana",
        "lastName": "Lima",
        "email": email,
        "username": username,
        "birthDate": birth_date.format("%Y-%m-%d").to_string(),
        "password": "segredo123",
    })
}

fn adult() -> NaiveDate {
    NaiveDate::from_ymd_opt(1995, 6, 15).unwrap()
}

/// Registers a user and returns (id, token).
async fn register(app: &Router, username: &str) -> (String, String) {
    let email = format!("{}@zen.social", username);
    let (status, body) = send(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(registration(username, &email, adult())),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    (
        body["user"]["id"].as_str().unwrap().to_string(),
        body["token"].as_str().unwrap().to_string(),
    )
}

fn user_count(state: &AppState) -> i64 {
    state
        .db
        .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?))
        .unwrap()
}

#[tokio::test]
async fn register_returns_token_and_public_projection() {
    let (app, _) = setup();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(registration("ana", "ana@zen.social", adult())),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Usuário criado com sucesso");
    assert!(body["token"].is_string());
    assert_eq!(body["user"]["firstName"], "Ana");
    assert_eq!(body["user"]["username"], "ana");
    assert!(body["user"].get("password").is_none());

    let token = body["token"].as_str().unwrap();
    let id = body["user"]["id"].as_str().unwrap();
    let (status, profile) = send(&app, Method::GET, &format!("/api/profile/{}", id), Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["user"]["birth_date"], "1995-06-15");
    assert!(profile["user"]["bio"].is_null());
    assert!(profile["user"].get("password").is_none());
}

#[tokio::test]
async fn sixteenth_birthday_boundary() {
    let (app, state) = setup();
    let today = Utc::now().date_naive();
    let sixteen_years_ago = today.checked_sub_months(Months::new(16 * 12)).unwrap();
    let one_day_short = sixteen_years_ago.checked_add_days(Days::new(1)).unwrap();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(registration("jovem", "jovem@zen.social", one_day_short)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Você deve ter pelo menos 16 anos para se registrar");
    assert_eq!(user_count(&state), 0);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(registration("jovem", "jovem@zen.social", sixteen_years_ago)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn duplicate_email_or_username_conflicts_without_side_effects() {
    let (app, state) = setup();
    register(&app, "ana").await;

    for (username, email) in [("outra", "ANA@zen.social"), ("Ana", "outra@zen.social")] {
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(registration(username, email, adult())),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "E-mail ou nome de usuário já está em uso");
        assert!(body.get("token").is_none());
    }

    assert_eq!(user_count(&state), 1);
}

#[tokio::test]
async fn login_failures_are_byte_identical() {
    let (app, _) = setup();
    register(&app, "ana").await;

    let (ok_status, ok_body) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "ana@zen.social", "password": "segredo123" })),
    )
    .await;
    assert_eq!(ok_status, StatusCode::OK);
    assert_eq!(ok_body["message"], "Login realizado com sucesso");
    assert_eq!(ok_body["user"]["username"], "ana");

    let (wrong_status, wrong_password) = send_raw(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "ana@zen.social", "password": "errada123" })),
    )
    .await;
    let (unknown_status, unknown_email) = send_raw(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "ninguem@zen.social", "password": "segredo123" })),
    )
    .await;

    assert_eq!(wrong_status, StatusCode::BAD_REQUEST);
    assert_eq!(wrong_status, unknown_status);
    assert_eq!(wrong_password, unknown_email);
}

#[tokio::test]
async fn guard_distinguishes_missing_and_invalid_tokens() {
    let (app, _) = setup();
    let (id, token) = register(&app, "ana").await;
    let uri = format!("/api/profile/{}", id);

    let (status, body) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Token de acesso necessário");

    let sig_start = token.rfind('.').unwrap() + 1;
    let mut bytes = token.clone().into_bytes();
    bytes[sig_start] = if bytes[sig_start] == b'A' { b'B' } else { b'A' };
    let tampered = String::from_utf8(bytes).unwrap();

    let (status, body) = send(&app, Method::GET, &uri, Some(&tampered), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Token inválido");

    let (status, _) = send(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn only_the_owner_may_update_a_profile() {
    let (app, _) = setup();
    let (ana_id, ana_token) = register(&app, "ana").await;
    let (_, bia_token) = register(&app, "bia").await;
    let uri = format!("/api/profile/{}", ana_id);

    let (status, body) = send(
        &app,
        Method::PUT,
        &uri,
        Some(&bia_token),
        Some(json!({ "bio": "hackeada", "avatarUrl": "https://evil/x.png" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Acesso negado");

    let (_, profile) = send(&app, Method::GET, &uri, Some(&ana_token), None).await;
    assert!(profile["user"]["bio"].is_null());
    assert!(profile["user"]["avatar_url"].is_null());

    let (status, body) = send(
        &app,
        Method::PUT,
        &uri,
        Some(&ana_token),
        Some(json!({ "bio": "Olá, mundo", "avatarUrl": "https://img/ana.png" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Perfil atualizado com sucesso");
    assert_eq!(body["user"]["bio"], "Olá, mundo");
    assert_eq!(body["user"]["avatar_url"], "https://img/ana.png");
}

#[tokio::test]
async fn non_owner_is_refused_before_the_body_is_validated() {
    let (app, _) = setup();
    let (ana_id, ana_token) = register(&app, "ana").await;
    let (_, bia_token) = register(&app, "bia").await;
    let uri = format!("/api/profile/{}", ana_id);

    for body in [
        json!({ "bio": "b".repeat(501) }),
        json!({ "bio": "oi", "isAdmin": true }),
        json!({ "bio": 7 }),
    ] {
        let (status, body) = send(&app, Method::PUT, &uri, Some(&bia_token), Some(body)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Acesso negado");
    }

    let (status, body) = send(
        &app,
        Method::PUT,
        &uri,
        Some(&ana_token),
        Some(json!({ "bio": "b".repeat(501) })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "O campo bio deve ter no máximo 500 caracteres");

    let (status, body) = send(
        &app,
        Method::PUT,
        &uri,
        Some(&ana_token),
        Some(json!({ "bio": "oi", "isAdmin": true })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Dados inválidos");
}

#[tokio::test]
async fn unknown_profile_is_not_found() {
    let (app, _) = setup();
    let (_, token) = register(&app, "ana").await;

    let uri = format!("/api/profile/{}", uuid::Uuid::new_v4());
    let (status, body) = send(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Usuário não encontrado");

    let (status, body) = send(&app, Method::GET, "/api/profile/42", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Identificador inválido");
}

#[tokio::test]
async fn messages_flow() {
    let (app, _) = setup();
    let (ana_id, ana_token) = register(&app, "ana").await;
    let (bia_id, bia_token) = register(&app, "bia").await;

    for content in ["oi bia", "tudo bem?"] {
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/messages",
            Some(&ana_token),
            Some(json!({ "receiverId": bia_id, "content": content })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"]["sender_id"], ana_id.as_str());
        assert_eq!(body["message"]["sender_username"], "ana");
    }

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/messages/{}", bia_id),
        Some(&bia_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["content"], "tudo bem?");
    assert_eq!(messages[1]["content"], "oi bia");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/messages",
        Some(&ana_token),
        Some(json!({ "receiverId": uuid::Uuid::new_v4(), "content": "alô?" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Usuário não encontrado");
}

#[tokio::test]
async fn community_topic_reply_round_trip() {
    let (app, _) = setup();
    let (ana_id, token) = register(&app, "ana").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/communities",
        Some(&token),
        Some(json!({ "name": "Rustáceos", "description": "Caranguejos unidos" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["community"]["created_by"], ana_id.as_str());
    let community_id = body["community"]["id"].as_str().unwrap().to_string();

    let (_, body) = send(&app, Method::GET, "/api/communities", Some(&token), None).await;
    let communities = body["communities"].as_array().unwrap();
    assert_eq!(communities.len(), 1);
    assert_eq!(communities[0]["member_count"], 1);
    assert_eq!(communities[0]["topic_count"], 0);
    assert_eq!(communities[0]["creator_username"], "ana");

    let topics_uri = format!("/api/communities/{}/topics", community_id);
    let (status, body) = send(
        &app,
        Method::POST,
        &topics_uri,
        Some(&token),
        Some(json!({ "title": "Boas-vindas", "content": "Apresentem-se!" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let topic_id = body["topic"]["id"].as_str().unwrap().to_string();

    let (_, body) = send(&app, Method::GET, &topics_uri, Some(&token), None).await;
    let topics = body["topics"].as_array().unwrap();
    assert_eq!(topics.len(), 1);
    assert_eq!(topics[0]["id"], topic_id.as_str());
    assert_eq!(topics[0]["reply_count"], 0);

    let replies_uri = format!("/api/topics/{}/replies", topic_id);
    let (status, body) = send(
        &app,
        Method::POST,
        &replies_uri,
        Some(&token),
        Some(json!({ "content": "Eu sou a Ana" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["reply"]["author_username"], "ana");

    let (_, body) = send(&app, Method::GET, &topics_uri, Some(&token), None).await;
    assert_eq!(body["topics"][0]["reply_count"], 1);

    let (_, body) = send(&app, Method::GET, &replies_uri, Some(&token), None).await;
    assert_eq!(body["replies"].as_array().unwrap().len(), 1);

    let (_, body) = send(&app, Method::GET, "/api/communities", Some(&token), None).await;
    assert_eq!(body["communities"][0]["topic_count"], 1);
}

#[tokio::test]
async fn topic_in_unknown_community_is_not_found() {
    let (app, _) = setup();
    let (_, token) = register(&app, "ana").await;

    let uri = format!("/api/communities/{}/topics", uuid::Uuid::new_v4());
    let (status, body) = send(
        &app,
        Method::POST,
        &uri,
        Some(&token),
        Some(json!({ "title": "Eco", "content": "Tem alguém aí?" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Comunidade não encontrada");
}

#[tokio::test]
async fn reply_to_unknown_topic_is_not_found() {
    let (app, _) = setup();
    let (_, token) = register(&app, "ana").await;

    let uri = format!("/api/topics/{}/replies", uuid::Uuid::new_v4());
    let (status, body) = send(
        &app,
        Method::POST,
        &uri,
        Some(&token),
        Some(json!({ "content": "Alô?" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Tópico não encontrado");
}

#[tokio::test]
async fn malformed_bodies_use_the_error_shape() {
    let (app, _) = setup();
    let (_, token) = register(&app, "ana").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/communities",
        Some(&token),
        Some(json!({ "name": 42 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Dados inválidos");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/communities",
        Some(&token),
        Some(json!({ "name": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Todos os campos são obrigatórios");
}

#[tokio::test]
async fn health_is_public() {
    let (app, _) = setup();
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
