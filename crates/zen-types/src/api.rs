use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{AuthUser, CommunityView, MessageView, Profile, ReplyView, TopicView};

// -- JWT Claims --

/// Bearer token claims. `sub` is the authenticated user's id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iat: usize,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
    pub birth_date: NaiveDate,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Returned by both register and login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub user: AuthUser,
}

// -- Profile --

/// Full overwrite: an absent or null field clears the column.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub user: Profile,
}

// -- Messages --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub receiver_id: Uuid,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct MessageList {
    pub messages: Vec<MessageView>,
}

#[derive(Debug, Serialize)]
pub struct MessageCreated {
    pub message: MessageView,
}

// -- Communities --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCommunityRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CommunityList {
    pub communities: Vec<CommunityView>,
}

#[derive(Debug, Serialize)]
pub struct CommunityCreated {
    pub message: String,
    pub community: CommunityView,
}

// -- Topics --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTopicRequest {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct TopicList {
    pub topics: Vec<TopicView>,
}

#[derive(Debug, Serialize)]
pub struct TopicCreated {
    pub message: String,
    pub topic: TopicView,
}

// -- Replies --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateReplyRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ReplyList {
    pub replies: Vec<ReplyView>,
}

#[derive(Debug, Serialize)]
pub struct ReplyCreated {
    pub message: String,
    pub reply: ReplyView,
}
