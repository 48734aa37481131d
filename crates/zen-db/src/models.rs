//! Database row types — these map directly to SQLite rows.
//! Distinct from zen-types API models to keep the DB layer independent.
//! Ids are UUID strings, timestamps RFC 3339 strings, `birth_date` is `YYYY-MM-DD`.

/// Columns needed to check a login. Only place the password hash leaves the store.
pub struct CredentialRow {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug)]
pub struct ProfileRow {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
    pub birth_date: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: String,
}

pub struct NewUser<'a> {
    pub id: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub username: &'a str,
    pub birth_date: &'a str,
    pub password_hash: &'a str,
}

#[derive(Debug)]
pub struct MessageRow {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
    pub created_at: String,
    pub sender_first_name: String,
    pub sender_last_name: String,
    pub sender_username: String,
    pub sender_avatar: Option<String>,
}

#[derive(Debug)]
pub struct CommunityRow {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_by: String,
    pub created_at: String,
    pub creator_username: Option<String>,
    pub member_count: i64,
    pub topic_count: i64,
}

#[derive(Debug)]
pub struct TopicRow {
    pub id: String,
    pub community_id: String,
    pub author_id: String,
    pub title: String,
    pub content: String,
    pub created_at: String,
    pub author_username: String,
    pub author_avatar: Option<String>,
    pub reply_count: i64,
}

#[derive(Debug)]
pub struct ReplyRow {
    pub id: String,
    pub topic_id: String,
    pub author_id: String,
    pub content: String,
    pub created_at: String,
    pub author_username: String,
    pub author_avatar: Option<String>,
}
