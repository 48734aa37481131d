//! Row → API model conversion. A row that fails to parse is corrupt data
//! and surfaces as an internal error.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use zen_db::models::{CommunityRow, MessageRow, ProfileRow, ReplyRow, TopicRow};
use zen_types::models::{CommunityView, MessageView, Profile, ReplyView, TopicView};

fn id(raw: &str) -> Result<Uuid> {
    raw.parse().with_context(|| format!("corrupt id '{}'", raw))
}

fn timestamp(raw: &str) -> Result<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // Rows written by hand may use SQLite's "YYYY-MM-DD HH:MM:SS".
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .with_context(|| format!("corrupt timestamp '{}'", raw))
}

pub(crate) fn profile(row: ProfileRow) -> Result<Profile> {
    Ok(Profile {
        id: id(&row.id)?,
        birth_date: NaiveDate::parse_from_str(&row.birth_date, "%Y-%m-%d")
            .with_context(|| format!("corrupt birth_date '{}'", row.birth_date))?,
        created_at: timestamp(&row.created_at)?,
        first_name: row.first_name,
        last_name: row.last_name,
        email: row.email,
        username: row.username,
        bio: row.bio,
        avatar_url: row.avatar_url,
    })
}

pub(crate) fn message(row: MessageRow) -> Result<MessageView> {
    Ok(MessageView {
        id: id(&row.id)?,
        sender_id: id(&row.sender_id)?,
        receiver_id: id(&row.receiver_id)?,
        created_at: timestamp(&row.created_at)?,
        content: row.content,
        sender_first_name: row.sender_first_name,
        sender_last_name: row.sender_last_name,
        sender_username: row.sender_username,
        sender_avatar: row.sender_avatar,
    })
}

pub(crate) fn community(row: CommunityRow) -> Result<CommunityView> {
    Ok(CommunityView {
        id: id(&row.id)?,
        created_by: id(&row.created_by)?,
        created_at: timestamp(&row.created_at)?,
        name: row.name,
        description: row.description,
        creator_username: row.creator_username,
        member_count: row.member_count,
        topic_count: row.topic_count,
    })
}

pub(crate) fn topic(row: TopicRow) -> Result<TopicView> {
    Ok(TopicView {
        id: id(&row.id)?,
        community_id: id(&row.community_id)?,
        author_id: id(&row.author_id)?,
        created_at: timestamp(&row.created_at)?,
        title: row.title,
        content: row.content,
        author_username: row.author_username,
        author_avatar: row.author_avatar,
        reply_count: row.reply_count,
    })
}

pub(crate) fn reply(row: ReplyRow) -> Result<ReplyView> {
    Ok(ReplyView {
        id: id(&row.id)?,
        topic_id: id(&row.topic_id)?,
        author_id: id(&row.author_id)?,
        created_at: timestamp(&row.created_at)?,
        content: row.content,
        author_username: row.author_username,
        author_avatar: row.author_avatar,
    })
}

/// Convert a list of rows, failing on the first corrupt one.
pub(crate) fn all<R, V, F>(rows: Vec<R>, f: F) -> Result<Vec<V>>
where
    F: Fn(R) -> Result<V>,
{
    rows.into_iter().map(f).collect()
}
