use crate::Database;
use crate::models::{
    CommunityRow, CredentialRow, MessageRow, NewUser, ProfileRow, ReplyRow, TopicRow,
};
use anyhow::{Result, anyhow};
use rusqlite::{Connection, OptionalExtension, Row, params};

const PROFILE_SELECT: &str = "SELECT id, first_name, last_name, email, username, birth_date, bio, avatar_url, created_at
     FROM users";

// Sender display fields are joined in so listing is a single query.
const MESSAGE_SELECT: &str = "SELECT m.id, m.sender_id, m.receiver_id, m.content, m.created_at,
            u.first_name, u.last_name, u.username, u.avatar_url
     FROM messages m
     JOIN users u ON m.sender_id = u.id";

const COMMUNITY_SELECT: &str = "SELECT c.id, c.name, c.description, c.created_by, c.created_at, u.username,
            (SELECT COUNT(*) FROM community_members cm WHERE cm.community_id = c.id),
            (SELECT COUNT(*) FROM topics t WHERE t.community_id = c.id)
     FROM communities c
     LEFT JOIN users u ON c.created_by = u.id";

const TOPIC_SELECT: &str = "SELECT t.id, t.community_id, t.author_id, t.title, t.content, t.created_at,
            u.username, u.avatar_url,
            (SELECT COUNT(*) FROM replies r WHERE r.topic_id = t.id)
     FROM topics t
     JOIN users u ON t.author_id = u.id";

const REPLY_SELECT: &str = "SELECT r.id, r.topic_id, r.author_id, r.content, r.created_at,
            u.username, u.avatar_url
     FROM replies r
     JOIN users u ON r.author_id = u.id";

impl Database {
    // -- Users --

    /// True when either the email or the username is already registered (case-insensitive).
    pub fn email_or_username_taken(&self, email: &str, username: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let taken: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1 OR username = ?2)",
                params![email, username],
                |row| row.get(0),
            )?;
            Ok(taken)
        })
    }

    /// Insert a user and return its stored public row. A duplicate email or
    /// username fails with a unique-constraint error.
    pub fn create_user(&self, user: &NewUser<'_>) -> Result<ProfileRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, first_name, last_name, email, username, birth_date, password)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    user.id,
                    user.first_name,
                    user.last_name,
                    user.email,
                    user.username,
                    user.birth_date,
                    user.password_hash,
                ],
            )?;
            query_profile(conn, user.id)?
                .ok_or_else(|| anyhow!("User vanished after insert: {}", user.id))
        })
    }

    pub fn get_credentials_by_email(&self, email: &str) -> Result<Option<CredentialRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, first_name, last_name, email, username, password
                     FROM users WHERE email = ?1",
                    [email],
                    |row| {
                        Ok(CredentialRow {
                            id: row.get(0)?,
                            first_name: row.get(1)?,
                            last_name: row.get(2)?,
                            email: row.get(3)?,
                            username: row.get(4)?,
                            password: row.get(5)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn get_profile(&self, id: &str) -> Result<Option<ProfileRow>> {
        self.with_conn(|conn| query_profile(conn, id))
    }

    /// Overwrite bio and avatar. Returns `None` if the user does not exist.
    pub fn update_profile(
        &self,
        id: &str,
        bio: Option<&str>,
        avatar_url: Option<&str>,
    ) -> Result<Option<ProfileRow>> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users SET bio = ?1, avatar_url = ?2 WHERE id = ?3",
                params![bio, avatar_url, id],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_profile(conn, id)
        })
    }

    // -- Messages --

    pub fn insert_message(
        &self,
        id: &str,
        sender_id: &str,
        receiver_id: &str,
        content: &str,
    ) -> Result<MessageRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (id, sender_id, receiver_id, content) VALUES (?1, ?2, ?3, ?4)",
                params![id, sender_id, receiver_id, content],
            )?;
            let sql = format!("{MESSAGE_SELECT} WHERE m.id = ?1");
            Ok(conn.query_row(&sql, [id], message_from_row)?)
        })
    }

    /// Messages received by a user, newest first.
    pub fn get_messages_for_receiver(&self, receiver_id: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{MESSAGE_SELECT} WHERE m.receiver_id = ?1 ORDER BY m.created_at DESC, m.rowid DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([receiver_id], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Communities --

    /// Create a community and enroll its creator, atomically.
    pub fn create_community(
        &self,
        id: &str,
        name: &str,
        description: Option<&str>,
        created_by: &str,
    ) -> Result<CommunityRow> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO communities (id, name, description, created_by) VALUES (?1, ?2, ?3, ?4)",
                params![id, name, description, created_by],
            )?;
            tx.execute(
                "INSERT INTO community_members (community_id, user_id) VALUES (?1, ?2)",
                params![id, created_by],
            )?;
            let sql = format!("{COMMUNITY_SELECT} WHERE c.id = ?1");
            let row = tx.query_row(&sql, [id], community_from_row)?;
            tx.commit()?;
            Ok(row)
        })
    }

    /// All communities with member and topic counts, newest first.
    pub fn list_communities(&self) -> Result<Vec<CommunityRow>> {
        self.with_conn(|conn| {
            let sql = format!("{COMMUNITY_SELECT} ORDER BY c.created_at DESC, c.rowid DESC");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], community_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Topics --

    pub fn insert_topic(
        &self,
        id: &str,
        community_id: &str,
        author_id: &str,
        title: &str,
        content: &str,
    ) -> Result<TopicRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO topics (id, community_id, author_id, title, content) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, community_id, author_id, title, content],
            )?;
            let sql = format!("{TOPIC_SELECT} WHERE t.id = ?1");
            Ok(conn.query_row(&sql, [id], topic_from_row)?)
        })
    }

    /// Topics of a community with reply counts, newest first.
    pub fn list_topics(&self, community_id: &str) -> Result<Vec<TopicRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{TOPIC_SELECT} WHERE t.community_id = ?1 ORDER BY t.created_at DESC, t.rowid DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([community_id], topic_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Replies --

    pub fn insert_reply(
        &self,
        id: &str,
        topic_id: &str,
        author_id: &str,
        content: &str,
    ) -> Result<ReplyRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO replies (id, topic_id, author_id, content) VALUES (?1, ?2, ?3, ?4)",
                params![id, topic_id, author_id, content],
            )?;
            let sql = format!("{REPLY_SELECT} WHERE r.id = ?1");
            Ok(conn.query_row(&sql, [id], reply_from_row)?)
        })
    }

    /// Replies of a topic, oldest first.
    pub fn list_replies(&self, topic_id: &str) -> Result<Vec<ReplyRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{REPLY_SELECT} WHERE r.topic_id = ?1 ORDER BY r.created_at ASC, r.rowid ASC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([topic_id], reply_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn query_profile(conn: &Connection, id: &str) -> Result<Option<ProfileRow>> {
    let sql = format!("{PROFILE_SELECT} WHERE id = ?1");
    let row = conn
        .query_row(&sql, [id], |row| {
            Ok(ProfileRow {
                id: row.get(0)?,
                first_name: row.get(1)?,
                last_name: row.get(2)?,
                email: row.get(3)?,
                username: row.get(4)?,
                birth_date: row.get(5)?,
                bio: row.get(6)?,
                avatar_url: row.get(7)?,
                created_at: row.get(8)?,
            })
        })
        .optional()?;
    Ok(row)
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        receiver_id: row.get(2)?,
        content: row.get(3)?,
        created_at: row.get(4)?,
        sender_first_name: row.get(5)?,
        sender_last_name: row.get(6)?,
        sender_username: row.get(7)?,
        sender_avatar: row.get(8)?,
    })
}

fn community_from_row(row: &Row<'_>) -> rusqlite::Result<CommunityRow> {
    Ok(CommunityRow {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_by: row.get(3)?,
        created_at: row.get(4)?,
        creator_username: row.get(5)?,
        member_count: row.get(6)?,
        topic_count: row.get(7)?,
    })
}

fn topic_from_row(row: &Row<'_>) -> rusqlite::Result<TopicRow> {
    Ok(TopicRow {
        id: row.get(0)?,
        community_id: row.get(1)?,
        author_id: row.get(2)?,
        title: row.get(3)?,
        content: row.get(4)?,
        created_at: row.get(5)?,
        author_username: row.get(6)?,
        author_avatar: row.get(7)?,
        reply_count: row.get(8)?,
    })
}

fn reply_from_row(row: &Row<'_>) -> rusqlite::Result<ReplyRow> {
    Ok(ReplyRow {
        id: row.get(0)?,
        topic_id: row.get(1)?,
        author_id: row.get(2)?,
        content: row.get(3)?,
        created_at: row.get(4)?,
        author_username: row.get(5)?,
        author_avatar: row.get(6)?,
    })
}
