use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::MessageRole;
use crate::models::{Conversation, Message};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

pub fn insert_conversation(conn: &Connection, conv: &Conversation) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO conversations (id, user_id, session_id, started_at) VALUES (?1, ?2, ?3, ?4)",
        params![
            conv.id.to_string(),
            conv.user_id,
            conv.session_id,
            conv.started_at.format(TIMESTAMP_FORMAT).to_string(),
        ],
    )?;
    Ok(())
}

/// Insert unless the session already has a conversation. Returns whether a
/// row was written.
pub fn insert_conversation_if_absent(
    conn: &Connection,
    conv: &Conversation,
) -> Result<bool, DatabaseError> {
    let inserted = conn.execute(
        "INSERT INTO conversations (id, user_id, session_id, started_at) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT (user_id, session_id) DO NOTHING",
        params![
            conv.id.to_string(),
            conv.user_id,
            conv.session_id,
            conv.started_at.format(TIMESTAMP_FORMAT).to_string(),
        ],
    )?;
    Ok(inserted == 1)
}

/// Look up the conversation bound to a user's session.
pub fn find_conversation_by_session(
    conn: &Connection,
    user_id: &str,
    session_id: &str,
) -> Result<Option<Uuid>, DatabaseError> {
    let id: Option<String> = conn
        .query_row(
            "SELECT id FROM conversations WHERE user_id = ?1 AND session_id = ?2",
            params![user_id, session_id],
            |row| row.get(0),
        )
        .optional()?;

    id.map(|raw| parse_uuid("conversations.id", &raw)).transpose()
}

pub fn insert_message(conn: &Connection, msg: &Message) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO messages (id, conversation_id, role, content, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            msg.id.to_string(),
            msg.conversation_id.to_string(),
            msg.role.as_str(),
            msg.content,
            msg.created_at.format(TIMESTAMP_FORMAT).to_string(),
        ],
    )?;
    Ok(())
}

/// Most recent messages of a conversation, newest first.
pub fn get_recent_messages(
    conn: &Connection,
    conversation_id: &Uuid,
    limit: usize,
) -> Result<Vec<Message>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, conversation_id, role, content, created_at
         FROM messages WHERE conversation_id = ?1
         ORDER BY seq DESC LIMIT ?2",
    )?;

    let rows = stmt.query_map(params![conversation_id.to_string(), limit as i64], |row| {
        Ok(MessageRow {
            id: row.get(0)?,
            conversation_id: row.get(1)?,
            role: row.get(2)?,
            content: row.get(3)?,
            created_at: row.get(4)?,
        })
    })?;

    rows.map(|row| message_from_row(row?))
        .collect::<Result<Vec<_>, DatabaseError>>()
}

struct MessageRow {
    id: String,
    conversation_id: String,
    role: String,
    content: String,
    created_at: String,
}

fn message_from_row(row: MessageRow) -> Result<Message, DatabaseError> {
    Ok(Message {
        id: parse_uuid("messages.id", &row.id)?,
        conversation_id: parse_uuid("messages.conversation_id", &row.conversation_id)?,
        role: MessageRole::from_str(&row.role)?,
        content: row.content,
        created_at: NaiveDateTime::parse_from_str(&row.created_at, TIMESTAMP_FORMAT)
            .unwrap_or_default(),
    })
}

fn parse_uuid(field: &str, raw: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(raw).map_err(|e| DatabaseError::InvalidData {
        field: field.into(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    fn conversation(user: &str, session: &str) -> Conversation {
        Conversation {
            id: Uuid::new_v4(),
            user_id: user.into(),
            session_id: session.into(),
            started_at: chrono::Local::now().naive_local(),
        }
    }

    fn message(conversation_id: Uuid, role: MessageRole, content: &str) -> Message {
        Message {
            id: Uuid::new_v4(),
            conversation_id,
            role,
            content: content.into(),
            created_at: chrono::Local::now().naive_local(),
        }
    }

    #[test]
    fn find_by_session_scopes_to_user() {
        let conn = open_memory_database().unwrap();
        let conv = conversation("alice", "default");
        insert_conversation(&conn, &conv).unwrap();

        assert_eq!(
            find_conversation_by_session(&conn, "alice", "default").unwrap(),
            Some(conv.id)
        );
        assert!(find_conversation_by_session(&conn, "bob", "default")
            .unwrap()
            .is_none());
    }

    #[test]
    fn duplicate_session_is_rejected() {
        let conn = open_memory_database().unwrap();
        insert_conversation(&conn, &conversation("alice", "s1")).unwrap();
        assert!(insert_conversation(&conn, &conversation("alice", "s1")).is_err());
    }

    #[test]
    fn insert_if_absent_keeps_existing_session() {
        let conn = open_memory_database().unwrap();
        let existing = conversation("alice", "s1");
        assert!(insert_conversation_if_absent(&conn, &existing).unwrap());
        assert!(!insert_conversation_if_absent(&conn, &conversation("alice", "s1")).unwrap());

        assert_eq!(
            find_conversation_by_session(&conn, "alice", "s1").unwrap(),
            Some(existing.id)
        );
    }

    #[test]
    fn recent_messages_are_newest_first_and_limited() {
        let conn = open_memory_database().unwrap();
        let conv = conversation("alice", "default");
        insert_conversation(&conn, &conv).unwrap();

        for i in 0..5 {
            insert_message(&conn, &message(conv.id, MessageRole::User, &format!("q{i}"))).unwrap();
        }

        let recent = get_recent_messages(&conn, &conv.id, 3).unwrap();
        let contents: Vec<_> = recent.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["q4", "q3", "q2"]);
    }

    #[test]
    fn message_for_unknown_conversation_fails() {
        let conn = open_memory_database().unwrap();
        let result = insert_message(&conn, &message(Uuid::new_v4(), MessageRole::User, "hi"));
        assert!(result.is_err());
    }
}
