use chrono::Local;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use uuid::Uuid;

use super::types::HistoryStore;
use super::RagError;
use crate::db::repository;
use crate::db::DatabaseError;
use crate::models::enums::MessageRole;
use crate::models::{Conversation, HistoryTurn, Message};

/// Six exchanges of patient question and assistant answer.
pub const MAX_HISTORY_TURNS: usize = 12;

/// Conversation lookup and persistence for one connection.
pub struct ConversationManager<'a> {
    conn: &'a Connection,
}

impl<'a> ConversationManager<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Existing conversation for a user's session, if one was started.
    pub fn find_for_session(&self, user_id: &str, session_id: &str) -> Result<Option<Uuid>, RagError> {
        Ok(repository::find_conversation_by_session(
            self.conn, user_id, session_id,
        )?)
    }

    /// Start a conversation for a session. Returns its ID, or the ID of the
    /// conversation another request started for the same session.
    pub fn start(&self, user_id: &str, session_id: &str) -> Result<Uuid, RagError> {
        let conversation = Conversation {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            session_id: session_id.to_string(),
            started_at: Local::now().naive_local(),
        };
        if repository::insert_conversation_if_absent(self.conn, &conversation)? {
            tracing::debug!(conversation_id = %conversation.id, "Conversation started");
            return Ok(conversation.id);
        }

        self.find_for_session(user_id, session_id)?.ok_or_else(|| {
            RagError::Database(DatabaseError::InvalidData {
                field: "conversations".into(),
                reason: "session conflict without a stored conversation".into(),
            })
        })
    }

    /// Store a question and its answer as one unit.
    ///
    /// Creates the session's conversation on first use. Takes the write lock
    /// up front so concurrent first requests for a session serialize.
    pub fn record_exchange(
        &self,
        user_id: &str,
        session_id: &str,
        question: &str,
        answer: &str,
    ) -> Result<Uuid, RagError> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)
            .map_err(DatabaseError::Sqlite)?;

        let conversation_id = match self.find_for_session(user_id, session_id)? {
            Some(id) => id,
            None => self.start(user_id, session_id)?,
        };

        self.append(conversation_id, MessageRole::User, question)?;
        self.append(conversation_id, MessageRole::Assistant, answer)?;

        tx.commit().map_err(DatabaseError::Sqlite)?;
        Ok(conversation_id)
    }

    fn append(&self, conversation_id: Uuid, role: MessageRole, content: &str) -> Result<(), RagError> {
        let msg = Message {
            id: Uuid::new_v4(),
            conversation_id,
            role,
            content: content.to_string(),
            created_at: Local::now().naive_local(),
        };
        repository::insert_message(self.conn, &msg)?;
        Ok(())
    }
}

impl HistoryStore for ConversationManager<'_> {
    fn recent_history(
        &self,
        conversation_id: &Uuid,
        max_turns: usize,
    ) -> Result<Vec<HistoryTurn>, RagError> {
        let messages = repository::get_recent_messages(self.conn, conversation_id, max_turns)?;
        Ok(messages.into_iter().map(HistoryTurn::from).collect())
    }
}
