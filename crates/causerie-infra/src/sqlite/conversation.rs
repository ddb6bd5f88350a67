//! SQLite conversation repository implementation.
//!
//! Implements `ConversationRepository` from `causerie-core` using sqlx with
//! split read/write pools: raw queries, private Row structs, reads on the
//! reader pool and writes (including multi-statement transactions) on the writer.

use std::collections::HashMap;

use causerie_core::repository::conversation::ConversationRepository;
use causerie_types::conversation::{Conversation, ConversationId, NewTurn, Turn};
use causerie_types::error::RepositoryError;
use chrono::{DateTime, Utc};
use sqlx::Row;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `ConversationRepository`.
pub struct SqliteConversationRepository {
    pool: DatabasePool,
}

impl SqliteConversationRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct ConversationRow {
    id: String,
    system_prompt: String,
    created_at: String,
}

impl ConversationRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            system_prompt: row.try_get("system_prompt")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_conversation(self) -> Result<Conversation, RepositoryError> {
        Ok(Conversation {
            id: ConversationId(self.id),
            system_prompt: self.system_prompt,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

struct TurnRow {
    id: i64,
    conversation_id: String,
    user_text: String,
    bot_text: String,
    created_at: String,
}

impl TurnRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            conversation_id: row.try_get("conversation_id")?,
            user_text: row.try_get("user_text")?,
            bot_text: row.try_get("bot_text")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_turn(self) -> Result<Turn, RepositoryError> {
        Ok(Turn {
            id: self.id,
            conversation_id: ConversationId(self.conversation_id),
            user_text: self.user_text,
            bot_text: self.bot_text,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn query_err(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Query(e.to_string())
}

fn map_turns(rows: &[sqlx::sqlite::SqliteRow]) -> Result<Vec<Turn>, RepositoryError> {
    let mut turns = Vec::with_capacity(rows.len());
    for row in rows {
        turns.push(TurnRow::from_row(row).map_err(query_err)?.into_turn()?);
    }
    Ok(turns)
}

// ---------------------------------------------------------------------------
// ConversationRepository implementation
// ---------------------------------------------------------------------------

impl ConversationRepository for SqliteConversationRepository {
    async fn create_conversation(
        &self,
        conversation: &Conversation,
    ) -> Result<Conversation, RepositoryError> {
        sqlx::query("INSERT INTO conversations (id, system_prompt, created_at) VALUES (?, ?, ?)")
            .bind(conversation.id.as_str())
            .bind(&conversation.system_prompt)
            .bind(format_datetime(&conversation.created_at))
            .execute(&self.pool.writer)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    RepositoryError::Conflict(format!(
                        "conversation '{}' already exists",
                        conversation.id
                    ))
                }
                other => query_err(other),
            })?;

        Ok(conversation.clone())
    }

    async fn get_conversation(
        &self,
        id: &ConversationId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM conversations WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;

        match row {
            Some(row) => {
                let conv_row = ConversationRow::from_row(&row).map_err(query_err)?;
                Ok(Some(conv_row.into_conversation()?))
            }
            None => Ok(None),
        }
    }

    async fn list_conversations(&self) -> Result<Vec<Conversation>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM conversations ORDER BY rowid ASC")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_err)?;

        let mut conversations = Vec::with_capacity(rows.len());
        for row in &rows {
            let conv_row = ConversationRow::from_row(row).map_err(query_err)?;
            conversations.push(conv_row.into_conversation()?);
        }

        Ok(conversations)
    }

    async fn update_system_prompt(
        &self,
        id: &ConversationId,
        system_prompt: &str,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE conversations SET system_prompt = ? WHERE id = ?")
            .bind(system_prompt)
            .bind(id.as_str())
            .execute(&self.pool.writer)
            .await
            .map_err(query_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_conversation(&self, id: &ConversationId) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_err)?;

        sqlx::query("DELETE FROM turns WHERE conversation_id = ?")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(query_err)?;

        let result = sqlx::query("DELETE FROM conversations WHERE id = ?")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(query_err)?;

        tx.commit().await.map_err(query_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn reset(&self) -> Result<(), RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_err)?;

        sqlx::query("DELETE FROM turns")
            .execute(&mut *tx)
            .await
            .map_err(query_err)?;
        sqlx::query("DELETE FROM conversations")
            .execute(&mut *tx)
            .await
            .map_err(query_err)?;

        tx.commit().await.map_err(query_err)
    }

    async fn append_turn(&self, turn: &NewTurn) -> Result<Turn, RepositoryError> {
        let created_at = Utc::now();

        let result = sqlx::query(
            r#"INSERT INTO turns (conversation_id, user_text, bot_text, created_at)
               VALUES (?, ?, ?, ?)"#,
        )
        .bind(turn.conversation_id.as_str())
        .bind(&turn.user_text)
        .bind(&turn.bot_text)
        .bind(format_datetime(&created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                RepositoryError::NotFound
            }
            other => query_err(other),
        })?;

        Ok(Turn {
            id: result.last_insert_rowid(),
            conversation_id: turn.conversation_id.clone(),
            user_text: turn.user_text.clone(),
            bot_text: turn.bot_text.clone(),
            created_at,
        })
    }

    async fn get_turns(&self, id: &ConversationId) -> Result<Vec<Turn>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM turns WHERE conversation_id = ? ORDER BY id ASC")
            .bind(id.as_str())
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_err)?;

        map_turns(&rows)
    }

    async fn get_recent_turns(
        &self,
        id: &ConversationId,
        limit: u32,
    ) -> Result<Vec<Turn>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT * FROM (
                   SELECT * FROM turns WHERE conversation_id = ? ORDER BY id DESC LIMIT ?
               ) ORDER BY id ASC"#,
        )
        .bind(id.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_err)?;

        map_turns(&rows)
    }

    async fn count_conversations(&self) -> Result<u64, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) as cnt FROM conversations")
            .fetch_one(&self.pool.reader)
            .await
            .map_err(query_err)?;

        let count: i64 = row.try_get("cnt").map_err(query_err)?;
        Ok(count as u64)
    }

    async fn count_turns(&self) -> Result<u64, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) as cnt FROM turns")
            .fetch_one(&self.pool.reader)
            .await
            .map_err(query_err)?;

        let count: i64 = row.try_get("cnt").map_err(query_err)?;
        Ok(count as u64)
    }

    async fn count_turns_by_conversation(
        &self,
    ) -> Result<HashMap<ConversationId, u64>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT conversation_id, COUNT(*) as cnt FROM turns GROUP BY conversation_id",
        )
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_err)?;

        rows.iter()
            .map(|row| {
                let id: String = row.try_get("conversation_id").map_err(query_err)?;
                let count: i64 = row.try_get("cnt").map_err(query_err)?;
                Ok((ConversationId::from(id), count as u64))
            })
            .collect()
    }
}
