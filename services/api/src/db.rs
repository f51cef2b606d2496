//! Data Access Layer
//!
//! This module contains all the functions for interacting with the
//! PostgreSQL database: session rows, transcript messages, and the
//! dialogue-state snapshots that let a WebSocket reconnect resume exactly
//! where the conversation left off.

use anyhow::Result;
use smartauction_core::session::DialogueSession;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{Message, MessageRole, Session, SessionStatus};

/// A wrapper around the `PgPool` to provide a clear data access interface.
#[derive(Clone)]
pub struct Db {
    pool: PgPool,
}

impl Db {
    /// Creates a new `Db` instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the schema if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id UUID PRIMARY KEY,
                user_id TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'active',
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id BIGSERIAL PRIMARY KEY,
                session_id UUID NOT NULL REFERENCES sessions(id),
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS dialogue_states (
                id BIGSERIAL PRIMARY KEY,
                session_id UUID NOT NULL REFERENCES sessions(id),
                state_json JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Creates a new session and its initial dialogue state in a single
    /// transaction.
    pub async fn create_session(
        &self,
        user_id: &str,
        initial_state: &DialogueSession,
    ) -> Result<Session> {
        let mut tx = self.pool.begin().await?;

        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (id, user_id)
            VALUES ($1, $2)
            RETURNING id, user_id, status, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        let state_json = serde_json::to_value(initial_state)?;

        sqlx::query("INSERT INTO dialogue_states (session_id, state_json) VALUES ($1, $2)")
            .bind(session.id)
            .bind(state_json)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(session)
    }

    /// Retrieves a single session by its ID, scoped to a specific user.
    pub async fn get_session(&self, session_id: Uuid, user_id: &str) -> Result<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            SELECT id, user_id, status, created_at, updated_at
            FROM sessions
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(session)
    }

    /// Lists all sessions for a given user, ordered by most recent.
    pub async fn list_sessions(&self, user_id: &str) -> Result<Vec<Session>> {
        let sessions = sqlx::query_as::<_, Session>(
            r#"
            SELECT id, user_id, status, created_at, updated_at
            FROM sessions
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(sessions)
    }

    /// Updates the status of a session (e.g., from 'active' to 'ended').
    pub async fn update_session_status(
        &self,
        session_id: Uuid,
        status: SessionStatus,
    ) -> Result<Session> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            UPDATE sessions
            SET status = $1, updated_at = now()
            WHERE id = $2
            RETURNING id, user_id, status, created_at, updated_at
            "#,
        )
        .bind(status.to_string())
        .bind(session_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(session)
    }

    /// Adds a new message to a session's transcript.
    pub async fn add_message(
        &self,
        session_id: Uuid,
        role: MessageRole,
        content: &str,
    ) -> Result<Message> {
        let message = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (session_id, role, content)
            VALUES ($1, $2, $3)
            RETURNING id, session_id, role, content, created_at
            "#,
        )
        .bind(session_id)
        .bind(role.to_string())
        .bind(content)
        .fetch_one(&self.pool)
        .await?;
        Ok(message)
    }

    /// Retrieves the full transcript for a session, ordered chronologically.
    pub async fn get_session_messages(&self, session_id: Uuid) -> Result<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, session_id, role, content, created_at
            FROM messages
            WHERE session_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(messages)
    }

    /// Retrieves the most recent dialogue state for a session.
    pub async fn get_latest_dialogue_state(
        &self,
        session_id: Uuid,
    ) -> Result<Option<DialogueSession>> {
        let record = sqlx::query(
            r#"
            SELECT state_json FROM dialogue_states
            WHERE session_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        match record {
            Some(row) => {
                let state_json: serde_json::Value = row.try_get("state_json")?;
                let state: DialogueSession = serde_json::from_value(state_json)?;
                Ok(Some(state))
            }
            None => Ok(None),
        }
    }

    /// Persists a new snapshot of the dialogue state.
    pub async fn save_dialogue_state(
        &self,
        session_id: Uuid,
        state: &DialogueSession,
    ) -> Result<()> {
        let state_json = serde_json::to_value(state)?;
        sqlx::query("INSERT INTO dialogue_states (session_id, state_json) VALUES ($1, $2)")
            .bind(session_id)
            .bind(state_json)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
