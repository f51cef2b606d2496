//! API and Database Models
//!
//! This module defines the core data structures used for both database
//! mapping with `sqlx` and for generating OpenAPI documentation with
//! `utoipa`. Status and role enums are stored as plain text columns and
//! parsed on the way out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Row, postgres::PgRow};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// Error raised when a text column holds a value outside the enum.
#[derive(Debug, thiserror::Error)]
#[error("unrecognized value in column: {0}")]
pub struct ParseEnumError(String);

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Ended,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Active => write!(f, "active"),
            SessionStatus::Ended => write!(f, "ended"),
        }
    }
}

impl FromStr for SessionStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SessionStatus::Active),
            "ended" => Ok(SessionStatus::Ended),
            other => Err(ParseEnumError(other.to_string())),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Agent,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Agent => write!(f, "agent"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(MessageRole::User),
            "agent" => Ok(MessageRole::Agent),
            other => Err(ParseEnumError(other.to_string())),
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct Session {
    #[schema(value_type = String, format = Uuid)]
    pub id: Uuid,
    pub user_id: String,
    #[schema(value_type = String, example = "active")]
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for Session {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let status: String = row.try_get("status")?;
        let status = status
            .parse::<SessionStatus>()
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "status".to_string(),
                source: Box::new(e),
            })?;
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            status,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// One transcript entry: what the user said, or what the agent replied.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct Message {
    pub id: i64,
    #[schema(value_type = String, format = Uuid)]
    pub session_id: Uuid,
    #[schema(value_type = String, example = "user")]
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for Message {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let role: String = row.try_get("role")?;
        let role = role
            .parse::<MessageRole>()
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "role".to_string(),
                source: Box::new(e),
            })?;
        Ok(Self {
            id: row.try_get("id")?,
            session_id: row.try_get("session_id")?,
            role,
            content: row.try_get("content")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateSessionStatusPayload {
    #[schema(example = "ended")]
    pub status: SessionStatus,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_session_status_serialization() {
        assert_eq!(
            serde_json::to_string(&SessionStatus::Active).unwrap(),
            "\"active\""
        );
        assert_eq!(
            serde_json::to_string(&SessionStatus::Ended).unwrap(),
            "\"ended\""
        );
    }

    #[test]
    fn test_session_status_deserialization() {
        let active: SessionStatus = serde_json::from_str("\"active\"").unwrap();
        let ended: SessionStatus = serde_json::from_str("\"ended\"").unwrap();

        assert_eq!(active, SessionStatus::Active);
        assert_eq!(ended, SessionStatus::Ended);
    }

    #[test]
    fn test_session_status_text_round_trip() {
        for status in [SessionStatus::Active, SessionStatus::Ended] {
            let text = status.to_string();
            assert_eq!(text.parse::<SessionStatus>().unwrap(), status);
        }
        assert!("archived".parse::<SessionStatus>().is_err());
    }

    #[test]
    fn test_message_role_text_round_trip() {
        for role in [MessageRole::User, MessageRole::Agent] {
            let text = role.to_string();
            assert_eq!(text.parse::<MessageRole>().unwrap(), role);
        }
        assert!("system".parse::<MessageRole>().is_err());
    }

    #[test]
    fn test_message_role_display() {
        assert_eq!(format!("{}", MessageRole::User), "user");
        assert_eq!(format!("{}", MessageRole::Agent), "agent");
    }

    #[test]
    fn test_session_serialization() {
        let session_id = Uuid::new_v4();
        let now = Utc::now();

        let session = Session {
            id: session_id,
            user_id: "caller_123".to_string(),
            status: SessionStatus::Active,
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_string(&session).unwrap();
        assert!(json.contains("caller_123"));
        assert!(json.contains("active"));

        let deserialized: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.id, session.id);
        assert_eq!(deserialized.user_id, session.user_id);
        assert_eq!(deserialized.status, session.status);
    }

    #[test]
    fn test_message_serialization() {
        let session_id = Uuid::new_v4();

        let message = Message {
            id: 42,
            session_id,
            role: MessageRole::User,
            content: "place a bid".to_string(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&message).unwrap();
        assert!(json.contains("place a bid"));
        assert!(json.contains("user"));

        let deserialized: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.id, message.id);
        assert_eq!(deserialized.session_id, message.session_id);
        assert_eq!(deserialized.role, message.role);
        assert_eq!(deserialized.content, message.content);
    }

    #[test]
    fn test_update_session_status_payload_deserialization() {
        let payload: UpdateSessionStatusPayload =
            serde_json::from_str(r#"{"status": "ended"}"#).unwrap();
        assert_eq!(payload.status, SessionStatus::Ended);
    }

    #[test]
    fn test_error_response_serialization() {
        let error = ErrorResponse {
            message: "Session not found".to_string(),
        };

        let json = serde_json::to_string(&error).unwrap();
        assert_eq!(json, r#"{"message":"Session not found"}"#);
    }

    #[test]
    fn test_invalid_enum_deserialization() {
        let result: Result<SessionStatus, _> = serde_json::from_str(r#""paused""#);
        assert!(result.is_err());

        let result: Result<MessageRole, _> = serde_json::from_str(r#""narrator""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_datetime_handling() {
        let specific_time = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();

        let session = Session {
            id: Uuid::new_v4(),
            user_id: "time_test".to_string(),
            status: SessionStatus::Active,
            created_at: specific_time,
            updated_at: specific_time,
        };

        let json = serde_json::to_string(&session).unwrap();
        let deserialized: Session = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.created_at, specific_time);
        assert_eq!(deserialized.updated_at, specific_time);
    }
}
