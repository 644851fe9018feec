use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum TaskKind {
    Heading,
    Task,
}

/// Shared checklist line, created once at seed time.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct TaskTemplate {
    pub id: String,
    pub text: String,
    #[sqlx(rename = "type")]
    pub kind: TaskKind,
    #[sqlx(rename = "order_index")]
    pub sequence_index: i64,
}

/// The user as the rest of the application sees it. No password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Full `users` row, only handled by the auth gate and the store.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn new(username: &str, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.to_string(),
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            username: record.username,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// One `user_tasks` row joined with its template.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ChecklistRow {
    pub id: String,
    pub task_id: String,
    pub text: String,
    #[sqlx(rename = "type")]
    pub kind: TaskKind,
    pub completed: bool,
    #[sqlx(rename = "order_index")]
    pub sequence_index: i64,
}
