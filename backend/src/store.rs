use std::future::Future;

use sqlx::SqlitePool;

use crate::db::models::{ChecklistRow, TaskTemplate, UserRecord};
use crate::db::repo;
use crate::error::StoreError;

/// The relational store that owns users, templates and completion rows.
///
/// Every call is a single request against the store: no retries, no
/// timeouts, last write wins per row.
pub trait TaskStore: Clone + Send + Sync + 'static {
    /// All templates, ascending by sequence index.
    fn task_templates(&self) -> impl Future<Output = Result<Vec<TaskTemplate>, StoreError>> + Send;

    /// The user's rows joined with their templates, ascending by sequence index.
    fn user_tasks(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Vec<ChecklistRow>, StoreError>> + Send;

    fn find_user(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Option<UserRecord>, StoreError>> + Send;

    /// Creates the user row and its task rows atomically. A taken username
    /// yields `StoreError::Conflict`.
    fn create_user_with_tasks(
        &self,
        user: &UserRecord,
        template_ids: &[String],
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Returns `false` when no task row with that id belongs to the user.
    fn set_completed(
        &self,
        user_id: &str,
        user_task_id: &str,
        completed: bool,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;
}

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl TaskStore for SqliteStore {
    async fn task_templates(&self) -> Result<Vec<TaskTemplate>, StoreError> {
        Ok(repo::list_templates(&self.pool).await?)
    }

    async fn user_tasks(&self, user_id: &str) -> Result<Vec<ChecklistRow>, StoreError> {
        Ok(repo::list_user_tasks(&self.pool, user_id).await?)
    }

    async fn find_user(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(repo::get_user(&self.pool, username).await?)
    }

    async fn create_user_with_tasks(
        &self,
        user: &UserRecord,
        template_ids: &[String],
    ) -> Result<(), StoreError> {
        repo::insert_user_with_tasks(&self.pool, user, template_ids).await
    }

    async fn set_completed(
        &self,
        user_id: &str,
        user_task_id: &str,
        completed: bool,
    ) -> Result<bool, StoreError> {
        Ok(repo::update_completed(&self.pool, user_id, user_task_id, completed).await?)
    }
}
