use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::{ChecklistRow, TaskTemplate, UserRecord};
use crate::error::StoreError;

pub async fn list_templates(pool: &SqlitePool) -> Result<Vec<TaskTemplate>, sqlx::Error> {
    sqlx::query_as::<_, TaskTemplate>(
        "SELECT id, text, type, order_index FROM tasks ORDER BY order_index ASC",
    )
    .fetch_all(pool)
    .await
}

pub async fn get_user(
    pool: &SqlitePool,
    username: &str,
) -> Result<Option<UserRecord>, sqlx::Error> {
    sqlx::query_as::<_, UserRecord>(
        "SELECT id, username, password_hash, created_at, updated_at FROM users WHERE username = ?",
    )
    .bind(username)
    .fetch_optional(pool)
    .await
}

/// Inserts the user and one incomplete `user_tasks` row per template in a
/// single transaction, so a failed registration leaves nothing behind.
pub async fn insert_user_with_tasks(
    pool: &SqlitePool,
    user: &UserRecord,
    template_ids: &[String],
) -> Result<(), StoreError> {
    let mut tx = pool.begin().await?;

    let inserted = sqlx::query(
        r#"
        INSERT INTO users (id, username, password_hash, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.id)
    .bind(&user.username)
    .bind(&user.password_hash)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(&mut *tx)
    .await;

    if let Err(e) = inserted {
        return Err(match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Conflict("username".to_string())
            }
            other => StoreError::Database(other),
        });
    }

    for task_id in template_ids {
        sqlx::query(
            r#"
            INSERT INTO user_tasks (id, user_id, task_id, completed, created_at, updated_at)
            VALUES (?, ?, ?, FALSE, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&user.id)
        .bind(task_id)
        .bind(user.created_at)
        .bind(user.created_at)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

pub async fn list_user_tasks(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<ChecklistRow>, sqlx::Error> {
    sqlx::query_as::<_, ChecklistRow>(
        r#"
        SELECT ut.id, ut.task_id, t.text, t.type, ut.completed, t.order_index
        FROM user_tasks ut
        JOIN tasks t ON t.id = ut.task_id
        WHERE ut.user_id = ?
        ORDER BY t.order_index ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Sets `completed` on one of the user's task rows. Headings and rows owned
/// by someone else are left alone; returns whether a row was updated.
pub async fn update_completed(
    pool: &SqlitePool,
    user_id: &str,
    user_task_id: &str,
    completed: bool,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE user_tasks
        SET completed = ?, updated_at = ?
        WHERE id = ? AND user_id = ?
          AND task_id IN (SELECT id FROM tasks WHERE type = 'task')
        "#,
    )
    .bind(completed)
    .bind(Utc::now())
    .bind(user_task_id)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}
