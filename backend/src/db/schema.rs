use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::TaskKind;

/// The checklist every new user starts from.
pub const DEFAULT_TEMPLATES: &[(TaskKind, &str)] = &[
    (TaskKind::Heading, "Phase 1: Preparation and planning"),
    (
        TaskKind::Task,
        "Spend 10 minutes listing every open question about the report (brainstorm, don't polish)",
    ),
    (
        TaskKind::Task,
        "Draft a simple outline and pick the key dimensions to analyse",
    ),
    (
        TaskKind::Task,
        "Book 15 minutes with your manager to confirm scope and expectations",
    ),
    (TaskKind::Heading, "Phase 2: Data collection"),
    (
        TaskKind::Task,
        "Give each product 30 minutes of research (work in 30 minute blocks with 5 minute breaks)",
    ),
    (
        TaskKind::Task,
        "Ask the product team for data or test results",
    ),
    (TaskKind::Heading, "Phase 3: Analysis and writing"),
    (
        TaskKind::Task,
        "Build a comparison table highlighting each product's strengths and weaknesses",
    ),
    (
        TaskKind::Task,
        "Write a first draft (aim for something you can iterate on)",
    ),
    (
        TaskKind::Task,
        "Ask a trusted colleague to review it and suggest improvements",
    ),
    (TaskKind::Task, "Revise and finish the report based on feedback"),
];

const TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        username TEXT UNIQUE NOT NULL,
        password_hash TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tasks (
        id TEXT PRIMARY KEY,
        text TEXT NOT NULL,
        type TEXT NOT NULL CHECK (type IN ('heading', 'task')),
        order_index INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS user_tasks (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        task_id TEXT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
        completed BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        UNIQUE (user_id, task_id)
    )
    "#,
];

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_user_tasks_user_id ON user_tasks(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_user_tasks_task_id ON user_tasks(task_id)",
    "CREATE INDEX IF NOT EXISTS idx_tasks_order_index ON tasks(order_index)",
    "CREATE INDEX IF NOT EXISTS idx_users_username ON users(username)",
];

/// Creates tables and indexes, then seeds the default templates if there are
/// none yet. Safe to run on every start.
pub async fn provision(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for ddl in TABLES.iter().chain(INDEXES) {
        sqlx::query(ddl).execute(pool).await?;
    }

    let seeded = seed_templates(pool, DEFAULT_TEMPLATES).await?;
    if seeded > 0 {
        tracing::info!(templates = seeded, "seeded default checklist");
    }

    Ok(())
}

/// Drops all three tables and provisions from scratch. Every user and their
/// progress is lost.
pub async fn reset(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    for table in ["user_tasks", "tasks", "users"] {
        sqlx::query(&format!("DROP TABLE IF EXISTS {table}"))
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;
    tracing::warn!("dropped checklist tables");

    provision(pool).await
}

/// Inserts `templates` in order, numbering them from 0. No-op when the
/// `tasks` table already has rows. Returns how many rows were written.
pub async fn seed_templates(
    pool: &SqlitePool,
    templates: &[(TaskKind, &str)],
) -> Result<usize, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks")
        .fetch_one(&mut *tx)
        .await?;
    if existing > 0 {
        return Ok(0);
    }

    for (index, (kind, text)) in templates.iter().enumerate() {
        sqlx::query("INSERT INTO tasks (id, text, type, order_index) VALUES (?, ?, ?, ?)")
            .bind(Uuid::new_v4().to_string())
            .bind(*text)
            .bind(*kind)
            .bind(index as i64)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(templates.len())
}
