use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::api::server::AppState;
use crate::api::token::AuthUser;
use crate::error::AppError;
use crate::store::SqliteStore;
use crate::viewmodel::{ChecklistItem, Progress, TaskList};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ItemView {
    Heading {
        id: String,
        text: String,
        sequence_index: i64,
    },
    Task {
        id: String,
        text: String,
        sequence_index: i64,
        completed: bool,
    },
}

impl From<&ChecklistItem> for ItemView {
    fn from(item: &ChecklistItem) -> Self {
        match item {
            ChecklistItem::Heading {
                id,
                text,
                sequence_index,
            } => ItemView::Heading {
                id: id.clone(),
                text: text.clone(),
                sequence_index: *sequence_index,
            },
            ChecklistItem::Task {
                id,
                text,
                sequence_index,
                completion,
            } => ItemView::Task {
                id: id.clone(),
                text: text.clone(),
                sequence_index: *sequence_index,
                completed: completion.shown(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub items: Vec<ItemView>,
    pub progress: Progress,
}

impl From<&TaskList<SqliteStore>> for TaskListResponse {
    fn from(list: &TaskList<SqliteStore>) -> Self {
        Self {
            items: list.items().iter().map(ItemView::from).collect(),
            progress: list.progress(),
        }
    }
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<TaskListResponse>, AppError> {
    tracing::debug!(username = %user.username, "listing checklist");
    let mut tasks = TaskList::new(state.store.clone());
    tasks.load(&user.user_id).await?;
    Ok(Json(TaskListResponse::from(&tasks)))
}

/// Toggling a heading leaves the list unchanged.
pub async fn toggle(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(item_id): Path<String>,
) -> Result<Json<TaskListResponse>, AppError> {
    let mut tasks = TaskList::new(state.store.clone());
    tasks.load(&user.user_id).await?;

    if !tasks.items().iter().any(|item| item.id() == item_id) {
        return Err(AppError::NotFound(format!("no task {item_id}")));
    }

    tracing::debug!(username = %user.username, item_id = %item_id, "toggling item");
    tasks.toggle(&item_id).await?;
    Ok(Json(TaskListResponse::from(&tasks)))
}
