use serde::Serialize;

use crate::db::models::{ChecklistRow, TaskKind};
use crate::error::{AppError, StoreError};
use crate::store::TaskStore;

/// Completion state of one task as the list shows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Settled(bool),
    /// Flipped locally, store write in flight. `ticket` names the toggle
    /// that owns the item.
    Pending { from: bool, to: bool, ticket: u64 },
}

impl Completion {
    /// The value to display. Pending items show their optimistic target.
    pub fn shown(self) -> bool {
        match self {
            Completion::Settled(v) => v,
            Completion::Pending { to, .. } => to,
        }
    }

    pub fn is_pending(self) -> bool {
        matches!(self, Completion::Pending { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChecklistItem {
    Heading {
        id: String,
        text: String,
        sequence_index: i64,
    },
    Task {
        id: String,
        text: String,
        sequence_index: i64,
        completion: Completion,
    },
}

impl ChecklistItem {
    pub fn id(&self) -> &str {
        match self {
            ChecklistItem::Heading { id, .. } | ChecklistItem::Task { id, .. } => id,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            ChecklistItem::Heading { text, .. } | ChecklistItem::Task { text, .. } => text,
        }
    }

    pub fn sequence_index(&self) -> i64 {
        match self {
            ChecklistItem::Heading { sequence_index, .. }
            | ChecklistItem::Task { sequence_index, .. } => *sequence_index,
        }
    }

    /// `None` for headings.
    pub fn completed(&self) -> Option<bool> {
        match self {
            ChecklistItem::Heading { .. } => None,
            ChecklistItem::Task { completion, .. } => Some(completion.shown()),
        }
    }
}

impl From<ChecklistRow> for ChecklistItem {
    fn from(row: ChecklistRow) -> Self {
        match row.kind {
            TaskKind::Heading => ChecklistItem::Heading {
                id: row.id,
                text: row.text,
                sequence_index: row.sequence_index,
            },
            TaskKind::Task => ChecklistItem::Task {
                id: row.id,
                text: row.text,
                sequence_index: row.sequence_index,
                completion: Completion::Settled(row.completed),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub percent: u8,
    pub completed: usize,
    pub total: usize,
    pub all_complete: bool,
}

impl Progress {
    /// Headings are not counted. Half percentages round up.
    pub fn of(items: &[ChecklistItem]) -> Self {
        let (completed, total) = items
            .iter()
            .filter_map(ChecklistItem::completed)
            .fold((0usize, 0usize), |(done, total), c| {
                (done + usize::from(c), total + 1)
            });

        let percent = if total == 0 {
            0
        } else {
            ((200 * completed + total) / (2 * total)) as u8
        };

        Progress {
            percent,
            completed,
            total,
            all_complete: total > 0 && completed == total,
        }
    }
}

/// A toggle applied locally whose store write has not been settled yet.
#[must_use = "a pending toggle must be settled"]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingToggle {
    user_id: String,
    item_id: String,
    from: bool,
    to: bool,
    ticket: u64,
}

impl PendingToggle {
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn target(&self) -> bool {
        self.to
    }
}

/// The signed-in user's checklist: a cached copy of their rows plus
/// optimistic toggles against the store.
pub struct TaskList<S> {
    store: S,
    user_id: Option<String>,
    items: Vec<ChecklistItem>,
    next_ticket: u64,
}

impl<S: TaskStore> TaskList<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            user_id: None,
            items: Vec::new(),
            next_ticket: 0,
        }
    }

    pub fn items(&self) -> &[ChecklistItem] {
        &self.items
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Replaces the cached list with the user's rows. On failure the
    /// previous list stays as it was.
    pub async fn load(&mut self, user_id: &str) -> Result<(), AppError> {
        let rows = self.store.user_tasks(user_id).await.map_err(|e| {
            tracing::warn!(user_id, error = %e, "failed to load checklist");
            AppError::from(e)
        })?;

        self.items = rows.into_iter().map(ChecklistItem::from).collect();
        self.user_id = Some(user_id.to_string());
        tracing::debug!(user_id, items = self.items.len(), "checklist loaded");
        Ok(())
    }

    /// Flips the item locally and marks it pending. Headings, unknown ids and
    /// an unloaded list give `None`.
    pub fn begin_toggle(&mut self, item_id: &str) -> Option<PendingToggle> {
        let user_id = self.user_id.clone()?;
        let completion = self.items.iter_mut().find_map(|item| match item {
            ChecklistItem::Task { id, completion, .. } if id == item_id => Some(completion),
            _ => None,
        })?;

        let from = completion.shown();
        let to = !from;
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        *completion = Completion::Pending { from, to, ticket };

        Some(PendingToggle {
            user_id,
            item_id: item_id.to_string(),
            from,
            to,
            ticket,
        })
    }

    /// Applies the store's answer to a pending toggle: keep the new value on
    /// success, restore the old one on failure.
    ///
    /// If a later toggle of the same item is still in flight, that toggle
    /// owns the item and this result only decides the return value.
    pub fn settle(
        &mut self,
        pending: PendingToggle,
        result: Result<bool, StoreError>,
    ) -> Result<(), AppError> {
        let outcome = match result {
            Ok(true) => Ok(()),
            Ok(false) => Err(AppError::NotFound(format!(
                "task {} no longer exists",
                pending.item_id
            ))),
            Err(e) => Err(AppError::from(e)),
        };

        let completion = self.items.iter_mut().find_map(|item| match item {
            ChecklistItem::Task { id, completion, .. } if *id == pending.item_id => {
                Some(completion)
            }
            _ => None,
        });

        if let Some(completion) = completion
            && let Completion::Pending { ticket, .. } = *completion
            && ticket == pending.ticket
        {
            *completion = match &outcome {
                Ok(()) => Completion::Settled(pending.to),
                Err(_) => Completion::Settled(pending.from),
            };
        }

        if let Err(e) = &outcome {
            tracing::warn!(item_id = %pending.item_id, error = %e, "toggle rolled back");
        }
        outcome
    }

    /// Optimistic toggle: flip locally, write the row, roll back if the
    /// write fails. No-op for headings and unknown ids.
    pub async fn toggle(&mut self, item_id: &str) -> Result<(), AppError> {
        let Some(pending) = self.begin_toggle(item_id) else {
            return Ok(());
        };

        let result = self
            .store
            .set_completed(&pending.user_id, &pending.item_id, pending.to)
            .await;
        self.settle(pending, result)
    }

    pub fn progress(&self) -> Progress {
        Progress::of(&self.items)
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.user_id = None;
    }
}
