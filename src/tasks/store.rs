use dashmap::DashMap;
use serde::Serialize;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

/// Lifecycle of an async analysis task. Transitions are one-directional:
/// PENDING -> RUNNING -> {COMPLETED, FAILED}; terminal states are frozen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

/// The analysis kinds launched after every upload. The serialized codes are
/// stable string identifiers consumers key on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskType {
    GlucoseTrend,
    EatingOrder,
    HealthScore,
}

impl TaskType {
    pub const ALL: [TaskType; 3] = [
        TaskType::GlucoseTrend,
        TaskType::EatingOrder,
        TaskType::HealthScore,
    ];

    pub fn code(self) -> &'static str {
        match self {
            TaskType::GlucoseTrend => "glucoseTrend",
            TaskType::EatingOrder => "eatingOrder",
            TaskType::HealthScore => "healthScore",
        }
    }
}

/// One tracked task. Owned by the [`TaskStore`] for its lifetime; pollers
/// only ever see clones, so status and result are always read together.
#[derive(Debug, Clone, Serialize)]
pub struct TaskRecord {
    pub id: Uuid,
    pub task_type: TaskType,
    pub status: TaskStatus,
    /// Present exactly when status is COMPLETED.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Present exactly when status is FAILED.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub user_id: Uuid,
    pub record_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
}

/// Concurrency-safe in-memory registry of async tasks.
///
/// Backed by a sharded map so pollers, workers, and the sweeper can touch it
/// from any number of tasks without an external lock; a mutation only locks
/// the shard of the record it touches. Constructed once at startup and
/// shared via `Arc` -- it is plain state, not a global.
#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: DashMap<Uuid, TaskRecord>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new PENDING task and return its record (the id inside is
    /// the handle clients poll with). Ids are fresh UUIDs, never reused.
    pub fn create(&self, task_type: TaskType, user_id: Uuid, record_id: Uuid) -> TaskRecord {
        let record = TaskRecord {
            id: Uuid::new_v4(),
            task_type,
            status: TaskStatus::Pending,
            result: None,
            error_message: None,
            user_id,
            record_id,
            created_at: OffsetDateTime::now_utc(),
            completed_at: None,
        };
        self.tasks.insert(record.id, record.clone());
        tracing::info!(task_id = %record.id, task_type = task_type.code(), %user_id, "async task created");
        record
    }

    /// Snapshot of a task, if it exists. Unknown ids are not an error.
    pub fn get(&self, id: Uuid) -> Option<TaskRecord> {
        self.tasks.get(&id).map(|t| t.clone())
    }

    /// PENDING -> RUNNING. No-op for unknown ids and for any task already
    /// past PENDING.
    pub fn mark_running(&self, id: Uuid) {
        if let Some(mut task) = self.tasks.get_mut(&id) {
            if task.status == TaskStatus::Pending {
                task.status = TaskStatus::Running;
                tracing::debug!(task_id = %id, "task running");
            }
        }
    }

    /// Terminal transition to COMPLETED with the handler's result. No-op if
    /// the task is unknown or already terminal.
    pub fn mark_completed(&self, id: Uuid, result: serde_json::Value) {
        if let Some(mut task) = self.tasks.get_mut(&id) {
            if task.status.is_terminal() {
                return;
            }
            task.status = TaskStatus::Completed;
            task.result = Some(result);
            task.completed_at = Some(OffsetDateTime::now_utc());
            tracing::info!(task_id = %id, task_type = task.task_type.code(), "task completed");
        }
    }

    /// Terminal transition to FAILED with a human-readable message. No-op if
    /// the task is unknown or already terminal.
    pub fn mark_failed(&self, id: Uuid, error_message: impl Into<String>) {
        if let Some(mut task) = self.tasks.get_mut(&id) {
            if task.status.is_terminal() {
                return;
            }
            task.status = TaskStatus::Failed;
            task.error_message = Some(error_message.into());
            task.completed_at = Some(OffsetDateTime::now_utc());
            tracing::error!(task_id = %id, error = task.error_message.as_deref().unwrap_or(""), "task failed");
        }
    }

    /// Unconditional delete; no-op when absent.
    pub fn remove(&self, id: Uuid) {
        self.tasks.remove(&id);
        tracing::debug!(task_id = %id, "task removed");
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Drop every task created more than `ttl` ago, returning how many were
    /// removed. Runs off the request path on the sweeper interval.
    pub fn sweep_expired(&self, ttl: Duration) -> usize {
        let cutoff = OffsetDateTime::now_utc() - ttl;
        let before = self.tasks.len();
        self.tasks.retain(|_, task| task.created_at >= cutoff);
        let removed = before.saturating_sub(self.tasks.len());
        if removed > 0 {
            tracing::info!(removed, remaining = self.tasks.len(), "expired tasks swept");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store_with_task() -> (TaskStore, Uuid) {
        let store = TaskStore::new();
        let task = store.create(TaskType::GlucoseTrend, Uuid::new_v4(), Uuid::new_v4());
        (store, task.id)
    }

    #[test]
    fn create_then_get_is_pending() {
        let (store, id) = store_with_task();
        let task = store.get(id).unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.result.is_none());
        assert!(task.error_message.is_none());
        assert!(task.completed_at.is_none());
    }

    #[test]
    fn unknown_id_returns_none_and_mutations_are_noops() {
        let store = TaskStore::new();
        let id = Uuid::new_v4();
        assert!(store.get(id).is_none());
        store.mark_running(id);
        store.mark_completed(id, json!({}));
        store.mark_failed(id, "nope");
        store.remove(id);
        assert!(store.is_empty());
    }

    #[test]
    fn full_lifecycle_to_completed() {
        let (store, id) = store_with_task();
        store.mark_running(id);
        assert_eq!(store.get(id).unwrap().status, TaskStatus::Running);

        store.mark_completed(id, json!({"peak_value": 7.8}));
        let task = store.get(id).unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.result, Some(json!({"peak_value": 7.8})));
        assert!(task.completed_at.is_some());
        assert!(task.error_message.is_none());
    }

    #[test]
    fn terminal_states_are_frozen() {
        let (store, id) = store_with_task();
        store.mark_running(id);
        store.mark_failed(id, "upstream timeout");

        // a late completion must not override the failure
        store.mark_completed(id, json!({"late": true}));
        let task = store.get(id).unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.error_message.as_deref(), Some("upstream timeout"));
        assert!(task.result.is_none());

        // nor may a late failure override a completion
        let (store, id) = store_with_task();
        store.mark_completed(id, json!(1));
        store.mark_failed(id, "too late");
        let task = store.get(id).unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert!(task.error_message.is_none());
    }

    #[test]
    fn running_cannot_regress_to_pending_path() {
        let (store, id) = store_with_task();
        store.mark_completed(id, json!(null));
        store.mark_running(id);
        assert_eq!(store.get(id).unwrap().status, TaskStatus::Completed);
    }

    #[test]
    fn remove_deletes() {
        let (store, id) = store_with_task();
        store.remove(id);
        assert!(store.get(id).is_none());
    }

    #[test]
    fn sweep_respects_the_ttl_boundary() {
        let store = TaskStore::new();
        let ttl = Duration::hours(24);

        let expired = store.create(TaskType::EatingOrder, Uuid::new_v4(), Uuid::new_v4());
        store
            .tasks
            .get_mut(&expired.id)
            .unwrap()
            .created_at = OffsetDateTime::now_utc() - ttl - Duration::seconds(1);

        let fresh = store.create(TaskType::EatingOrder, Uuid::new_v4(), Uuid::new_v4());
        store
            .tasks
            .get_mut(&fresh.id)
            .unwrap()
            .created_at = OffsetDateTime::now_utc() - ttl + Duration::seconds(1);

        assert_eq!(store.sweep_expired(ttl), 1);
        assert!(store.get(expired.id).is_none());
        assert!(store.get(fresh.id).is_some());
    }

    #[test]
    fn task_type_codes_are_stable() {
        assert_eq!(TaskType::GlucoseTrend.code(), "glucoseTrend");
        assert_eq!(TaskType::EatingOrder.code(), "eatingOrder");
        assert_eq!(TaskType::HealthScore.code(), "healthScore");
        assert_eq!(
            serde_json::to_string(&TaskType::GlucoseTrend).unwrap(),
            "\"glucoseTrend\""
        );
    }
}
