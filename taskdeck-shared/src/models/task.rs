/// Task model and database operations
///
/// Tasks are the unit of work being tracked. Every read and write goes
/// through a visibility check: a task is reachable when it has no owner or
/// when the caller is its owner, so the same query shape serves both
/// anonymous and authenticated traffic. See [`crate::visibility::Caller`].
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('to_do', 'done');
///
/// CREATE TABLE tasks (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL,
///     status task_status NOT NULL DEFAULT 'to_do',
///     created_by UUID REFERENCES users(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskdeck_shared::models::task::{CreateTask, Task, TaskFilter, TaskStatus};
/// use taskdeck_shared::visibility::Caller;
/// use taskdeck_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let task = Task::create(&pool, CreateTask {
///     name: "Write release notes".to_string(),
///     description: "Summarize the 0.1 changes".to_string(),
///     status: TaskStatus::ToDo,
///     created_by: None,
/// }).await?;
///
/// // Anonymous callers see ownerless tasks
/// let visible = Task::list(&pool, Caller::Anonymous, TaskFilter::default()).await?;
/// assert!(visible.iter().any(|t| t.id == task.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::visibility::Caller;

/// Completion state of a task
///
/// Maps to the Postgres `task_status` enum and serializes as its wire
/// labels, so the same two strings appear in SQL, JSON bodies, and the
/// `status` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    ToDo,
    Done,
}

impl TaskStatus {
    /// Wire label for this status
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::ToDo => "to_do",
            TaskStatus::Done => "done",
        }
    }

    /// Parses a wire label, returning `None` for anything else
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "to_do" => Some(TaskStatus::ToDo),
            "done" => Some(TaskStatus::Done),
            _ => None,
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::ToDo
    }
}

/// Sort order for task listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOrder {
    /// Newest first; ids are monotone so this avoids created_at ties
    NewestFirst,
    CreatedAtAsc,
    CreatedAtDesc,
}

impl TaskOrder {
    /// Parses the `order_by` query parameter
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "created_at" => Some(TaskOrder::CreatedAtAsc),
            "-created_at" => Some(TaskOrder::CreatedAtDesc),
            _ => None,
        }
    }

    /// ORDER BY clause body; values are whitelisted here, never
    /// interpolated from user input
    pub fn as_sql(&self) -> &'static str {
        match self {
            TaskOrder::NewestFirst => "id DESC",
            TaskOrder::CreatedAtAsc => "created_at ASC",
            TaskOrder::CreatedAtDesc => "created_at DESC",
        }
    }
}

impl Default for TaskOrder {
    fn default() -> Self {
        TaskOrder::NewestFirst
    }
}

/// A tracked task
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: i64,

    /// Short name, at most 255 characters
    pub name: String,

    /// Free-form description, may be empty
    pub description: String,

    /// Completion state
    pub status: TaskStatus,

    /// Owning user, or None for an ownerless task visible to everyone
    pub created_by: Option<Uuid>,

    /// When the task was created
    pub created_at: DateTime<Utc>,
}

/// Fields for creating a task
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTask {
    pub name: String,
    pub description: String,
    pub status: TaskStatus,
    pub created_by: Option<Uuid>,
}

/// Fields for a partial update; None means leave unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTask {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
}

impl UpdateTask {
    /// True when no field is being changed
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.status.is_none()
    }
}

/// Listing criteria; all fields combine with AND
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Exact status match
    pub status: Option<TaskStatus>,

    /// Case-insensitive substring match on name
    pub search: Option<String>,

    /// Sort order
    pub order: TaskOrder,
}

impl Task {
    /// Creates a new task
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn create(pool: &PgPool, task: CreateTask) -> Result<Self, sqlx::Error> {
        let created = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (name, description, status, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, description, status, created_by, created_at
            "#,
        )
        .bind(task.name)
        .bind(task.description)
        .bind(task.status)
        .bind(task.created_by)
        .fetch_one(pool)
        .await?;

        Ok(created)
    }

    /// Finds a task by ID if the caller may see it
    ///
    /// Hidden and missing tasks are both `None`; callers cannot distinguish
    /// another user's task from one that does not exist.
    pub async fn find_by_id_visible(
        pool: &PgPool,
        id: i64,
        caller: Caller,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, name, description, status, created_by, created_at
            FROM tasks
            WHERE id = $1 AND (created_by IS NULL OR created_by = $2)
            "#,
        )
        .bind(id)
        .bind(caller.owner_id())
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists tasks visible to the caller, filtered and ordered
    ///
    /// The WHERE clause is assembled from the fixed visibility predicate
    /// plus one optional clause per filter field, with bind positions
    /// counted as clauses are added.
    pub async fn list(
        pool: &PgPool,
        caller: Caller,
        filter: TaskFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut sql = String::from(
            "SELECT id, name, description, status, created_by, created_at \
             FROM tasks WHERE (created_by IS NULL OR created_by = $1)",
        );
        let mut bind_count = 1;

        if filter.status.is_some() {
            bind_count += 1;
            sql.push_str(&format!(" AND status = ${}", bind_count));
        }

        if filter.search.is_some() {
            bind_count += 1;
            sql.push_str(&format!(" AND name ILIKE ${}", bind_count));
        }

        sql.push_str(" ORDER BY ");
        sql.push_str(filter.order.as_sql());

        let mut query = sqlx::query_as::<_, Task>(&sql).bind(caller.owner_id());

        if let Some(status) = filter.status {
            query = query.bind(status);
        }

        if let Some(search) = &filter.search {
            query = query.bind(format!("%{}%", escape_like(search)));
        }

        query.fetch_all(pool).await
    }

    /// Applies a partial update to a task the caller may see
    ///
    /// An empty update is a read: the task is returned unchanged rather
    /// than rejected. Returns `None` when the task is hidden or missing.
    pub async fn update_visible(
        pool: &PgPool,
        id: i64,
        caller: Caller,
        update: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        if update.is_empty() {
            return Self::find_by_id_visible(pool, id, caller).await;
        }

        let mut query = String::from("UPDATE tasks SET ");
        let mut updates = Vec::new();
        let mut bind_count = 0;

        if update.name.is_some() {
            bind_count += 1;
            updates.push(format!("name = ${}", bind_count));
        }

        if update.description.is_some() {
            bind_count += 1;
            updates.push(format!("description = ${}", bind_count));
        }

        if update.status.is_some() {
            bind_count += 1;
            updates.push(format!("status = ${}", bind_count));
        }

        query.push_str(&updates.join(", "));
        query.push_str(&format!(
            " WHERE id = ${} AND (created_by IS NULL OR created_by = ${}) \
             RETURNING id, name, description, status, created_by, created_at",
            bind_count + 1,
            bind_count + 2,
        ));

        let mut q = sqlx::query_as::<_, Task>(&query);

        if let Some(name) = update.name {
            q = q.bind(name);
        }
        if let Some(description) = update.description {
            q = q.bind(description);
        }
        if let Some(status) = update.status {
            q = q.bind(status);
        }

        q.bind(id)
            .bind(caller.owner_id())
            .fetch_optional(pool)
            .await
    }

    /// Deletes a task the caller may see
    ///
    /// # Returns
    ///
    /// True if a row was deleted, false when hidden or missing
    pub async fn delete_visible(
        pool: &PgPool,
        id: i64,
        caller: Caller,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM tasks WHERE id = $1 AND (created_by IS NULL OR created_by = $2)",
        )
        .bind(id)
        .bind(caller.owner_id())
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Escapes LIKE wildcards so search terms match literally
fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels_round_trip() {
        for status in [TaskStatus::ToDo, TaskStatus::Done] {
            assert_eq!(TaskStatus::parse(status.as_str()), Some(status));
        }

        assert_eq!(TaskStatus::parse("in_progress"), None);
        assert_eq!(TaskStatus::parse("TO_DO"), None);
        assert_eq!(TaskStatus::parse(""), None);
    }

    #[test]
    fn test_status_serializes_as_wire_label() {
        let json = serde_json::to_string(&TaskStatus::ToDo).unwrap();
        assert_eq!(json, "\"to_do\"");

        let parsed: TaskStatus = serde_json::from_str("\"done\"").unwrap();
        assert_eq!(parsed, TaskStatus::Done);
    }

    #[test]
    fn test_order_parse_and_sql() {
        assert_eq!(TaskOrder::parse("created_at"), Some(TaskOrder::CreatedAtAsc));
        assert_eq!(TaskOrder::parse("-created_at"), Some(TaskOrder::CreatedAtDesc));
        assert_eq!(TaskOrder::parse("name"), None);
        assert_eq!(TaskOrder::parse(""), None);

        assert_eq!(TaskOrder::default().as_sql(), "id DESC");
        assert_eq!(TaskOrder::CreatedAtAsc.as_sql(), "created_at ASC");
        assert_eq!(TaskOrder::CreatedAtDesc.as_sql(), "created_at DESC");
    }

    #[test]
    fn test_update_is_empty() {
        assert!(UpdateTask::default().is_empty());

        let update = UpdateTask {
            status: Some(TaskStatus::Done),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("50%"), "50\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
    }

    // Visibility scoping and filter behavior against real rows are covered
    // in tests/models_tests.rs
}
