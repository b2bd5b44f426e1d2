/// Task CRUD endpoints
///
/// This module provides the task endpoints:
/// - Listing with filters
/// - Creation
/// - Retrieval, partial update, deletion by ID
///
/// # Endpoints
///
/// - `GET /tasks/` - List visible tasks
/// - `POST /tasks/` - Create a task
/// - `GET /tasks/:id/` - Retrieve a task
/// - `PATCH /tasks/:id/` - Partially update a task
/// - `DELETE /tasks/:id/` - Delete a task
///
/// All endpoints apply the visibility rule: ownerless tasks plus the
/// caller's own. A task outside the caller's view responds 404 on every
/// verb; the API never reveals whether it exists.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    app::AppState,
    error::{ApiError, ApiJson, ApiResult, ValidationErrorDetail},
};
use taskdeck_shared::{
    models::task::{CreateTask, Task, TaskFilter, TaskOrder, TaskStatus, UpdateTask},
    visibility::Caller,
};

/// Maximum length of a task name
const NAME_MAX_LENGTH: usize = 255;

/// Task as returned by the API
///
/// The owner is deliberately absent: exposing it would let clients probe
/// who owns what, and visibility already encodes everything a caller may
/// know.
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskResponse {
    /// Task ID
    pub id: i64,

    /// Task name
    pub name: String,

    /// Task description
    pub description: String,

    /// Completion state
    pub status: TaskStatus,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            name: task.name,
            description: task.description,
            status: task.status,
            created_at: task.created_at,
        }
    }
}

/// Query parameters for task listing
#[derive(Debug, Default, Deserialize)]
pub struct TaskListQuery {
    /// Exact status match ("to_do" or "done")
    pub status: Option<String>,

    /// Case-insensitive substring match on name
    pub search: Option<String>,

    /// "created_at" for oldest first, "-created_at" for newest first
    pub order_by: Option<String>,
}

impl TaskListQuery {
    /// Converts the raw query parameters into a filter
    ///
    /// Empty parameter values are treated as absent, so `?status=` lists
    /// everything. Unknown status or ordering values are rejected with a
    /// field error rather than silently ignored.
    fn into_filter(self) -> Result<TaskFilter, ApiError> {
        let mut errors = Vec::new();
        let mut filter = TaskFilter::default();

        if let Some(raw) = self.status.as_deref().filter(|s| !s.is_empty()) {
            match TaskStatus::parse(raw) {
                Some(status) => filter.status = Some(status),
                None => errors.push(ValidationErrorDetail::new(
                    "status",
                    format!("\"{}\" is not a valid choice.", raw),
                )),
            }
        }

        if let Some(raw) = self.order_by.as_deref().filter(|s| !s.is_empty()) {
            match TaskOrder::parse(raw) {
                Some(order) => filter.order = order,
                None => errors.push(ValidationErrorDetail::new(
                    "order_by",
                    format!("\"{}\" is not a valid choice.", raw),
                )),
            }
        }

        if let Some(search) = self.search.filter(|s| !s.is_empty()) {
            filter.search = Some(search);
        }

        if errors.is_empty() {
            Ok(filter)
        } else {
            Err(ApiError::ValidationError(errors))
        }
    }
}

/// Create task request
#[derive(Debug, Default, Deserialize)]
pub struct CreateTaskRequest {
    /// Task name (required, at most 255 characters)
    pub name: Option<String>,

    /// Task description (required, may be long)
    pub description: Option<String>,

    /// Completion state (optional, defaults to "to_do")
    pub status: Option<String>,
}

impl CreateTaskRequest {
    /// Validates the request, reporting every bad field at once
    fn validate(self) -> Result<(String, String, TaskStatus), ApiError> {
        let mut errors = Vec::new();

        let name = match self.name.as_deref().map(str::trim) {
            None => {
                errors.push(ValidationErrorDetail::new("name", "This field is required."));
                None
            }
            Some(name) => check_name(name, &mut errors),
        };

        let description = match self.description.as_deref().map(str::trim) {
            None => {
                errors.push(ValidationErrorDetail::new(
                    "description",
                    "This field is required.",
                ));
                None
            }
            Some(description) => check_description(description, &mut errors),
        };

        let status = match self.status.as_deref() {
            None => Some(TaskStatus::default()),
            Some(raw) => check_status(raw, &mut errors),
        };

        if !errors.is_empty() {
            return Err(ApiError::ValidationError(errors));
        }

        // All are Some when no error was recorded for them
        Ok((
            name.unwrap_or_default(),
            description.unwrap_or_default(),
            status.unwrap_or_default(),
        ))
    }
}

/// Update task request; absent fields are left unchanged
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTaskRequest {
    /// New task name
    pub name: Option<String>,

    /// New task description
    pub description: Option<String>,

    /// New completion state
    pub status: Option<String>,
}

impl UpdateTaskRequest {
    /// Validates the present fields; an empty request is valid
    fn validate(self) -> Result<UpdateTask, ApiError> {
        let mut errors = Vec::new();
        let mut update = UpdateTask::default();

        if let Some(name) = self.name.as_deref().map(str::trim) {
            update.name = check_name(name, &mut errors);
        }

        if let Some(description) = self.description.as_deref().map(str::trim) {
            update.description = check_description(description, &mut errors);
        }

        if let Some(raw) = self.status.as_deref() {
            update.status = check_status(raw, &mut errors);
        }

        if errors.is_empty() {
            Ok(update)
        } else {
            Err(ApiError::ValidationError(errors))
        }
    }
}

/// Validates a trimmed task name, recording any problems
fn check_name(name: &str, errors: &mut Vec<ValidationErrorDetail>) -> Option<String> {
    if name.is_empty() {
        errors.push(ValidationErrorDetail::new(
            "name",
            "This field may not be blank.",
        ));
        return None;
    }

    if name.chars().count() > NAME_MAX_LENGTH {
        errors.push(ValidationErrorDetail::new(
            "name",
            format!(
                "Ensure this field has no more than {} characters.",
                NAME_MAX_LENGTH
            ),
        ));
        return None;
    }

    Some(name.to_string())
}

/// Validates a trimmed description; required on create, and when present
/// it may not be blank
fn check_description(
    description: &str,
    errors: &mut Vec<ValidationErrorDetail>,
) -> Option<String> {
    if description.is_empty() {
        errors.push(ValidationErrorDetail::new(
            "description",
            "This field may not be blank.",
        ));
        return None;
    }

    Some(description.to_string())
}

/// Parses a status value, recording a choice error on failure
fn check_status(raw: &str, errors: &mut Vec<ValidationErrorDetail>) -> Option<TaskStatus> {
    match TaskStatus::parse(raw) {
        Some(status) => Some(status),
        None => {
            errors.push(ValidationErrorDetail::new(
                "status",
                format!("\"{}\" is not a valid choice.", raw),
            ));
            None
        }
    }
}

/// List tasks
///
/// Returns every task the caller may see, newest first unless `order_by`
/// says otherwise.
///
/// # Endpoint
///
/// ```text
/// GET /tasks/?status=to_do&search=deploy&order_by=-created_at
/// ```
///
/// # Response
///
/// ```json
/// [
///   {
///     "id": 2,
///     "name": "Deploy staging",
///     "description": "Roll out build 142",
///     "status": "to_do",
///     "created_at": "2025-08-12T14:30:22Z"
///   }
/// ]
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Unknown status or order_by value
/// - `401 Unauthorized`: Invalid credentials presented
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(query): Query<TaskListQuery>,
) -> ApiResult<Json<Vec<TaskResponse>>> {
    let filter = query.into_filter()?;

    let tasks = Task::list(&state.db, caller, filter).await?;

    Ok(Json(tasks.into_iter().map(TaskResponse::from).collect()))
}

/// Create a task
///
/// The owner is taken from the caller's credentials, never from the body.
/// Anonymous callers create ownerless tasks, which are visible to
/// everyone.
///
/// # Endpoint
///
/// ```text
/// POST /tasks/
/// Content-Type: application/json
///
/// {
///   "name": "Deploy staging",
///   "description": "Roll out build 142",
///   "status": "to_do"
/// }
/// ```
///
/// # Response
///
/// `201 Created` with the stored task.
///
/// # Errors
///
/// - `400 Bad Request`: Missing or invalid fields
/// - `401 Unauthorized`: Invalid credentials presented
pub async fn create_task(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiJson(req): ApiJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    let (name, description, status) = req.validate()?;

    let task = Task::create(
        &state.db,
        CreateTask {
            name,
            description,
            status,
            created_by: caller.owner_id(),
        },
    )
    .await?;

    tracing::debug!(task_id = task.id, "Task created");

    Ok((StatusCode::CREATED, Json(task.into())))
}

/// Retrieve a task
///
/// # Endpoint
///
/// ```text
/// GET /tasks/:id/
/// ```
///
/// # Errors
///
/// - `404 Not Found`: Task is missing or belongs to someone else
pub async fn get_task(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i64>,
) -> ApiResult<Json<TaskResponse>> {
    let task = Task::find_by_id_visible(&state.db, id, caller)
        .await?
        .ok_or_else(|| ApiError::NotFound("Not found.".to_string()))?;

    Ok(Json(task.into()))
}

/// Partially update a task
///
/// Only the fields present in the body change. An empty body is accepted
/// and returns the task unchanged.
///
/// # Endpoint
///
/// ```text
/// PATCH /tasks/:id/
/// Content-Type: application/json
///
/// { "status": "done" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Invalid field values
/// - `404 Not Found`: Task is missing or belongs to someone else
pub async fn update_task(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i64>,
    ApiJson(req): ApiJson<UpdateTaskRequest>,
) -> ApiResult<Json<TaskResponse>> {
    let update = req.validate()?;

    let task = Task::update_visible(&state.db, id, caller, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Not found.".to_string()))?;

    Ok(Json(task.into()))
}

/// Delete a task
///
/// # Endpoint
///
/// ```text
/// DELETE /tasks/:id/
/// ```
///
/// # Response
///
/// `204 No Content` on success.
///
/// # Errors
///
/// - `404 Not Found`: Task is missing or belongs to someone else
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    let deleted = Task::delete_visible(&state.db, id, caller).await?;

    if !deleted {
        return Err(ApiError::NotFound("Not found.".to_string()));
    }

    tracing::debug!(task_id = id, "Task deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages_for(err: ApiError, field: &str) -> Vec<String> {
        match err {
            ApiError::ValidationError(details) => details
                .into_iter()
                .filter(|d| d.field == field)
                .map(|d| d.message)
                .collect(),
            other => panic!("Expected validation error, got {other}"),
        }
    }

    #[test]
    fn test_create_requires_name() {
        let err = CreateTaskRequest::default().validate().unwrap_err();
        assert_eq!(messages_for(err, "name"), vec!["This field is required."]);
    }

    #[test]
    fn test_create_rejects_blank_name() {
        let req = CreateTaskRequest {
            name: Some("   ".to_string()),
            ..Default::default()
        };

        let err = req.validate().unwrap_err();
        assert_eq!(messages_for(err, "name"), vec!["This field may not be blank."]);
    }

    #[test]
    fn test_create_rejects_long_name() {
        let req = CreateTaskRequest {
            name: Some("x".repeat(256)),
            ..Default::default()
        };

        let err = req.validate().unwrap_err();
        assert_eq!(
            messages_for(err, "name"),
            vec!["Ensure this field has no more than 255 characters."]
        );
    }

    #[test]
    fn test_create_accepts_name_at_limit() {
        let req = CreateTaskRequest {
            name: Some("x".repeat(255)),
            description: Some("fits".to_string()),
            ..Default::default()
        };

        let (name, description, status) = req.validate().unwrap();
        assert_eq!(name.len(), 255);
        assert_eq!(description, "fits");
        assert_eq!(status, TaskStatus::ToDo);
    }

    #[test]
    fn test_create_requires_description() {
        let req = CreateTaskRequest {
            name: Some("ok".to_string()),
            ..Default::default()
        };

        let err = req.validate().unwrap_err();
        assert_eq!(
            messages_for(err, "description"),
            vec!["This field is required."]
        );
    }

    #[test]
    fn test_create_rejects_blank_description() {
        let req = CreateTaskRequest {
            name: Some("ok".to_string()),
            description: Some("   ".to_string()),
            ..Default::default()
        };

        let err = req.validate().unwrap_err();
        assert_eq!(
            messages_for(err, "description"),
            vec!["This field may not be blank."]
        );
    }

    #[test]
    fn test_create_rejects_unknown_status() {
        let req = CreateTaskRequest {
            name: Some("ok".to_string()),
            description: Some("fine".to_string()),
            status: Some("in_progress".to_string()),
        };

        let err = req.validate().unwrap_err();
        assert_eq!(
            messages_for(err, "status"),
            vec!["\"in_progress\" is not a valid choice."]
        );
    }

    #[test]
    fn test_create_collects_all_field_errors() {
        let req = CreateTaskRequest {
            name: None,
            description: None,
            status: Some("bogus".to_string()),
        };

        match req.validate().unwrap_err() {
            ApiError::ValidationError(details) => {
                let fields: Vec<_> = details.iter().map(|d| d.field.as_str()).collect();
                assert_eq!(fields, vec!["name", "description", "status"]);
            }
            other => panic!("Expected validation error, got {other}"),
        }
    }

    #[test]
    fn test_create_trims_whitespace() {
        let req = CreateTaskRequest {
            name: Some("  padded  ".to_string()),
            description: Some("  also padded  ".to_string()),
            ..Default::default()
        };

        let (name, description, _) = req.validate().unwrap();
        assert_eq!(name, "padded");
        assert_eq!(description, "also padded");
    }

    #[test]
    fn test_update_allows_empty_body() {
        let update = UpdateTaskRequest::default().validate().unwrap();
        assert!(update.is_empty());
    }

    #[test]
    fn test_update_rejects_blank_name() {
        let req = UpdateTaskRequest {
            name: Some(String::new()),
            ..Default::default()
        };

        let err = req.validate().unwrap_err();
        assert_eq!(messages_for(err, "name"), vec!["This field may not be blank."]);
    }

    #[test]
    fn test_update_rejects_blank_description() {
        let req = UpdateTaskRequest {
            description: Some("  ".to_string()),
            ..Default::default()
        };

        let err = req.validate().unwrap_err();
        assert_eq!(
            messages_for(err, "description"),
            vec!["This field may not be blank."]
        );
    }

    #[test]
    fn test_update_parses_status() {
        let req = UpdateTaskRequest {
            status: Some("done".to_string()),
            ..Default::default()
        };

        let update = req.validate().unwrap();
        assert_eq!(update.status, Some(TaskStatus::Done));
        assert!(update.name.is_none());
    }

    #[test]
    fn test_query_defaults() {
        let filter = TaskListQuery::default().into_filter().unwrap();
        assert!(filter.status.is_none());
        assert!(filter.search.is_none());
        assert_eq!(filter.order, TaskOrder::NewestFirst);
    }

    #[test]
    fn test_query_empty_values_are_ignored() {
        let query = TaskListQuery {
            status: Some(String::new()),
            search: Some(String::new()),
            order_by: Some(String::new()),
        };

        let filter = query.into_filter().unwrap();
        assert!(filter.status.is_none());
        assert!(filter.search.is_none());
        assert_eq!(filter.order, TaskOrder::NewestFirst);
    }

    #[test]
    fn test_query_parses_filters() {
        let query = TaskListQuery {
            status: Some("done".to_string()),
            search: Some("deploy".to_string()),
            order_by: Some("created_at".to_string()),
        };

        let filter = query.into_filter().unwrap();
        assert_eq!(filter.status, Some(TaskStatus::Done));
        assert_eq!(filter.search.as_deref(), Some("deploy"));
        assert_eq!(filter.order, TaskOrder::CreatedAtAsc);
    }

    #[test]
    fn test_query_rejects_unknown_values() {
        let query = TaskListQuery {
            status: Some("archived".to_string()),
            order_by: Some("name".to_string()),
            ..Default::default()
        };

        match query.into_filter().unwrap_err() {
            ApiError::ValidationError(details) => {
                let fields: Vec<_> = details.iter().map(|d| d.field.as_str()).collect();
                assert_eq!(fields, vec!["status", "order_by"]);
            }
            other => panic!("Expected validation error, got {other}"),
        }
    }

    #[test]
    fn test_response_hides_owner() {
        let task = Task {
            id: 7,
            name: "secret".to_string(),
            description: String::new(),
            status: TaskStatus::ToDo,
            created_by: Some(uuid::Uuid::new_v4()),
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(TaskResponse::from(task)).unwrap();
        assert!(json.get("created_by").is_none());
        assert_eq!(json["id"], 7);
    }
}
