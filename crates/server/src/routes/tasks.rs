use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{delete, get, post, put},
};
use db::models::{
    task::{
        CreateTask, DEFAULT_PAGE_LIMIT, Task, TaskError, TaskListFilter, TaskListPage, TaskSort,
        TaskStatus, UpdateTask,
    },
    user::User,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::load_task_middleware};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListParams {
    pub search: Option<String>,
    pub status: Option<String>,
    pub sort_by: Option<String>,
    // Kept as raw strings so garbage degrades to the defaults instead of a
    // deserialization failure.
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Serialize, TS)]
pub struct TaskDeletedResponse {
    pub message: String,
}

fn parse_positive(raw: Option<&str>, default: u64) -> u64 {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|value| *value >= 1)
        .unwrap_or(default)
}

fn parse_status_filter(raw: Option<&str>) -> Option<TaskStatus> {
    use std::str::FromStr;

    raw.map(str::trim)
        .filter(|s| !s.is_empty() && *s != "all")
        .and_then(|s| TaskStatus::from_str(s).ok())
}

fn ensure_owner(task: &Task, user: &User) -> Result<(), ApiError> {
    if task.user_id != user.id {
        tracing::warn!(
            task_id = %task.id,
            user_id = %user.id,
            "Rejected access to another user's task"
        );
        return Err(ApiError::Unauthorized);
    }
    Ok(())
}

pub async fn get_tasks(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(params): Query<TaskListParams>,
) -> Result<ResponseJson<TaskListPage>, ApiError> {
    let filter = TaskListFilter {
        search: params.search,
        status: parse_status_filter(params.status.as_deref()),
        sort: TaskSort::from_param(params.sort_by.as_deref()),
        page: parse_positive(params.page.as_deref(), 1),
        limit: parse_positive(params.limit.as_deref(), DEFAULT_PAGE_LIMIT),
    };

    let page = Task::list(&state.db().pool, user.id, &filter).await?;
    Ok(ResponseJson(page))
}

pub async fn get_task(
    Extension(task): Extension<Task>,
    Extension(user): Extension<User>,
) -> Result<ResponseJson<Task>, ApiError> {
    ensure_owner(&task, &user)?;
    Ok(ResponseJson(task))
}

pub async fn create_task(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<CreateTask>,
) -> Result<(StatusCode, ResponseJson<Task>), ApiError> {
    if payload.title.trim().is_empty() || payload.description.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Please add a title and description".to_string(),
        ));
    }

    let task = Task::create(&state.db().pool, &payload, user.id, Uuid::new_v4()).await?;
    tracing::debug!(task_id = %task.id, "Created task");
    Ok((StatusCode::CREATED, ResponseJson(task)))
}

pub async fn update_task(
    Extension(existing_task): Extension<Task>,
    Extension(user): Extension<User>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateTask>,
) -> Result<ResponseJson<Task>, ApiError> {
    ensure_owner(&existing_task, &user)?;

    // Absent or empty fields keep their current value; a caller cannot clear
    // a field to the empty string through this endpoint.
    let title = payload
        .title
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(existing_task.title);
    let description = payload
        .description
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(existing_task.description);
    let status = payload.status.unwrap_or(existing_task.status);

    let task = Task::update(&state.db().pool, existing_task.id, title, description, status)
        .await?;
    Ok(ResponseJson(task))
}

pub async fn delete_task(
    Extension(task): Extension<Task>,
    Extension(user): Extension<User>,
    State(state): State<AppState>,
) -> Result<ResponseJson<TaskDeletedResponse>, ApiError> {
    ensure_owner(&task, &user)?;

    let rows = Task::delete(&state.db().pool, task.id).await?;
    if rows == 0 {
        return Err(TaskError::TaskNotFound.into());
    }

    tracing::debug!(task_id = %task.id, "Deleted task");
    Ok(ResponseJson(TaskDeletedResponse {
        message: "Task removed".to_string(),
    }))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let task_id_routes = Router::new()
        .route("/view/{task_id}", get(get_task))
        .route("/edit/{task_id}", put(update_task))
        .route("/delete/{task_id}", delete(delete_task))
        .layer(from_fn_with_state(state.clone(), load_task_middleware));

    Router::new()
        .route("/view", get(get_tasks))
        .route("/create", post(create_task))
        .merge(task_id_routes)
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use tower::ServiceExt;

    use crate::test_support::{body_json, create_task, json_request, register_user, test_app};

    #[tokio::test]
    async fn create_and_read_round_trip_with_default_status() {
        let (_dir, app) = test_app().await;
        let token = register_user(&app, "ada@example.com").await;

        let created = create_task(&app, &token, "T", "D").await;
        assert_eq!(created["status"], "pending");
        assert!(created["createdAt"].as_str().is_some());

        let id = created["id"].as_str().unwrap();
        let response = app
            .oneshot(json_request(
                Method::GET,
                &format!("/api/tasks/view/{id}"),
                Some(&token),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["title"], "T");
        assert_eq!(json["description"], "D");
        assert_eq!(json["status"], "pending");
    }

    #[tokio::test]
    async fn create_requires_title_and_description() {
        let (_dir, app) = test_app().await;
        let token = register_user(&app, "ada@example.com").await;

        let response = app
            .oneshot(json_request(
                Method::POST,
                "/api/tasks/create",
                Some(&token),
                Some(serde_json::json!({"title": "  ", "description": "D"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["message"], "Please add a title and description");
    }

    #[tokio::test]
    async fn invalid_status_on_create_falls_back_to_pending() {
        let (_dir, app) = test_app().await;
        let token = register_user(&app, "ada@example.com").await;

        let response = app
            .oneshot(json_request(
                Method::POST,
                "/api/tasks/create",
                Some(&token),
                Some(serde_json::json!({
                    "title": "T",
                    "description": "D",
                    "status": "bogus",
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        assert_eq!(json["status"], "pending");
    }

    #[tokio::test]
    async fn listing_reports_pagination_metadata() {
        let (_dir, app) = test_app().await;
        let token = register_user(&app, "ada@example.com").await;

        for i in 0..5 {
            create_task(&app, &token, &format!("task {i}"), "d").await;
        }

        let response = app
            .clone()
            .oneshot(json_request(
                Method::GET,
                "/api/tasks/view?sortBy=title_asc&page=2&limit=2",
                Some(&token),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["totalCount"], 5);
        assert_eq!(json["totalPages"], 3);
        assert_eq!(json["currentPage"], 2);
        let titles: Vec<_> = json["tasks"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["title"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(titles, vec!["task 2", "task 3"]);

        // Past the end: empty slice, echoed page, no error.
        let response = app
            .clone()
            .oneshot(json_request(
                Method::GET,
                "/api/tasks/view?page=42&limit=2",
                Some(&token),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert!(json["tasks"].as_array().unwrap().is_empty());
        assert_eq!(json["currentPage"], 42);

        // A huge but well-formed page still yields an empty slice.
        let response = app
            .clone()
            .oneshot(json_request(
                Method::GET,
                "/api/tasks/view?page=18446744073709551615&limit=2",
                Some(&token),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert!(json["tasks"].as_array().unwrap().is_empty());

        // Garbage page/limit degrade to defaults rather than erroring.
        let response = app
            .oneshot(json_request(
                Method::GET,
                "/api/tasks/view?page=zero&limit=-3",
                Some(&token),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["currentPage"], 1);
        assert_eq!(json["tasks"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn listing_filters_by_search_and_status() {
        let (_dir, app) = test_app().await;
        let token = register_user(&app, "ada@example.com").await;

        create_task(&app, &token, "Buy groceries", "weekly").await;
        let done = create_task(&app, &token, "Ship release", "v2 launch").await;

        let id = done["id"].as_str().unwrap();
        let response = app
            .clone()
            .oneshot(json_request(
                Method::PUT,
                &format!("/api/tasks/edit/{id}"),
                Some(&token),
                Some(serde_json::json!({"status": "done"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(json_request(
                Method::GET,
                "/api/tasks/view?search=GROCERIES",
                Some(&token),
                None,
            ))
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["totalCount"], 1);
        assert_eq!(json["tasks"][0]["title"], "Buy groceries");

        let response = app
            .oneshot(json_request(
                Method::GET,
                "/api/tasks/view?status=done",
                Some(&token),
                None,
            ))
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["totalCount"], 1);
        assert_eq!(json["tasks"][0]["status"], "done");
    }

    #[tokio::test]
    async fn partial_update_keeps_omitted_and_empty_fields() {
        let (_dir, app) = test_app().await;
        let token = register_user(&app, "ada@example.com").await;
        let created = create_task(&app, &token, "Original title", "Original description").await;
        let id = created["id"].as_str().unwrap();

        let response = app
            .clone()
            .oneshot(json_request(
                Method::PUT,
                &format!("/api/tasks/edit/{id}"),
                Some(&token),
                Some(serde_json::json!({"status": "done"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["title"], "Original title");
        assert_eq!(json["description"], "Original description");
        assert_eq!(json["status"], "done");

        // Empty string does not clear the field; this mirrors the documented
        // "falsy disables update" behavior.
        let response = app
            .oneshot(json_request(
                Method::PUT,
                &format!("/api/tasks/edit/{id}"),
                Some(&token),
                Some(serde_json::json!({"title": "", "description": "New description"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["title"], "Original title");
        assert_eq!(json["description"], "New description");
        assert_eq!(json["status"], "done");
    }

    #[tokio::test]
    async fn delete_is_not_idempotent() {
        let (_dir, app) = test_app().await;
        let token = register_user(&app, "ada@example.com").await;
        let created = create_task(&app, &token, "T", "D").await;
        let id = created["id"].as_str().unwrap();

        let response = app
            .clone()
            .oneshot(json_request(
                Method::DELETE,
                &format!("/api/tasks/delete/{id}"),
                Some(&token),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["message"], "Task removed");

        let response = app
            .clone()
            .oneshot(json_request(
                Method::DELETE,
                &format!("/api/tasks/delete/{id}"),
                Some(&token),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .oneshot(json_request(
                Method::GET,
                &format!("/api/tasks/view/{id}"),
                Some(&token),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["message"], "Task not found");
    }

    #[tokio::test]
    async fn other_users_tasks_are_invisible_and_untouchable() {
        let (_dir, app) = test_app().await;
        let alice = register_user(&app, "alice@example.com").await;
        let bob = register_user(&app, "bob@example.com").await;

        let created = create_task(&app, &alice, "Alice task", "hers").await;
        let id = created["id"].as_str().unwrap();

        // Bob's listing never includes Alice's task.
        let response = app
            .clone()
            .oneshot(json_request(Method::GET, "/api/tasks/view", Some(&bob), None))
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["totalCount"], 0);

        // Existing-but-foreign id yields 401, not 404.
        for (method, uri, body) in [
            (Method::GET, format!("/api/tasks/view/{id}"), None),
            (
                Method::PUT,
                format!("/api/tasks/edit/{id}"),
                Some(serde_json::json!({"title": "hijacked"})),
            ),
            (Method::DELETE, format!("/api/tasks/delete/{id}"), None),
        ] {
            let response = app
                .clone()
                .oneshot(json_request(method, &uri, Some(&bob), body))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }

        // And the task is unaffected.
        let response = app
            .oneshot(json_request(
                Method::GET,
                &format!("/api/tasks/view/{id}"),
                Some(&alice),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["title"], "Alice task");
    }
}
