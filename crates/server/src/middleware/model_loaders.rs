use std::{fmt::Display, future::Future};

use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::Response,
};
use db::models::task::Task;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

async fn fetch_model_or_error<M, E, Fut>(
    model_name: &'static str,
    model_id: Uuid,
    load_future: Fut,
) -> Result<M, ApiError>
where
    E: Display,
    Fut: Future<Output = Result<Option<M>, E>>,
{
    match load_future.await {
        Ok(Some(model)) => Ok(model),
        Ok(None) => {
            tracing::warn!("{model_name} {model_id} not found");
            Err(ApiError::NotFound(format!("{model_name} not found")))
        }
        Err(error) => {
            tracing::error!("Failed to fetch {model_name} {model_id}: {error}");
            Err(ApiError::Internal(error.to_string()))
        }
    }
}

/// Loads the task named by the path parameter and stashes it as a request
/// extension. 404s before the handler sees the request; the ownership check
/// stays with the handler so it can distinguish 401 from 404.
pub async fn load_task_middleware(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let task = fetch_model_or_error(
        "Task",
        task_id,
        Task::find_by_id(&state.db().pool, task_id),
    )
    .await?;

    let mut request = request;
    request.extensions_mut().insert(task);
    Ok(next.run(request).await)
}
