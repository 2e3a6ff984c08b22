pub mod auth;

use axum::{Router, middleware::from_fn_with_state};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{AppState, routes};

/// Builds the full application router: a public health probe, public user
/// registration and login, and the task routes behind bearer-token auth.
pub fn router(state: &AppState) -> Router {
    let task_routes = routes::tasks::router(state)
        .layer(from_fn_with_state(state.clone(), auth::require_auth));

    let api = Router::new()
        .nest("/users", routes::users::router())
        .nest("/tasks", task_routes);

    Router::new()
        .route("/health", axum::routing::get(routes::health::health_check))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state.clone())
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use tower::ServiceExt;

    use crate::test_support::{body_json, json_request, test_app};

    #[tokio::test]
    async fn health_is_public() {
        let (_dir, app) = test_app().await;
        let response = app
            .oneshot(json_request(Method::GET, "/health", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn task_routes_require_a_token() {
        let (_dir, app) = test_app().await;

        let response = app
            .clone()
            .oneshot(json_request(Method::GET, "/api/tasks/view", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["message"], "Not authorized");

        let response = app
            .oneshot(json_request(
                Method::GET,
                "/api/tasks/view",
                Some("not-a-real-token"),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
