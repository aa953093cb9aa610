//! API routes

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use super::handlers::{self, AppState};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))

        // Workers
        .route(
            "/api/workers",
            get(handlers::list_workers).post(handlers::create_worker),
        )
        .route(
            "/api/workers/:id",
            get(handlers::get_worker)
                .put(handlers::update_worker)
                .delete(handlers::delete_worker),
        )
        .route(
            "/api/workers/:id/documents",
            get(handlers::list_worker_documents).post(handlers::create_document),
        )

        // Documents
        .route("/api/documents", get(handlers::list_documents))
        .route(
            "/api/documents/:id",
            get(handlers::get_document)
                .put(handlers::update_document)
                .delete(handlers::delete_document),
        )

        // Projects
        .route(
            "/api/projects",
            get(handlers::list_projects).post(handlers::create_project),
        )
        .route(
            "/api/projects/:id",
            get(handlers::get_project)
                .put(handlers::update_project)
                .delete(handlers::delete_project),
        )
        .route("/api/projects/:id/budget", get(handlers::project_budget))
        .route(
            "/api/projects/:id/expenses",
            get(handlers::list_project_expenses).post(handlers::create_expense),
        )

        // Expenses
        .route("/api/expenses", get(handlers::list_expenses))
        .route(
            "/api/expenses/:id",
            get(handlers::get_expense)
                .put(handlers::update_expense)
                .delete(handlers::delete_expense),
        )

        // Recruitment pipeline
        .route(
            "/api/pipeline",
            get(handlers::list_candidates).post(handlers::create_candidate),
        )
        .route(
            "/api/pipeline/:id",
            get(handlers::get_candidate)
                .put(handlers::update_candidate)
                .delete(handlers::delete_candidate),
        )
        .route("/api/pipeline/:id/stage", post(handlers::move_candidate_stage))
        .route("/api/pipeline/:id/hire", post(handlers::hire_candidate))

        // Notifications
        .route("/api/notifications", get(handlers::list_notifications))
        .route(
            "/api/notifications/read-all",
            post(handlers::mark_all_notifications_read),
        )
        .route(
            "/api/notifications/:id/read",
            post(handlers::mark_notification_read),
        )
        .route("/api/notifications/:id", delete(handlers::delete_notification))

        // Alerts & dashboard
        .route("/api/alerts", get(handlers::list_alerts))
        .route("/api/alerts/sweep", post(handlers::sweep_alerts))
        .route("/api/dashboard", get(handlers::get_dashboard))

        .fallback(handlers::route_not_found)
        .layer(middleware::from_fn(handlers::method_not_allowed))
        .with_state(state)
}
