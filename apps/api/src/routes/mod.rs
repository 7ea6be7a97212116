pub mod health;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::applications::handlers as applications;
use crate::auth::handlers as auth;
use crate::credits::handlers as credits;
use crate::jobs::handlers as jobs;
use crate::regions::handlers as regions;
use crate::search::handlers as search;
use crate::state::AppState;
use crate::sweeper;
use crate::users::handlers as users;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Accounts
        .route("/api/v1/auth/signup", post(auth::handle_signup))
        .route("/api/v1/auth/login", post(auth::handle_login))
        .route("/api/v1/auth/logout", post(auth::handle_logout))
        .route("/api/v1/me", get(users::handle_me))
        .route("/api/v1/onboarding", post(users::handle_onboarding))
        // Search
        .route("/api/v1/jobs/search", get(search::handle_search))
        .route("/api/v1/jobs/search/parse", post(search::handle_parse_query))
        // Jobs
        .route("/api/v1/jobs", post(jobs::handle_create_job))
        .route(
            "/api/v1/jobs/:id",
            get(jobs::handle_get_job).patch(jobs::handle_update_job),
        )
        .route("/api/v1/jobs/:id/activate", post(jobs::handle_activate_job))
        .route("/api/v1/jobs/:id/pause", post(jobs::handle_pause_job))
        .route("/api/v1/employer/jobs", get(jobs::handle_list_employer_jobs))
        // Applications
        .route(
            "/api/v1/jobs/:id/applications",
            post(applications::handle_apply).get(applications::handle_list_job_applications),
        )
        .route(
            "/api/v1/applications",
            get(applications::handle_list_my_applications),
        )
        .route(
            "/api/v1/applications/:id/status",
            patch(applications::handle_update_application_status),
        )
        // Credits
        .route("/api/v1/credits", get(credits::handle_get_credits))
        // Admin
        .route(
            "/api/v1/admin/credits/grant",
            post(credits::handle_grant_credits),
        )
        .route(
            "/api/v1/admin/subscriptions",
            post(credits::handle_renew_subscription),
        )
        .route(
            "/api/v1/admin/regions/assign",
            post(regions::handle_assign_regions),
        )
        .route("/api/v1/admin/sweep", post(sweeper::handle_sweep))
        .with_state(state)
}
