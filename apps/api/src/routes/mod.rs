pub mod health;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::applicants::handlers as applicants;
use crate::catalog::handlers as catalog;
use crate::interviewers::handlers as interviewers;
use crate::progression::handlers as progression;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Stage catalog
        .route(
            "/api/stages",
            get(catalog::handle_list_stages).post(catalog::handle_create_stage),
        )
        .route("/api/stages/stats", get(catalog::handle_stage_stats))
        .route(
            "/api/stages/:id",
            get(catalog::handle_get_stage)
                .patch(catalog::handle_update_stage)
                .delete(catalog::handle_delete_stage),
        )
        // Interviewers
        .route(
            "/api/interviewers",
            get(interviewers::handle_list_interviewers).post(interviewers::handle_create_interviewer),
        )
        .route("/api/interviewers/:id", get(interviewers::handle_get_interviewer))
        // Applicants
        .route(
            "/api/applicants",
            get(applicants::handle_list_applicants).post(applicants::handle_create_applicant),
        )
        .route("/api/applicants/:id", get(applicants::handle_get_applicant))
        .route(
            "/api/applicants/:id/offer",
            get(applicants::handle_get_offer_status).post(applicants::handle_submit_offer_decision),
        )
        .route(
            "/api/applicants/:id/ai-result",
            get(applicants::handle_get_ai_result).patch(applicants::handle_update_ai_result),
        )
        .route(
            "/api/applicants/:id/next-stage",
            get(progression::handle_propose_next_stage),
        )
        .route(
            "/api/applicants/:id/interviews",
            get(progression::handle_list_applicant_interviews),
        )
        // Interviews
        .route("/api/interviews", post(progression::handle_schedule_stage))
        .route("/api/interviews/:id", get(progression::handle_get_interview))
        .route(
            "/api/interviews/:id/status",
            patch(progression::handle_update_interview_status),
        )
        .route(
            "/api/interviews/:id/stages",
            get(progression::handle_list_interview_stages),
        )
        .route(
            "/api/interviews/:id/stages/:stage_id/outcome",
            get(progression::handle_get_outcome).post(progression::handle_submit_outcome),
        )
        .with_state(state)
}
