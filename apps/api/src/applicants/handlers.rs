use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::applicants::validation::validate_new_applicant;
use crate::errors::{unique_violation, AppError};
use crate::models::applicant::{AiResult, ApplicantRow, ApplicantStatus, OfferStatus};
use crate::progression::engine::{self, OfferDecision};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateApplicantRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub resume_ref: String,
}

/// POST /api/applicants
pub async fn handle_create_applicant(
    State(state): State<AppState>,
    Json(req): Json<CreateApplicantRequest>,
) -> Result<(StatusCode, Json<ApplicantRow>), AppError> {
    validate_new_applicant(&req.name, &req.email, &req.phone, &req.resume_ref)
        .map_err(AppError::Validation)?;

    let applicant: ApplicantRow = sqlx::query_as(
        r#"
        INSERT INTO applicants (name, email, phone, resume_ref)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(req.name.trim())
    .bind(&req.email)
    .bind(&req.phone)
    .bind(&req.resume_ref)
    .fetch_one(&state.db)
    .await
    .map_err(|e| unique_violation(e, "Email already exists"))?;

    Ok((StatusCode::CREATED, Json(applicant)))
}

#[derive(Debug, Deserialize)]
pub struct ApplicantListQuery {
    pub offer_status: Option<OfferStatus>,
}

/// GET /api/applicants
pub async fn handle_list_applicants(
    State(state): State<AppState>,
    Query(params): Query<ApplicantListQuery>,
) -> Result<Json<Vec<ApplicantRow>>, AppError> {
    let applicants: Vec<ApplicantRow> = match params.offer_status {
        Some(offer_status) => {
            sqlx::query_as(
                "SELECT * FROM applicants WHERE offer_status = $1 ORDER BY updated_at DESC",
            )
            .bind(offer_status)
            .fetch_all(&state.db)
            .await?
        }
        None => {
            sqlx::query_as("SELECT * FROM applicants ORDER BY updated_at DESC")
                .fetch_all(&state.db)
                .await?
        }
    };
    Ok(Json(applicants))
}

/// GET /api/applicants/:id
pub async fn handle_get_applicant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApplicantRow>, AppError> {
    Ok(Json(find_applicant(&state, id).await?))
}

#[derive(Debug, Serialize)]
pub struct OfferStatusResponse {
    pub id: Uuid,
    pub name: String,
    pub status: ApplicantStatus,
    pub offer_status: OfferStatus,
}

/// GET /api/applicants/:id/offer
pub async fn handle_get_offer_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<OfferStatusResponse>, AppError> {
    let applicant = find_applicant(&state, id).await?;
    Ok(Json(OfferStatusResponse {
        id: applicant.id,
        name: applicant.name,
        status: applicant.status,
        offer_status: applicant.offer_status,
    }))
}

#[derive(Debug, Deserialize)]
pub struct OfferDecisionRequest {
    pub decision: OfferDecision,
}

/// POST /api/applicants/:id/offer
///
/// Records the applicant's accept/decline. The UPDATE is conditioned on
/// `status = 'offered'` so a concurrent transition loses cleanly.
pub async fn handle_submit_offer_decision(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<OfferDecisionRequest>,
) -> Result<Json<ApplicantRow>, AppError> {
    let applicant = find_applicant(&state, id).await?;
    let (status, offer_status) = engine::offer_transition(applicant.status, req.decision)?;

    let updated: Option<ApplicantRow> = sqlx::query_as(
        r#"
        UPDATE applicants SET status = $2, offer_status = $3, updated_at = now()
        WHERE id = $1 AND status = 'offered'
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(status)
    .bind(offer_status)
    .fetch_optional(&state.db)
    .await?;

    let updated = updated.ok_or_else(|| {
        AppError::Conflict("applicant status changed while recording the offer decision".to_string())
    })?;

    info!("Applicant {} offer decision: {}", updated.id, updated.status);
    Ok(Json(updated))
}

#[derive(Debug, Deserialize)]
pub struct AiResultRequest {
    pub ai_result: AiResult,
}

#[derive(Debug, Serialize)]
pub struct AiResultResponse {
    pub applicant_id: Uuid,
    pub ai_result: Option<AiResult>,
}

/// PATCH /api/applicants/:id/ai-result
pub async fn handle_update_ai_result(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AiResultRequest>,
) -> Result<Json<ApplicantRow>, AppError> {
    let updated: Option<ApplicantRow> = sqlx::query_as(
        "UPDATE applicants SET ai_result = $2, updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(req.ai_result)
    .fetch_optional(&state.db)
    .await?;

    let updated = updated.ok_or_else(|| AppError::NotFound(format!("Applicant {id} not found")))?;
    Ok(Json(updated))
}

/// GET /api/applicants/:id/ai-result
pub async fn handle_get_ai_result(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AiResultResponse>, AppError> {
    let applicant = find_applicant(&state, id).await?;
    Ok(Json(AiResultResponse {
        applicant_id: applicant.id,
        ai_result: applicant.ai_result,
    }))
}

async fn find_applicant(state: &AppState, id: Uuid) -> Result<ApplicantRow, AppError> {
    let applicant: Option<ApplicantRow> = sqlx::query_as("SELECT * FROM applicants WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?;
    applicant.ok_or_else(|| AppError::NotFound(format!("Applicant {id} not found")))
}
