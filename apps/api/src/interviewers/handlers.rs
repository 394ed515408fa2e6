use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::applicants::validation::is_valid_email;
use crate::errors::{unique_violation, AppError};
use crate::models::interviewer::{FunctionArea, InterviewerRow};
use crate::models::stage::InterviewerCapability;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateInterviewerRequest {
    pub name: String,
    pub email: String,
    pub capability: InterviewerCapability,
    pub function_area: FunctionArea,
    pub position: String,
}

/// POST /api/interviewers
pub async fn handle_create_interviewer(
    State(state): State<AppState>,
    Json(req): Json<CreateInterviewerRequest>,
) -> Result<(StatusCode, Json<InterviewerRow>), AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }
    if !is_valid_email(&req.email) {
        return Err(AppError::Validation(
            "Please provide a valid email address".to_string(),
        ));
    }

    let interviewer: InterviewerRow = sqlx::query_as(
        r#"
        INSERT INTO interviewers (name, email, capability, function_area, position)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(req.name.trim())
    .bind(&req.email)
    .bind(req.capability)
    .bind(req.function_area)
    .bind(&req.position)
    .fetch_one(&state.db)
    .await
    .map_err(|e| unique_violation(e, "Email already exists"))?;

    Ok((StatusCode::CREATED, Json(interviewer)))
}

#[derive(Debug, Deserialize)]
pub struct InterviewerListQuery {
    pub capability: Option<InterviewerCapability>,
}

/// GET /api/interviewers
pub async fn handle_list_interviewers(
    State(state): State<AppState>,
    Query(params): Query<InterviewerListQuery>,
) -> Result<Json<Vec<InterviewerRow>>, AppError> {
    let interviewers: Vec<InterviewerRow> = match params.capability {
        Some(capability) => {
            sqlx::query_as("SELECT * FROM interviewers WHERE capability = $1 ORDER BY name ASC")
                .bind(capability)
                .fetch_all(&state.db)
                .await?
        }
        None => {
            sqlx::query_as("SELECT * FROM interviewers ORDER BY name ASC")
                .fetch_all(&state.db)
                .await?
        }
    };
    Ok(Json(interviewers))
}

/// GET /api/interviewers/:id
pub async fn handle_get_interviewer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<InterviewerRow>, AppError> {
    let interviewer: Option<InterviewerRow> =
        sqlx::query_as("SELECT * FROM interviewers WHERE id = $1")
            .bind(id)
            .fetch_optional(&state.db)
            .await?;
    let interviewer =
        interviewer.ok_or_else(|| AppError::NotFound(format!("Interviewer {id} not found")))?;
    Ok(Json(interviewer))
}
