use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::applicant::{ApplicantRow, ApplicantStatus};
use crate::models::interview::{
    HrScreeningFields, InterviewRow, InterviewStatus, StageOutcomeRow, StageResult,
};
use crate::models::interviewer::InterviewerRow;
use crate::models::stage::{InterviewerCapability, StageDefinitionRow};
use crate::progression::{engine, store};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StageSummary {
    pub id: Uuid,
    pub name: String,
    pub stage_order: i32,
    pub required_capability: InterviewerCapability,
}

impl From<&StageDefinitionRow> for StageSummary {
    fn from(stage: &StageDefinitionRow) -> Self {
        Self {
            id: stage.id,
            name: stage.name.clone(),
            stage_order: stage.stage_order,
            required_capability: stage.required_capability,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InterviewerSummary {
    pub id: Uuid,
    pub name: String,
    pub position: String,
    pub capability: InterviewerCapability,
}

impl From<&InterviewerRow> for InterviewerSummary {
    fn from(interviewer: &InterviewerRow) -> Self {
        Self {
            id: interviewer.id,
            name: interviewer.name.clone(),
            position: interviewer.position.clone(),
            capability: interviewer.capability,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApplicantSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub status: ApplicantStatus,
}

impl From<&ApplicantRow> for ApplicantSummary {
    fn from(applicant: &ApplicantRow) -> Self {
        Self {
            id: applicant.id,
            name: applicant.name.clone(),
            email: applicant.email.clone(),
            status: applicant.status,
        }
    }
}

const CONFLICT_MESSAGE: &str = "another transition is in progress for this applicant";

#[derive(Debug, Deserialize)]
pub struct ScheduleStageRequest {
    pub applicant_id: Uuid,
    pub interviewer_id: Uuid,
    pub stage_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ScheduledInterviewResponse {
    pub interview: InterviewRow,
    pub outcome: StageOutcomeRow,
    pub applicant: ApplicantSummary,
    pub interviewer: InterviewerSummary,
    pub stage: StageSummary,
}

/// POST /api/interviews
///
/// Schedules a stage for an applicant. One validator covers every stage,
/// entry or later; the decision rules live in the engine.
pub async fn handle_schedule_stage(
    State(state): State<AppState>,
    Json(req): Json<ScheduleStageRequest>,
) -> Result<(StatusCode, Json<ScheduledInterviewResponse>), AppError> {
    let mut tx = state.db.begin().await?;

    if !store::try_applicant_lock(&mut tx, req.applicant_id).await? {
        return Err(AppError::Conflict(CONFLICT_MESSAGE.to_string()));
    }

    let applicant = store::find_applicant(&mut *tx, req.applicant_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Applicant {} not found", req.applicant_id)))?;
    let catalog = store::load_catalog(&mut *tx).await?;
    let stage = catalog
        .iter()
        .find(|s| s.id == req.stage_id)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("Stage {} not found", req.stage_id)))?;
    let interviewer = store::find_interviewer(&mut *tx, req.interviewer_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Interviewer {} not found", req.interviewer_id))
        })?;
    let history = store::load_history(&mut *tx, applicant.id).await?;

    engine::validate_schedule(
        &catalog,
        &history,
        applicant.status,
        &stage,
        interviewer.capability,
    )?;

    let (interview, outcome) =
        store::create_scheduled_interview(&mut tx, &applicant, interviewer.id, &stage, req.scheduled_at)
            .await?;

    // Entering the very first stage flips the applicant out of 'applied';
    // later stages leave the status to the outcome cascade.
    let applicant = if history.is_empty() {
        store::set_applicant_status(&mut *tx, applicant.id, ApplicantStatus::Interviewing).await?
    } else {
        applicant
    };

    tx.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(ScheduledInterviewResponse {
            applicant: ApplicantSummary::from(&applicant),
            interviewer: InterviewerSummary::from(&interviewer),
            stage: StageSummary::from(&stage),
            interview,
            outcome,
        }),
    ))
}

#[derive(Debug, Serialize)]
pub struct NextStageResponse {
    pub pipeline_complete: bool,
    pub next_stage: Option<StageSummary>,
}

/// GET /api/applicants/:id/next-stage
pub async fn handle_propose_next_stage(
    State(state): State<AppState>,
    Path(applicant_id): Path<Uuid>,
) -> Result<Json<NextStageResponse>, AppError> {
    store::find_applicant(&state.db, applicant_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Applicant {applicant_id} not found")))?;

    let catalog = store::load_catalog(&state.db).await?;
    let history = store::load_history(&state.db, applicant_id).await?;

    let response = match engine::propose_next_stage(&catalog, &history)? {
        Some(stage) => NextStageResponse {
            pipeline_complete: false,
            next_stage: Some(StageSummary::from(stage)),
        },
        None => NextStageResponse {
            pipeline_complete: true,
            next_stage: None,
        },
    };
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct SubmitOutcomeRequest {
    pub result: StageResult,
    pub feedback: Option<String>,
    pub notes: Option<String>,
    pub hr: Option<HrScreeningFields>,
}

#[derive(Debug, Serialize)]
pub struct SubmitOutcomeResponse {
    pub outcome: StageOutcomeRow,
    pub stage: StageSummary,
    pub applicant: ApplicantSummary,
}

/// POST /api/interviews/:id/stages/:stage_id/outcome
///
/// Records the stage result and cascades the applicant status: fail
/// rejects, pass on the last stage offers, pass elsewhere keeps the
/// applicant interviewing. Submitting `pending` only attaches feedback.
pub async fn handle_submit_outcome(
    State(state): State<AppState>,
    Path((interview_id, stage_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<SubmitOutcomeRequest>,
) -> Result<Json<SubmitOutcomeResponse>, AppError> {
    let mut tx = state.db.begin().await?;

    let interview = store::find_interview(&mut *tx, interview_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Interview {interview_id} not found")))?;

    if !store::try_applicant_lock(&mut tx, interview.applicant_id).await? {
        return Err(AppError::Conflict(CONFLICT_MESSAGE.to_string()));
    }

    let outcome = store::find_outcome(&mut *tx, interview_id, stage_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "No stage outcome for interview {interview_id} and stage {stage_id}"
            ))
        })?;
    engine::validate_outcome_submission(outcome.result)?;

    let catalog = store::load_catalog(&mut *tx).await?;
    let stage = catalog
        .iter()
        .find(|s| s.id == stage_id)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("Stage {stage_id} not found")))?;

    if req.hr.is_some() && stage.required_capability != InterviewerCapability::Hr {
        return Err(AppError::Validation(
            "HR screening fields are only accepted for HR stages".to_string(),
        ));
    }

    let updated = store::record_outcome(
        &mut tx,
        outcome.id,
        req.result,
        req.feedback.as_deref(),
        req.notes.as_deref(),
        req.hr.as_ref(),
    )
    .await?;

    let applicant = match engine::status_after_outcome(&catalog, &stage, req.result) {
        Some(status) => {
            store::set_applicant_status(&mut *tx, interview.applicant_id, status).await?
        }
        None => store::find_applicant(&mut *tx, interview.applicant_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Applicant {} not found", interview.applicant_id))
            })?,
    };

    tx.commit().await?;

    info!(
        "Recorded {:?} for stage '{}' (applicant {} now '{}')",
        req.result, stage.name, applicant.id, applicant.status
    );

    Ok(Json(SubmitOutcomeResponse {
        stage: StageSummary::from(&stage),
        applicant: ApplicantSummary::from(&applicant),
        outcome: updated,
    }))
}

#[derive(Debug, Serialize)]
pub struct StageResultResponse {
    pub outcome: StageOutcomeRow,
    pub stage: StageSummary,
}

/// GET /api/interviews/:id/stages/:stage_id/outcome
pub async fn handle_get_outcome(
    State(state): State<AppState>,
    Path((interview_id, stage_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<StageResultResponse>, AppError> {
    let outcome = store::find_outcome(&state.db, interview_id, stage_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "No stage outcome for interview {interview_id} and stage {stage_id}"
            ))
        })?;
    let stage = find_stage(&state, outcome.stage_id).await?;
    Ok(Json(StageResultResponse {
        stage: StageSummary::from(&stage),
        outcome,
    }))
}

/// GET /api/interviews/:id/stages
pub async fn handle_list_interview_stages(
    State(state): State<AppState>,
    Path(interview_id): Path<Uuid>,
) -> Result<Json<Vec<StageResultResponse>>, AppError> {
    store::find_interview(&state.db, interview_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Interview {interview_id} not found")))?;

    let outcomes: Vec<StageOutcomeRow> = sqlx::query_as(
        r#"
        SELECT o.*
        FROM stage_outcomes o
        JOIN stage_definitions s ON s.id = o.stage_id
        WHERE o.interview_id = $1
        ORDER BY s.stage_order ASC
        "#,
    )
    .bind(interview_id)
    .fetch_all(&state.db)
    .await?;

    let catalog = store::load_catalog(&state.db).await?;
    let mut items = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        let stage = catalog
            .iter()
            .find(|s| s.id == outcome.stage_id)
            .ok_or_else(|| anyhow::anyhow!("stage {} missing from catalog", outcome.stage_id))?;
        items.push(StageResultResponse {
            stage: StageSummary::from(stage),
            outcome,
        });
    }
    Ok(Json(items))
}

/// Fully joined interview view: meeting, participants, stage, and result.
#[derive(Debug, Serialize)]
pub struct InterviewDetail {
    pub id: Uuid,
    pub title: String,
    pub scheduled_at: DateTime<Utc>,
    pub status: InterviewStatus,
    pub created_at: DateTime<Utc>,
    pub applicant: ApplicantSummary,
    pub interviewer: InterviewerSummary,
    pub stage: StageSummary,
    pub result: StageResult,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(FromRow)]
struct InterviewDetailRow {
    id: Uuid,
    title: String,
    scheduled_at: DateTime<Utc>,
    status: InterviewStatus,
    created_at: DateTime<Utc>,
    applicant_id: Uuid,
    applicant_name: String,
    applicant_email: String,
    applicant_status: ApplicantStatus,
    interviewer_id: Uuid,
    interviewer_name: String,
    interviewer_position: String,
    interviewer_capability: InterviewerCapability,
    stage_id: Uuid,
    stage_name: String,
    stage_order: i32,
    required_capability: InterviewerCapability,
    result: StageResult,
    completed_at: Option<DateTime<Utc>>,
}

impl From<InterviewDetailRow> for InterviewDetail {
    fn from(row: InterviewDetailRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            scheduled_at: row.scheduled_at,
            status: row.status,
            created_at: row.created_at,
            applicant: ApplicantSummary {
                id: row.applicant_id,
                name: row.applicant_name,
                email: row.applicant_email,
                status: row.applicant_status,
            },
            interviewer: InterviewerSummary {
                id: row.interviewer_id,
                name: row.interviewer_name,
                position: row.interviewer_position,
                capability: row.interviewer_capability,
            },
            stage: StageSummary {
                id: row.stage_id,
                name: row.stage_name,
                stage_order: row.stage_order,
                required_capability: row.required_capability,
            },
            result: row.result,
            completed_at: row.completed_at,
        }
    }
}

const INTERVIEW_DETAIL_SELECT: &str = r#"
    SELECT i.id, i.title, i.scheduled_at, i.status, i.created_at,
           a.id AS applicant_id, a.name AS applicant_name,
           a.email AS applicant_email, a.status AS applicant_status,
           v.id AS interviewer_id, v.name AS interviewer_name,
           v.position AS interviewer_position, v.capability AS interviewer_capability,
           s.id AS stage_id, s.name AS stage_name, s.stage_order, s.required_capability,
           o.result, o.completed_at
    FROM interviews i
    JOIN applicants a ON a.id = i.applicant_id
    JOIN interviewers v ON v.id = i.interviewer_id
    JOIN stage_outcomes o ON o.interview_id = i.id
    JOIN stage_definitions s ON s.id = o.stage_id
"#;

/// GET /api/applicants/:id/interviews
pub async fn handle_list_applicant_interviews(
    State(state): State<AppState>,
    Path(applicant_id): Path<Uuid>,
) -> Result<Json<Vec<InterviewDetail>>, AppError> {
    store::find_applicant(&state.db, applicant_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Applicant {applicant_id} not found")))?;

    let sql = format!("{INTERVIEW_DETAIL_SELECT} WHERE i.applicant_id = $1 ORDER BY i.scheduled_at DESC");
    let rows: Vec<InterviewDetailRow> = sqlx::query_as(&sql)
        .bind(applicant_id)
        .fetch_all(&state.db)
        .await?;

    Ok(Json(rows.into_iter().map(InterviewDetail::from).collect()))
}

/// GET /api/interviews/:id
pub async fn handle_get_interview(
    State(state): State<AppState>,
    Path(interview_id): Path<Uuid>,
) -> Result<Json<InterviewDetail>, AppError> {
    let sql = format!("{INTERVIEW_DETAIL_SELECT} WHERE i.id = $1");
    let row: Option<InterviewDetailRow> = sqlx::query_as(&sql)
        .bind(interview_id)
        .fetch_optional(&state.db)
        .await?;

    let row =
        row.ok_or_else(|| AppError::NotFound(format!("Interview {interview_id} not found")))?;
    Ok(Json(InterviewDetail::from(row)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateInterviewStatusRequest {
    pub status: InterviewStatus,
}

/// PATCH /api/interviews/:id/status
/// Meeting lifecycle only; stage results go through the outcome endpoint.
pub async fn handle_update_interview_status(
    State(state): State<AppState>,
    Path(interview_id): Path<Uuid>,
    Json(req): Json<UpdateInterviewStatusRequest>,
) -> Result<Json<InterviewRow>, AppError> {
    let updated: Option<InterviewRow> =
        sqlx::query_as("UPDATE interviews SET status = $2 WHERE id = $1 RETURNING *")
            .bind(interview_id)
            .bind(req.status)
            .fetch_optional(&state.db)
            .await?;

    let updated =
        updated.ok_or_else(|| AppError::NotFound(format!("Interview {interview_id} not found")))?;
    Ok(Json(updated))
}

async fn find_stage(state: &AppState, stage_id: Uuid) -> Result<StageDefinitionRow, AppError> {
    let stage: Option<StageDefinitionRow> =
        sqlx::query_as("SELECT * FROM stage_definitions WHERE id = $1")
            .bind(stage_id)
            .fetch_optional(&state.db)
            .await?;
    stage.ok_or_else(|| AppError::NotFound(format!("Stage {stage_id} not found")))
}
