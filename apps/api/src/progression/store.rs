use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, Postgres, Transaction};
use tracing::info;
use uuid::Uuid;

use crate::models::applicant::{ApplicantRow, ApplicantStatus};
use crate::models::interview::{
    HrScreeningFields, InterviewRow, StageOutcomeRow, StageResult,
};
use crate::models::interviewer::InterviewerRow;
use crate::models::stage::StageDefinitionRow;
use crate::progression::engine::OutcomeView;

/// Folds a uuid into the 64-bit keyspace of Postgres advisory locks.
fn applicant_lock_key(applicant_id: Uuid) -> i64 {
    let bits = applicant_id.as_u128();
    (bits ^ (bits >> 64)) as i64
}

/// Attempts to take the per-applicant transaction lock that serializes
/// state transitions. Returns false when another transition holds it, in
/// which case the caller must surface a conflict instead of proceeding.
pub async fn try_applicant_lock(
    tx: &mut Transaction<'_, Postgres>,
    applicant_id: Uuid,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT pg_try_advisory_xact_lock($1)")
        .bind(applicant_lock_key(applicant_id))
        .fetch_one(&mut **tx)
        .await
}

pub async fn load_catalog(
    executor: impl PgExecutor<'_>,
) -> Result<Vec<StageDefinitionRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM stage_definitions ORDER BY stage_order ASC")
        .fetch_all(executor)
        .await
}

/// The applicant's full outcome history joined with catalog stages, oldest
/// first. Feeds the engine's decision functions.
pub async fn load_history(
    executor: impl PgExecutor<'_>,
    applicant_id: Uuid,
) -> Result<Vec<OutcomeView>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT o.stage_id, s.name AS stage_name, s.stage_order, o.result,
               o.created_at AS recorded_at
        FROM stage_outcomes o
        JOIN interviews i ON i.id = o.interview_id
        JOIN stage_definitions s ON s.id = o.stage_id
        WHERE i.applicant_id = $1
        ORDER BY o.created_at ASC
        "#,
    )
    .bind(applicant_id)
    .fetch_all(executor)
    .await
}

pub async fn find_applicant(
    executor: impl PgExecutor<'_>,
    id: Uuid,
) -> Result<Option<ApplicantRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM applicants WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn find_interviewer(
    executor: impl PgExecutor<'_>,
    id: Uuid,
) -> Result<Option<InterviewerRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM interviewers WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn find_interview(
    executor: impl PgExecutor<'_>,
    id: Uuid,
) -> Result<Option<InterviewRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM interviews WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn find_outcome(
    executor: impl PgExecutor<'_>,
    interview_id: Uuid,
    stage_id: Uuid,
) -> Result<Option<StageOutcomeRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM stage_outcomes WHERE interview_id = $1 AND stage_id = $2")
        .bind(interview_id)
        .bind(stage_id)
        .fetch_optional(executor)
        .await
}

/// Creates the interview and its pending outcome in one transaction so a
/// failure leaves neither behind.
pub async fn create_scheduled_interview(
    tx: &mut Transaction<'_, Postgres>,
    applicant: &ApplicantRow,
    interviewer_id: Uuid,
    stage: &StageDefinitionRow,
    scheduled_at: DateTime<Utc>,
) -> Result<(InterviewRow, StageOutcomeRow), sqlx::Error> {
    let title = format!("{} - {}", stage.name, applicant.name);

    let interview: InterviewRow = sqlx::query_as(
        r#"
        INSERT INTO interviews (applicant_id, interviewer_id, title, scheduled_at, status)
        VALUES ($1, $2, $3, $4, 'scheduled')
        RETURNING *
        "#,
    )
    .bind(applicant.id)
    .bind(interviewer_id)
    .bind(&title)
    .bind(scheduled_at)
    .fetch_one(&mut **tx)
    .await?;

    let outcome: StageOutcomeRow = sqlx::query_as(
        r#"
        INSERT INTO stage_outcomes (interview_id, stage_id, result)
        VALUES ($1, $2, 'pending')
        RETURNING *
        "#,
    )
    .bind(interview.id)
    .bind(stage.id)
    .fetch_one(&mut **tx)
    .await?;

    info!(
        "Scheduled stage '{}' for applicant {} (interview {})",
        stage.name, applicant.id, interview.id
    );

    Ok((interview, outcome))
}

pub async fn set_applicant_status(
    executor: impl PgExecutor<'_>,
    applicant_id: Uuid,
    status: ApplicantStatus,
) -> Result<ApplicantRow, sqlx::Error> {
    sqlx::query_as(
        "UPDATE applicants SET status = $2, updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(applicant_id)
    .bind(status)
    .fetch_one(executor)
    .await
}

/// Records a submitted outcome. `completed_at` is stamped only for terminal
/// results; HR fields are written only when provided.
pub async fn record_outcome(
    tx: &mut Transaction<'_, Postgres>,
    outcome_id: Uuid,
    result: StageResult,
    feedback: Option<&str>,
    notes: Option<&str>,
    hr: Option<&HrScreeningFields>,
) -> Result<StageOutcomeRow, sqlx::Error> {
    let terminal = matches!(result, StageResult::Pass | StageResult::Fail);
    let hr = hr.cloned().unwrap_or_default();

    sqlx::query_as(
        r#"
        UPDATE stage_outcomes SET
            result = $2,
            feedback = COALESCE($3, feedback),
            notes = COALESCE($4, notes),
            completed_at = CASE WHEN $5 THEN now() ELSE completed_at END,
            current_salary = COALESCE($6, current_salary),
            expected_salary = COALESCE($7, expected_salary),
            notice_period_days = COALESCE($8, notice_period_days),
            willing_to_relocate = COALESCE($9, willing_to_relocate),
            willing_to_travel = COALESCE($10, willing_to_travel)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(outcome_id)
    .bind(result)
    .bind(feedback)
    .bind(notes)
    .bind(terminal)
    .bind(hr.current_salary)
    .bind(hr.expected_salary)
    .bind(hr.notice_period_days)
    .bind(hr.willing_to_relocate)
    .bind(hr.willing_to_travel)
    .fetch_one(&mut **tx)
    .await
}
