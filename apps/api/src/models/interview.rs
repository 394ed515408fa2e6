use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Lifecycle of the meeting itself, independent of the stage outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "interview_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InterviewStatus {
    Pending,
    Scheduled,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "stage_result", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum StageResult {
    Pending,
    Pass,
    Fail,
}

/// One scheduled meeting for exactly one stage attempt.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InterviewRow {
    pub id: Uuid,
    pub applicant_id: Uuid,
    pub interviewer_id: Uuid,
    pub title: String,
    pub scheduled_at: DateTime<Utc>,
    pub status: InterviewStatus,
    pub created_at: DateTime<Utc>,
}

/// Screening details collected during the HR round. Only accepted for
/// stages that require the HR capability.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HrScreeningFields {
    pub current_salary: Option<f64>,
    pub expected_salary: Option<f64>,
    pub notice_period_days: Option<i32>,
    pub willing_to_relocate: Option<bool>,
    pub willing_to_travel: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StageOutcomeRow {
    pub id: Uuid,
    pub interview_id: Uuid,
    pub stage_id: Uuid,
    pub result: StageResult,
    pub feedback: Option<String>,
    pub notes: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub current_salary: Option<f64>,
    pub expected_salary: Option<f64>,
    pub notice_period_days: Option<i32>,
    pub willing_to_relocate: bool,
    pub willing_to_travel: bool,
    pub created_at: DateTime<Utc>,
}
