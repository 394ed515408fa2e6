use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::stage::InterviewerCapability;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "function_area", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FunctionArea {
    DataTransformation,
    AnalyticsAi,
    LowCode,
    DigitalEnablement,
    EmergingTech,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InterviewerRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub capability: InterviewerCapability,
    pub function_area: FunctionArea,
    pub position: String,
    pub created_at: DateTime<Utc>,
}
