use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Capability tag carried by every interviewer. A stage may only be
/// conducted by an interviewer whose capability equals the stage's
/// `required_capability`; the check happens at scheduling time and is
/// not stored redundantly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "interviewer_capability", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InterviewerCapability {
    Hr,
    Technical,
    Cultural,
    Final,
}

impl std::fmt::Display for InterviewerCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            InterviewerCapability::Hr => "HR",
            InterviewerCapability::Technical => "Technical",
            InterviewerCapability::Cultural => "Cultural",
            InterviewerCapability::Final => "Final",
        };
        f.write_str(label)
    }
}

/// One row of the stage catalog. `stage_order` is unique and meaningful
/// only in relative comparison; gaps between values are allowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct StageDefinitionRow {
    pub id: Uuid,
    pub name: String,
    pub stage_order: i32,
    pub required_capability: InterviewerCapability,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}
