use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Closed set of pipeline states. Every value here is reachable through a
/// progression operation; nothing else writes this field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "applicant_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ApplicantStatus {
    Applied,
    Interviewing,
    Rejected,
    Offered,
    OfferAccepted,
    OfferRejected,
}

impl ApplicantStatus {
    /// Terminal states block any further stage scheduling. `Offered` is
    /// terminal for the interview pipeline; the offer workflow takes over.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ApplicantStatus::Rejected
                | ApplicantStatus::Offered
                | ApplicantStatus::OfferAccepted
                | ApplicantStatus::OfferRejected
        )
    }
}

impl std::fmt::Display for ApplicantStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ApplicantStatus::Applied => "applied",
            ApplicantStatus::Interviewing => "interviewing",
            ApplicantStatus::Rejected => "rejected",
            ApplicantStatus::Offered => "offered",
            ApplicantStatus::OfferAccepted => "offer_accepted",
            ApplicantStatus::OfferRejected => "offer_rejected",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "offer_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OfferStatus {
    Pending,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "ai_result", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AiResult {
    Shortlisted,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicantRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Opaque reference to the applicant's resume; upload handling lives
    /// outside this service.
    pub resume_ref: String,
    pub status: ApplicantStatus,
    pub offer_status: OfferStatus,
    pub ai_result: Option<AiResult>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
