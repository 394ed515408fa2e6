use chrono::{DateTime, Utc};
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

use crate::models::applicant::{ApplicantStatus, OfferStatus};
use crate::models::interview::StageResult;
use crate::models::stage::{InterviewerCapability, StageDefinitionRow};

/// A recorded stage outcome projected to what the decision rules need.
/// Built by joining outcomes with their interview and catalog stage.
#[derive(Debug, Clone, FromRow)]
pub struct OutcomeView {
    pub stage_id: Uuid,
    pub stage_name: String,
    pub stage_order: i32,
    pub result: StageResult,
    pub recorded_at: DateTime<Utc>,
}

/// Client-visible reasons a transition is refused. Every variant maps to
/// an unprocessable request, never an internal error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionRefusal {
    #[error("applicant status is '{0}'; no further stages can be scheduled")]
    TerminalStatus(ApplicantStatus),

    #[error("this stage requires a {required} interviewer, but got {offered}")]
    CapabilityMismatch {
        required: InterviewerCapability,
        offered: InterviewerCapability,
    },

    #[error("stage '{0}' was already conducted for this applicant")]
    AlreadyConducted(String),

    #[error("previous stage '{0}' has not been passed")]
    PreviousNotPassed(String),

    #[error("cannot advance: stage '{0}' is still awaiting an outcome")]
    AwaitingOutcome(String),

    #[error("cannot advance: stage '{0}' was failed")]
    StageFailed(String),

    #[error("no interview stages are configured")]
    EmptyCatalog,

    #[error("stage outcome was already completed")]
    OutcomeAlreadyRecorded,

    #[error("offer decision requires status 'offered', but applicant is '{0}'")]
    NotOffered(ApplicantStatus),
}

/// Accept/decline input for the offer workflow. Deliberately narrower than
/// `OfferStatus`: a decision can never be 'pending'.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferDecision {
    Accepted,
    Rejected,
}

/// The applicant's most recent outcome, ordered by recording time with the
/// catalog order as tie-breaker. Insertion order alone is not trusted.
pub fn latest_outcome(history: &[OutcomeView]) -> Option<&OutcomeView> {
    history
        .iter()
        .max_by_key(|o| (o.recorded_at, o.stage_order))
}

/// The entry stage: lowest catalog order.
pub fn entry_stage(catalog: &[StageDefinitionRow]) -> Option<&StageDefinitionRow> {
    catalog.iter().min_by_key(|s| s.stage_order)
}

/// The stage with the smallest order strictly greater than `order`.
pub fn stage_after(catalog: &[StageDefinitionRow], order: i32) -> Option<&StageDefinitionRow> {
    catalog
        .iter()
        .filter(|s| s.stage_order > order)
        .min_by_key(|s| s.stage_order)
}

/// The stage immediately preceding `order`, if any.
pub fn stage_before(catalog: &[StageDefinitionRow], order: i32) -> Option<&StageDefinitionRow> {
    catalog
        .iter()
        .filter(|s| s.stage_order < order)
        .max_by_key(|s| s.stage_order)
}

/// Decides which stage the applicant should enter next.
///
/// - no history: the entry stage
/// - latest outcome passed: the next stage by order, or `Ok(None)` when the
///   pipeline is complete
/// - latest outcome pending or failed: refusal
pub fn propose_next_stage<'a>(
    catalog: &'a [StageDefinitionRow],
    history: &[OutcomeView],
) -> Result<Option<&'a StageDefinitionRow>, TransitionRefusal> {
    if catalog.is_empty() {
        return Err(TransitionRefusal::EmptyCatalog);
    }
    let Some(latest) = latest_outcome(history) else {
        return Ok(entry_stage(catalog));
    };
    match latest.result {
        StageResult::Pending => Err(TransitionRefusal::AwaitingOutcome(latest.stage_name.clone())),
        StageResult::Fail => Err(TransitionRefusal::StageFailed(latest.stage_name.clone())),
        StageResult::Pass => Ok(stage_after(catalog, latest.stage_order)),
    }
}

/// Validates a proposed `(stage, interviewer)` scheduling against the
/// applicant's outcome history. Entity existence is the caller's concern;
/// everything here is a transition rule.
///
/// Check order: terminal status, capability match, duplicate attempt,
/// previous stage passed.
pub fn validate_schedule(
    catalog: &[StageDefinitionRow],
    history: &[OutcomeView],
    applicant_status: ApplicantStatus,
    target: &StageDefinitionRow,
    interviewer_capability: InterviewerCapability,
) -> Result<(), TransitionRefusal> {
    if applicant_status.is_terminal() {
        return Err(TransitionRefusal::TerminalStatus(applicant_status));
    }

    if interviewer_capability != target.required_capability {
        return Err(TransitionRefusal::CapabilityMismatch {
            required: target.required_capability,
            offered: interviewer_capability,
        });
    }

    // A failed attempt may be retried; a pending or passed one may not.
    let already_conducted = history
        .iter()
        .any(|o| o.stage_id == target.id && o.result != StageResult::Fail);
    if already_conducted {
        return Err(TransitionRefusal::AlreadyConducted(target.name.clone()));
    }

    if let Some(previous) = stage_before(catalog, target.stage_order) {
        let previous_passed = history
            .iter()
            .any(|o| o.stage_id == previous.id && o.result == StageResult::Pass);
        if !previous_passed {
            return Err(TransitionRefusal::PreviousNotPassed(previous.name.clone()));
        }
    }

    Ok(())
}

/// A terminal outcome may only be recorded once; `pending` outcomes accept
/// updates (feedback can be attached before the final result).
pub fn validate_outcome_submission(current: StageResult) -> Result<(), TransitionRefusal> {
    match current {
        StageResult::Pending => Ok(()),
        StageResult::Pass | StageResult::Fail => Err(TransitionRefusal::OutcomeAlreadyRecorded),
    }
}

/// The applicant status implied by recording `result` for `stage`.
/// `None` means the status is left untouched.
pub fn status_after_outcome(
    catalog: &[StageDefinitionRow],
    stage: &StageDefinitionRow,
    result: StageResult,
) -> Option<ApplicantStatus> {
    match result {
        StageResult::Pending => None,
        StageResult::Fail => Some(ApplicantStatus::Rejected),
        StageResult::Pass => Some(if stage_after(catalog, stage.stage_order).is_some() {
            ApplicantStatus::Interviewing
        } else {
            ApplicantStatus::Offered
        }),
    }
}

/// Applies an offer decision. Only legal from `Offered`; the result is the
/// terminal `(status, offer_status)` pair.
pub fn offer_transition(
    current: ApplicantStatus,
    decision: OfferDecision,
) -> Result<(ApplicantStatus, OfferStatus), TransitionRefusal> {
    if current != ApplicantStatus::Offered {
        return Err(TransitionRefusal::NotOffered(current));
    }
    Ok(match decision {
        OfferDecision::Accepted => (ApplicantStatus::OfferAccepted, OfferStatus::Accepted),
        OfferDecision::Rejected => (ApplicantStatus::OfferRejected, OfferStatus::Rejected),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn stage(name: &str, order: i32, capability: InterviewerCapability) -> StageDefinitionRow {
        StageDefinitionRow {
            id: Uuid::new_v4(),
            name: name.to_string(),
            stage_order: order,
            required_capability: capability,
            description: None,
            created_at: Utc::now(),
        }
    }

    fn catalog() -> Vec<StageDefinitionRow> {
        vec![
            stage("HR Interview", 1, InterviewerCapability::Hr),
            stage("Technical Round", 2, InterviewerCapability::Technical),
            stage("Final Round", 3, InterviewerCapability::Final),
        ]
    }

    fn outcome(stage: &StageDefinitionRow, result: StageResult, minute: u32) -> OutcomeView {
        OutcomeView {
            stage_id: stage.id,
            stage_name: stage.name.clone(),
            stage_order: stage.stage_order,
            result,
            recorded_at: Utc.with_ymd_and_hms(2025, 6, 1, 9, minute, 0).unwrap(),
        }
    }

    #[test]
    fn test_propose_entry_stage_for_new_applicant() {
        let catalog = catalog();
        let next = propose_next_stage(&catalog, &[]).unwrap().unwrap();
        assert_eq!(next.name, "HR Interview");
    }

    #[test]
    fn test_propose_respects_order_gaps() {
        let catalog = vec![
            stage("HR Interview", 10, InterviewerCapability::Hr),
            stage("Final Round", 40, InterviewerCapability::Final),
        ];
        let history = vec![outcome(&catalog[0], StageResult::Pass, 0)];
        let next = propose_next_stage(&catalog, &history).unwrap().unwrap();
        assert_eq!(next.name, "Final Round");
    }

    #[test]
    fn test_propose_after_pass_returns_next_stage() {
        let catalog = catalog();
        let history = vec![outcome(&catalog[0], StageResult::Pass, 0)];
        let next = propose_next_stage(&catalog, &history).unwrap().unwrap();
        assert_eq!(next.name, "Technical Round");
    }

    #[test]
    fn test_propose_after_final_pass_signals_completion() {
        let catalog = catalog();
        let history = vec![
            outcome(&catalog[0], StageResult::Pass, 0),
            outcome(&catalog[1], StageResult::Pass, 1),
            outcome(&catalog[2], StageResult::Pass, 2),
        ];
        assert!(propose_next_stage(&catalog, &history).unwrap().is_none());
    }

    #[test]
    fn test_propose_refuses_while_pending() {
        let catalog = catalog();
        let history = vec![outcome(&catalog[0], StageResult::Pending, 0)];
        assert_eq!(
            propose_next_stage(&catalog, &history),
            Err(TransitionRefusal::AwaitingOutcome("HR Interview".into()))
        );
    }

    #[test]
    fn test_propose_refuses_after_fail() {
        let catalog = catalog();
        let history = vec![
            outcome(&catalog[0], StageResult::Pass, 0),
            outcome(&catalog[1], StageResult::Fail, 1),
        ];
        assert_eq!(
            propose_next_stage(&catalog, &history),
            Err(TransitionRefusal::StageFailed("Technical Round".into()))
        );
    }

    #[test]
    fn test_propose_empty_catalog_refused() {
        assert_eq!(
            propose_next_stage(&[], &[]),
            Err(TransitionRefusal::EmptyCatalog)
        );
    }

    #[test]
    fn test_latest_outcome_breaks_timestamp_ties_by_order() {
        let catalog = catalog();
        // Identical timestamps: the catalog order decides.
        let a = outcome(&catalog[0], StageResult::Pass, 5);
        let b = outcome(&catalog[1], StageResult::Pending, 5);
        let history = [a, b];
        let latest = latest_outcome(&history).unwrap();
        assert_eq!(latest.stage_order, 2);
    }

    #[test]
    fn test_schedule_out_of_order_rejected() {
        let catalog = catalog();
        // No HR pass yet; Technical must be refused.
        let err = validate_schedule(
            &catalog,
            &[],
            ApplicantStatus::Applied,
            &catalog[1],
            InterviewerCapability::Technical,
        )
        .unwrap_err();
        assert_eq!(
            err,
            TransitionRefusal::PreviousNotPassed("HR Interview".into())
        );
    }

    #[test]
    fn test_schedule_capability_mismatch_rejected_even_in_order() {
        let catalog = catalog();
        let history = vec![outcome(&catalog[0], StageResult::Pass, 0)];
        let err = validate_schedule(
            &catalog,
            &history,
            ApplicantStatus::Interviewing,
            &catalog[1],
            InterviewerCapability::Hr,
        )
        .unwrap_err();
        assert!(matches!(err, TransitionRefusal::CapabilityMismatch { .. }));
    }

    #[test]
    fn test_schedule_duplicate_stage_rejected() {
        let catalog = catalog();
        let history = vec![outcome(&catalog[0], StageResult::Pass, 0)];
        let err = validate_schedule(
            &catalog,
            &history,
            ApplicantStatus::Interviewing,
            &catalog[0],
            InterviewerCapability::Hr,
        )
        .unwrap_err();
        assert_eq!(
            err,
            TransitionRefusal::AlreadyConducted("HR Interview".into())
        );
    }

    #[test]
    fn test_schedule_pending_stage_counts_as_conducted() {
        let catalog = catalog();
        let history = vec![outcome(&catalog[0], StageResult::Pending, 0)];
        let err = validate_schedule(
            &catalog,
            &history,
            ApplicantStatus::Interviewing,
            &catalog[0],
            InterviewerCapability::Hr,
        )
        .unwrap_err();
        assert_eq!(
            err,
            TransitionRefusal::AlreadyConducted("HR Interview".into())
        );
    }

    #[test]
    fn test_schedule_while_previous_pending_rejected() {
        let catalog = catalog();
        let history = vec![outcome(&catalog[0], StageResult::Pending, 0)];
        let err = validate_schedule(
            &catalog,
            &history,
            ApplicantStatus::Interviewing,
            &catalog[1],
            InterviewerCapability::Technical,
        )
        .unwrap_err();
        assert_eq!(
            err,
            TransitionRefusal::PreviousNotPassed("HR Interview".into())
        );
    }

    #[test]
    fn test_schedule_entry_stage_succeeds() {
        let catalog = catalog();
        assert!(validate_schedule(
            &catalog,
            &[],
            ApplicantStatus::Applied,
            &catalog[0],
            InterviewerCapability::Hr,
        )
        .is_ok());
    }

    #[test]
    fn test_schedule_after_rejection_refused() {
        let catalog = catalog();
        let history = vec![
            outcome(&catalog[0], StageResult::Pass, 0),
            outcome(&catalog[1], StageResult::Fail, 1),
        ];
        // Even the next in-order stage is blocked once the applicant is rejected.
        let err = validate_schedule(
            &catalog,
            &history,
            ApplicantStatus::Rejected,
            &catalog[2],
            InterviewerCapability::Final,
        )
        .unwrap_err();
        assert_eq!(
            err,
            TransitionRefusal::TerminalStatus(ApplicantStatus::Rejected)
        );
    }

    #[test]
    fn test_schedule_after_offer_refused() {
        let catalog = catalog();
        let err = validate_schedule(
            &catalog,
            &[],
            ApplicantStatus::Offered,
            &catalog[0],
            InterviewerCapability::Hr,
        )
        .unwrap_err();
        assert_eq!(
            err,
            TransitionRefusal::TerminalStatus(ApplicantStatus::Offered)
        );
    }

    #[test]
    fn test_fail_sets_rejected() {
        let catalog = catalog();
        assert_eq!(
            status_after_outcome(&catalog, &catalog[1], StageResult::Fail),
            Some(ApplicantStatus::Rejected)
        );
    }

    #[test]
    fn test_pass_on_final_stage_sets_offered() {
        let catalog = catalog();
        assert_eq!(
            status_after_outcome(&catalog, &catalog[2], StageResult::Pass),
            Some(ApplicantStatus::Offered)
        );
    }

    #[test]
    fn test_pass_on_mid_stage_keeps_interviewing() {
        let catalog = catalog();
        assert_eq!(
            status_after_outcome(&catalog, &catalog[0], StageResult::Pass),
            Some(ApplicantStatus::Interviewing)
        );
    }

    #[test]
    fn test_pending_result_leaves_status_untouched() {
        let catalog = catalog();
        assert_eq!(
            status_after_outcome(&catalog, &catalog[0], StageResult::Pending),
            None
        );
    }

    #[test]
    fn test_outcome_submission_idempotence() {
        assert!(validate_outcome_submission(StageResult::Pending).is_ok());
        assert_eq!(
            validate_outcome_submission(StageResult::Pass),
            Err(TransitionRefusal::OutcomeAlreadyRecorded)
        );
        assert_eq!(
            validate_outcome_submission(StageResult::Fail),
            Err(TransitionRefusal::OutcomeAlreadyRecorded)
        );
    }

    #[test]
    fn test_offer_decision_requires_offered() {
        let err = offer_transition(ApplicantStatus::Interviewing, OfferDecision::Accepted)
            .unwrap_err();
        assert_eq!(
            err,
            TransitionRefusal::NotOffered(ApplicantStatus::Interviewing)
        );
    }

    #[test]
    fn test_offer_accept_and_reject_are_terminal() {
        assert_eq!(
            offer_transition(ApplicantStatus::Offered, OfferDecision::Accepted).unwrap(),
            (ApplicantStatus::OfferAccepted, OfferStatus::Accepted)
        );
        assert_eq!(
            offer_transition(ApplicantStatus::Offered, OfferDecision::Rejected).unwrap(),
            (ApplicantStatus::OfferRejected, OfferStatus::Rejected)
        );
        assert!(offer_transition(ApplicantStatus::OfferAccepted, OfferDecision::Rejected).is_err());
    }

    // Full walkthrough of the three-stage pipeline: HR pass, wrong-capability
    // refusal on Technical, Technical fail, then everything blocked.
    #[test]
    fn test_pipeline_walkthrough() {
        let catalog = catalog();
        let mut history: Vec<OutcomeView> = Vec::new();
        let mut status = ApplicantStatus::Applied;

        // New applicant is proposed the HR stage.
        let next = propose_next_stage(&catalog, &history).unwrap().unwrap();
        assert_eq!(next.stage_order, 1);

        // HR scheduling succeeds and the outcome comes back as a pass.
        validate_schedule(&catalog, &history, status, &catalog[0], InterviewerCapability::Hr)
            .unwrap();
        history.push(outcome(&catalog[0], StageResult::Pass, 0));
        status = status_after_outcome(&catalog, &catalog[0], StageResult::Pass).unwrap();
        assert_eq!(status, ApplicantStatus::Interviewing);

        // Technical is next, but an HR interviewer is refused.
        let next = propose_next_stage(&catalog, &history).unwrap().unwrap();
        assert_eq!(next.name, "Technical Round");
        assert!(matches!(
            validate_schedule(&catalog, &history, status, &catalog[1], InterviewerCapability::Hr),
            Err(TransitionRefusal::CapabilityMismatch { .. })
        ));

        // Properly staffed, Technical is conducted and failed.
        validate_schedule(
            &catalog,
            &history,
            status,
            &catalog[1],
            InterviewerCapability::Technical,
        )
        .unwrap();
        history.push(outcome(&catalog[1], StageResult::Fail, 1));
        status = status_after_outcome(&catalog, &catalog[1], StageResult::Fail).unwrap();
        assert_eq!(status, ApplicantStatus::Rejected);

        // Nothing can be scheduled for a rejected applicant.
        assert!(validate_schedule(
            &catalog,
            &history,
            status,
            &catalog[2],
            InterviewerCapability::Final,
        )
        .is_err());
        assert!(propose_next_stage(&catalog, &history).is_err());
    }
}
