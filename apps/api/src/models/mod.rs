pub mod applicant;
pub mod interview;
pub mod interviewer;
pub mod stage;
