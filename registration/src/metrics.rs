//! Business metrics.

use metrics::{counter, describe_counter};

/// Submissions by outcome (`completed`, `invalid`, `duplicate`, ...)
pub const SUBMISSIONS_TOTAL: &str = "inscriptions_submissions_total";

/// Outcome label for a fully processed submission
pub const OUTCOME_COMPLETED: &str = "completed";
/// Outcome label for an unreadable body
pub const OUTCOME_MALFORMED: &str = "malformed";
/// Outcome label for a workflow that missed its deadline
pub const OUTCOME_DEADLINE: &str = "deadline_exceeded";
/// Outcome label for a workflow that ended without a usable terminal action
pub const OUTCOME_INTERNAL: &str = "internal_error";

/// Register metric descriptions with the installed recorder.
pub fn register_business_metrics() {
    describe_counter!(SUBMISSIONS_TOTAL, "Registration submissions by outcome");
}

/// Count one submission.
pub fn record_submission(outcome: &'static str) {
    counter!(SUBMISSIONS_TOTAL, "outcome" => outcome).increment(1);
}
