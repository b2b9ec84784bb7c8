use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::SubmissionRequest;

/// A submission kept locally after the endpoint rejected or missed it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingSubmission {
    pub session_id: String,
    pub participant_id: String,
    pub request: SubmissionRequest,
    pub saved_at: DateTime<Utc>,
}
