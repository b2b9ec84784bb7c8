pub mod pending_submission;

pub use pending_submission::PendingSubmission;
