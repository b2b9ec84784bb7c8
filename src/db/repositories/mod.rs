pub mod app_state;
pub mod pending_submissions;
