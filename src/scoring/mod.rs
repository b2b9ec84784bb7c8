pub mod config;
pub mod metrics;

pub use config::ScoringConfig;
pub use metrics::{summarize, AssessmentSummary, EmotionalBias, Level};
