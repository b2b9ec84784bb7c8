pub mod decision;
pub mod emotion;
pub mod reaction;
pub mod record;
pub mod session;

pub use decision::{
    DecisionResponse, DecisionTaskResult, ResponseCategory, Scenario, ScenarioOption,
};
pub use emotion::{EmotionLabel, EmotionTaskResult, EmotionTrial};
pub use reaction::{ReactionTaskResult, ReactionTrial};
pub use record::{
    AssessmentRecord, RecordBuilder, SubmissionMeta, SubmissionReceipt, SubmissionRequest,
};
pub use session::SessionContext;
