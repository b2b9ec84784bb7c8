pub mod fallback;
pub mod sequencer;

pub use fallback::fallback_scenarios;
pub use sequencer::{DecisionProgress, LoadOutcome, ScenarioSequencer};
