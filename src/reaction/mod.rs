pub mod delay;
pub mod scheduler;

pub use delay::{DelayRange, DelaySampler, UniformDelay};
pub use scheduler::{ReactionOutcome, ScheduledTarget, TrialPhase, TrialScheduler};
