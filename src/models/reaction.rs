use serde::{Deserialize, Serialize};

/// One reaction-time measurement attempt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReactionTrial {
    pub trial_index: usize,
    pub latency_ms: u64,
    pub premature: bool,
}

impl ReactionTrial {
    pub fn measured(trial_index: usize, latency_ms: u64) -> Self {
        Self {
            trial_index,
            latency_ms,
            premature: false,
        }
    }

    pub fn premature(trial_index: usize) -> Self {
        Self {
            trial_index,
            latency_ms: 0,
            premature: true,
        }
    }
}

/// Valid trials in order, plus every premature attempt that was retried.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReactionTaskResult {
    pub trials: Vec<ReactionTrial>,
    /// Failed attempts, each tagged with the index it retried.
    pub premature: Vec<ReactionTrial>,
}

impl ReactionTaskResult {
    pub fn latencies(&self) -> Vec<u64> {
        self.trials.iter().map(|trial| trial.latency_ms).collect()
    }

    pub fn premature_attempts(&self) -> u32 {
        self.premature.len() as u32
    }

    /// Attempts including the premature ones.
    pub fn total_attempts(&self) -> usize {
        self.trials.len() + self.premature.len()
    }
}
