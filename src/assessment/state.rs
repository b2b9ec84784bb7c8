use serde::{Deserialize, Serialize};

use crate::models::AssessmentRecord;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    #[default]
    Idle,
    Reaction,
    Decision,
    Emotion,
    Finalizing,
    Complete,
    Abandoned,
}

impl Stage {
    /// The only stage reachable by normal progress; `Abandoned` is reached by
    /// cancellation instead.
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Idle => Some(Stage::Reaction),
            Stage::Reaction => Some(Stage::Decision),
            Stage::Decision => Some(Stage::Emotion),
            Stage::Emotion => Some(Stage::Finalizing),
            Stage::Finalizing => Some(Stage::Complete),
            Stage::Complete | Stage::Abandoned => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Complete | Stage::Abandoned)
    }

    /// Stages an abandon request may interrupt.
    pub fn is_abandonable(self) -> bool {
        matches!(
            self,
            Stage::Idle | Stage::Reaction | Stage::Decision | Stage::Emotion
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Idle => "Idle",
            Stage::Reaction => "Reaction",
            Stage::Decision => "Decision",
            Stage::Emotion => "Emotion",
            Stage::Finalizing => "Finalizing",
            Stage::Complete => "Complete",
            Stage::Abandoned => "Abandoned",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub stage: Stage,
    /// Every stage entered so far, starting with `Idle`.
    pub history: Vec<Stage>,
    pub record: Option<AssessmentRecord>,
}
