//! Inputs to the engine, outputs for the presentation layer, and the side
//! effects the async controller carries out on the engine's behalf.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;

use crate::{
    error::EngineResult,
    models::{
        AssessmentRecord, EmotionLabel, ReactionTrial, ResponseCategory, Scenario,
        SubmissionReceipt, SubmissionRequest,
    },
};

use super::state::Stage;

#[derive(Debug)]
pub enum EngineEvent {
    Begin,
    /// User pressed start on the current trial.
    StartTrial,
    /// Inter-trial pause elapsed.
    TrialDue { trial_index: usize },
    /// Randomized wait elapsed for the given attempt.
    TargetDue { attempt: u64 },
    Tap,
    ScenariosLoaded(EngineResult<Vec<Scenario>>),
    Choose(ResponseCategory),
    Guess(EmotionLabel),
    SubmissionFinished(EngineResult<SubmissionReceipt>),
    Abandon,
}

/// Transient, user-facing notices.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Notice {
    TooEarly,
    FallbackScenarios,
    Saved,
    SavedLocally,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PresentationEvent {
    TrialWaiting {
        trial_index: usize,
        trial_count: usize,
    },
    TargetVisible {
        trial_index: usize,
    },
    PrematureInput {
        trial_index: usize,
    },
    TrialRecorded {
        trial: ReactionTrial,
    },
    ScenarioReady {
        index: usize,
        total: usize,
        scenario: Scenario,
    },
    StimulusReady {
        index: usize,
        total: usize,
        label: EmotionLabel,
    },
    StageComplete {
        stage: Stage,
    },
    SessionComplete {
        record: Box<AssessmentRecord>,
    },
    Notice {
        notice: Notice,
    },
}

/// Work the engine asks for but never performs itself.
#[derive(Debug)]
pub enum Effect {
    /// Post `event` back after `after`; replaces any pending timer.
    Schedule { after: Duration, event: EngineEvent },
    CancelTimers,
    FetchScenarios { context: String },
    Submit(Box<SubmissionRequest>),
    SaveLocally(Box<SubmissionRequest>),
    Present(PresentationEvent),
}

/// Receives presentation events; implemented by whatever renders the tasks.
pub trait Presenter: Send + Sync {
    fn present(&self, event: PresentationEvent);
}

impl Presenter for mpsc::UnboundedSender<PresentationEvent> {
    fn present(&self, event: PresentationEvent) {
        let _ = self.send(event);
    }
}
