//! The finalized assessment record and the submission envelope around it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    assessment::Stage,
    error::{EngineError, EngineResult},
    scoring::{summarize, AssessmentSummary, ScoringConfig},
};

use super::{DecisionTaskResult, EmotionTaskResult, ReactionTaskResult, SessionContext};

const SUBMISSION_SOURCE: &str = "quiz";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssessmentRecord {
    pub session_id: String,
    pub participant_id: String,
    pub reaction: ReactionTaskResult,
    pub decision: DecisionTaskResult,
    pub emotion: EmotionTaskResult,
    pub summary: AssessmentSummary,
    pub completed_at: DateTime<Utc>,
}

/// Collects each stage's frozen result until all three are present.
#[derive(Debug, Default)]
pub struct RecordBuilder {
    reaction: Option<ReactionTaskResult>,
    decision: Option<DecisionTaskResult>,
    emotion: Option<EmotionTaskResult>,
}

impl RecordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_reaction(&mut self, result: ReactionTaskResult) -> EngineResult<()> {
        store_once(&mut self.reaction, result, Stage::Reaction)
    }

    pub fn set_decision(&mut self, result: DecisionTaskResult) -> EngineResult<()> {
        store_once(&mut self.decision, result, Stage::Decision)
    }

    pub fn set_emotion(&mut self, result: EmotionTaskResult) -> EngineResult<()> {
        store_once(&mut self.emotion, result, Stage::Emotion)
    }

    /// Returns `None` until every task result has been stored.
    pub fn build(
        &self,
        context: &SessionContext,
        scoring: &ScoringConfig,
        completed_at: DateTime<Utc>,
    ) -> Option<AssessmentRecord> {
        let (reaction, decision, emotion) =
            match (&self.reaction, &self.decision, &self.emotion) {
                (Some(reaction), Some(decision), Some(emotion)) => {
                    (reaction.clone(), decision.clone(), emotion.clone())
                }
                _ => return None,
            };

        let summary = summarize(&reaction, &decision, &emotion, scoring);

        Some(AssessmentRecord {
            session_id: context.session_id.clone(),
            participant_id: context.participant_id.clone(),
            reaction,
            decision,
            emotion,
            summary,
            completed_at,
        })
    }
}

fn store_once<T>(slot: &mut Option<T>, value: T, stage: Stage) -> EngineResult<()> {
    if slot.is_some() {
        return Err(EngineError::invalid(stage, "overwrite a frozen task result"));
    }
    *slot = Some(value);
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubmissionMeta {
    pub completed: bool,
    pub consent: bool,
}

/// Body posted to the session-submission endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubmissionRequest {
    pub participant_id: String,
    pub source: String,
    pub raw_data: AssessmentRecord,
    pub meta: SubmissionMeta,
}

impl SubmissionRequest {
    pub fn for_record(record: AssessmentRecord, context: &SessionContext) -> Self {
        Self {
            participant_id: context.participant_id.clone(),
            source: SUBMISSION_SOURCE.to_string(),
            raw_data: record,
            meta: SubmissionMeta {
                completed: true,
                consent: context.consent,
            },
        }
    }

    pub fn session_id(&self) -> &str {
        &self.raw_data.session_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubmissionReceipt {
    pub session_id: String,
    pub status: String,
}
