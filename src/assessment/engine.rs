//! The assessment state machine.
//!
//! `AssessmentEngine` owns every sub-component and the record builder for one
//! session. It never sleeps, spawns or performs I/O: each call to
//! [`AssessmentEngine::handle`] applies one event and returns the [`Effect`]s
//! the caller must carry out. Stages only move forward:
//! `Idle → Reaction → Decision → Emotion → Finalizing → Complete`, with
//! `Abandoned` reachable from any stage before `Finalizing`.

use std::time::Instant;

use chrono::Utc;

use crate::{
    decision::{DecisionProgress, ScenarioSequencer},
    emotion::{EmotionProgress, EmotionTrialRunner},
    error::{EngineError, EngineResult},
    models::{
        AssessmentRecord, EmotionLabel, RecordBuilder, ResponseCategory, Scenario,
        SessionContext, SubmissionReceipt, SubmissionRequest,
    },
    reaction::{DelaySampler, ReactionOutcome, ScheduledTarget, TrialPhase, TrialScheduler},
    settings::AssessmentSettings,
};

use super::{
    events::{Effect, EngineEvent, Notice, PresentationEvent},
    state::{SessionSnapshot, Stage},
};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

pub struct AssessmentEngine {
    context: SessionContext,
    settings: AssessmentSettings,
    sampler: Box<dyn DelaySampler>,
    stage: Stage,
    history: Vec<Stage>,
    reaction: Option<TrialScheduler>,
    decision: Option<ScenarioSequencer>,
    emotion: Option<EmotionTrialRunner>,
    builder: RecordBuilder,
    record: Option<AssessmentRecord>,
    submission: Option<SubmissionRequest>,
    completion_emitted: bool,
}

impl AssessmentEngine {
    pub fn new(
        context: SessionContext,
        settings: AssessmentSettings,
        sampler: Box<dyn DelaySampler>,
    ) -> Self {
        Self {
            context,
            settings,
            sampler,
            stage: Stage::Idle,
            history: vec![Stage::Idle],
            reaction: None,
            decision: None,
            emotion: None,
            builder: RecordBuilder::new(),
            record: None,
            submission: None,
            completion_emitted: false,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn history(&self) -> &[Stage] {
        &self.history
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn settings(&self) -> &AssessmentSettings {
        &self.settings
    }

    pub fn record(&self) -> Option<&AssessmentRecord> {
        self.record.as_ref()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.context.session_id.clone(),
            stage: self.stage,
            history: self.history.clone(),
            record: self.record.clone(),
        }
    }

    pub fn handle(&mut self, event: EngineEvent, now: Instant) -> EngineResult<Vec<Effect>> {
        match event {
            EngineEvent::Begin => self.begin(),
            EngineEvent::StartTrial => self.start_trial(),
            EngineEvent::TrialDue { trial_index } => self.trial_due(trial_index),
            EngineEvent::TargetDue { attempt } => Ok(self.target_due(attempt, now)),
            EngineEvent::Tap => self.tap(now),
            EngineEvent::ScenariosLoaded(fetched) => self.scenarios_loaded(fetched),
            EngineEvent::Choose(category) => self.choose(category),
            EngineEvent::Guess(label) => self.guess(label),
            EngineEvent::SubmissionFinished(result) => self.submission_finished(result),
            EngineEvent::Abandon => self.abandon(),
        }
    }

    /// Builds the immutable record and asks for it to be submitted. Valid
    /// once, in `Finalizing`; a second call is a contract violation.
    pub fn finalize(&mut self) -> EngineResult<Vec<Effect>> {
        if self.record.is_some() {
            let err = EngineError::AlreadyFinalized {
                session_id: self.context.session_id.clone(),
            };
            log_error!("{err}");
            return Err(err);
        }
        self.expect_stage(Stage::Finalizing, "finalize")?;

        let record = self
            .builder
            .build(&self.context, &self.settings.scoring, Utc::now())
            .ok_or_else(|| EngineError::invalid(self.stage, "finalize with missing task results"))?;
        let request = SubmissionRequest::for_record(record.clone(), &self.context);

        log_info!(
            "Session {} finalized: stress {:.2}, attention {:.1}",
            self.context.session_id,
            record.summary.stress_score,
            record.summary.attention_score
        );

        self.record = Some(record);
        self.submission = Some(request.clone());
        Ok(vec![Effect::Submit(Box::new(request))])
    }

    fn begin(&mut self) -> EngineResult<Vec<Effect>> {
        self.expect_stage(Stage::Idle, "begin")?;
        self.reaction = Some(TrialScheduler::new(&self.settings.reaction));
        self.transition(Stage::Reaction)?;
        Ok(Vec::new())
    }

    fn start_trial(&mut self) -> EngineResult<Vec<Effect>> {
        self.expect_stage(Stage::Reaction, "start a trial")?;
        let scheduler = self
            .reaction
            .as_mut()
            .ok_or_else(|| EngineError::invalid(Stage::Reaction, "start a trial"))?;
        let target = scheduler.start_trial(self.sampler.as_mut())?;
        let trial_count = scheduler.trial_count();
        Ok(schedule_target(target, trial_count))
    }

    fn trial_due(&mut self, trial_index: usize) -> EngineResult<Vec<Effect>> {
        let ready = self.stage == Stage::Reaction
            && self.reaction.as_ref().is_some_and(|scheduler| {
                scheduler.phase() == TrialPhase::Ready && scheduler.trial_index() == trial_index
            });
        if !ready {
            log_debug!("Ignoring stale trial timer for trial {trial_index}");
            return Ok(Vec::new());
        }
        self.start_trial()
    }

    fn target_due(&mut self, attempt: u64, now: Instant) -> Vec<Effect> {
        if self.stage != Stage::Reaction {
            return Vec::new();
        }
        let Some(scheduler) = self.reaction.as_mut() else {
            return Vec::new();
        };
        if !scheduler.show_target(attempt, now) {
            log_debug!("Ignoring stale target for attempt {attempt}");
            return Vec::new();
        }
        vec![Effect::Present(PresentationEvent::TargetVisible {
            trial_index: scheduler.trial_index(),
        })]
    }

    fn tap(&mut self, now: Instant) -> EngineResult<Vec<Effect>> {
        self.expect_stage(Stage::Reaction, "tap")?;
        let pause = self.settings.reaction.inter_trial_pause();
        let scheduler = self
            .reaction
            .as_mut()
            .ok_or_else(|| EngineError::invalid(Stage::Reaction, "tap"))?;

        match scheduler.respond(now, self.sampler.as_mut()) {
            Ok(ReactionOutcome::Ignored) => Ok(Vec::new()),
            Ok(ReactionOutcome::Recorded(trial)) => Ok(vec![
                Effect::Present(PresentationEvent::TrialRecorded { trial }),
                Effect::Schedule {
                    after: pause,
                    event: EngineEvent::TrialDue {
                        trial_index: trial.trial_index + 1,
                    },
                },
            ]),
            Ok(ReactionOutcome::Completed(result)) => {
                let last = result.trials.last().copied();
                log_info!(
                    "Reaction task complete: {} trials, {} premature",
                    result.trials.len(),
                    result.premature_attempts()
                );
                self.builder.set_reaction(result)?;

                let mut effects = Vec::new();
                if let Some(trial) = last {
                    effects.push(Effect::Present(PresentationEvent::TrialRecorded { trial }));
                }
                effects.push(Effect::CancelTimers);
                effects.push(Effect::Present(PresentationEvent::StageComplete {
                    stage: Stage::Reaction,
                }));
                effects.extend(self.enter_decision()?);
                Ok(effects)
            }
            Err(EngineError::PrematureInput { trial_index }) => {
                log_warn!("Premature tap on trial {trial_index}; rescheduling");
                let mut effects = vec![
                    Effect::Present(PresentationEvent::PrematureInput { trial_index }),
                    Effect::Present(PresentationEvent::Notice {
                        notice: Notice::TooEarly,
                    }),
                ];
                if let Some(target) = scheduler.pending() {
                    effects.extend(schedule_target(target, scheduler.trial_count()));
                }
                Ok(effects)
            }
            Err(err) => Err(err),
        }
    }

    fn enter_decision(&mut self) -> EngineResult<Vec<Effect>> {
        self.decision = Some(ScenarioSequencer::new(self.settings.decision.min_scenarios));
        self.transition(Stage::Decision)?;
        Ok(vec![Effect::FetchScenarios {
            context: self.settings.decision.content_context.clone(),
        }])
    }

    fn scenarios_loaded(
        &mut self,
        fetched: EngineResult<Vec<Scenario>>,
    ) -> EngineResult<Vec<Effect>> {
        self.expect_stage(Stage::Decision, "load scenarios")?;
        let sequencer = self
            .decision
            .as_mut()
            .ok_or_else(|| EngineError::invalid(Stage::Decision, "load scenarios"))?;

        let outcome = sequencer.load(fetched)?;
        let mut effects = Vec::new();
        if let Some(reason) = &outcome.reason {
            log_warn!("Using built-in scenarios: {reason}");
            effects.push(Effect::Present(PresentationEvent::Notice {
                notice: Notice::FallbackScenarios,
            }));
        }
        if let Some(first) = sequencer.current() {
            effects.push(Effect::Present(PresentationEvent::ScenarioReady {
                index: 0,
                total: outcome.scenario_count,
                scenario: first.clone(),
            }));
        }
        Ok(effects)
    }

    fn choose(&mut self, category: ResponseCategory) -> EngineResult<Vec<Effect>> {
        self.expect_stage(Stage::Decision, "choose")?;
        let sequencer = self
            .decision
            .as_mut()
            .ok_or_else(|| EngineError::invalid(Stage::Decision, "choose"))?;
        let total = sequencer.scenarios().len();

        match sequencer.submit_choice(category)? {
            DecisionProgress::Next { index, scenario } => {
                Ok(vec![Effect::Present(PresentationEvent::ScenarioReady {
                    index,
                    total,
                    scenario,
                })])
            }
            DecisionProgress::Completed(result) => {
                log_info!(
                    "Decision task complete: {} responses{}",
                    result.responses.len(),
                    if result.used_fallback { " (built-in scenarios)" } else { "" }
                );
                self.builder.set_decision(result)?;
                let mut effects = vec![Effect::Present(PresentationEvent::StageComplete {
                    stage: Stage::Decision,
                })];
                effects.extend(self.enter_emotion()?);
                Ok(effects)
            }
        }
    }

    fn enter_emotion(&mut self) -> EngineResult<Vec<Effect>> {
        let runner = EmotionTrialRunner::new(self.settings.emotion.stimuli.clone());
        let first = runner.current();
        let total = self.settings.emotion.stimuli.len();
        self.emotion = Some(runner);
        self.transition(Stage::Emotion)?;

        Ok(first
            .map(|label| {
                Effect::Present(PresentationEvent::StimulusReady {
                    index: 0,
                    total,
                    label,
                })
            })
            .into_iter()
            .collect())
    }

    fn guess(&mut self, label: EmotionLabel) -> EngineResult<Vec<Effect>> {
        self.expect_stage(Stage::Emotion, "guess")?;
        let total = self.settings.emotion.stimuli.len();
        let runner = self
            .emotion
            .as_mut()
            .ok_or_else(|| EngineError::invalid(Stage::Emotion, "guess"))?;

        match runner.submit_guess(label)? {
            EmotionProgress::Next(next) => {
                let index = runner.answered();
                Ok(vec![Effect::Present(PresentationEvent::StimulusReady {
                    index,
                    total,
                    label: next,
                })])
            }
            EmotionProgress::Completed(result) => {
                log_info!(
                    "Emotion task complete: {}% accuracy",
                    result.accuracy_percent
                );
                self.builder.set_emotion(result)?;
                self.transition(Stage::Finalizing)?;

                let mut effects = vec![Effect::Present(PresentationEvent::StageComplete {
                    stage: Stage::Emotion,
                })];
                effects.extend(self.finalize()?);
                Ok(effects)
            }
        }
    }

    fn submission_finished(
        &mut self,
        result: EngineResult<SubmissionReceipt>,
    ) -> EngineResult<Vec<Effect>> {
        if self.completion_emitted {
            log_error!("Session {} already reported completion", self.context.session_id);
            return Err(EngineError::invalid(self.stage, "complete twice"));
        }
        self.expect_stage(Stage::Finalizing, "finish submission")?;

        let mut effects = Vec::new();
        match result {
            Ok(receipt) => {
                log_info!(
                    "Session {} submitted (server id {}, {})",
                    self.context.session_id,
                    receipt.session_id,
                    receipt.status
                );
                effects.push(Effect::Present(PresentationEvent::Notice {
                    notice: Notice::Saved,
                }));
            }
            Err(err) => {
                log_warn!("Session {} not submitted: {err}", self.context.session_id);
                if let Some(request) = self.submission.clone() {
                    effects.push(Effect::SaveLocally(Box::new(request)));
                }
                effects.push(Effect::Present(PresentationEvent::Notice {
                    notice: Notice::SavedLocally,
                }));
            }
        }

        let record = self
            .record
            .clone()
            .ok_or_else(|| EngineError::invalid(self.stage, "complete without a record"))?;
        self.transition(Stage::Complete)?;
        self.completion_emitted = true;
        effects.push(Effect::Present(PresentationEvent::SessionComplete {
            record: Box::new(record),
        }));
        Ok(effects)
    }

    fn abandon(&mut self) -> EngineResult<Vec<Effect>> {
        if !self.stage.is_abandonable() {
            return Err(EngineError::invalid(self.stage, "abandon"));
        }
        if let Some(scheduler) = self.reaction.as_mut() {
            scheduler.cancel();
        }
        log_info!(
            "Session {} abandoned during {}",
            self.context.session_id,
            self.stage.as_str()
        );
        self.transition(Stage::Abandoned)?;
        Ok(vec![Effect::CancelTimers])
    }

    fn transition(&mut self, to: Stage) -> EngineResult<()> {
        let allowed = self.stage.next() == Some(to)
            || (to == Stage::Abandoned && self.stage.is_abandonable());
        if !allowed {
            log_error!(
                "Refusing transition {} -> {}",
                self.stage.as_str(),
                to.as_str()
            );
            return Err(EngineError::invalid(self.stage, "transition backwards or skip a stage"));
        }
        log_debug!("Stage {} -> {}", self.stage.as_str(), to.as_str());
        self.stage = to;
        self.history.push(to);
        Ok(())
    }

    fn expect_stage(&self, expected: Stage, action: &'static str) -> EngineResult<()> {
        if self.stage != expected {
            log_debug!("Rejected {action} during {}", self.stage.as_str());
            return Err(EngineError::invalid(self.stage, action));
        }
        Ok(())
    }
}

fn schedule_target(target: ScheduledTarget, trial_count: usize) -> Vec<Effect> {
    vec![
        Effect::Present(PresentationEvent::TrialWaiting {
            trial_index: target.trial_index,
            trial_count,
        }),
        Effect::Schedule {
            after: target.delay,
            event: EngineEvent::TargetDue {
                attempt: target.attempt,
            },
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::EmotionLabel::*,
        reaction::delay::ScriptedDelays,
    };
    use std::time::Duration;

    fn engine() -> AssessmentEngine {
        AssessmentEngine::new(
            SessionContext::new("anon_test12345", true),
            AssessmentSettings::default(),
            Box::new(ScriptedDelays::new(&[900, 1100, 1500, 1000, 1300])),
        )
    }

    fn scheduled_target(effects: &[Effect]) -> (Duration, u64) {
        effects
            .iter()
            .find_map(|effect| match effect {
                Effect::Schedule {
                    after,
                    event: EngineEvent::TargetDue { attempt },
                } => Some((*after, *attempt)),
                _ => None,
            })
            .expect("a target timer is scheduled")
    }

    fn presented(effects: &[Effect]) -> Vec<&PresentationEvent> {
        effects
            .iter()
            .filter_map(|effect| match effect {
                Effect::Present(event) => Some(event),
                _ => None,
            })
            .collect()
    }

    /// Drives the reaction task with the given latencies; returns the effects
    /// of the final tap.
    fn run_reaction(
        engine: &mut AssessmentEngine,
        clock: &mut Instant,
        latencies: &[u64],
    ) -> Vec<Effect> {
        let mut effects = engine.handle(EngineEvent::StartTrial, *clock).unwrap();
        let mut last = Vec::new();
        for (index, latency) in latencies.iter().enumerate() {
            if index > 0 {
                *clock += Duration::from_millis(1000);
                effects = engine
                    .handle(EngineEvent::TrialDue { trial_index: index }, *clock)
                    .unwrap();
            }
            let (delay, attempt) = scheduled_target(&effects);
            *clock += delay;
            let shown = engine.handle(EngineEvent::TargetDue { attempt }, *clock).unwrap();
            assert_eq!(shown.len(), 1);
            *clock += Duration::from_millis(*latency);
            last = engine.handle(EngineEvent::Tap, *clock).unwrap();
        }
        last
    }

    fn run_to_finalizing(engine: &mut AssessmentEngine) -> Vec<Effect> {
        let mut clock = Instant::now();
        engine.handle(EngineEvent::Begin, clock).unwrap();
        run_reaction(engine, &mut clock, &[210, 180, 260, 190, 220]);
        engine
            .handle(EngineEvent::ScenariosLoaded(Ok(Vec::new())), clock)
            .unwrap();
        engine
            .handle(EngineEvent::Choose(ResponseCategory::Calm), clock)
            .unwrap();
        engine
            .handle(EngineEvent::Choose(ResponseCategory::Impulsive), clock)
            .unwrap();
        for label in [Happy, Angry, Angry] {
            engine.handle(EngineEvent::Guess(label), clock).unwrap();
        }
        engine.handle(EngineEvent::Guess(Neutral), clock).unwrap()
    }

    #[test]
    fn full_session_walks_every_stage_once() {
        let mut engine = engine();
        let effects = run_to_finalizing(&mut engine);
        assert_eq!(engine.stage(), Stage::Finalizing);
        assert!(effects
            .iter()
            .any(|effect| matches!(effect, Effect::Submit(_))));

        let effects = engine
            .handle(
                EngineEvent::SubmissionFinished(Ok(SubmissionReceipt {
                    session_id: "42".into(),
                    status: "created".into(),
                })),
                Instant::now(),
            )
            .unwrap();

        assert_eq!(
            engine.history(),
            &[
                Stage::Idle,
                Stage::Reaction,
                Stage::Decision,
                Stage::Emotion,
                Stage::Finalizing,
                Stage::Complete,
            ]
        );
        let events = presented(&effects);
        assert!(events.contains(&&PresentationEvent::Notice {
            notice: Notice::Saved
        }));

        let record = engine.record().expect("record built");
        assert_eq!(record.reaction.latencies(), vec![210, 180, 260, 190, 220]);
        assert_eq!(record.decision.responses.len(), 2);
        assert!(record.decision.used_fallback);
        assert_eq!(record.emotion.accuracy_percent, 75.0);
        assert_eq!(record.participant_id, "anon_test12345");
    }

    #[test]
    fn failed_submission_still_completes_exactly_once() {
        let mut engine = engine();
        run_to_finalizing(&mut engine);

        let effects = engine
            .handle(
                EngineEvent::SubmissionFinished(Err(EngineError::SubmissionFailure(
                    "503".into(),
                ))),
                Instant::now(),
            )
            .unwrap();

        assert_eq!(engine.stage(), Stage::Complete);
        assert!(effects
            .iter()
            .any(|effect| matches!(effect, Effect::SaveLocally(_))));
        let completions = presented(&effects)
            .into_iter()
            .filter(|event| matches!(event, PresentationEvent::SessionComplete { .. }))
            .count();
        assert_eq!(completions, 1);
        assert!(presented(&effects).contains(&&PresentationEvent::Notice {
            notice: Notice::SavedLocally
        }));

        let again = engine.handle(
            EngineEvent::SubmissionFinished(Ok(SubmissionReceipt {
                session_id: "x".into(),
                status: "created".into(),
            })),
            Instant::now(),
        );
        assert!(matches!(
            again,
            Err(EngineError::InvalidState {
                stage: Stage::Complete,
                action: "complete twice",
            })
        ));
        assert_eq!(engine.history().last(), Some(&Stage::Complete));
    }

    #[test]
    fn finalize_twice_is_a_contract_violation() {
        let mut engine = engine();
        run_to_finalizing(&mut engine);

        let err = engine.finalize().unwrap_err();
        assert!(matches!(err, EngineError::AlreadyFinalized { .. }));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn premature_taps_do_not_consume_trials() {
        let mut engine = engine();
        let mut clock = Instant::now();
        engine.handle(EngineEvent::Begin, clock).unwrap();
        let effects = engine.handle(EngineEvent::StartTrial, clock).unwrap();
        let (_, first_attempt) = scheduled_target(&effects);

        let mut retry = Vec::new();
        for _ in 0..3 {
            clock += Duration::from_millis(100);
            retry = engine.handle(EngineEvent::Tap, clock).unwrap();
            assert!(presented(&retry).contains(&&PresentationEvent::PrematureInput {
                trial_index: 0
            }));
        }

        // The superseded timer no longer shows a target.
        assert!(engine
            .handle(EngineEvent::TargetDue { attempt: first_attempt }, clock)
            .unwrap()
            .is_empty());

        let (delay, attempt) = scheduled_target(&retry);
        clock += delay;
        engine.handle(EngineEvent::TargetDue { attempt }, clock).unwrap();
        clock += Duration::from_millis(200);
        engine.handle(EngineEvent::Tap, clock).unwrap();

        run_reaction_rest(&mut engine, &mut clock, 4);
        engine
            .handle(EngineEvent::ScenariosLoaded(Ok(Vec::new())), clock)
            .unwrap();
        assert_eq!(engine.stage(), Stage::Decision);
    }

    fn run_reaction_rest(engine: &mut AssessmentEngine, clock: &mut Instant, remaining: usize) {
        for offset in 0..remaining {
            let trial_index = 5 - remaining + offset;
            *clock += Duration::from_millis(1000);
            let effects = engine
                .handle(EngineEvent::TrialDue { trial_index }, *clock)
                .unwrap();
            let (delay, attempt) = scheduled_target(&effects);
            *clock += delay;
            engine.handle(EngineEvent::TargetDue { attempt }, *clock).unwrap();
            *clock += Duration::from_millis(250);
            engine.handle(EngineEvent::Tap, *clock).unwrap();
        }
    }

    #[test]
    fn events_for_other_stages_are_rejected_without_change() {
        let mut engine = engine();
        let clock = Instant::now();

        assert!(matches!(
            engine.handle(EngineEvent::Tap, clock),
            Err(EngineError::InvalidState { stage: Stage::Idle, .. })
        ));
        engine.handle(EngineEvent::Begin, clock).unwrap();
        assert!(matches!(
            engine.handle(EngineEvent::Guess(Happy), clock),
            Err(EngineError::InvalidState { stage: Stage::Reaction, .. })
        ));
        assert!(matches!(
            engine.handle(EngineEvent::Choose(ResponseCategory::Calm), clock),
            Err(EngineError::InvalidState { .. })
        ));
        assert!(matches!(
            engine.handle(EngineEvent::Begin, clock),
            Err(EngineError::InvalidState { .. })
        ));
        assert_eq!(engine.history(), &[Stage::Idle, Stage::Reaction]);
    }

    #[test]
    fn choice_before_scenarios_load_is_rejected() {
        let mut engine = engine();
        let mut clock = Instant::now();
        engine.handle(EngineEvent::Begin, clock).unwrap();
        let effects = run_reaction(&mut engine, &mut clock, &[200, 200, 200, 200, 200]);
        assert!(effects
            .iter()
            .any(|effect| matches!(effect, Effect::FetchScenarios { .. })));

        assert!(matches!(
            engine.handle(EngineEvent::Choose(ResponseCategory::Calm), clock),
            Err(EngineError::InvalidState { stage: Stage::Decision, .. })
        ));
        assert_eq!(engine.stage(), Stage::Decision);
    }

    #[test]
    fn abandon_cancels_timers_and_never_submits() {
        let mut engine = engine();
        let clock = Instant::now();
        engine.handle(EngineEvent::Begin, clock).unwrap();
        let effects = engine.handle(EngineEvent::StartTrial, clock).unwrap();
        let (delay, attempt) = scheduled_target(&effects);

        let effects = engine.handle(EngineEvent::Abandon, clock).unwrap();
        assert!(matches!(effects.as_slice(), [Effect::CancelTimers]));
        assert_eq!(engine.stage(), Stage::Abandoned);
        assert!(engine.record().is_none());

        assert!(engine
            .handle(EngineEvent::TargetDue { attempt }, clock + delay)
            .unwrap()
            .is_empty());
        assert!(engine.handle(EngineEvent::Abandon, clock).is_err());
        assert!(engine.finalize().is_err());
    }

    #[test]
    fn abandon_is_refused_once_finalizing() {
        let mut engine = engine();
        run_to_finalizing(&mut engine);
        assert!(matches!(
            engine.handle(EngineEvent::Abandon, Instant::now()),
            Err(EngineError::InvalidState { stage: Stage::Finalizing, .. })
        ));
    }
}
