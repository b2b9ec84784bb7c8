use std::time::{Duration, Instant};

use crate::{
    assessment::Stage,
    error::{EngineError, EngineResult},
    models::{ReactionTaskResult, ReactionTrial},
    settings::ReactionSettings,
};

use super::delay::{DelayRange, DelaySampler};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialPhase {
    /// Nothing scheduled; taps are ignored.
    Ready,
    Waiting {
        attempt: u64,
    },
    TargetVisible {
        attempt: u64,
        shown_at: Instant,
    },
    Done,
}

/// A target appearance the caller must fire after `delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTarget {
    pub attempt: u64,
    pub trial_index: usize,
    pub delay: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReactionOutcome {
    Ignored,
    Recorded(ReactionTrial),
    Completed(ReactionTaskResult),
}

/// Runs the reaction trials. Time is passed in by the caller so the scheduler
/// never reads a clock itself.
#[derive(Debug)]
pub struct TrialScheduler {
    trial_count: usize,
    range: DelayRange,
    phase: TrialPhase,
    trials: Vec<ReactionTrial>,
    premature: Vec<ReactionTrial>,
    next_attempt: u64,
    pending: Option<ScheduledTarget>,
}

impl TrialScheduler {
    pub fn new(settings: &ReactionSettings) -> Self {
        Self {
            trial_count: settings.trial_count.max(1),
            range: DelayRange::from_settings(settings),
            phase: TrialPhase::Ready,
            trials: Vec::with_capacity(settings.trial_count),
            premature: Vec::new(),
            next_attempt: 0,
            pending: None,
        }
    }

    pub fn phase(&self) -> TrialPhase {
        self.phase
    }

    /// Index of the trial currently being measured.
    pub fn trial_index(&self) -> usize {
        self.trials.len()
    }

    pub fn trial_count(&self) -> usize {
        self.trial_count
    }

    pub fn premature_attempts(&self) -> u32 {
        self.premature.len() as u32
    }

    /// The target waiting to be shown, if any.
    pub fn pending(&self) -> Option<ScheduledTarget> {
        match self.phase {
            TrialPhase::Waiting { .. } => self.pending,
            _ => None,
        }
    }

    pub fn start_trial(&mut self, sampler: &mut dyn DelaySampler) -> EngineResult<ScheduledTarget> {
        if self.phase != TrialPhase::Ready {
            return Err(EngineError::invalid(Stage::Reaction, "start a trial"));
        }
        Ok(self.schedule(sampler))
    }

    /// Marks the target visible. Returns false for a superseded attempt.
    pub fn show_target(&mut self, attempt: u64, now: Instant) -> bool {
        match self.phase {
            TrialPhase::Waiting { attempt: current } if current == attempt => {
                self.phase = TrialPhase::TargetVisible {
                    attempt,
                    shown_at: now,
                };
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    /// Handles a tap. A tap while waiting reschedules the same trial index
    /// with a fresh delay and reports [`EngineError::PrematureInput`].
    pub fn respond(
        &mut self,
        now: Instant,
        sampler: &mut dyn DelaySampler,
    ) -> EngineResult<ReactionOutcome> {
        match self.phase {
            TrialPhase::Ready | TrialPhase::Done => Ok(ReactionOutcome::Ignored),
            TrialPhase::Waiting { .. } => {
                let trial_index = self.trial_index();
                self.premature.push(ReactionTrial::premature(trial_index));
                self.schedule(sampler);
                Err(EngineError::PrematureInput { trial_index })
            }
            TrialPhase::TargetVisible { shown_at, .. } => {
                let latency_ms = now.saturating_duration_since(shown_at).as_millis() as u64;
                let trial = ReactionTrial::measured(self.trial_index(), latency_ms);
                self.trials.push(trial);

                if self.trials.len() >= self.trial_count {
                    self.phase = TrialPhase::Done;
                    Ok(ReactionOutcome::Completed(ReactionTaskResult {
                        trials: self.trials.clone(),
                        premature: self.premature.clone(),
                    }))
                } else {
                    self.phase = TrialPhase::Ready;
                    Ok(ReactionOutcome::Recorded(trial))
                }
            }
        }
    }

    /// Drops any scheduled target; later timer signals are ignored.
    pub fn cancel(&mut self) {
        self.pending = None;
        self.phase = TrialPhase::Done;
    }

    fn schedule(&mut self, sampler: &mut dyn DelaySampler) -> ScheduledTarget {
        self.next_attempt += 1;
        let target = ScheduledTarget {
            attempt: self.next_attempt,
            trial_index: self.trial_index(),
            delay: sampler.sample(self.range),
        };
        self.phase = TrialPhase::Waiting {
            attempt: target.attempt,
        };
        self.pending = Some(target);
        target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reaction::delay::{ScriptedDelays, UniformDelay};

    fn settings(trial_count: usize) -> ReactionSettings {
        ReactionSettings {
            trial_count,
            ..ReactionSettings::default()
        }
    }

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    /// Runs one full trial; returns the outcome of the measured tap.
    fn run_trial(
        scheduler: &mut TrialScheduler,
        sampler: &mut dyn DelaySampler,
        clock: &mut Instant,
        latency_ms: u64,
    ) -> ReactionOutcome {
        let target = scheduler.start_trial(sampler).unwrap();
        *clock += target.delay;
        assert!(scheduler.show_target(target.attempt, *clock));
        *clock += ms(latency_ms);
        scheduler.respond(*clock, sampler).unwrap()
    }

    #[test]
    fn five_trials_record_the_measured_latencies() {
        let mut scheduler = TrialScheduler::new(&settings(5));
        let mut sampler = ScriptedDelays::new(&[900, 1100, 1500, 1000, 1300]);
        let mut clock = Instant::now();
        let latencies = [210, 180, 260, 190, 220];

        let mut delays = Vec::new();
        let mut outcome = ReactionOutcome::Ignored;
        for latency in latencies {
            let target = scheduler.start_trial(&mut sampler).unwrap();
            delays.push(target.delay.as_millis() as u64);
            clock += target.delay;
            assert!(scheduler.show_target(target.attempt, clock));
            clock += ms(latency);
            outcome = scheduler.respond(clock, &mut sampler).unwrap();
        }

        assert_eq!(delays, vec![900, 1100, 1500, 1000, 1300]);
        match outcome {
            ReactionOutcome::Completed(result) => {
                assert_eq!(result.latencies(), latencies.to_vec());
                assert!(result.trials.iter().all(|trial| !trial.premature));
                assert!(result.premature.is_empty());
            }
            other => panic!("expected completion, got {other:?}"),
        }
        assert_eq!(scheduler.phase(), TrialPhase::Done);
    }

    #[test]
    fn premature_taps_retry_the_same_index() {
        let mut scheduler = TrialScheduler::new(&settings(3));
        let mut sampler = UniformDelay::seeded(9);
        let mut clock = Instant::now();

        let first = scheduler.start_trial(&mut sampler).unwrap();
        for _ in 0..4 {
            let err = scheduler.respond(clock, &mut sampler).unwrap_err();
            assert_eq!(err, EngineError::PrematureInput { trial_index: 0 });
            assert_eq!(scheduler.trial_index(), 0);
        }

        let retry = scheduler.pending().expect("premature tap reschedules");
        assert_eq!(retry.trial_index, 0);
        assert_ne!(retry.attempt, first.attempt);

        // The original attempt's timer is stale now.
        assert!(!scheduler.show_target(first.attempt, clock));
        clock += retry.delay;
        assert!(scheduler.show_target(retry.attempt, clock));
        clock += ms(300);
        assert_eq!(
            scheduler.respond(clock, &mut sampler).unwrap(),
            ReactionOutcome::Recorded(ReactionTrial::measured(0, 300))
        );

        run_trial(&mut scheduler, &mut sampler, &mut clock, 250);
        match run_trial(&mut scheduler, &mut sampler, &mut clock, 240) {
            ReactionOutcome::Completed(result) => {
                assert_eq!(result.trials.len(), 3);
                assert_eq!(result.premature_attempts(), 4);
                assert!(result
                    .premature
                    .iter()
                    .all(|attempt| attempt.premature && attempt.trial_index == 0));
                assert_eq!(result.total_attempts(), 7);
            }
            other => panic!("expected completion, got {other:?}"),
        }
    }

    #[test]
    fn each_attempt_is_either_measured_or_flagged_premature() {
        let mut scheduler = TrialScheduler::new(&settings(1));
        let mut sampler = ScriptedDelays::new(&[900, 1000, 1100]);
        let mut clock = Instant::now();

        scheduler.start_trial(&mut sampler).unwrap();
        for _ in 0..2 {
            assert!(scheduler.respond(clock, &mut sampler).is_err());
        }
        let retry = scheduler.pending().unwrap();
        clock += retry.delay;
        assert!(scheduler.show_target(retry.attempt, clock));
        clock += ms(275);

        match scheduler.respond(clock, &mut sampler).unwrap() {
            ReactionOutcome::Completed(result) => {
                assert_eq!(result.trials, vec![ReactionTrial::measured(0, 275)]);
                assert_eq!(
                    result.premature,
                    vec![ReactionTrial::premature(0), ReactionTrial::premature(0)]
                );
                assert!(result
                    .trials
                    .iter()
                    .chain(result.premature.iter())
                    .all(|trial| trial.premature == (trial.latency_ms == 0)));
            }
            other => panic!("expected completion, got {other:?}"),
        }
    }

    #[test]
    fn any_trial_count_yields_exactly_that_many_entries() {
        for trial_count in 1..=8 {
            let mut scheduler = TrialScheduler::new(&settings(trial_count));
            let mut sampler = UniformDelay::seeded(trial_count as u64);
            let mut clock = Instant::now();

            let mut completed = None;
            for index in 0..trial_count {
                if let ReactionOutcome::Completed(result) =
                    run_trial(&mut scheduler, &mut sampler, &mut clock, 100 + index as u64)
                {
                    completed = Some(result);
                }
            }

            let result = completed.expect("last trial completes the task");
            assert_eq!(result.trials.len(), trial_count);
            assert!(result
                .trials
                .iter()
                .enumerate()
                .all(|(index, trial)| trial.trial_index == index));
        }
    }

    #[test]
    fn taps_with_nothing_scheduled_are_ignored() {
        let mut scheduler = TrialScheduler::new(&settings(2));
        let mut sampler = UniformDelay::seeded(3);
        let clock = Instant::now();

        assert_eq!(
            scheduler.respond(clock, &mut sampler).unwrap(),
            ReactionOutcome::Ignored
        );
        assert_eq!(scheduler.phase(), TrialPhase::Ready);
        assert_eq!(scheduler.premature_attempts(), 0);
    }

    #[test]
    fn starting_twice_is_rejected() {
        let mut scheduler = TrialScheduler::new(&settings(2));
        let mut sampler = UniformDelay::seeded(3);

        scheduler.start_trial(&mut sampler).unwrap();
        assert!(matches!(
            scheduler.start_trial(&mut sampler),
            Err(EngineError::InvalidState { .. })
        ));
    }

    #[test]
    fn cancel_discards_the_pending_target() {
        let mut scheduler = TrialScheduler::new(&settings(2));
        let mut sampler = UniformDelay::seeded(3);
        let target = scheduler.start_trial(&mut sampler).unwrap();

        scheduler.cancel();
        assert_eq!(scheduler.pending(), None);
        assert!(!scheduler.show_target(target.attempt, Instant::now()));
    }
}
