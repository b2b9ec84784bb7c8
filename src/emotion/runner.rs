use crate::{
    assessment::Stage,
    error::{EngineError, EngineResult},
    models::{EmotionLabel, EmotionTaskResult, EmotionTrial},
};

#[derive(Debug, Clone, PartialEq)]
pub enum EmotionProgress {
    Next(EmotionLabel),
    Completed(EmotionTaskResult),
}

/// Presents stimuli in order and scores each guess.
#[derive(Debug)]
pub struct EmotionTrialRunner {
    stimuli: Vec<EmotionLabel>,
    trials: Vec<EmotionTrial>,
    correct_count: usize,
}

impl EmotionTrialRunner {
    pub fn new(stimuli: Vec<EmotionLabel>) -> Self {
        let stimuli = if stimuli.is_empty() {
            EmotionLabel::ALL.to_vec()
        } else {
            stimuli
        };
        Self {
            trials: Vec::with_capacity(stimuli.len()),
            stimuli,
            correct_count: 0,
        }
    }

    pub fn current(&self) -> Option<EmotionLabel> {
        self.stimuli.get(self.trials.len()).copied()
    }

    /// Number of stimuli already answered; also the index of the current one.
    pub fn answered(&self) -> usize {
        self.trials.len()
    }

    pub fn submit_guess(&mut self, guess: EmotionLabel) -> EngineResult<EmotionProgress> {
        let expected = self
            .current()
            .ok_or_else(|| EngineError::invalid(Stage::Emotion, "guess after the last stimulus"))?;

        let trial = EmotionTrial::new(expected, guess);
        // Single increment; accuracy below reads this count.
        if trial.correct {
            self.correct_count += 1;
        }
        self.trials.push(trial);

        match self.current() {
            Some(next) => Ok(EmotionProgress::Next(next)),
            None => Ok(EmotionProgress::Completed(EmotionTaskResult {
                trials: self.trials.clone(),
                correct_count: self.correct_count,
                accuracy_percent: accuracy_percent(self.correct_count, self.trials.len()),
            })),
        }
    }
}

fn accuracy_percent(correct: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (correct as f64 * 100.0) / total as f64
}
