use serde::{Deserialize, Serialize};

use crate::models::{DecisionTaskResult, EmotionTaskResult, ReactionTaskResult, ResponseCategory};

use super::config::ScoringConfig;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    Moderate,
    High,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EmotionalBias {
    Negative,
    NeutralPositive,
}

/// Derived metrics stored alongside the raw task results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssessmentSummary {
    pub mean_latency_ms: f64,
    pub latency_std_dev_ms: f64,
    pub premature_rate: f64,
    pub impulsive_ratio: f64,
    pub emotion_accuracy_percent: f64,
    pub negative_confusion_rate: f64,
    pub stress_score: f64,
    pub stress_level: Level,
    pub attention_score: f64,
    /// `None` when no decision was recorded.
    pub impulsivity: Option<Level>,
    pub emotional_bias: EmotionalBias,
}

pub fn summarize(
    reaction: &ReactionTaskResult,
    decision: &DecisionTaskResult,
    emotion: &EmotionTaskResult,
    config: &ScoringConfig,
) -> AssessmentSummary {
    let latencies = reaction.latencies();
    let mean_latency_ms = mean(&latencies);
    let latency_std_dev_ms = sample_std_dev(&latencies, mean_latency_ms);
    let premature_rate = premature_rate(reaction);
    let impulsive_ratio = impulsive_ratio(decision);
    let negative_confusion_rate = negative_confusion_rate(emotion);

    let stress_score = stress_score(
        mean_latency_ms,
        premature_rate,
        negative_confusion_rate,
        impulsive_ratio,
        config,
    );

    let attention_score = if latencies.is_empty() {
        0.0
    } else {
        (100.0
            - mean_latency_ms / 10.0
            - latency_std_dev_ms / 2.0
            - reaction.premature_attempts() as f64 * config.attention_premature_penalty)
            .clamp(0.0, 100.0)
    };

    let impulsivity = if decision.responses.is_empty() {
        None
    } else if impulsive_ratio > config.impulsivity_high_above {
        Some(Level::High)
    } else if impulsive_ratio >= config.impulsivity_moderate_from {
        Some(Level::Moderate)
    } else {
        Some(Level::Low)
    };

    let emotional_bias = if negative_confusion_rate > config.negative_confusion_threshold {
        EmotionalBias::Negative
    } else {
        EmotionalBias::NeutralPositive
    };

    AssessmentSummary {
        mean_latency_ms,
        latency_std_dev_ms,
        premature_rate,
        impulsive_ratio,
        emotion_accuracy_percent: emotion.accuracy_percent,
        negative_confusion_rate,
        stress_score,
        stress_level: stress_level(stress_score, config),
        attention_score,
        impulsivity,
        emotional_bias,
    }
}

/// Baseline plus one weight per indicator over its threshold, clamped to [0, 1].
fn stress_score(
    mean_latency_ms: f64,
    premature_rate: f64,
    negative_confusion_rate: f64,
    impulsive_ratio: f64,
    config: &ScoringConfig,
) -> f64 {
    let mut score = config.stress_baseline;

    if mean_latency_ms > config.slow_reaction_ms {
        score += config.weight_slow_reaction;
    }
    if premature_rate > config.premature_rate_threshold {
        score += config.weight_premature;
    }
    if negative_confusion_rate > config.negative_confusion_threshold {
        score += config.weight_negative_confusion;
    }
    if impulsive_ratio > config.impulsive_threshold {
        score += config.weight_impulsive;
    }

    score.clamp(0.0, 1.0)
}

fn stress_level(score: f64, config: &ScoringConfig) -> Level {
    if score < config.stress_low_below {
        Level::Low
    } else if score < config.stress_moderate_below {
        Level::Moderate
    } else {
        Level::High
    }
}

fn mean(values: &[u64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<u64>() as f64 / values.len() as f64
}

/// Sample standard deviation (n - 1); zero below two values.
fn sample_std_dev(values: &[u64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let squared: f64 = values
        .iter()
        .map(|value| {
            let delta = *value as f64 - mean;
            delta * delta
        })
        .sum();
    (squared / (values.len() - 1) as f64).sqrt()
}

fn premature_rate(reaction: &ReactionTaskResult) -> f64 {
    let total = reaction.total_attempts();
    if total == 0 {
        return 0.0;
    }
    reaction.premature_attempts() as f64 / total as f64
}

fn impulsive_ratio(decision: &DecisionTaskResult) -> f64 {
    if decision.responses.is_empty() {
        return 0.0;
    }
    decision.count_of(ResponseCategory::Impulsive) as f64 / decision.responses.len() as f64
}

fn negative_confusion_rate(emotion: &EmotionTaskResult) -> f64 {
    if emotion.trials.is_empty() {
        return 0.0;
    }
    let confused = emotion
        .trials
        .iter()
        .filter(|trial| trial.is_negative_confusion())
        .count();
    confused as f64 / emotion.trials.len() as f64
}
