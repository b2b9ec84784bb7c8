use serde::{Deserialize, Serialize};

/// Thresholds and weights for the derived summary metrics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoringConfig {
    /// Stress score before any indicator is added
    pub stress_baseline: f64,

    /// Mean latency above this adds `weight_slow_reaction`
    pub slow_reaction_ms: f64,
    /// Premature rate above this adds `weight_premature`
    pub premature_rate_threshold: f64,
    /// Negative confusion rate above this adds `weight_negative_confusion`
    pub negative_confusion_threshold: f64,
    /// Impulsive ratio above this adds `weight_impulsive`
    pub impulsive_threshold: f64,

    pub weight_slow_reaction: f64,
    pub weight_premature: f64,
    pub weight_negative_confusion: f64,
    pub weight_impulsive: f64,

    /// Stress level cut points: below `low` is Low, below `moderate` is Moderate
    pub stress_low_below: f64,
    pub stress_moderate_below: f64,

    /// Impulsivity label cut points on the impulsive ratio
    pub impulsivity_high_above: f64,
    pub impulsivity_moderate_from: f64,

    /// Attention points lost per premature attempt
    pub attention_premature_penalty: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            stress_baseline: 0.3,
            slow_reaction_ms: 450.0,
            premature_rate_threshold: 0.1,
            negative_confusion_threshold: 0.2,
            impulsive_threshold: 0.5,
            weight_slow_reaction: 0.2,
            weight_premature: 0.15,
            weight_negative_confusion: 0.2,
            weight_impulsive: 0.2,
            stress_low_below: 0.33,
            stress_moderate_below: 0.66,
            impulsivity_high_above: 0.5,
            impulsivity_moderate_from: 0.25,
            attention_premature_penalty: 10.0,
        }
    }
}
