use serde::{Deserialize, Serialize};

/// Behavioral category behind each decision option.
///
/// Serialized lowercase; content providers send the capitalized form, which is
/// accepted on input.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ResponseCategory {
    #[serde(alias = "Calm")]
    Calm,
    #[serde(alias = "Impulsive")]
    Impulsive,
    #[serde(alias = "Avoidant")]
    Avoidant,
}

impl ResponseCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseCategory::Calm => "calm",
            ResponseCategory::Impulsive => "impulsive",
            ResponseCategory::Avoidant => "avoidant",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScenarioOption {
    pub label: String,
    #[serde(rename = "type")]
    pub category: ResponseCategory,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Scenario {
    pub text: String,
    pub options: Vec<ScenarioOption>,
}

impl Scenario {
    pub fn new(text: impl Into<String>, options: Vec<(&str, ResponseCategory)>) -> Self {
        Self {
            text: text.into(),
            options: options
                .into_iter()
                .map(|(label, category)| ScenarioOption {
                    label: label.to_string(),
                    category,
                })
                .collect(),
        }
    }

    /// A scenario is usable when it has a prompt and at least two options.
    pub fn is_well_formed(&self) -> bool {
        !self.text.trim().is_empty() && self.options.len() >= 2
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DecisionResponse {
    pub scenario_index: usize,
    pub category: ResponseCategory,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DecisionTaskResult {
    pub responses: Vec<DecisionResponse>,
    /// True when the built-in scenarios replaced provider content.
    pub used_fallback: bool,
}

impl DecisionTaskResult {
    pub fn count_of(&self, category: ResponseCategory) -> usize {
        self.responses
            .iter()
            .filter(|response| response.category == category)
            .count()
    }
}
