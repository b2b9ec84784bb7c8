use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EmotionLabel {
    #[serde(alias = "Happy")]
    Happy,
    #[serde(alias = "Sad")]
    Sad,
    #[serde(alias = "Angry")]
    Angry,
    #[serde(alias = "Neutral")]
    Neutral,
}

impl EmotionLabel {
    pub const ALL: [EmotionLabel; 4] = [
        EmotionLabel::Happy,
        EmotionLabel::Sad,
        EmotionLabel::Angry,
        EmotionLabel::Neutral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionLabel::Happy => "happy",
            EmotionLabel::Sad => "sad",
            EmotionLabel::Angry => "angry",
            EmotionLabel::Neutral => "neutral",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|label| label.as_str().eq_ignore_ascii_case(value.trim()))
    }

    pub fn is_negative(&self) -> bool {
        matches!(self, EmotionLabel::Sad | EmotionLabel::Angry)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmotionTrial {
    pub expected: EmotionLabel,
    pub guessed: EmotionLabel,
    pub correct: bool,
}

impl EmotionTrial {
    pub fn new(expected: EmotionLabel, guessed: EmotionLabel) -> Self {
        Self {
            expected,
            guessed,
            correct: expected == guessed,
        }
    }

    /// A non-negative face read as a negative one.
    pub fn is_negative_confusion(&self) -> bool {
        !self.expected.is_negative() && self.guessed.is_negative()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmotionTaskResult {
    pub trials: Vec<EmotionTrial>,
    pub correct_count: usize,
    pub accuracy_percent: f64,
}
