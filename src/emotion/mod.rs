pub mod runner;

pub use runner::{EmotionProgress, EmotionTrialRunner};
