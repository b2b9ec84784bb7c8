use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock, time::Duration};

use crate::{models::EmotionLabel, scoring::ScoringConfig};

const API_URL_ENV: &str = "MINDGAMES_API_URL";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReactionSettings {
    pub trial_count: usize,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Pause between a recorded trial and the next one starting on its own.
    pub inter_trial_pause_ms: u64,
}

impl Default for ReactionSettings {
    fn default() -> Self {
        Self {
            trial_count: 5,
            min_delay_ms: 800,
            max_delay_ms: 2000,
            inter_trial_pause_ms: 1000,
        }
    }
}

impl ReactionSettings {
    pub fn inter_trial_pause(&self) -> Duration {
        Duration::from_millis(self.inter_trial_pause_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DecisionSettings {
    /// Fewer usable scenarios than this and the built-in set is used instead.
    pub min_scenarios: usize,
    pub content_context: String,
    pub fetch_timeout_ms: u64,
}

impl Default for DecisionSettings {
    fn default() -> Self {
        Self {
            min_scenarios: 2,
            content_context: "General teen stress".into(),
            fetch_timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmotionSettings {
    pub stimuli: Vec<EmotionLabel>,
}

impl Default for EmotionSettings {
    fn default() -> Self {
        Self {
            stimuli: EmotionLabel::ALL.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RemoteSettings {
    pub base_url: String,
    pub submit_timeout_ms: u64,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".into(),
            submit_timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct AssessmentSettings {
    pub reaction: ReactionSettings,
    pub decision: DecisionSettings,
    pub emotion: EmotionSettings,
    pub remote: RemoteSettings,
    pub scoring: ScoringConfig,
}

impl AssessmentSettings {
    pub fn validate(&self) -> Result<()> {
        if self.reaction.trial_count == 0 {
            bail!("reaction.trial_count must be greater than zero");
        }
        if self.reaction.min_delay_ms > self.reaction.max_delay_ms {
            bail!(
                "reaction delay range is inverted ({} > {})",
                self.reaction.min_delay_ms,
                self.reaction.max_delay_ms
            );
        }
        if self.decision.min_scenarios == 0 {
            bail!("decision.min_scenarios must be greater than zero");
        }
        if self.emotion.stimuli.is_empty() {
            bail!("emotion.stimuli must not be empty");
        }
        Ok(())
    }

    /// Environment overrides applied on top of the stored file.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                self.remote.base_url = url.trim().trim_end_matches('/').to_string();
            }
        }
        self
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<AssessmentSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            match serde_json::from_str::<AssessmentSettings>(&contents) {
                Ok(settings) if settings.validate().is_ok() => settings,
                Ok(_) | Err(_) => {
                    log::warn!(
                        "Ignoring invalid settings at {}; using defaults",
                        path.display()
                    );
                    AssessmentSettings::default()
                }
            }
        } else {
            AssessmentSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn settings(&self) -> AssessmentSettings {
        match self.data.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn update(&self, settings: AssessmentSettings) -> Result<()> {
        settings.validate()?;
        let mut guard = match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        self.persist(&settings)?;
        *guard = settings;
        Ok(())
    }

    fn persist(&self, data: &AssessmentSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        let settings = store.settings();

        assert_eq!(settings.reaction.trial_count, 5);
        assert_eq!(settings.reaction.min_delay_ms, 800);
        assert_eq!(settings.reaction.max_delay_ms, 2000);
        assert_eq!(settings.decision.min_scenarios, 2);
        assert_eq!(settings.emotion.stimuli.len(), 4);
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_sections() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "reaction": { "trial_count": 3 } }"#).unwrap();

        let settings = SettingsStore::new(path).unwrap().settings();
        assert_eq!(settings.reaction.trial_count, 3);
        assert_eq!(settings.reaction.max_delay_ms, 2000);
        assert_eq!(settings.remote, RemoteSettings::default());
    }

    #[test]
    fn invalid_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "emotion": { "stimuli": [] } }"#).unwrap();

        let settings = SettingsStore::new(path).unwrap().settings();
        assert_eq!(settings, AssessmentSettings::default());
    }

    #[test]
    fn update_persists_and_rejects_inverted_ranges() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let store = SettingsStore::new(path.clone()).unwrap();

        let mut settings = store.settings();
        settings.reaction.trial_count = 7;
        store.update(settings).unwrap();
        assert_eq!(
            SettingsStore::new(path).unwrap().settings().reaction.trial_count,
            7
        );

        let mut broken = store.settings();
        broken.reaction.min_delay_ms = 3000;
        assert!(store.update(broken).is_err());
        assert_eq!(store.settings().reaction.trial_count, 7);
    }
}
