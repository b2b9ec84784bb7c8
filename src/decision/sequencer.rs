use crate::{
    assessment::Stage,
    error::{EngineError, EngineResult},
    models::{DecisionResponse, DecisionTaskResult, ResponseCategory, Scenario},
};

use super::fallback::fallback_scenarios;

/// How scenario content was settled for the session.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOutcome {
    pub scenario_count: usize,
    pub used_fallback: bool,
    /// Why provider content was replaced, when it was.
    pub reason: Option<EngineError>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DecisionProgress {
    Next { index: usize, scenario: Scenario },
    Completed(DecisionTaskResult),
}

#[derive(Debug)]
struct LoadedContent {
    scenarios: Vec<Scenario>,
    used_fallback: bool,
}

#[derive(Debug)]
pub struct ScenarioSequencer {
    min_scenarios: usize,
    content: Option<LoadedContent>,
    responses: Vec<DecisionResponse>,
    completed: bool,
}

impl ScenarioSequencer {
    pub fn new(min_scenarios: usize) -> Self {
        Self {
            min_scenarios: min_scenarios.max(1),
            content: None,
            responses: Vec::new(),
            completed: false,
        }
    }

    /// Settles the scenario list from a provider response. Malformed entries
    /// are dropped; too few survivors or a failed fetch switch to the
    /// built-in list. Content is fixed once loaded.
    pub fn load(&mut self, fetched: EngineResult<Vec<Scenario>>) -> EngineResult<LoadOutcome> {
        if self.content.is_some() {
            return Err(EngineError::invalid(Stage::Decision, "reload scenarios"));
        }

        let (scenarios, reason) = match fetched {
            Ok(scenarios) => {
                let received = scenarios.len();
                let usable: Vec<Scenario> =
                    scenarios.into_iter().filter(Scenario::is_well_formed).collect();
                if usable.len() >= self.min_scenarios {
                    (usable, None)
                } else {
                    let reason = EngineError::ContentUnavailable(format!(
                        "{} usable of {} received scenarios, need {}",
                        usable.len(),
                        received,
                        self.min_scenarios
                    ));
                    (fallback_scenarios(), Some(reason))
                }
            }
            Err(err) => (fallback_scenarios(), Some(err)),
        };

        let outcome = LoadOutcome {
            scenario_count: scenarios.len(),
            used_fallback: reason.is_some(),
            reason,
        };
        self.content = Some(LoadedContent {
            scenarios,
            used_fallback: outcome.used_fallback,
        });
        Ok(outcome)
    }

    pub fn scenarios(&self) -> &[Scenario] {
        self.content
            .as_ref()
            .map(|content| content.scenarios.as_slice())
            .unwrap_or(&[])
    }

    pub fn current_index(&self) -> usize {
        self.responses.len()
    }

    pub fn current(&self) -> Option<&Scenario> {
        if self.completed {
            return None;
        }
        self.scenarios().get(self.current_index())
    }

    pub fn submit_choice(&mut self, category: ResponseCategory) -> EngineResult<DecisionProgress> {
        if self.completed {
            return Err(EngineError::invalid(Stage::Decision, "choose after the last scenario"));
        }
        let content = self
            .content
            .as_ref()
            .ok_or_else(|| EngineError::invalid(Stage::Decision, "choose before scenarios load"))?;

        self.responses.push(DecisionResponse {
            scenario_index: self.responses.len(),
            category,
        });

        if self.responses.len() >= content.scenarios.len() {
            self.completed = true;
            return Ok(DecisionProgress::Completed(DecisionTaskResult {
                responses: self.responses.clone(),
                used_fallback: content.used_fallback,
            }));
        }

        let index = self.responses.len();
        Ok(DecisionProgress::Next {
            index,
            scenario: content.scenarios[index].clone(),
        })
    }
}
