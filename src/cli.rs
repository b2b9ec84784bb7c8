//! Line-oriented terminal front end for running one session by hand.
//!
//! `start` begins the reaction task, an empty line is a tap, a number picks a
//! decision option, an emotion name answers a stimulus and `quit` abandons.

use anyhow::Result;
use tokio::{
    io::{self, AsyncBufReadExt, BufReader},
    sync::mpsc,
};

use crate::{
    assessment::{AssessmentController, Notice, PresentationEvent, SessionSnapshot, Stage},
    models::{EmotionLabel, ScenarioOption},
};

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Start,
    Tap,
    Choose(usize),
    Guess(EmotionLabel),
    Quit,
    Unknown(String),
}

fn parse_command(line: &str) -> Command {
    let input = line.trim();
    if input.is_empty() {
        return Command::Tap;
    }
    match input.to_ascii_lowercase().as_str() {
        "start" | "s" => return Command::Start,
        "quit" | "q" | "exit" => return Command::Quit,
        _ => {}
    }
    if let Ok(number) = input.parse::<usize>() {
        if number > 0 {
            return Command::Choose(number - 1);
        }
    }
    match EmotionLabel::parse(input) {
        Some(label) => Command::Guess(label),
        None => Command::Unknown(input.to_string()),
    }
}

fn render(event: &PresentationEvent) -> String {
    match event {
        PresentationEvent::TrialWaiting {
            trial_index,
            trial_count,
        } => format!(
            "Trial {}/{}: wait for the target...",
            trial_index + 1,
            trial_count
        ),
        PresentationEvent::TargetVisible { .. } => "*** TAP NOW (press Enter) ***".to_string(),
        PresentationEvent::PrematureInput { trial_index } => {
            format!("Trial {} restarts.", trial_index + 1)
        }
        PresentationEvent::TrialRecorded { trial } => {
            format!("Reaction time: {} ms", trial.latency_ms)
        }
        PresentationEvent::ScenarioReady {
            index,
            total,
            scenario,
        } => {
            let mut text = format!("Scenario {}/{}: {}", index + 1, total, scenario.text);
            for (number, option) in scenario.options.iter().enumerate() {
                text.push_str(&format!("\n  {}. {}", number + 1, option.label));
            }
            text
        }
        PresentationEvent::StimulusReady {
            index,
            total,
            label,
        } => format!(
            "Face {}/{}: [{} face] Which emotion is this? (happy, sad, angry, neutral)",
            index + 1,
            total,
            label.as_str()
        ),
        PresentationEvent::StageComplete { stage } => {
            format!("{} task complete.", stage_title(*stage))
        }
        PresentationEvent::SessionComplete { record } => format!(
            "All done. Mean reaction {:.0} ms, emotion accuracy {:.0}%, stress {:?}.",
            record.summary.mean_latency_ms,
            record.emotion.accuracy_percent,
            record.summary.stress_level
        ),
        PresentationEvent::Notice { notice } => notice_text(*notice).to_string(),
    }
}

fn stage_title(stage: Stage) -> &'static str {
    match stage {
        Stage::Reaction => "Reaction",
        Stage::Decision => "Decision",
        Stage::Emotion => "Emotion",
        _ => "Session",
    }
}

fn notice_text(notice: Notice) -> &'static str {
    match notice {
        Notice::TooEarly => "Too early! Wait for the target.",
        Notice::FallbackScenarios => "Using built-in scenarios.",
        Notice::Saved => "Results saved.",
        Notice::SavedLocally => "Could not reach the server; results saved locally.",
    }
}

/// Runs the session until it completes, is abandoned or stdin closes.
pub async fn run_session(
    controller: AssessmentController,
    mut events: mpsc::UnboundedReceiver<PresentationEvent>,
) -> Result<SessionSnapshot> {
    let mut lines = BufReader::new(io::stdin()).lines();
    let mut options: Vec<ScenarioOption> = Vec::new();

    println!("Type `start` to begin the reaction task, `quit` to leave.");

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                if let PresentationEvent::ScenarioReady { scenario, .. } = &event {
                    options = scenario.options.clone();
                }
                println!("{}", render(&event));
                if matches!(event, PresentationEvent::SessionComplete { .. }) {
                    break;
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    if controller.snapshot().stage.is_abandonable() {
                        let _ = controller.abandon().await;
                    }
                    break;
                };
                if !handle_command(&controller, parse_command(&line), &options).await {
                    break;
                }
            }
        }
    }

    Ok(controller.wait_until_finished().await)
}

/// Returns false once the user has left the session.
async fn handle_command(
    controller: &AssessmentController,
    command: Command,
    options: &[ScenarioOption],
) -> bool {
    let result = match command {
        Command::Start => {
            if controller.snapshot().stage == Stage::Idle {
                if let Err(err) = controller.begin().await {
                    println!("{err}");
                    return true;
                }
            }
            controller.start_trial().await
        }
        Command::Tap => controller.tap().await,
        Command::Choose(index) => match options.get(index) {
            Some(option) => controller.choose(option.category).await,
            None => {
                println!("Pick one of the listed options.");
                return true;
            }
        },
        Command::Guess(label) => controller.guess(label).await,
        Command::Quit => {
            if let Err(err) = controller.abandon().await {
                println!("{err}");
                return true;
            }
            println!("Session abandoned.");
            return false;
        }
        Command::Unknown(input) => {
            println!("Unrecognized input `{input}`.");
            return true;
        }
    };

    if let Err(err) = result {
        println!("{err}");
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ReactionTrial, ResponseCategory::*, Scenario};

    #[test]
    fn parses_terminal_input() {
        assert_eq!(parse_command(""), Command::Tap);
        assert_eq!(parse_command("   "), Command::Tap);
        assert_eq!(parse_command("START"), Command::Start);
        assert_eq!(parse_command("2"), Command::Choose(1));
        assert_eq!(parse_command("Angry"), Command::Guess(EmotionLabel::Angry));
        assert_eq!(parse_command("quit"), Command::Quit);
        assert_eq!(parse_command("0"), Command::Unknown("0".into()));
        assert_eq!(parse_command("maybe"), Command::Unknown("maybe".into()));
    }

    #[test]
    fn scenarios_render_with_numbered_options() {
        let event = PresentationEvent::ScenarioReady {
            index: 0,
            total: 2,
            scenario: Scenario::new("Exam tomorrow.", vec![("Study", Calm), ("Panic", Impulsive)]),
        };
        assert_eq!(
            render(&event),
            "Scenario 1/2: Exam tomorrow.\n  1. Study\n  2. Panic"
        );
    }

    #[test]
    fn trial_results_render_latency() {
        let event = PresentationEvent::TrialRecorded {
            trial: ReactionTrial::measured(0, 245),
        };
        assert_eq!(render(&event), "Reaction time: 245 ms");
    }
}
