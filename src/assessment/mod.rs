pub mod controller;
pub mod engine;
pub mod events;
pub mod state;

pub use controller::{AssessmentController, SessionServices};
pub use engine::AssessmentEngine;
pub use events::{Effect, EngineEvent, Notice, PresentationEvent, Presenter};
pub use state::{SessionSnapshot, Stage};
