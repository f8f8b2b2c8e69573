//! Core domain types for Wayfinder.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod content;
mod ephemeral;
mod ids;
mod outcome;

pub use content::{
    AnswerGroup, Exploration, ExplorationError, Interaction, InteractionObject, Outcome, RuleSpec,
    State, SubtitledHtml, TERMINAL_INTERACTION_ID,
};
pub use ephemeral::{AnswerAndResponse, CompletedState, EphemeralState, PendingState, StateKind};
pub use ids::{ExplorationId, SkillId, StateName};
pub use outcome::{AnswerOutcome, Destination};
