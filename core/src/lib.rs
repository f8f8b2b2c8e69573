//! Session logic for Wayfinder.
//!
//! This crate holds the pure, synchronous pieces of an exploration session:
//! the state graph, the deck of visited cards, the play stage machine, and the
//! answer classifier seam. The engine crate adds serialization and IO on top.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod classify;
mod deck;
mod graph;
mod progress;
mod stage;

pub use classify::{AnswerClassifier, ClassificationError, RuleClassifier};
pub use deck::{DeckError, StateDeck};
pub use graph::{GraphError, StateGraph};
pub use progress::{ExplorationProgress, ProgressError};
pub use stage::{PlayStage, StageTransitionError};
