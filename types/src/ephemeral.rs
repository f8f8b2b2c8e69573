//! Read-model snapshots of the card a learner is looking at.

use serde::{Deserialize, Serialize};

use crate::{InteractionObject, State, SubtitledHtml};

/// One submitted answer and the feedback shown for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerAndResponse {
    pub user_answer: InteractionObject,
    pub feedback: SubtitledHtml,
}

/// Answers submitted so far to a card the learner has not finished.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PendingState {
    pub wrong_answers: Vec<AnswerAndResponse>,
}

/// The sealed answer log of a finished card.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletedState {
    pub answers: Vec<AnswerAndResponse>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateKind {
    Pending(PendingState),
    Completed(CompletedState),
    Terminal,
}

/// Snapshot of the card currently in view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EphemeralState {
    pub state: State,
    pub has_previous_state: bool,
    pub has_next_state: bool,
    pub kind: StateKind,
}

impl EphemeralState {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, StateKind::Terminal)
    }

    #[must_use]
    pub fn pending(&self) -> Option<&PendingState> {
        match &self.kind {
            StateKind::Pending(pending) => Some(pending),
            _ => None,
        }
    }

    #[must_use]
    pub fn completed(&self) -> Option<&CompletedState> {
        match &self.kind {
            StateKind::Completed(completed) => Some(completed),
            _ => None,
        }
    }
}
