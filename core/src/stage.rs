//! Session play stage state machine.

use std::fmt;

use thiserror::Error;

/// Top-level stage of the exploration session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlayStage {
    #[default]
    NotPlaying,
    LoadingExploration,
    ViewingState,
    SubmittingAnswer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid play stage transition from {from} to {to}")]
pub struct StageTransitionError {
    pub from: PlayStage,
    pub to: PlayStage,
}

impl PlayStage {
    pub const ALL: [PlayStage; 4] = [
        PlayStage::NotPlaying,
        PlayStage::LoadingExploration,
        PlayStage::ViewingState,
        PlayStage::SubmittingAnswer,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            PlayStage::NotPlaying => "not_playing",
            PlayStage::LoadingExploration => "loading_exploration",
            PlayStage::ViewingState => "viewing_state",
            PlayStage::SubmittingAnswer => "submitting_answer",
        }
    }

    /// Whether `self -> next` is one of the legal transitions.
    #[must_use]
    pub const fn can_transition_to(self, next: PlayStage) -> bool {
        matches!(
            (self, next),
            (PlayStage::NotPlaying, PlayStage::LoadingExploration)
                | (PlayStage::LoadingExploration, PlayStage::ViewingState)
                | (PlayStage::ViewingState, PlayStage::SubmittingAnswer)
                | (PlayStage::SubmittingAnswer, PlayStage::ViewingState)
                | (
                    PlayStage::LoadingExploration
                        | PlayStage::ViewingState
                        | PlayStage::SubmittingAnswer,
                    PlayStage::NotPlaying
                )
        )
    }

    pub fn transition_to(self, next: PlayStage) -> Result<PlayStage, StageTransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(StageTransitionError {
                from: self,
                to: next,
            })
        }
    }

    #[must_use]
    pub const fn is_playing(self) -> bool {
        !matches!(self, PlayStage::NotPlaying)
    }
}

impl fmt::Display for PlayStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
