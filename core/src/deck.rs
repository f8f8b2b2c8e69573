//! Navigable history of the cards a learner has played.
//!
//! The deck is a list of completed cards followed by exactly one pending top
//! card. `state_index` points into that combined sequence and is always in
//! `0..=previous_states.len()`; only the top position accepts answers or new
//! cards. A terminal card can only ever be the top of the deck.

use std::mem;

use thiserror::Error;

use wayfinder_types::{
    AnswerAndResponse, CompletedState, EphemeralState, InteractionObject, PendingState, State,
    StateKind, StateName, SubtitledHtml,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeckError {
    #[error("deck has no initial state")]
    Empty,
    #[error("cannot modify the deck except at the most recent state")]
    NotAtTopOfDeck,
    #[error("cannot modify the deck after reaching a terminal state")]
    TerminalState,
    #[error("cannot push another state without an answer")]
    NoAnswerSubmitted,
    #[error("cannot route from state '{0}' to itself as a new card")]
    SelfLoop(StateName),
    #[error("cannot navigate to previous state; at initial state")]
    AtInitialState,
    #[error("cannot navigate to next state; at most recent state")]
    AtTopOfDeck,
}

#[derive(Debug, Clone, Default)]
pub struct StateDeck {
    pending_top_state: Option<State>,
    previous_states: Vec<EphemeralState>,
    current_dialog_interactions: Vec<AnswerAndResponse>,
    state_index: usize,
}

impl StateDeck {
    pub fn new(initial_state: State) -> Self {
        let mut deck = Self::default();
        deck.reset_deck(initial_state);
        deck
    }

    /// Resets this deck to a new initial [`State`].
    pub fn reset_deck(&mut self, initial_state: State) {
        self.pending_top_state = Some(initial_state);
        self.previous_states.clear();
        self.current_dialog_interactions.clear();
        self.state_index = 0;
    }

    /// Discards every card, leaving the deck without an initial state.
    pub fn clear(&mut self) {
        self.pending_top_state = None;
        self.previous_states.clear();
        self.current_dialog_interactions.clear();
        self.state_index = 0;
    }

    #[must_use]
    pub fn state_index(&self) -> usize {
        self.state_index
    }

    /// Number of cards, including the pending top card.
    #[must_use]
    pub fn len(&self) -> usize {
        if self.pending_top_state.is_some() {
            self.previous_states.len() + 1
        } else {
            0
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending_top_state.is_none()
    }

    /// Returns the most recent card, regardless of which card is in view.
    pub fn get_pending_top_state(&self) -> Result<&State, DeckError> {
        self.pending_top_state.as_ref().ok_or(DeckError::Empty)
    }

    /// Returns the card the learner is currently viewing.
    pub fn get_current_ephemeral_state(&self) -> Result<EphemeralState, DeckError> {
        let top = self.get_pending_top_state()?;
        if !self.is_current_state_top_of_deck() {
            return Ok(self.previous_states[self.state_index].clone());
        }
        let kind = if top.is_terminal() {
            StateKind::Terminal
        } else {
            StateKind::Pending(PendingState {
                wrong_answers: self.current_dialog_interactions.clone(),
            })
        };
        Ok(EphemeralState {
            state: top.clone(),
            has_previous_state: !self.is_current_state_initial(),
            has_next_state: false,
            kind,
        })
    }

    /// Records an answer and its feedback against the pending top card.
    pub fn submit_answer(
        &mut self,
        user_answer: InteractionObject,
        feedback: SubtitledHtml,
    ) -> Result<(), DeckError> {
        self.check_top_is_answerable()?;
        self.current_dialog_interactions.push(AnswerAndResponse {
            user_answer,
            feedback,
        });
        Ok(())
    }

    /// Completes the pending top card and makes `state` the new top.
    ///
    /// Requires the learner to be on the top card, that card to be non-terminal
    /// and answered at least once, and `state` to be a different card.
    pub fn push_state(&mut self, state: State) -> Result<(), DeckError> {
        self.check_top_is_answerable()?;
        if self.current_dialog_interactions.is_empty() {
            return Err(DeckError::NoAnswerSubmitted);
        }
        let has_previous_state = !self.is_current_state_initial();
        let Some(top) = self.pending_top_state.take_if(|top| top.name != state.name) else {
            return Err(DeckError::SelfLoop(state.name));
        };

        self.previous_states.push(EphemeralState {
            state: top,
            has_previous_state,
            has_next_state: true,
            kind: StateKind::Completed(CompletedState {
                answers: mem::take(&mut self.current_dialog_interactions),
            }),
        });
        self.pending_top_state = Some(state);
        self.state_index += 1;
        Ok(())
    }

    pub fn navigate_to_previous_state(&mut self) -> Result<(), DeckError> {
        self.get_pending_top_state()?;
        if self.is_current_state_initial() {
            return Err(DeckError::AtInitialState);
        }
        self.state_index -= 1;
        Ok(())
    }

    pub fn navigate_to_next_state(&mut self) -> Result<(), DeckError> {
        self.get_pending_top_state()?;
        if self.is_current_state_top_of_deck() {
            return Err(DeckError::AtTopOfDeck);
        }
        self.state_index += 1;
        Ok(())
    }

    /// Fails unless the learner is on the top card and it accepts answers.
    pub fn check_top_is_answerable(&self) -> Result<(), DeckError> {
        let top = self.get_pending_top_state()?;
        if !self.is_current_state_top_of_deck() {
            return Err(DeckError::NotAtTopOfDeck);
        }
        if top.is_terminal() {
            return Err(DeckError::TerminalState);
        }
        Ok(())
    }

    fn is_current_state_initial(&self) -> bool {
        self.state_index == 0
    }

    fn is_current_state_top_of_deck(&self) -> bool {
        self.state_index == self.previous_states.len()
    }
}
