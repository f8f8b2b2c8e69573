//! The stage, graph, and deck of one exploration session, kept together so
//! they can only ever be replaced as a unit.

use thiserror::Error;

use wayfinder_types::{AnswerOutcome, Exploration, ExplorationId, InteractionObject, Outcome};

use crate::deck::{DeckError, StateDeck};
use crate::graph::{GraphError, StateGraph};
use crate::stage::{PlayStage, StageTransitionError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgressError {
    #[error(transparent)]
    Stage(#[from] StageTransitionError),
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Deck(#[from] DeckError),
}

#[derive(Debug, Default)]
pub struct ExplorationProgress {
    stage: PlayStage,
    exploration_id: Option<ExplorationId>,
    graph: StateGraph,
    deck: StateDeck,
}

impl ExplorationProgress {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn play_stage(&self) -> PlayStage {
        self.stage
    }

    #[must_use]
    pub fn exploration_id(&self) -> Option<&ExplorationId> {
        self.exploration_id.as_ref()
    }

    #[must_use]
    pub fn graph(&self) -> &StateGraph {
        &self.graph
    }

    #[must_use]
    pub fn deck(&self) -> &StateDeck {
        &self.deck
    }

    /// Moves the deck cursor one card back.
    pub fn navigate_previous(&mut self) -> Result<(), DeckError> {
        self.deck.navigate_to_previous_state()
    }

    /// Moves the deck cursor one card forward.
    pub fn navigate_next(&mut self) -> Result<(), DeckError> {
        self.deck.navigate_to_next_state()
    }

    /// Moves to `next`, failing on any transition outside the stage table.
    pub fn advance_play_stage_to(&mut self, next: PlayStage) -> Result<(), StageTransitionError> {
        let from = self.stage;
        self.stage = from.transition_to(next)?;
        tracing::debug!(%from, to = %next, "Play stage advanced");
        Ok(())
    }

    /// Records the exploration to load and enters the loading stage.
    pub fn begin(&mut self, exploration_id: ExplorationId) -> Result<(), StageTransitionError> {
        self.advance_play_stage_to(PlayStage::LoadingExploration)?;
        self.exploration_id = Some(exploration_id);
        Ok(())
    }

    /// Installs a loaded exploration and starts viewing its initial state.
    ///
    /// The initial state is resolved against the new graph before anything is
    /// replaced, so a failure leaves the previous graph and deck untouched.
    pub fn finish_load(&mut self, exploration: Exploration) -> Result<(), ProgressError> {
        if self.stage != PlayStage::LoadingExploration {
            return Err(StageTransitionError {
                from: self.stage,
                to: PlayStage::ViewingState,
            }
            .into());
        }
        let graph = StateGraph::new(exploration.states);
        let initial_state = graph.get_state(&exploration.init_state_name)?.clone();

        self.graph = graph;
        self.deck.reset_deck(initial_state);
        self.advance_play_stage_to(PlayStage::ViewingState)?;
        Ok(())
    }

    /// Applies a classified answer to the top card.
    ///
    /// The answer and its feedback are logged on the card, and a transition
    /// outcome pushes the destination state. The destination is resolved
    /// before the deck is touched, so an unknown state changes nothing.
    pub fn record_answer(
        &mut self,
        answer: InteractionObject,
        outcome: &Outcome,
    ) -> Result<AnswerOutcome, ProgressError> {
        self.deck.check_top_is_answerable()?;
        let top = self.deck.get_pending_top_state()?;
        let answer_outcome = StateGraph::compute_answer_outcome(top, outcome);
        let next_state = match answer_outcome.next_state_name() {
            Some(name) => Some(self.graph.get_state(name)?.clone()),
            None => None,
        };

        self.deck.submit_answer(answer, answer_outcome.feedback.clone())?;
        if let Some(state) = next_state {
            self.deck.push_state(state)?;
        }
        Ok(answer_outcome)
    }

    /// Leaves the session and discards its graph and deck.
    pub fn end(&mut self) -> Result<(), StageTransitionError> {
        self.advance_play_stage_to(PlayStage::NotPlaying)?;
        self.exploration_id = None;
        self.graph.clear();
        self.deck.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfinder_types::{Destination, Interaction, State, SubtitledHtml};

    fn exploration(init: &str) -> Exploration {
        Exploration::new(
            ExplorationId::new("exp"),
            init,
            [
                State::new("A", SubtitledHtml::new("c", "A"), Interaction::new("Continue")),
                State::new("B", SubtitledHtml::new("c", "B"), Interaction::terminal()),
            ],
        )
    }

    #[test]
    fn begin_then_load_views_initial_state() {
        let mut progress = ExplorationProgress::new();
        progress.begin(ExplorationId::new("exp")).unwrap();
        assert_eq!(progress.play_stage(), PlayStage::LoadingExploration);

        progress.finish_load(exploration("A")).unwrap();
        assert_eq!(progress.play_stage(), PlayStage::ViewingState);
        assert_eq!(progress.graph().len(), 2);
        let current = progress.deck().get_current_ephemeral_state().unwrap();
        assert_eq!(current.state.name.as_str(), "A");
    }

    #[test]
    fn load_with_unknown_initial_state_changes_nothing() {
        let mut progress = ExplorationProgress::new();
        progress.begin(ExplorationId::new("exp")).unwrap();

        let err = progress.finish_load(exploration("Missing")).unwrap_err();
        assert_eq!(err, ProgressError::Graph(GraphError::UnknownState("Missing".into())));
        assert_eq!(progress.play_stage(), PlayStage::LoadingExploration);
        assert!(progress.graph().is_empty());
        assert!(progress.deck().is_empty());
    }

    #[test]
    fn load_outside_loading_stage_fails() {
        let mut progress = ExplorationProgress::new();
        let err = progress.finish_load(exploration("A")).unwrap_err();
        assert!(matches!(err, ProgressError::Stage(_)));
    }

    fn viewing(init: &str) -> ExplorationProgress {
        let mut progress = ExplorationProgress::new();
        progress.begin(ExplorationId::new("exp")).unwrap();
        progress.finish_load(exploration(init)).unwrap();
        progress
    }

    #[test]
    fn record_transition_pushes_destination() {
        let mut progress = viewing("A");
        let outcome = Outcome::new("B", SubtitledHtml::new("fb", "On to B"));

        let result = progress
            .record_answer(InteractionObject::text("go"), &outcome)
            .unwrap();
        assert_eq!(result.destination, Destination::StateName("B".into()));
        assert_eq!(progress.deck().get_pending_top_state().unwrap().name.as_str(), "B");
        assert_eq!(progress.deck().state_index(), 1);
    }

    #[test]
    fn record_same_state_logs_without_pushing() {
        let mut progress = viewing("A");
        let outcome = Outcome::new("A", SubtitledHtml::new("fb", "Try again"));

        let result = progress
            .record_answer(InteractionObject::text("wrong"), &outcome)
            .unwrap();
        assert!(result.is_same_state());
        let view = progress.deck().get_current_ephemeral_state().unwrap();
        assert_eq!(view.pending().unwrap().wrong_answers.len(), 1);
        assert_eq!(progress.deck().state_index(), 0);
    }

    #[test]
    fn record_unknown_destination_changes_nothing() {
        let mut progress = viewing("A");
        let outcome = Outcome::new("Nowhere", SubtitledHtml::default());

        let err = progress
            .record_answer(InteractionObject::text("go"), &outcome)
            .unwrap_err();
        assert_eq!(err, ProgressError::Graph(GraphError::UnknownState("Nowhere".into())));
        let view = progress.deck().get_current_ephemeral_state().unwrap();
        assert!(view.pending().unwrap().wrong_answers.is_empty());
    }

    #[test]
    fn record_on_terminal_card_fails() {
        let mut progress = viewing("B");
        let outcome = Outcome::new("A", SubtitledHtml::default());
        let err = progress
            .record_answer(InteractionObject::text("go"), &outcome)
            .unwrap_err();
        assert_eq!(err, ProgressError::Deck(DeckError::TerminalState));
    }

    #[test]
    fn navigation_moves_cursor_within_deck() {
        let mut progress = viewing("A");
        let outcome = Outcome::new("B", SubtitledHtml::default());
        progress
            .record_answer(InteractionObject::text("go"), &outcome)
            .unwrap();

        assert_eq!(progress.navigate_next(), Err(DeckError::AtTopOfDeck));
        progress.navigate_previous().unwrap();
        assert_eq!(progress.deck().state_index(), 0);
        assert_eq!(progress.navigate_previous(), Err(DeckError::AtInitialState));
        progress.navigate_next().unwrap();
        assert_eq!(progress.deck().state_index(), 1);
        assert_eq!(progress.play_stage(), PlayStage::ViewingState);
    }

    #[test]
    fn begin_twice_fails() {
        let mut progress = ExplorationProgress::new();
        progress.begin(ExplorationId::new("first")).unwrap();
        assert!(progress.begin(ExplorationId::new("second")).is_err());
        assert_eq!(progress.exploration_id().unwrap().as_str(), "first");
    }

    #[test]
    fn end_discards_session() {
        let mut progress = ExplorationProgress::new();
        progress.begin(ExplorationId::new("exp")).unwrap();
        progress.finish_load(exploration("A")).unwrap();
        progress.end().unwrap();

        assert_eq!(progress.play_stage(), PlayStage::NotPlaying);
        assert!(progress.exploration_id().is_none());
        assert!(progress.graph().is_empty());
        assert!(progress.deck().is_empty());
        assert!(progress.end().is_err());
    }
}
