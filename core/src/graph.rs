//! Lookup table of an exploration's states and answer-outcome resolution.

use std::collections::{BTreeMap, HashMap};

use thiserror::Error;

use wayfinder_types::{AnswerOutcome, Destination, Outcome, State, StateName};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("unknown state '{0}'")]
    UnknownState(StateName),
}

/// Provides lookup access to [`State`]s by name.
#[derive(Debug, Clone, Default)]
pub struct StateGraph {
    states: HashMap<StateName, State>,
}

impl StateGraph {
    pub fn new(states: BTreeMap<StateName, State>) -> Self {
        Self {
            states: states.into_iter().collect(),
        }
    }

    /// Replaces the whole graph.
    pub fn reset_state_graph(&mut self, states: BTreeMap<StateName, State>) {
        self.states = states.into_iter().collect();
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }

    pub fn get_state(&self, name: &StateName) -> Result<&State, GraphError> {
        self.states
            .get(name)
            .ok_or_else(|| GraphError::UnknownState(name.clone()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Resolves a classified [`Outcome`] into a single [`Destination`].
    ///
    /// Precedence: refresher exploration, then missing prerequisite skill,
    /// then same state, then a transition to `dest_state_name`. Empty ids
    /// count as absent.
    #[must_use]
    pub fn compute_answer_outcome(current_state: &State, outcome: &Outcome) -> AnswerOutcome {
        let refresher = outcome
            .refresher_exploration_id
            .as_ref()
            .filter(|id| !id.as_str().is_empty());
        let missing_skill = outcome
            .missing_prerequisite_skill_id
            .as_ref()
            .filter(|id| !id.as_str().is_empty());

        let destination = if let Some(id) = refresher {
            Destination::RefresherExploration(id.clone())
        } else if let Some(id) = missing_skill {
            Destination::MissingPrerequisiteSkill(id.clone())
        } else if outcome.dest_state_name == current_state.name {
            Destination::SameState
        } else {
            Destination::StateName(outcome.dest_state_name.clone())
        };

        AnswerOutcome {
            feedback: outcome.feedback.clone(),
            labelled_as_correct: outcome.labelled_as_correct,
            destination,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfinder_types::{ExplorationId, Interaction, SkillId, SubtitledHtml};

    fn state(name: &str) -> State {
        State::new(name, SubtitledHtml::new("content", name), Interaction::new("TextInput"))
    }

    fn graph() -> StateGraph {
        let mut states = BTreeMap::new();
        for name in ["A", "B"] {
            states.insert(StateName::from(name), state(name));
        }
        StateGraph::new(states)
    }

    #[test]
    fn get_state_returns_named_state() {
        let graph = graph();
        assert_eq!(graph.get_state(&"B".into()).unwrap().name.as_str(), "B");
    }

    #[test]
    fn get_state_unknown_fails() {
        let graph = graph();
        assert_eq!(
            graph.get_state(&"Z".into()),
            Err(GraphError::UnknownState("Z".into()))
        );
    }

    #[test]
    fn reset_replaces_all_states() {
        let mut graph = graph();
        let mut states = BTreeMap::new();
        states.insert(StateName::from("C"), state("C"));
        graph.reset_state_graph(states);
        assert_eq!(graph.len(), 1);
        assert!(graph.get_state(&"A".into()).is_err());
        assert!(graph.get_state(&"C".into()).is_ok());
    }

    #[test]
    fn outcome_to_other_state_is_transition() {
        let outcome = Outcome::new("B", SubtitledHtml::new("fb", "Nice")).labelled_correct();
        let result = StateGraph::compute_answer_outcome(&state("A"), &outcome);
        assert_eq!(result.destination, Destination::StateName("B".into()));
        assert!(result.labelled_as_correct);
        assert_eq!(result.feedback.html, "Nice");
    }

    #[test]
    fn outcome_to_current_state_is_same_state() {
        let outcome = Outcome::new("A", SubtitledHtml::default());
        let result = StateGraph::compute_answer_outcome(&state("A"), &outcome);
        assert!(result.is_same_state());
        assert!(result.next_state_name().is_none());
    }

    #[test]
    fn refresher_takes_precedence_over_everything() {
        let outcome = Outcome::new("A", SubtitledHtml::default())
            .with_refresher(ExplorationId::new("refresher"))
            .with_missing_prerequisite(SkillId::new("skill"));
        let result = StateGraph::compute_answer_outcome(&state("A"), &outcome);
        assert_eq!(
            result.destination,
            Destination::RefresherExploration(ExplorationId::new("refresher"))
        );
    }

    #[test]
    fn missing_prerequisite_beats_same_state_and_transition() {
        let outcome =
            Outcome::new("B", SubtitledHtml::default()).with_missing_prerequisite(SkillId::new("s"));
        let result = StateGraph::compute_answer_outcome(&state("A"), &outcome);
        assert_eq!(
            result.destination,
            Destination::MissingPrerequisiteSkill(SkillId::new("s"))
        );
    }

    #[test]
    fn empty_ids_are_ignored() {
        let outcome = Outcome::new("B", SubtitledHtml::default())
            .with_refresher(ExplorationId::new(""))
            .with_missing_prerequisite(SkillId::new(""));
        let result = StateGraph::compute_answer_outcome(&state("A"), &outcome);
        assert_eq!(result.destination, Destination::StateName("B".into()));
    }
}
