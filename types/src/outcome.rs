use serde::{Deserialize, Serialize};

use crate::{ExplorationId, SkillId, StateName, SubtitledHtml};

/// Where a resolved answer sends the learner. Exactly one applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    /// The learner stays on the current card.
    SameState,
    /// The learner moves to another card of this exploration.
    StateName(StateName),
    /// The learner should be sent to a refresher exploration.
    RefresherExploration(ExplorationId),
    /// The learner is missing a prerequisite skill and should review it.
    MissingPrerequisiteSkill(SkillId),
}

/// Engine-level result of submitting an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOutcome {
    pub feedback: SubtitledHtml,
    pub labelled_as_correct: bool,
    pub destination: Destination,
}

impl AnswerOutcome {
    /// The state to push onto the deck, if this outcome routes to one.
    #[must_use]
    pub fn next_state_name(&self) -> Option<&StateName> {
        match &self.destination {
            Destination::StateName(name) => Some(name),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_same_state(&self) -> bool {
        matches!(self.destination, Destination::SameState)
    }
}
