//! Exploration content model.
//!
//! These are the immutable value objects produced by the content loader:
//! an [`Exploration`] is a named set of [`State`]s plus the name of the state
//! a learner starts on. The JSON shape mirrors the authoring format, with each
//! state's name taken from its key in the `states` map.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ExplorationId, SkillId, StateName};

/// Interaction id marking the end of an exploration.
pub const TERMINAL_INTERACTION_ID: &str = "EndExploration";

/// HTML content paired with the id used to look up its translations and audio.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubtitledHtml {
    #[serde(default)]
    pub content_id: String,
    #[serde(default)]
    pub html: String,
}

impl SubtitledHtml {
    pub fn new(content_id: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            content_id: content_id.into(),
            html: html.into(),
        }
    }
}

/// A learner answer, or a rule input it is compared against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionObject {
    NormalizedString(String),
    Real(f64),
    NonNegativeInt(u32),
}

impl InteractionObject {
    pub fn text(value: impl Into<String>) -> Self {
        Self::NormalizedString(value.into())
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NormalizedString(_) => "normalized_string",
            Self::Real(_) => "real",
            Self::NonNegativeInt(_) => "non_negative_int",
        }
    }
}

/// Renders the bare answer value, as a learner typed or picked it.
impl fmt::Display for InteractionObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NormalizedString(value) => f.write_str(value),
            Self::Real(value) => write!(f, "{value}"),
            Self::NonNegativeInt(value) => write!(f, "{value}"),
        }
    }
}

/// Content-level result of classifying an answer.
///
/// Several routing fields may be populated at once in authored content; the
/// state graph resolves them into a single [`crate::Destination`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub dest_state_name: StateName,
    #[serde(default)]
    pub feedback: SubtitledHtml,
    #[serde(default)]
    pub labelled_as_correct: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresher_exploration_id: Option<ExplorationId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_prerequisite_skill_id: Option<SkillId>,
}

impl Outcome {
    pub fn new(dest_state_name: impl Into<StateName>, feedback: SubtitledHtml) -> Self {
        Self {
            dest_state_name: dest_state_name.into(),
            feedback,
            labelled_as_correct: false,
            refresher_exploration_id: None,
            missing_prerequisite_skill_id: None,
        }
    }

    #[must_use]
    pub fn labelled_correct(mut self) -> Self {
        self.labelled_as_correct = true;
        self
    }

    #[must_use]
    pub fn with_refresher(mut self, id: ExplorationId) -> Self {
        self.refresher_exploration_id = Some(id);
        self
    }

    #[must_use]
    pub fn with_missing_prerequisite(mut self, id: SkillId) -> Self {
        self.missing_prerequisite_skill_id = Some(id);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub rule_type: String,
    #[serde(default)]
    pub inputs: BTreeMap<String, InteractionObject>,
}

impl RuleSpec {
    pub fn new(rule_type: impl Into<String>) -> Self {
        Self {
            rule_type: rule_type.into(),
            inputs: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_input(mut self, name: impl Into<String>, value: InteractionObject) -> Self {
        self.inputs.insert(name.into(), value);
        self
    }
}

/// Rules sharing one outcome. The group matches when any of its rules match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerGroup {
    #[serde(default)]
    pub rule_specs: Vec<RuleSpec>,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub id: String,
    #[serde(default)]
    pub answer_groups: Vec<AnswerGroup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_outcome: Option<Outcome>,
}

impl Interaction {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            answer_groups: Vec::new(),
            default_outcome: None,
        }
    }

    #[must_use]
    pub fn terminal() -> Self {
        Self::new(TERMINAL_INTERACTION_ID)
    }

    #[must_use]
    pub fn with_answer_group(mut self, group: AnswerGroup) -> Self {
        self.answer_groups.push(group);
        self
    }

    #[must_use]
    pub fn with_default_outcome(mut self, outcome: Outcome) -> Self {
        self.default_outcome = Some(outcome);
        self
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.id == TERMINAL_INTERACTION_ID
    }
}

/// One card of an exploration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Filled from the `states` map key when absent in JSON.
    #[serde(default)]
    pub name: StateName,
    pub content: SubtitledHtml,
    pub interaction: Interaction,
}

impl State {
    pub fn new(name: impl Into<StateName>, content: SubtitledHtml, interaction: Interaction) -> Self {
        Self {
            name: name.into(),
            content,
            interaction,
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.interaction.is_terminal()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExplorationError {
    #[error("state keyed '{key}' declares a different name '{name}'")]
    StateNameMismatch { key: StateName, name: StateName },
    #[error("state names must not be empty")]
    EmptyStateName,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ExplorationWire")]
pub struct Exploration {
    pub id: ExplorationId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub objective: String,
    #[serde(default)]
    pub language_code: String,
    pub init_state_name: StateName,
    pub states: BTreeMap<StateName, State>,
}

#[derive(Deserialize)]
struct ExplorationWire {
    id: ExplorationId,
    #[serde(default)]
    title: String,
    #[serde(default)]
    objective: String,
    #[serde(default)]
    language_code: String,
    init_state_name: StateName,
    states: BTreeMap<StateName, State>,
}

impl TryFrom<ExplorationWire> for Exploration {
    type Error = ExplorationError;

    fn try_from(wire: ExplorationWire) -> Result<Self, Self::Error> {
        let mut states = BTreeMap::new();
        for (key, mut state) in wire.states {
            if key.as_str().is_empty() {
                return Err(ExplorationError::EmptyStateName);
            }
            if state.name.as_str().is_empty() {
                state.name = key.clone();
            } else if state.name != key {
                return Err(ExplorationError::StateNameMismatch {
                    key,
                    name: state.name,
                });
            }
            states.insert(key, state);
        }
        Ok(Self {
            id: wire.id,
            title: wire.title,
            objective: wire.objective,
            language_code: wire.language_code,
            init_state_name: wire.init_state_name,
            states,
        })
    }
}

impl Exploration {
    /// Builds an exploration keyed by each state's own name.
    pub fn new(
        id: ExplorationId,
        init_state_name: impl Into<StateName>,
        states: impl IntoIterator<Item = State>,
    ) -> Self {
        Self {
            id,
            title: String::new(),
            objective: String::new(),
            language_code: String::new(),
            init_state_name: init_state_name.into(),
            states: states
                .into_iter()
                .map(|state| (state.name.clone(), state))
                .collect(),
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}
