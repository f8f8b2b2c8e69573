//! Answer classification.
//!
//! The engine only depends on [`AnswerClassifier`]. [`RuleClassifier`] is the
//! built-in implementation covering the common interactions: answer groups are
//! evaluated in order, a group matches when any of its rules match, and the
//! interaction's default outcome applies when nothing matches.

use std::mem;

use thiserror::Error;

use wayfinder_types::{InteractionObject, Outcome, RuleSpec, State, StateName};

/// Tolerance used by numeric `Equals`.
const NUMERIC_EQUALITY_TOLERANCE: f64 = 1e-5;

/// Maximum edit distance accepted by `FuzzyEquals`.
const FUZZY_MAX_EDITS: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassificationError {
    #[error("encountered unknown interaction type '{0}'")]
    UnknownInteraction(String),
    #[error("interaction {interaction} has no classifier for rule type '{rule_type}'")]
    UnknownRule {
        interaction: String,
        rule_type: String,
    },
    #[error("rule {rule_type} is missing input '{input}'")]
    MissingInput { rule_type: String, input: String },
    #[error("rule {rule_type} expects input '{input}' to be {expected}")]
    InvalidInput {
        rule_type: String,
        input: String,
        expected: &'static str,
    },
    #[error("interaction {interaction} expects a {expected} answer, got {actual}")]
    AnswerTypeMismatch {
        interaction: String,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("state '{0}' is terminal and does not accept answers")]
    TerminalInteraction(StateName),
    #[error("no answer group matched in state '{0}' and it has no default outcome")]
    NoDefaultOutcome(StateName),
}

/// Maps a learner's answer on a state to the outcome it earns.
///
/// Implementations must behave as pure functions of their inputs.
pub trait AnswerClassifier: Send + Sync {
    fn classify(
        &self,
        state: &State,
        answer: &InteractionObject,
    ) -> Result<Outcome, ClassificationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InteractionKind {
    Continue,
    TextInput,
    NumericInput,
    MultipleChoiceInput,
    EndExploration,
}

impl InteractionKind {
    fn parse(id: &str) -> Option<Self> {
        match id {
            "Continue" => Some(Self::Continue),
            "TextInput" => Some(Self::TextInput),
            "NumericInput" => Some(Self::NumericInput),
            "MultipleChoiceInput" => Some(Self::MultipleChoiceInput),
            "EndExploration" => Some(Self::EndExploration),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Continue => "Continue",
            Self::TextInput => "TextInput",
            Self::NumericInput => "NumericInput",
            Self::MultipleChoiceInput => "MultipleChoiceInput",
            Self::EndExploration => "EndExploration",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RuleClassifier;

impl RuleClassifier {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl AnswerClassifier for RuleClassifier {
    fn classify(
        &self,
        state: &State,
        answer: &InteractionObject,
    ) -> Result<Outcome, ClassificationError> {
        let interaction = &state.interaction;
        let kind = InteractionKind::parse(&interaction.id)
            .ok_or_else(|| ClassificationError::UnknownInteraction(interaction.id.clone()))?;
        if kind == InteractionKind::EndExploration {
            return Err(ClassificationError::TerminalInteraction(state.name.clone()));
        }

        for group in &interaction.answer_groups {
            for rule in &group.rule_specs {
                if rule_matches(kind, rule, answer)? {
                    tracing::trace!(
                        state = %state.name,
                        rule = %rule.rule_type,
                        dest = %group.outcome.dest_state_name,
                        "Answer matched rule"
                    );
                    return Ok(group.outcome.clone());
                }
            }
        }

        interaction
            .default_outcome
            .clone()
            .ok_or_else(|| ClassificationError::NoDefaultOutcome(state.name.clone()))
    }
}

fn rule_matches(
    kind: InteractionKind,
    rule: &RuleSpec,
    answer: &InteractionObject,
) -> Result<bool, ClassificationError> {
    match kind {
        InteractionKind::TextInput => text_rule_matches(rule, answer),
        InteractionKind::NumericInput => numeric_rule_matches(rule, answer),
        InteractionKind::MultipleChoiceInput => choice_rule_matches(rule, answer),
        InteractionKind::Continue | InteractionKind::EndExploration => Err(unknown_rule(kind, rule)),
    }
}

fn text_rule_matches(rule: &RuleSpec, answer: &InteractionObject) -> Result<bool, ClassificationError> {
    let InteractionObject::NormalizedString(answer) = answer else {
        return Err(mismatch(InteractionKind::TextInput, "normalized_string", answer));
    };
    let matches = match rule.rule_type.as_str() {
        "Equals" => normalize(answer) == normalize(string_input(rule, "x")?),
        "CaseSensitiveEquals" => answer.trim() == string_input(rule, "x")?.trim(),
        "Contains" => normalize(answer).contains(&normalize(string_input(rule, "x")?)),
        "StartsWith" => normalize(answer).starts_with(&normalize(string_input(rule, "x")?)),
        "FuzzyEquals" => {
            edit_distance(&normalize(answer), &normalize(string_input(rule, "x")?))
                <= FUZZY_MAX_EDITS
        }
        _ => return Err(unknown_rule(InteractionKind::TextInput, rule)),
    };
    Ok(matches)
}

fn numeric_rule_matches(
    rule: &RuleSpec,
    answer: &InteractionObject,
) -> Result<bool, ClassificationError> {
    let answer = match answer {
        InteractionObject::Real(value) => *value,
        InteractionObject::NonNegativeInt(value) => f64::from(*value),
        InteractionObject::NormalizedString(_) => {
            return Err(mismatch(InteractionKind::NumericInput, "real", answer));
        }
    };
    let matches = match rule.rule_type.as_str() {
        "Equals" => (answer - real_input(rule, "x")?).abs() < NUMERIC_EQUALITY_TOLERANCE,
        "IsLessThan" => answer < real_input(rule, "x")?,
        "IsGreaterThan" => answer > real_input(rule, "x")?,
        "IsLessThanOrEqualTo" => answer <= real_input(rule, "x")?,
        "IsGreaterThanOrEqualTo" => answer >= real_input(rule, "x")?,
        "IsInclusivelyBetween" => {
            let low = real_input(rule, "a")?;
            let high = real_input(rule, "b")?;
            low <= answer && answer <= high
        }
        "IsWithinTolerance" => {
            let target = real_input(rule, "x")?;
            let tolerance = real_input(rule, "tol")?;
            (answer - target).abs() <= tolerance
        }
        _ => return Err(unknown_rule(InteractionKind::NumericInput, rule)),
    };
    Ok(matches)
}

fn choice_rule_matches(
    rule: &RuleSpec,
    answer: &InteractionObject,
) -> Result<bool, ClassificationError> {
    let InteractionObject::NonNegativeInt(choice) = answer else {
        return Err(mismatch(
            InteractionKind::MultipleChoiceInput,
            "non_negative_int",
            answer,
        ));
    };
    match rule.rule_type.as_str() {
        "Equals" => match input(rule, "x")? {
            InteractionObject::NonNegativeInt(expected) => Ok(choice == expected),
            _ => Err(invalid_input(rule, "x", "non_negative_int")),
        },
        _ => Err(unknown_rule(InteractionKind::MultipleChoiceInput, rule)),
    }
}

fn input<'a>(rule: &'a RuleSpec, name: &str) -> Result<&'a InteractionObject, ClassificationError> {
    rule.inputs
        .get(name)
        .ok_or_else(|| ClassificationError::MissingInput {
            rule_type: rule.rule_type.clone(),
            input: name.to_string(),
        })
}

fn string_input<'a>(rule: &'a RuleSpec, name: &str) -> Result<&'a str, ClassificationError> {
    match input(rule, name)? {
        InteractionObject::NormalizedString(value) => Ok(value),
        _ => Err(invalid_input(rule, name, "normalized_string")),
    }
}

fn real_input(rule: &RuleSpec, name: &str) -> Result<f64, ClassificationError> {
    match input(rule, name)? {
        InteractionObject::Real(value) => Ok(*value),
        InteractionObject::NonNegativeInt(value) => Ok(f64::from(*value)),
        InteractionObject::NormalizedString(_) => Err(invalid_input(rule, name, "real")),
    }
}

fn unknown_rule(kind: InteractionKind, rule: &RuleSpec) -> ClassificationError {
    ClassificationError::UnknownRule {
        interaction: kind.as_str().to_string(),
        rule_type: rule.rule_type.clone(),
    }
}

fn invalid_input(rule: &RuleSpec, name: &str, expected: &'static str) -> ClassificationError {
    ClassificationError::InvalidInput {
        rule_type: rule.rule_type.clone(),
        input: name.to_string(),
        expected,
    }
}

fn mismatch(
    kind: InteractionKind,
    expected: &'static str,
    answer: &InteractionObject,
) -> ClassificationError {
    ClassificationError::AnswerTypeMismatch {
        interaction: kind.as_str().to_string(),
        expected,
        actual: answer.kind(),
    }
}

/// Lowercases and collapses runs of whitespace.
fn normalize(value: &str) -> String {
    value
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];
    for (i, ca) in a.chars().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != *cb);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfinder_types::{AnswerGroup, Interaction, SubtitledHtml};

    fn outcome(dest: &str) -> Outcome {
        Outcome::new(dest, SubtitledHtml::new("fb", dest))
    }

    fn state_with(interaction: Interaction) -> State {
        State::new("Question", SubtitledHtml::new("c", "?"), interaction)
    }

    fn text_state(rule_type: &str, x: &str) -> State {
        state_with(
            Interaction::new("TextInput")
                .with_answer_group(AnswerGroup {
                    rule_specs: vec![
                        RuleSpec::new(rule_type).with_input("x", InteractionObject::text(x)),
                    ],
                    outcome: outcome("Matched"),
                })
                .with_default_outcome(outcome("Question")),
        )
    }

    fn numeric_state(rule: RuleSpec) -> State {
        state_with(
            Interaction::new("NumericInput")
                .with_answer_group(AnswerGroup {
                    rule_specs: vec![rule],
                    outcome: outcome("Matched"),
                })
                .with_default_outcome(outcome("Question")),
        )
    }

    fn dest(state: &State, answer: InteractionObject) -> String {
        RuleClassifier
            .classify(state, &answer)
            .unwrap()
            .dest_state_name
            .to_string()
    }

    #[test]
    fn continue_uses_default_outcome() {
        let state = state_with(Interaction::new("Continue").with_default_outcome(outcome("Next")));
        assert_eq!(dest(&state, InteractionObject::text("Continue")), "Next");
    }

    #[test]
    fn text_equals_ignores_case_and_spacing() {
        let state = text_state("Equals", "Finnish");
        assert_eq!(dest(&state, InteractionObject::text("  finnish ")), "Matched");
        assert_eq!(dest(&state, InteractionObject::text("Swedish")), "Question");
    }

    #[test]
    fn text_case_sensitive_equals() {
        let state = text_state("CaseSensitiveEquals", "Finnish");
        assert_eq!(dest(&state, InteractionObject::text("Finnish")), "Matched");
        assert_eq!(dest(&state, InteractionObject::text("finnish")), "Question");
    }

    #[test]
    fn text_contains_and_starts_with() {
        let contains = text_state("Contains", "fin");
        assert_eq!(dest(&contains, InteractionObject::text("It is Finnish")), "Matched");
        let starts = text_state("StartsWith", "fin");
        assert_eq!(dest(&starts, InteractionObject::text("It is Finnish")), "Question");
        assert_eq!(dest(&starts, InteractionObject::text("Finnish")), "Matched");
    }

    #[test]
    fn text_fuzzy_equals_allows_one_edit() {
        let state = text_state("FuzzyEquals", "Finnish");
        assert_eq!(dest(&state, InteractionObject::text("Finish")), "Matched");
        assert_eq!(dest(&state, InteractionObject::text("Fish")), "Question");
    }

    #[test]
    fn numeric_rules() {
        let x = |v| InteractionObject::Real(v);
        let equals = numeric_state(RuleSpec::new("Equals").with_input("x", x(2.5)));
        assert_eq!(dest(&equals, x(2.5)), "Matched");
        assert_eq!(dest(&equals, x(2.6)), "Question");

        let less = numeric_state(RuleSpec::new("IsLessThan").with_input("x", x(3.0)));
        assert_eq!(dest(&less, x(2.0)), "Matched");
        assert_eq!(dest(&less, x(3.0)), "Question");

        let at_most = numeric_state(RuleSpec::new("IsLessThanOrEqualTo").with_input("x", x(3.0)));
        assert_eq!(dest(&at_most, x(3.0)), "Matched");

        let between = numeric_state(
            RuleSpec::new("IsInclusivelyBetween")
                .with_input("a", x(1.0))
                .with_input("b", x(2.0)),
        );
        assert_eq!(dest(&between, x(1.0)), "Matched");
        assert_eq!(dest(&between, x(2.01)), "Question");

        let tolerance = numeric_state(
            RuleSpec::new("IsWithinTolerance")
                .with_input("x", x(10.0))
                .with_input("tol", x(0.5)),
        );
        assert_eq!(dest(&tolerance, x(10.4)), "Matched");
        assert_eq!(dest(&tolerance, InteractionObject::NonNegativeInt(11)), "Question");
    }

    #[test]
    fn multiple_choice_equals() {
        let state = state_with(
            Interaction::new("MultipleChoiceInput")
                .with_answer_group(AnswerGroup {
                    rule_specs: vec![
                        RuleSpec::new("Equals").with_input("x", InteractionObject::NonNegativeInt(2)),
                    ],
                    outcome: outcome("Matched"),
                })
                .with_default_outcome(outcome("Question")),
        );
        assert_eq!(dest(&state, InteractionObject::NonNegativeInt(2)), "Matched");
        assert_eq!(dest(&state, InteractionObject::NonNegativeInt(0)), "Question");
    }

    #[test]
    fn first_matching_group_wins() {
        let group = |x: &str, dest: &str| AnswerGroup {
            rule_specs: vec![RuleSpec::new("Contains").with_input("x", InteractionObject::text(x))],
            outcome: outcome(dest),
        };
        let state = state_with(
            Interaction::new("TextInput")
                .with_answer_group(group("a", "First"))
                .with_answer_group(group("b", "Second"))
                .with_default_outcome(outcome("Question")),
        );
        assert_eq!(dest(&state, InteractionObject::text("ab")), "First");
        assert_eq!(dest(&state, InteractionObject::text("b")), "Second");
    }

    #[test]
    fn group_matches_when_any_rule_matches() {
        let state = state_with(
            Interaction::new("TextInput")
                .with_answer_group(AnswerGroup {
                    rule_specs: vec![
                        RuleSpec::new("Equals").with_input("x", InteractionObject::text("one")),
                        RuleSpec::new("Equals").with_input("x", InteractionObject::text("two")),
                    ],
                    outcome: outcome("Matched"),
                })
                .with_default_outcome(outcome("Question")),
        );
        assert_eq!(dest(&state, InteractionObject::text("two")), "Matched");
    }

    #[test]
    fn unknown_interaction_fails() {
        let state = state_with(Interaction::new("DragAndDrop"));
        let err = RuleClassifier
            .classify(&state, &InteractionObject::text("x"))
            .unwrap_err();
        assert_eq!(err, ClassificationError::UnknownInteraction("DragAndDrop".into()));
    }

    #[test]
    fn unknown_rule_fails() {
        let state = text_state("SoundsLike", "x");
        let err = RuleClassifier
            .classify(&state, &InteractionObject::text("x"))
            .unwrap_err();
        assert!(matches!(err, ClassificationError::UnknownRule { .. }));
    }

    #[test]
    fn terminal_state_rejects_answers() {
        let state = state_with(Interaction::terminal());
        let err = RuleClassifier
            .classify(&state, &InteractionObject::text("x"))
            .unwrap_err();
        assert_eq!(err, ClassificationError::TerminalInteraction("Question".into()));
    }

    #[test]
    fn wrong_answer_type_fails() {
        let state = text_state("Equals", "x");
        let err = RuleClassifier
            .classify(&state, &InteractionObject::Real(1.0))
            .unwrap_err();
        assert!(matches!(err, ClassificationError::AnswerTypeMismatch { .. }));
    }

    #[test]
    fn missing_default_outcome_fails() {
        let state = state_with(Interaction::new("TextInput"));
        let err = RuleClassifier
            .classify(&state, &InteractionObject::text("x"))
            .unwrap_err();
        assert_eq!(err, ClassificationError::NoDefaultOutcome("Question".into()));
    }

    #[test]
    fn missing_rule_input_fails() {
        let state = numeric_state(RuleSpec::new("IsInclusivelyBetween").with_input("a", InteractionObject::Real(1.0)));
        let err = RuleClassifier
            .classify(&state, &InteractionObject::Real(1.5))
            .unwrap_err();
        assert_eq!(
            err,
            ClassificationError::MissingInput {
                rule_type: "IsInclusivelyBetween".into(),
                input: "b".into(),
            }
        );
    }

    #[test]
    fn edit_distance_counts_single_edits() {
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("same", "same"), 0);
    }
}
