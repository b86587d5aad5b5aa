//! Question model shared by every prompt round, and the loop that drives a
//! [`Prompter`] through it.

use crate::error::{Result, ScaffoldError};
use indexmap::IndexMap;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;
use tracing::debug;

/// Prefix of the answer keys holding comma-separated custom function names.
pub const FUNCTION_NAMES_PREFIX: &str = "functionNames_";

// ---------------------------------------------------------------------------
// Answers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    Text(String),
    Bool(bool),
    Choice(String),
    Choices(Vec<String>),
}

impl Answer {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Answer::Text(s) | Answer::Choice(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Answer::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_choices(&self) -> &[String] {
        match self {
            Answer::Choices(v) => v,
            _ => &[],
        }
    }
}

pub type Answers = IndexMap<String, Answer>;

// ---------------------------------------------------------------------------
// Questions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    pub label: String,
    pub value: String,
}

impl Choice {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }

    pub fn same(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChoiceItem {
    Separator(String),
    Choice(Choice),
}

#[derive(Debug, Clone, PartialEq)]
pub enum QuestionKind {
    Input {
        default: Option<String>,
    },
    Confirm {
        default: bool,
    },
    Select {
        choices: Vec<Choice>,
        default: Option<String>,
    },
    MultiSelect {
        choices: Vec<ChoiceItem>,
        defaults: Vec<String>,
    },
}

/// When a question is shown, evaluated against the answers collected so far.
#[derive(Debug, Clone, PartialEq)]
pub enum Visibility {
    /// A multi-select answer contains this value.
    ChoiceIncludes { question: String, value: String },
    /// A single-select or text answer equals this value.
    Equals { question: String, value: String },
}

impl Visibility {
    pub fn holds(&self, answers: &Answers) -> bool {
        match self {
            Visibility::ChoiceIncludes { question, value } => answers
                .get(question)
                .is_some_and(|a| a.as_choices().contains(value)),
            Visibility::Equals { question, value } => answers
                .get(question)
                .and_then(Answer::as_text)
                .is_some_and(|a| a == value),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    Required,
    AtLeastOne(String),
    SemVer,
    /// Comma-separated names: at least one, unique, not in `taken`, and not
    /// typed for another action in the same batch.
    FunctionNames { taken: Vec<String> },
}

impl Validation {
    /// Returns the message to show when `answer` is rejected.
    pub fn check(&self, key: &str, answer: &Answer, answers: &Answers) -> Option<String> {
        match self {
            Validation::Required => match answer.as_text() {
                Some(s) if !s.trim().is_empty() => None,
                _ => Some("A value is required.".to_string()),
            },
            Validation::AtLeastOne(message) => {
                if answer.as_choices().is_empty() {
                    Some(message.clone())
                } else {
                    None
                }
            }
            Validation::SemVer => {
                let version = answer.as_text().unwrap_or("").trim();
                if is_semver(version) {
                    None
                } else {
                    Some(
                        "Please supply a valid semantic version of the form \
                         <major>.<minor>.<patch>[-annotation]. Examples: '0.1.0', '3.21.103', '3.9.22-alt'"
                            .to_string(),
                    )
                }
            }
            Validation::FunctionNames { taken } => {
                let names = split_names(answer.as_text().unwrap_or(""));
                if names.is_empty() {
                    return Some("Please supply at least one custom function name.".to_string());
                }
                if let Some(bad) = names.iter().find(|n| !is_function_name(n)) {
                    return Some(format!(
                        "'{bad}' is not a valid custom function name; use letters, digits, '.', '_' or '-'."
                    ));
                }
                let mut seen = HashSet::new();
                let mut others: HashSet<String> = taken.iter().cloned().collect();
                for (other_key, other) in answers {
                    if other_key != key && other_key.starts_with(FUNCTION_NAMES_PREFIX) {
                        others.extend(split_names(other.as_text().unwrap_or("")));
                    }
                }
                let clashes: Vec<&str> = names
                    .iter()
                    .filter(|n| !seen.insert(n.as_str()) || others.contains(n.as_str()))
                    .map(String::as_str)
                    .collect();
                if clashes.is_empty() {
                    None
                } else {
                    Some(format!(
                        "Custom function names must be unique. Already used: {}",
                        clashes.join(", ")
                    ))
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub name: String,
    pub message: String,
    pub kind: QuestionKind,
    pub when: Option<Visibility>,
    pub validate: Option<Validation>,
}

impl Question {
    pub fn new(name: impl Into<String>, message: impl Into<String>, kind: QuestionKind) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            kind,
            when: None,
            validate: None,
        }
    }

    pub fn when(mut self, visibility: Visibility) -> Self {
        self.when = Some(visibility);
        self
    }

    pub fn validate(mut self, validation: Validation) -> Self {
        self.validate = Some(validation);
        self
    }

    pub fn is_visible(&self, answers: &Answers) -> bool {
        self.when.as_ref().map_or(true, |w| w.holds(answers))
    }

    /// The answer taken when the question is not rendered.
    pub fn default_answer(&self) -> Answer {
        match &self.kind {
            QuestionKind::Input { default } => Answer::Text(default.clone().unwrap_or_default()),
            QuestionKind::Confirm { default } => Answer::Bool(*default),
            QuestionKind::Select { choices, default } => Answer::Choice(
                default
                    .clone()
                    .or_else(|| choices.first().map(|c| c.value.clone()))
                    .unwrap_or_default(),
            ),
            QuestionKind::MultiSelect { defaults, .. } => Answer::Choices(defaults.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// Prompter
// ---------------------------------------------------------------------------

/// Renders one question and collects its answer.
pub trait Prompter {
    fn ask(&mut self, question: &Question) -> Result<Answer>;

    /// Show a validation message before the question is asked again.
    fn reject(&mut self, question: &Question, message: &str);

    /// Whether a rejected answer can be asked again. Non-interactive
    /// prompters turn a rejection into an error.
    fn interactive(&self) -> bool {
        true
    }
}

/// Answers every question with its default, for `--skip-prompts` runs.
#[derive(Debug, Default)]
pub struct DefaultsPrompter;

impl Prompter for DefaultsPrompter {
    fn ask(&mut self, question: &Question) -> Result<Answer> {
        Ok(question.default_answer())
    }

    fn reject(&mut self, _question: &Question, _message: &str) {}

    fn interactive(&self) -> bool {
        false
    }
}

/// Ask each visible question in order, re-asking on validation failure.
/// Hidden questions record nothing.
pub fn ask_all(prompter: &mut dyn Prompter, questions: &[Question], answers: &mut Answers) -> Result<()> {
    for question in questions {
        if !question.is_visible(answers) {
            debug!(question = %question.name, "skipped by visibility predicate");
            continue;
        }
        loop {
            let answer = prompter.ask(question)?;
            let rejection = question
                .validate
                .as_ref()
                .and_then(|v| v.check(&question.name, &answer, answers));
            match rejection {
                None => {
                    answers.insert(question.name.clone(), answer);
                    break;
                }
                Some(message) if prompter.interactive() => prompter.reject(question, &message),
                Some(message) => {
                    return Err(ScaffoldError::InvalidAnswer {
                        question: question.name.clone(),
                        message,
                    })
                }
            }
        }
    }
    Ok(())
}

/// Split a comma-separated list, trimming whitespace and dropping blanks.
pub fn split_names(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

static FUNCTION_NAME_RE: OnceLock<Regex> = OnceLock::new();

pub fn is_function_name(name: &str) -> bool {
    FUNCTION_NAME_RE
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9_$][A-Za-z0-9_.$-]*$").unwrap())
        .is_match(name)
}

static SEMVER_RE: OnceLock<Regex> = OnceLock::new();

pub fn is_semver(version: &str) -> bool {
    SEMVER_RE
        .get_or_init(|| {
            Regex::new(r"^(0|[1-9]\d*)\.(0|[1-9]\d*)\.(0|[1-9]\d*)(-[0-9A-Za-z.-]+)?(\+[0-9A-Za-z.-]+)?$")
                .unwrap()
        })
        .is_match(version)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
