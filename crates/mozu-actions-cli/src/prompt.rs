//! Terminal rendering of core questions with dialoguer.

use console::style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, MultiSelect, Select};
use mozu_actions_core::prompt::{Answer, Choice, ChoiceItem, Prompter, Question, QuestionKind};
use mozu_actions_core::{Result, ScaffoldError};

#[derive(Default)]
pub struct TermPrompter {
    theme: ColorfulTheme,
}

fn term_error(e: dialoguer::Error) -> ScaffoldError {
    let dialoguer::Error::IO(io) = e;
    ScaffoldError::Io(io)
}

impl Prompter for TermPrompter {
    fn ask(&mut self, question: &Question) -> Result<Answer> {
        let answer = match &question.kind {
            QuestionKind::Input { default } => {
                let mut input = Input::<String>::with_theme(&self.theme)
                    .with_prompt(&question.message)
                    .allow_empty(true);
                if let Some(d) = default.as_ref().filter(|d| !d.is_empty()) {
                    input = input.default(d.clone());
                }
                Answer::Text(input.interact_text().map_err(term_error)?)
            }
            QuestionKind::Confirm { default } => Answer::Bool(
                Confirm::with_theme(&self.theme)
                    .with_prompt(&question.message)
                    .default(*default)
                    .interact()
                    .map_err(term_error)?,
            ),
            QuestionKind::Select { choices, default } => {
                let labels: Vec<&str> = choices.iter().map(|c| c.label.as_str()).collect();
                let selected = default
                    .as_ref()
                    .and_then(|d| choices.iter().position(|c| &c.value == d))
                    .unwrap_or(0);
                let idx = Select::with_theme(&self.theme)
                    .with_prompt(&question.message)
                    .items(&labels)
                    .default(selected)
                    .interact()
                    .map_err(term_error)?;
                Answer::Choice(choices[idx].value.clone())
            }
            QuestionKind::MultiSelect { choices, defaults } => {
                // Separators head the list; dialoguer has no unselectable rows.
                for item in choices {
                    if let ChoiceItem::Separator(text) = item {
                        eprintln!("{}", style(text).dim());
                    }
                }
                let options: Vec<&Choice> = choices
                    .iter()
                    .filter_map(|item| match item {
                        ChoiceItem::Choice(c) => Some(c),
                        ChoiceItem::Separator(_) => None,
                    })
                    .collect();
                let labels: Vec<&str> = options.iter().map(|c| c.label.as_str()).collect();
                let checked: Vec<bool> = options.iter().map(|c| defaults.contains(&c.value)).collect();
                let picked = MultiSelect::with_theme(&self.theme)
                    .with_prompt(&question.message)
                    .items(&labels)
                    .defaults(&checked)
                    .interact()
                    .map_err(term_error)?;
                Answer::Choices(picked.into_iter().map(|i| options[i].value.clone()).collect())
            }
        };
        Ok(answer)
    }

    fn reject(&mut self, _question: &Question, message: &str) {
        eprintln!("{} {message}", style(">>").red());
    }
}
