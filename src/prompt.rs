use anyhow::{bail, Result};
use dialoguer::{Confirm, Input, Select};
use owo_colors::OwoColorize;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::ErrorKind;

/// Validation predicate for text input. Returns a user-facing message on
/// rejection.
pub type Validator<'a> = &'a dyn Fn(&str) -> Result<(), String>;

/// Boundary to the interactive terminal. Every method returns `Ok(None)`
/// when the user cancels (Esc or Ctrl-C), which callers treat as a graceful
/// abort rather than an error.
pub trait Prompter {
    fn input(
        &self,
        prompt: &str,
        default: Option<&str>,
        validator: Option<Validator>,
    ) -> Result<Option<String>>;

    fn select(&self, prompt: &str, items: &[String]) -> Result<Option<usize>>;

    fn confirm(&self, prompt: &str, default: bool) -> Result<Option<bool>>;
}

/// Real terminal prompting via dialoguer.
pub struct TermPrompter;

fn is_cancel(err: &dialoguer::Error) -> bool {
    let dialoguer::Error::IO(io_err) = err;
    io_err.kind() == ErrorKind::Interrupted
}

impl Prompter for TermPrompter {
    fn input(
        &self,
        prompt: &str,
        default: Option<&str>,
        validator: Option<Validator>,
    ) -> Result<Option<String>> {
        loop {
            let mut input = Input::<String>::new().with_prompt(prompt);
            if let Some(d) = default {
                input = input.default(d.to_string());
            }
            match input.interact_text() {
                Ok(answer) => {
                    if let Some(validate) = validator {
                        if let Err(msg) = validate(&answer) {
                            eprintln!("{}", msg.red());
                            continue;
                        }
                    }
                    return Ok(Some(answer));
                }
                Err(e) if is_cancel(&e) => return Ok(None),
                Err(e) => bail!("Failed to read input: {}", e),
            }
        }
    }

    fn select(&self, prompt: &str, items: &[String]) -> Result<Option<usize>> {
        match Select::new()
            .with_prompt(prompt)
            .items(items)
            .default(0)
            .interact_opt()
        {
            Ok(choice) => Ok(choice),
            Err(e) if is_cancel(&e) => Ok(None),
            Err(e) => bail!("Failed to read selection: {}", e),
        }
    }

    fn confirm(&self, prompt: &str, default: bool) -> Result<Option<bool>> {
        match Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact_opt()
        {
            Ok(choice) => Ok(choice),
            Err(e) if is_cancel(&e) => Ok(None),
            Err(e) => bail!("Failed to read confirmation: {}", e),
        }
    }
}

/// A scripted answer for [`ScriptedPrompter`].
#[derive(Debug, Clone)]
pub enum Answer {
    Text(String),
    Select(usize),
    Confirm(bool),
    /// User cancelled at this prompt.
    Cancel,
}

/// Non-interactive prompter fed from a fixed answer queue. Used by tests
/// and available for scripting; answers are consumed in order and a type
/// mismatch or an exhausted queue is an error.
pub struct ScriptedPrompter {
    answers: RefCell<VecDeque<Answer>>,
}

impl ScriptedPrompter {
    pub fn new(answers: Vec<Answer>) -> Self {
        Self {
            answers: RefCell::new(answers.into()),
        }
    }

    fn next(&self, prompt: &str) -> Result<Answer> {
        match self.answers.borrow_mut().pop_front() {
            Some(answer) => Ok(answer),
            None => bail!("No scripted answer left for prompt: {}", prompt),
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn input(
        &self,
        prompt: &str,
        default: Option<&str>,
        validator: Option<Validator>,
    ) -> Result<Option<String>> {
        let answer = match self.next(prompt)? {
            Answer::Text(text) if text.is_empty() => match default {
                Some(d) => d.to_string(),
                None => text,
            },
            Answer::Text(text) => text,
            Answer::Cancel => return Ok(None),
            other => bail!("Expected text answer for '{}', got {:?}", prompt, other),
        };
        if let Some(validate) = validator {
            if let Err(msg) = validate(&answer) {
                bail!("Scripted answer '{}' rejected: {}", answer, msg);
            }
        }
        Ok(Some(answer))
    }

    fn select(&self, prompt: &str, items: &[String]) -> Result<Option<usize>> {
        match self.next(prompt)? {
            Answer::Select(index) if index < items.len() => Ok(Some(index)),
            Answer::Select(index) => bail!(
                "Scripted selection {} out of range for '{}' ({} items)",
                index,
                prompt,
                items.len()
            ),
            Answer::Cancel => Ok(None),
            other => bail!("Expected selection for '{}', got {:?}", prompt, other),
        }
    }

    fn confirm(&self, prompt: &str, _default: bool) -> Result<Option<bool>> {
        match self.next(prompt)? {
            Answer::Confirm(value) => Ok(Some(value)),
            Answer::Cancel => Ok(None),
            other => bail!("Expected confirmation for '{}', got {:?}", prompt, other),
        }
    }
}
