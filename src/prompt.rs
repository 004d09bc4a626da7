use crate::binding::constraint::ConstraintSet;
use crate::binding::{missing_arguments, RawInput};
use crate::endpoint::{EndpointDescriptor, ParamKind};
use crate::error::Result;
use colored::Colorize;
use console::Term;
use dialoguer::{Input, Select};

/// Terminal interaction used to fill in missing values.
pub trait Prompter: Send + Sync {
    fn note(&self, lines: &[String]) -> Result<()>;

    /// Offers a closed set of choices and returns the selected one.
    fn choose(&self, question: &str, choices: &[String], default: Option<usize>) -> Result<String>;

    fn ask(&self, question: &str, default: Option<&str>) -> Result<String>;

    fn report(&self, message: &str) -> Result<()>;
}

pub struct TerminalPrompter {
    term: Term,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        TerminalPrompter {
            term: Term::stderr(),
        }
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for TerminalPrompter {
    fn note(&self, lines: &[String]) -> Result<()> {
        for line in lines.iter().filter(|line| !line.is_empty()) {
            self.term
                .write_line(&format!("{} {}", "! [NOTE]".yellow(), line))?;
        }
        Ok(())
    }

    fn choose(&self, question: &str, choices: &[String], default: Option<usize>) -> Result<String> {
        let index = Select::new()
            .with_prompt(question)
            .items(choices)
            .default(default.unwrap_or(0))
            .interact_on(&self.term)?;

        Ok(choices[index].clone())
    }

    fn ask(&self, question: &str, default: Option<&str>) -> Result<String> {
        let mut input = Input::<String>::new()
            .with_prompt(question)
            .allow_empty(true);
        if let Some(default) = default {
            input = input.default(default.to_string());
        }

        Ok(input.interact_text_on(&self.term)?)
    }

    fn report(&self, message: &str) -> Result<()> {
        self.term
            .write_line(&format!("{} {}", "[ERROR]".red().bold(), message))?;
        Ok(())
    }
}

/// Asks until the answer satisfies `constraints`. There is no attempt limit.
pub fn ask_until_valid(
    prompter: &dyn Prompter,
    question: &str,
    default: Option<&str>,
    constraints: &ConstraintSet,
) -> Result<String> {
    loop {
        let answer = prompter.ask(question, default)?;
        match constraints.validate(&answer) {
            Ok(()) => return Ok(answer),
            Err(message) => {
                tracing::debug!(question, %message, "Rejected interactive answer");
                prompter.report(&message)?;
            }
        }
    }
}

/// Prompts for every required parameter the invocation left out.
///
/// Non-interactive runs fail on the first missing value instead.
pub fn fill_missing(
    descriptor: &EndpointDescriptor,
    input: &mut RawInput,
    prompter: &dyn Prompter,
    interactive: bool,
) -> Result<()> {
    let positional = descriptor.positional_params();
    let ordered = positional
        .iter()
        .copied()
        .chain(descriptor.option_params().filter(|spec| spec.required));

    for spec in ordered {
        if input.value(&spec.name).is_some() {
            continue;
        }
        if !interactive {
            return Err(missing_arguments(std::slice::from_ref(&spec.name)));
        }

        prompter.note(&[
            format!("{} is a required argument.", spec.name),
            spec.description.clone().unwrap_or_default(),
        ])?;

        let answer = match &spec.kind {
            ParamKind::Enum(choices) => {
                let default = spec
                    .default
                    .as_ref()
                    .and_then(|d| choices.values.iter().position(|v| v == d));
                prompter.choose(
                    &format!("Please select a value for {}", spec.name),
                    &choices.values,
                    default,
                )?
            }
            _ => {
                let constraints = ConstraintSet::for_param(spec).unwrap_or_default();
                ask_until_valid(
                    prompter,
                    &format!("Please enter a value for {}", spec.name),
                    spec.default.as_deref(),
                    &constraints,
                )?
            }
        };
        input.supply(&spec.name, answer);
    }

    Ok(())
}
