use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::prompt::{Prompter, Response, Step};

/// Pre-recorded answers for some or all of the three prompts.
#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Answers {
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub regex: bool,
    #[serde(default)]
    pub replacement: Option<String>,
    #[serde(default)]
    pub confirm: Option<bool>,
}

impl Answers {
    /// Fields set in `overrides` win.
    pub fn merge(mut self, overrides: Answers) -> Answers {
        if overrides.pattern.is_some() {
            self.pattern = overrides.pattern;
        }
        if overrides.regex {
            self.regex = true;
        }
        if overrides.replacement.is_some() {
            self.replacement = overrides.replacement;
        }
        if overrides.confirm.is_some() {
            self.confirm = overrides.confirm;
        }
        self
    }
}

pub fn load_answers(path: &Path) -> Result<Answers> {
    let data = fs::read(path).with_context(|| format!("reading answers {}", path.display()))?;
    let answers = if path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
    {
        serde_json::from_slice(&data)
            .with_context(|| format!("parsing answers {}", path.display()))?
    } else {
        serde_yaml::from_slice(&data)
            .with_context(|| format!("parsing answers {}", path.display()))?
    };
    Ok(answers)
}

/// Answers the prompts it has answers for and hands the rest to `fallback`.
pub struct ScriptedPrompter<P> {
    answers: Answers,
    fallback: P,
}

impl<P: Prompter> ScriptedPrompter<P> {
    pub fn new(answers: Answers, fallback: P) -> Self {
        Self { answers, fallback }
    }

    fn scripted(&mut self, step: Step) -> Option<Response> {
        match step {
            Step::Pattern => {
                let text = self.answers.pattern.take()?;
                Some(if self.answers.regex {
                    Response::RegexSubmit(text)
                } else {
                    Response::PlainSubmit(text)
                })
            }
            Step::Replacement => self
                .answers
                .replacement
                .take()
                .map(Response::ReplacementSubmit),
            Step::Confirmation => self.answers.confirm.take().map(|confirm| {
                if confirm {
                    Response::Confirm
                } else {
                    Response::Cancel
                }
            }),
        }
    }
}

impl<P: Prompter> Prompter for ScriptedPrompter<P> {
    fn show(&mut self, text: &str) -> Result<()> {
        self.fallback.show(text)
    }

    fn ask(&mut self, step: Step, text: &str) -> Result<Response> {
        match self.scripted(step) {
            Some(response) => {
                if step == Step::Confirmation {
                    self.fallback.show(text)?;
                }
                Ok(response)
            }
            None => self.fallback.ask(step, text),
        }
    }
}
