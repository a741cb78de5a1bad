use std::fmt::{self, Write as _};

use anyhow::{Context, Result, bail};

use crate::diff::render_rename;
use crate::files::FileEntry;
use crate::logging::{ChangeLog, json_event};
use crate::pattern::Pattern;
use crate::planner::{EmptyPlanReason, RenamePlan, build_plan};
use crate::prompt::{Prompter, Response, Step};
use crate::rename::{FileSystem, execute_plan};

/// Only the pattern prompt is capped; the rename always covers every file.
pub const MAX_SHOWN_FILES: usize = 200;

const EMPTY_PATTERN_MESSAGE: &str = "You need to type something to search for!";

const REPLACEMENT_PROMPT: &str = "\
Type the text to replace the match with.
Use \"&\" as a macro for the matched text.
Use \\& to insert the character only.
You'll get to see the changes before they are made.";

/// Where the session was when an error escaped it.
#[derive(Debug, Clone)]
pub struct SessionSnapshot(String);

impl fmt::Display for SessionSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "while running rename session ({})", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Renamed(usize),
    NothingToDo,
    Cancelled,
    EmptyPattern,
}

#[derive(Debug)]
enum State {
    AwaitPattern,
    AwaitReplacement {
        pattern: Pattern,
    },
    AwaitConfirmation {
        pattern: Pattern,
        template: String,
        plan: RenamePlan,
    },
    Execute {
        plan: RenamePlan,
    },
    Done(Outcome),
}

impl State {
    /// Compact description attached to unexpected errors for bug reports.
    fn snapshot(&self, files: usize) -> SessionSnapshot {
        let description = match self {
            State::AwaitPattern => format!("state=AwaitPattern files={files}"),
            State::AwaitReplacement { pattern } => format!(
                "state=AwaitReplacement files={files} pattern={:?} mode={}",
                pattern.text(),
                pattern.mode()
            ),
            State::AwaitConfirmation {
                pattern,
                template,
                plan,
            } => format!(
                "state=AwaitConfirmation files={files} pattern={:?} mode={} template={template:?} queued={}",
                pattern.text(),
                pattern.mode(),
                plan.len()
            ),
            State::Execute { plan } => format!("state=Execute files={files} queued={}", plan.len()),
            State::Done(outcome) => format!("state=Done({outcome:?}) files={files}"),
        };
        SessionSnapshot(description)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SessionOptions {
    pub colorize: bool,
    pub json: bool,
}

/// One pattern → replacement → confirmation run over a fixed file list.
pub struct Session<'a, P, F> {
    files: &'a [FileEntry],
    prompter: P,
    fs: F,
    options: SessionOptions,
    change_log: Option<ChangeLog>,
}

impl<'a, P: Prompter, F: FileSystem> Session<'a, P, F> {
    pub fn new(files: &'a [FileEntry], prompter: P, fs: F, options: SessionOptions) -> Self {
        Self {
            files,
            prompter,
            fs,
            options,
            change_log: None,
        }
    }

    pub fn with_change_log(mut self, change_log: Option<ChangeLog>) -> Self {
        self.change_log = change_log;
        self
    }

    pub fn run(&mut self) -> Result<Outcome> {
        let mut state = State::AwaitPattern;
        loop {
            if let State::Done(outcome) = state {
                return Ok(outcome);
            }
            let snapshot = state.snapshot(self.files.len());
            state = self.advance(state).context(snapshot)?;
        }
    }

    fn advance(&mut self, state: State) -> Result<State> {
        match state {
            State::AwaitPattern => self.await_pattern(),
            State::AwaitReplacement { pattern } => self.await_replacement(pattern),
            State::AwaitConfirmation {
                pattern,
                template: _,
                plan,
            } => self.await_confirmation(&pattern, plan),
            State::Execute { plan } => self.execute(plan),
            State::Done(outcome) => Ok(State::Done(outcome)),
        }
    }

    fn await_pattern(&mut self) -> Result<State> {
        let text = pattern_prompt(self.files);
        let pattern = match self.prompter.ask(Step::Pattern, &text)? {
            Response::PlainSubmit(text) => Pattern::Plain(text),
            Response::RegexSubmit(text) => Pattern::Regex(text),
            Response::Cancel => return Ok(State::Done(Outcome::Cancelled)),
            other => bail!("unexpected response {other:?} to the pattern prompt"),
        };

        if pattern.is_empty() {
            self.prompter.show(EMPTY_PATTERN_MESSAGE)?;
            return Ok(State::Done(Outcome::EmptyPattern));
        }
        pattern.compile()?;
        Ok(State::AwaitReplacement { pattern })
    }

    fn await_replacement(&mut self, pattern: Pattern) -> Result<State> {
        let template = match self.prompter.ask(Step::Replacement, REPLACEMENT_PROMPT)? {
            Response::ReplacementSubmit(text) => text,
            Response::Cancel => return Ok(State::Done(Outcome::Cancelled)),
            other => bail!("unexpected response {other:?} to the replacement prompt"),
        };
        let plan = build_plan(self.files, &pattern, &template)?;
        Ok(State::AwaitConfirmation {
            pattern,
            template,
            plan,
        })
    }

    fn await_confirmation(&mut self, pattern: &Pattern, plan: RenamePlan) -> Result<State> {
        if self.options.json {
            for entry in plan.entries() {
                println!("{}", json_event("planned", entry));
            }
        }
        let text = self.confirmation_prompt(pattern, &plan);
        match self.prompter.ask(Step::Confirmation, &text)? {
            Response::Confirm if plan.is_empty() => Ok(State::Done(Outcome::NothingToDo)),
            Response::Confirm => Ok(State::Execute { plan }),
            Response::Cancel => Ok(State::Done(Outcome::Cancelled)),
            other => bail!("unexpected response {other:?} to the confirmation prompt"),
        }
    }

    fn execute(&mut self, plan: RenamePlan) -> Result<State> {
        let json = self.options.json;
        let change_log = self.change_log.as_ref();
        let renamed = execute_plan(plan, &self.fs, |entry| {
            if let Some(log) = change_log {
                if let Err(err) = log.record("renamed", entry) {
                    eprintln!("warning: unable to update change log: {err:#}");
                }
            }
            if json {
                println!("{}", json_event("renamed", entry));
            }
        })?;
        Ok(State::Done(Outcome::Renamed(renamed)))
    }

    fn confirmation_prompt(&self, pattern: &Pattern, plan: &RenamePlan) -> String {
        let mut text = String::from("Files queued:\n");
        for entry in plan.entries() {
            let _ = writeln!(
                text,
                "{}",
                render_rename(&entry.old_name, &entry.new_name, self.options.colorize)
            );
        }
        match plan.empty_reason() {
            Some(EmptyPlanReason::NoMatches) => {
                let _ = writeln!(text, "No files match pattern \"{}\".", pattern.text());
            }
            Some(EmptyPlanReason::NoChanges) => {
                let _ = writeln!(
                    text,
                    "Files match pattern \"{}\" but no names would change.",
                    pattern.text()
                );
            }
            None => {
                for warning in plan.warnings(&self.fs) {
                    let _ = writeln!(text, "{}", warning.describe());
                }
            }
        }
        let _ = write!(text, "\n{} file(s) will be renamed.", plan.len());
        text
    }
}

fn pattern_prompt(files: &[FileEntry]) -> String {
    let mut text = String::from("Type the text to find.\n\nFiles queued:\n");
    for file in files.iter().take(MAX_SHOWN_FILES) {
        let _ = writeln!(text, "{}", file.display_name);
    }
    if files.len() > MAX_SHOWN_FILES {
        let _ = writeln!(text, "And {} more...", files.len() - MAX_SHOWN_FILES);
    }
    text
}
