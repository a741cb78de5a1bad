use std::error::Error as _;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{ArgAction, Args, Parser, ValueEnum, ValueHint};
use is_terminal::IsTerminal;

mod answers;
mod diff;
mod errors;
mod files;
mod logging;
mod pattern;
mod planner;
mod prompt;
mod rename;
mod sequencer;
use answers::{Answers, ScriptedPrompter, load_answers};
use errors::{REPORT_URL, RenameError};
use logging::ChangeLog;
use prompt::TerminalPrompter;
use rename::RealFileSystem;
use sequencer::{Outcome, Session, SessionOptions, SessionSnapshot};

const EXIT_EMPTY_PATTERN: u8 = 1;
const EXIT_FATAL: u8 = 2;

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq, Default)]
enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    fn should_color(self) -> bool {
        match self {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => io::stdout().is_terminal(),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(outcome) => ExitCode::from(exit_status(outcome)),
        Err(err) => {
            report_error(&err);
            ExitCode::from(EXIT_FATAL)
        }
    }
}

fn run(cli: Cli) -> Result<Outcome> {
    let entries =
        files::resolve_targets(&cli.paths, &cli.selection.globs, &cli.selection.exclude)?;
    let answers = cli.answers.resolve()?;
    let change_log = cli.log_dir.as_deref().map(ChangeLog::open).transpose()?;
    if let Some(log) = &change_log {
        println!("recording renames in {}", log.path().display());
    }
    let options = SessionOptions {
        colorize: cli.color.should_color(),
        json: cli.json,
    };

    let stdin = io::stdin();
    let terminal = TerminalPrompter::new(stdin.lock(), io::stdout(), answers.regex);
    let prompter = ScriptedPrompter::new(answers, terminal);
    let outcome = Session::new(&entries, prompter, RealFileSystem, options)
        .with_change_log(change_log)
        .run()?;

    print_outcome(outcome);
    Ok(outcome)
}

fn exit_status(outcome: Outcome) -> u8 {
    match outcome {
        Outcome::EmptyPattern => EXIT_EMPTY_PATTERN,
        Outcome::Renamed(_) | Outcome::NothingToDo | Outcome::Cancelled => 0,
    }
}

fn print_outcome(outcome: Outcome) {
    match outcome {
        Outcome::Renamed(count) => println!("renamed {count} file(s)."),
        Outcome::NothingToDo => println!("nothing to rename."),
        Outcome::Cancelled => println!("cancelled; no files were renamed."),
        Outcome::EmptyPattern => {}
    }
}

fn report_error(err: &anyhow::Error) {
    if let Some(known) = err.downcast_ref::<RenameError>() {
        eprintln!("error: {known}");
        let mut cause = known.source();
        while let Some(inner) = cause {
            eprintln!("  caused by: {inner}");
            cause = inner.source();
        }
        return;
    }

    if err.downcast_ref::<SessionSnapshot>().is_some() {
        eprintln!("Unexpected error! This shouldn't have happened.");
        eprintln!("If you can reproduce it, feel free to file an issue at {REPORT_URL}");
        eprintln!("Please include a copy of this information:\n");
        eprintln!("{err:?}");
        return;
    }

    eprintln!("error: {err:#}");
}

#[derive(Debug, Parser)]
#[command(
    name = "bulkrename",
    version,
    about = "Rename a batch of files with a find/replace pattern, after a preview"
)]
struct Cli {
    /// Files to rename; file:// URIs are accepted.
    #[arg(value_name = "PATH", value_hint = ValueHint::AnyPath)]
    paths: Vec<String>,
    #[command(flatten)]
    selection: SelectionArgs,
    #[command(flatten)]
    answers: AnswerArgs,
    #[arg(long = "color", value_enum, default_value = "auto")]
    color: ColorChoice,
    /// Print one JSON event per planned and applied rename.
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,
    /// Append applied renames to DIR/rename_log.jsonl.
    #[arg(long = "log-dir", value_name = "DIR", value_hint = ValueHint::DirPath)]
    log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct SelectionArgs {
    #[arg(long = "glob", value_name = "GLOB")]
    globs: Vec<String>,
    #[arg(long = "exclude", value_name = "GLOB")]
    exclude: Vec<String>,
}

#[derive(Debug, Clone, Args)]
struct AnswerArgs {
    /// YAML or JSON file answering some or all prompts.
    #[arg(long = "answers", value_name = "FILE", value_hint = ValueHint::FilePath)]
    answers_file: Option<PathBuf>,
    #[arg(long, value_name = "TEXT", allow_hyphen_values = true)]
    pattern: Option<String>,
    /// Read the pattern as a regular expression.
    #[arg(long, action = ArgAction::SetTrue)]
    regex: bool,
    #[arg(long, value_name = "TEXT", allow_hyphen_values = true)]
    replacement: Option<String>,
    /// Confirm the rename without asking.
    #[arg(long = "yes", action = ArgAction::SetTrue)]
    auto_confirm: bool,
}

impl AnswerArgs {
    fn resolve(&self) -> Result<Answers> {
        let base = match &self.answers_file {
            Some(path) => load_answers(path)?,
            None => Answers::default(),
        };
        Ok(base.merge(Answers {
            pattern: self.pattern.clone(),
            regex: self.regex,
            replacement: self.replacement.clone(),
            confirm: self.auto_confirm.then_some(true),
        }))
    }
}
