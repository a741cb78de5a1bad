use std::io::{BufRead, Write};

use anyhow::{Context, Result};

const REGEX_PREFIX: &str = "re:";
const PLAIN_PREFIX: &str = "plain:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Pattern,
    Replacement,
    Confirmation,
}

impl Step {
    fn marker(self) -> &'static str {
        match self {
            Step::Pattern => "find> ",
            Step::Replacement => "replace> ",
            Step::Confirmation => "[y]es/[n]o: ",
        }
    }
}

/// The named responses a prompt can yield.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    PlainSubmit(String),
    RegexSubmit(String),
    ReplacementSubmit(String),
    Confirm,
    Cancel,
}

/// Display/input boundary: show text, block until the user answers.
pub trait Prompter {
    fn show(&mut self, text: &str) -> Result<()>;
    fn ask(&mut self, step: Step, text: &str) -> Result<Response>;
}

impl<P: Prompter + ?Sized> Prompter for &mut P {
    fn show(&mut self, text: &str) -> Result<()> {
        (**self).show(text)
    }

    fn ask(&mut self, step: Step, text: &str) -> Result<Response> {
        (**self).ask(step, text)
    }
}

pub struct TerminalPrompter<R, W> {
    input: R,
    output: W,
    regex_default: bool,
}

impl<R: BufRead, W: Write> TerminalPrompter<R, W> {
    pub fn new(input: R, output: W, regex_default: bool) -> Self {
        Self {
            input,
            output,
            regex_default,
        }
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        let bytes = self
            .input
            .read_line(&mut line)
            .context("reading user input")?;
        if bytes == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    #[cfg(test)]
    pub(crate) fn written(&self) -> &W {
        &self.output
    }
}

impl<R: BufRead, W: Write> Prompter for TerminalPrompter<R, W> {
    fn show(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{text}")?;
        self.output.flush()?;
        Ok(())
    }

    fn ask(&mut self, step: Step, text: &str) -> Result<Response> {
        self.show(text)?;
        if step == Step::Pattern {
            writeln!(self.output, "{}", pattern_hint(self.regex_default))?;
        }
        loop {
            write!(self.output, "{}", step.marker())?;
            self.output.flush()?;
            let Some(line) = self.read_line()? else {
                writeln!(self.output)?;
                return Ok(Response::Cancel);
            };
            let response = match step {
                Step::Pattern => Some(parse_pattern_line(line, self.regex_default)),
                Step::Replacement => Some(Response::ReplacementSubmit(line)),
                Step::Confirmation => parse_confirmation(&line),
            };
            match response {
                Some(response) => return Ok(response),
                None => writeln!(self.output, "Please enter y or n.")?,
            }
        }
    }
}

fn pattern_hint(regex_default: bool) -> &'static str {
    if regex_default {
        "Enter searches with a regular expression; prefix with \"plain:\" for plain text. Ctrl+D cancels."
    } else {
        "Enter searches as plain text; prefix with \"re:\" for a regular expression. Ctrl+D cancels."
    }
}

fn parse_pattern_line(line: String, regex_default: bool) -> Response {
    if let Some(rest) = line.strip_prefix(REGEX_PREFIX) {
        return Response::RegexSubmit(rest.to_string());
    }
    if let Some(rest) = line.strip_prefix(PLAIN_PREFIX) {
        return Response::PlainSubmit(rest.to_string());
    }
    if regex_default {
        Response::RegexSubmit(line)
    } else {
        Response::PlainSubmit(line)
    }
}

fn parse_confirmation(line: &str) -> Option<Response> {
    match line.trim().to_lowercase().as_str() {
        "y" | "yes" | "" => Some(Response::Confirm),
        "n" | "no" | "q" | "quit" => Some(Response::Cancel),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompter(input: &str) -> TerminalPrompter<Cursor<Vec<u8>>, Vec<u8>> {
        TerminalPrompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new(), false)
    }

    #[test]
    fn plain_line_is_plain_submit() {
        let mut p = prompter("foo bar\n");
        assert_eq!(
            p.ask(Step::Pattern, "pattern?").unwrap(),
            Response::PlainSubmit("foo bar".into())
        );
    }

    #[test]
    fn prefixed_line_is_regex_submit() {
        let mut p = prompter("re:\\d+\n");
        assert_eq!(
            p.ask(Step::Pattern, "pattern?").unwrap(),
            Response::RegexSubmit("\\d+".into())
        );
    }

    #[test]
    fn regex_default_can_be_overridden_with_plain_prefix() {
        let input = Cursor::new(b"plain:a.b\nx.y\n".to_vec());
        let mut p = TerminalPrompter::new(input, Vec::new(), true);
        assert_eq!(
            p.ask(Step::Pattern, "").unwrap(),
            Response::PlainSubmit("a.b".into())
        );
        assert_eq!(
            p.ask(Step::Pattern, "").unwrap(),
            Response::RegexSubmit("x.y".into())
        );
    }

    #[test]
    fn replacement_keeps_inner_whitespace() {
        let mut p = prompter(" spaced  \r\n");
        assert_eq!(
            p.ask(Step::Replacement, "").unwrap(),
            Response::ReplacementSubmit(" spaced  ".into())
        );
    }

    #[test]
    fn confirmation_reprompts_until_valid() {
        let mut p = prompter("maybe\nYES\n");
        assert_eq!(p.ask(Step::Confirmation, "").unwrap(), Response::Confirm);
        let shown = String::from_utf8(p.output).unwrap();
        assert!(shown.contains("Please enter y or n."));
    }

    #[test]
    fn confirmation_accepts_enter_and_rejects_no() {
        let mut p = prompter("\nn\n");
        assert_eq!(p.ask(Step::Confirmation, "").unwrap(), Response::Confirm);
        assert_eq!(p.ask(Step::Confirmation, "").unwrap(), Response::Cancel);
    }

    #[test]
    fn closed_input_cancels() {
        let mut p = prompter("");
        assert_eq!(p.ask(Step::Replacement, "").unwrap(), Response::Cancel);
    }

    #[test]
    fn prompt_text_is_displayed() {
        let mut p = prompter("x\n");
        p.ask(Step::Pattern, "Files queued:\nfoo.txt").unwrap();
        let shown = String::from_utf8(p.output).unwrap();
        assert!(shown.starts_with("Files queued:\nfoo.txt\n"));
        assert!(shown.contains("prefix with \"re:\""));
        assert!(shown.ends_with("find> "));
    }
}
