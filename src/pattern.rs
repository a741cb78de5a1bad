use std::borrow::Cow;
use std::collections::BTreeSet;

use regex::{NoExpand, Regex};

use crate::errors::RenameError;

/// What the user typed at the first prompt, tagged with how to read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    Plain(String),
    Regex(String),
}

impl Pattern {
    pub fn text(&self) -> &str {
        match self {
            Pattern::Plain(text) | Pattern::Regex(text) => text,
        }
    }

    pub fn mode(&self) -> &'static str {
        match self {
            Pattern::Plain(_) => "plain",
            Pattern::Regex(_) => "regex",
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text().is_empty()
    }

    /// The regular expression the pattern stands for.
    pub fn expression(&self) -> Cow<'_, str> {
        match self {
            Pattern::Plain(text) => Cow::Owned(regex::escape(text)),
            Pattern::Regex(text) => Cow::Borrowed(text),
        }
    }

    pub fn compile(&self) -> Result<Regex, RenameError> {
        Regex::new(&self.expression()).map_err(|source| RenameError::Pattern {
            pattern: self.text().to_string(),
            source,
        })
    }
}

/// Returns the matched text when every match in `name` is the same string.
///
/// Capture groups are ignored: `&` always stands for the whole match.
pub fn unique_match<'n>(regex: &Regex, name: &'n str) -> Option<&'n str> {
    let distinct: BTreeSet<&str> = regex.find_iter(name).map(|m| m.as_str()).collect();
    if distinct.len() == 1 {
        distinct.into_iter().next()
    } else {
        None
    }
}

/// Expands `&` to the unique match and `\&` to a literal ampersand.
///
/// Without a unique match the template is returned untouched, escapes included.
pub fn resolve_template<'t>(template: &'t str, unique: Option<&str>) -> Cow<'t, str> {
    let Some(matched) = unique else {
        return Cow::Borrowed(template);
    };
    if !template.contains('&') {
        return Cow::Borrowed(template);
    }

    let mut resolved = String::with_capacity(template.len() + matched.len());
    let mut chars = template.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' if chars.peek() == Some(&'&') => {
                chars.next();
                resolved.push('&');
            }
            '&' => resolved.push_str(matched),
            _ => resolved.push(ch),
        }
    }
    Cow::Owned(resolved)
}

/// Computes the new file name: every match is replaced by the resolved template.
pub fn rename_file_name(regex: &Regex, name: &str, template: &str) -> String {
    let resolved = resolve_template(template, unique_match(regex, name));
    regex
        .replace_all(name, NoExpand(resolved.as_ref()))
        .into_owned()
}
