use similar::{ChangeTag, TextDiff};

const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const RESET: &str = "\x1b[0m";
pub const ARROW: &str = "  -->  ";

/// Formats `old  -->  new`, colouring removed and inserted characters.
pub fn render_rename(old: &str, new: &str, colorize: bool) -> String {
    if !colorize {
        return format!("{old}{ARROW}{new}");
    }

    let diff = TextDiff::from_chars(old, new);
    let mut left = Painter::default();
    let mut right = Painter::default();
    for change in diff.iter_all_changes() {
        let value = change.value();
        match change.tag() {
            ChangeTag::Equal => {
                left.push(value, None);
                right.push(value, None);
            }
            ChangeTag::Delete => left.push(value, Some(RED)),
            ChangeTag::Insert => right.push(value, Some(GREEN)),
        }
    }
    format!("{}{ARROW}{}", left.finish(), right.finish())
}

#[derive(Default)]
struct Painter {
    out: String,
    active: Option<&'static str>,
}

impl Painter {
    fn push(&mut self, text: &str, color: Option<&'static str>) {
        if self.active != color {
            if self.active.is_some() {
                self.out.push_str(RESET);
            }
            if let Some(code) = color {
                self.out.push_str(code);
            }
            self.active = color;
        }
        self.out.push_str(text);
    }

    fn finish(mut self) -> String {
        if self.active.is_some() {
            self.out.push_str(RESET);
        }
        self.out
    }
}
