use std::borrow::Cow;
use std::fmt;

fn fence<S: AsRef<str>>(snippet: &[S]) -> String {
    let body = snippet
        .iter()
        .map(|line| line.as_ref())
        .collect::<Vec<_>>()
        .join("\n");
    format!("```\n{body}\n```")
}

fn trim_message(message: &str) -> Cow<'_, str> {
    let trimmed = message.trim_end();
    if trimmed.len() == message.len() {
        Cow::Borrowed(message)
    } else {
        Cow::Owned(trimmed.to_string())
    }
}

/// `Line <line>: <message>` followed by the fenced snippet.
pub fn line_error<S: AsRef<str>>(line: usize, message: impl fmt::Display, snippet: &[S]) -> String {
    let message = message.to_string();
    format!(
        "Line {line}: {}\n{}",
        trim_message(&message),
        fence(snippet)
    )
}

/// `Error on lines <start> - <end>` with the message on its own line, followed by the
/// fenced snippet.
pub fn lines_error<S: AsRef<str>>(
    start: usize,
    end: usize,
    message: impl fmt::Display,
    snippet: &[S],
) -> String {
    let message = message.to_string();
    format!(
        "Error on lines {start} - {end}\n{}\n{}",
        trim_message(&message),
        fence(snippet)
    )
}

/// Picks the single-line or multi-line form depending on how many lines the snippet spans.
pub fn located_error<S: AsRef<str>>(
    line_start: usize,
    snippet: &[S],
    message: impl fmt::Display,
) -> String {
    if snippet.len() <= 1 {
        line_error(line_start, message, snippet)
    } else {
        let end = line_start + snippet.len() - 1;
        lines_error(line_start, end, message, snippet)
    }
}

/// Joins a list of names the way diagnostics present alternatives: `a | b | c`.
pub fn join_alternatives<S: AsRef<str>>(names: &[S]) -> String {
    names
        .iter()
        .map(|name| name.as_ref())
        .collect::<Vec<_>>()
        .join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line_errors_use_line_prefix() {
        let rendered = line_error(3, "Unexpected token", &["x = = 1"]);
        assert_eq!(rendered, "Line 3: Unexpected token\n```\nx = = 1\n```");
    }

    #[test]
    fn multi_line_errors_report_range() {
        let rendered = located_error(5, &["f: number", "f = \"a\""], "Expected `number`");
        assert_eq!(
            rendered,
            "Error on lines 5 - 6\nExpected `number`\n```\nf: number\nf = \"a\"\n```"
        );
    }

    #[test]
    fn alternatives_are_pipe_separated() {
        assert_eq!(join_alternatives(&["Red", "Blue"]), "Red | Blue");
    }
}
