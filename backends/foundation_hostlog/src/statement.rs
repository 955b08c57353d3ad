use alloc::string::String;
use core::fmt::Write;

use crate::{ConsoleTarget, Message};

/// [`escape_single_quoted`] encodes `text` so it can sit between two single
/// quotes in a JavaScript source string and read back as the same text.
pub fn escape_single_quoted(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            '\u{2028}' => escaped.push_str("\\u2028"),
            '\u{2029}' => escaped.push_str("\\u2029"),
            // `\0` followed by a digit reads as a legacy octal escape
            '\0' if !chars.peek().is_some_and(char::is_ascii_digit) => escaped.push_str("\\0"),
            c if c.is_ascii_control() => {
                let _ = write!(escaped, "\\x{:02x}", c as u32);
            }
            c => escaped.push(c),
        }
    }
    escaped
}

/// [`Statement`] is a host-executable call of a [`ConsoleTarget`] with a
/// single string literal argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement(String);

impl Statement {
    /// [`raw`] splices the message into the literal as-is.
    ///
    /// Any `'`, `\` or line break in the message changes the meaning of the
    /// statement or makes it unparsable.
    pub fn raw(target: &ConsoleTarget, message: &Message<'_>) -> Self {
        Self::build(target, message.as_str())
    }

    pub fn escaped(target: &ConsoleTarget, message: &Message<'_>) -> Self {
        Self::build(target, &escape_single_quoted(message.as_str()))
    }

    fn build(target: &ConsoleTarget, literal: &str) -> Self {
        let mut statement = String::with_capacity(target.as_str().len() + literal.len() + 4);
        statement.push_str(target.as_str());
        statement.push_str("('");
        statement.push_str(literal);
        statement.push_str("')");
        Self(statement)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl core::fmt::Display for Statement {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
