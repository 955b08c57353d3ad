use alloc::string::{String, ToString};

use serde::{Deserialize, Serialize};

use crate::{ForwardError, ForwardResult};

pub const DEFAULT_CONSOLE_TARGET: &str = "console.log";

/// [`ConsoleTarget`] names the host function that receives a message, as a
/// dotted path such as `console.log` or `window.console.warn`.
///
/// The path ends up inside code the host executes, so it is restricted to
/// plain identifier segments: ASCII letters, digits, `_` and `$`, never
/// starting with a digit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConsoleTarget(String);

impl ConsoleTarget {
    /// [`parse`] validates the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ForwardError::InvalidTarget`] when any segment is empty or
    /// holds characters outside of an identifier.
    pub fn parse(path: &str) -> ForwardResult<Self> {
        if path.is_empty() || !path.split('.').all(is_identifier) {
            return Err(ForwardError::InvalidTarget(path.to_string()));
        }
        Ok(Self(path.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' || first == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

impl Default for ConsoleTarget {
    fn default() -> Self {
        Self(DEFAULT_CONSOLE_TARGET.to_string())
    }
}

impl TryFrom<String> for ConsoleTarget {
    type Error = ForwardError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ConsoleTarget> for String {
    fn from(value: ConsoleTarget) -> Self {
        value.0
    }
}

impl core::fmt::Display for ConsoleTarget {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod console_target_tests {
    use super::*;

    #[test]
    fn default_is_console_log() {
        assert_eq!("console.log", ConsoleTarget::default().as_str());
    }

    #[test]
    fn accepts_dotted_identifiers() {
        for path in [
            "console.warn",
            "window.console.info",
            "$log",
            "_hooks.print2",
        ] {
            let target = ConsoleTarget::parse(path).expect("should be valid");
            assert_eq!(path, target.as_str());
        }
    }

    #[test]
    fn rejects_anything_that_is_not_a_path() {
        for path in [
            "",
            "console.log('x')",
            "1abc",
            "console..log",
            "console.",
            "a b",
        ] {
            assert_eq!(
                Err(ForwardError::InvalidTarget(path.to_string())),
                ConsoleTarget::parse(path)
            );
        }
    }
}
