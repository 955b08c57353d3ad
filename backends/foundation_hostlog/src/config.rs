use serde::{Deserialize, Serialize};

use crate::ConsoleTarget;

/// [`ForwardMode`] picks how a message reaches the host console.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForwardMode {
    /// Register the console function once and pass each message as a
    /// parameter, no code is built from message text.
    #[default]
    Structured,

    /// Run `target('<message>')` with the message escaped as a string literal.
    EscapedStatement,

    /// Run `target('<message>')` with the message spliced in unescaped.
    ///
    /// Messages containing `'`, `\` or line breaks produce a malformed
    /// statement and whatever the host does with it.
    RawStatement,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForwarderConfig {
    pub mode: ForwardMode,
    pub target: ConsoleTarget,
}

impl ForwarderConfig {
    pub fn new(mode: ForwardMode, target: ConsoleTarget) -> Self {
        Self { mode, target }
    }

    pub fn with_mode(mode: ForwardMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }
}
