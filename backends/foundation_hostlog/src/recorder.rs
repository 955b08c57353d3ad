//! In-memory [`Host`] that keeps console output around for inspection.
//!
//! It understands exactly the two shapes of code the forwarder produces:
//! a call `target('literal')` and a function body
//! `function(message){ target(message); }`. Anything else is rejected the
//! way a JS engine would reject it, with a syntax error.
//!
//! String literals follow the JS grammar for single-quoted strings: simple
//! escapes, `\xHH`, `\uHHHH`, `\u{H..}` and surrogate pairs. A lone
//! surrogate has no `char` and is recorded as U+FFFD.

use alloc::collections::btree_map::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::str::CharIndices;
use core::sync::atomic::{AtomicBool, Ordering};

use spin::Mutex;

use crate::{decode_params, ConsoleTarget, FunctionHandle, Host, HostError, HostResult};

/// [`ConsoleEntry`] is one line printed on the recorded console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleEntry {
    pub target: String,
    pub text: String,
}

#[derive(Default)]
struct Recorded {
    entries: Vec<ConsoleEntry>,
    rejected: Vec<String>,
    functions: BTreeMap<FunctionHandle, String>,
    next_handle: u64,
}

#[derive(Default)]
pub struct RecordingHost {
    state: Mutex<Recorded>,
    fail_registration: AtomicBool,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<ConsoleEntry> {
        self.state.lock().entries.clone()
    }

    /// [`messages`] returns only the printed text of every entry, in order.
    pub fn messages(&self) -> Vec<String> {
        self.state
            .lock()
            .entries
            .iter()
            .map(|entry| entry.text.clone())
            .collect()
    }

    /// [`rejected_statements`] lists code the host refused to run.
    pub fn rejected_statements(&self) -> Vec<String> {
        self.state.lock().rejected.clone()
    }

    pub fn registered_functions(&self) -> usize {
        self.state.lock().functions.len()
    }

    /// [`fail_next_registration`] makes the next [`Host::register_function`]
    /// call fail with [`HostError::Rejected`].
    pub fn fail_next_registration(&self) {
        self.fail_registration.store(true, Ordering::SeqCst);
    }

    /// [`forget_functions`] drops every registered function, like a host
    /// runtime that was reloaded.
    pub fn forget_functions(&self) {
        self.state.lock().functions.clear();
    }

    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.rejected.clear();
    }

    fn reject(&self, code: &str, reason: &str) -> HostError {
        self.state.lock().rejected.push(code.to_string());
        HostError::SyntaxError(reason.to_string())
    }
}

impl Host for RecordingHost {
    fn run_script(&self, statement: &str) -> HostResult {
        let (target, text) = parse_call(statement)
            .map_err(|reason| self.reject(statement, reason))?;
        self.state.lock().entries.push(ConsoleEntry { target, text });
        Ok(())
    }

    fn register_function(&self, body: &str) -> HostResult<FunctionHandle> {
        if self.fail_registration.swap(false, Ordering::SeqCst) {
            return Err(HostError::Rejected(1));
        }

        let target = parse_function_body(body)
            .map_err(|reason| self.reject(body, reason))?;

        let mut state = self.state.lock();
        // handles start at 1, `0` is how the web host signals a rejected body
        state.next_handle += 1;
        let handle = FunctionHandle::handle(state.next_handle);
        state.functions.insert(handle, target);
        Ok(handle)
    }

    fn invoke_function(&self, handle: FunctionHandle, params: &[u8]) -> HostResult {
        let params = decode_params(params)?;

        let mut state = self.state.lock();
        let target = state
            .functions
            .get(&handle)
            .cloned()
            .ok_or(HostError::UnknownFunction(handle))?;

        let text = params
            .into_iter()
            .next()
            .unwrap_or_else(|| "undefined".to_string());
        state.entries.push(ConsoleEntry { target, text });
        Ok(())
    }
}

fn parse_target(path: &str) -> Result<String, &'static str> {
    ConsoleTarget::parse(path.trim())
        .map(String::from)
        .map_err(|_| "expected a function name")
}

fn parse_function_body(body: &str) -> Result<String, &'static str> {
    let inner = body
        .trim()
        .strip_prefix("function(message){")
        .and_then(|rest| rest.strip_suffix('}'))
        .ok_or("expected function(message){ ... }")?;

    let path = inner
        .trim()
        .strip_suffix(';')
        .unwrap_or(inner.trim())
        .trim_end()
        .strip_suffix("(message)")
        .ok_or("expected a single call with the message argument")?;

    parse_target(path)
}

fn parse_call(statement: &str) -> Result<(String, String), &'static str> {
    let (path, arguments) = statement
        .trim()
        .split_once('(')
        .ok_or("expected a function call")?;
    let target = parse_target(path)?;

    let literal = arguments
        .strip_prefix('\'')
        .ok_or("expected a string literal argument")?;
    let (text, rest) = parse_single_quoted(literal)?;

    let rest = rest.trim_start();
    let rest = rest
        .strip_prefix(')')
        .ok_or("missing ) after argument list")?;
    let rest = rest.trim();
    if !(rest.is_empty() || rest == ";") {
        return Err("unexpected token after call");
    }

    Ok((target, text))
}

/// Reads a single-quoted literal whose opening quote was already consumed,
/// returning the decoded text and what follows the closing quote.
fn parse_single_quoted(source: &str) -> Result<(String, &str), &'static str> {
    let mut text = String::new();
    let mut chars = source.char_indices();

    while let Some((index, c)) = chars.next() {
        match c {
            '\'' => return Ok((text, &source[index + 1..])),
            '\n' | '\r' | '\u{2028}' | '\u{2029}' => return Err("unterminated string literal"),
            '\\' => {
                let (_, escaped) = chars.next().ok_or("unterminated string literal")?;
                match escaped {
                    'n' => text.push('\n'),
                    'r' => text.push('\r'),
                    't' => text.push('\t'),
                    'b' => text.push('\u{8}'),
                    'f' => text.push('\u{c}'),
                    'v' => text.push('\u{b}'),
                    '0' => text.push('\0'),
                    'x' => {
                        let value = read_hex_value(&mut chars, 2)?;
                        text.push(char::from_u32(value).ok_or(INVALID_ESCAPE)?);
                    }
                    'u' => text.push(read_unicode_escape(&mut chars)?),
                    // line continuation
                    '\n' => {}
                    other => text.push(other),
                }
            }
            other => text.push(other),
        }
    }

    Err("unterminated string literal")
}

const INVALID_ESCAPE: &str = "invalid escape sequence";

fn read_hex_value(chars: &mut CharIndices<'_>, digits: usize) -> Result<u32, &'static str> {
    let mut value = 0u32;
    for _ in 0..digits {
        let (_, digit) = chars.next().ok_or(INVALID_ESCAPE)?;
        value = value * 16 + digit.to_digit(16).ok_or(INVALID_ESCAPE)?;
    }
    Ok(value)
}

/// Reads what follows `\u`: either `{H..}` with up to U+10FFFF, or four hex
/// digits, pairing a high surrogate with a directly following `\uHHHH` low one.
fn read_unicode_escape(chars: &mut CharIndices<'_>) -> Result<char, &'static str> {
    let mut lookahead = chars.clone();
    if let Some((_, '{')) = lookahead.next() {
        *chars = lookahead;
        let mut value = 0u32;
        let mut digits = 0;
        loop {
            let (_, c) = chars.next().ok_or(INVALID_ESCAPE)?;
            if c == '}' {
                break;
            }
            value = value * 16 + c.to_digit(16).ok_or(INVALID_ESCAPE)?;
            digits += 1;
            if value > 0x0010_FFFF {
                return Err(INVALID_ESCAPE);
            }
        }
        if digits == 0 {
            return Err(INVALID_ESCAPE);
        }
        return Ok(char::from_u32(value).unwrap_or(char::REPLACEMENT_CHARACTER));
    }

    let unit = read_hex_value(chars, 4)?;
    if !(0xD800..=0xDBFF).contains(&unit) {
        return Ok(char::from_u32(unit).unwrap_or(char::REPLACEMENT_CHARACTER));
    }

    let mut lookahead = chars.clone();
    if let (Some((_, '\\')), Some((_, 'u'))) = (lookahead.next(), lookahead.next()) {
        if let Ok(low @ 0xDC00..=0xDFFF) = read_hex_value(&mut lookahead, 4) {
            *chars = lookahead;
            let value = 0x1_0000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
            return Ok(char::from_u32(value).unwrap_or(char::REPLACEMENT_CHARACTER));
        }
    }
    Ok(char::REPLACEMENT_CHARACTER)
}

#[cfg(test)]
mod recording_host_tests {
    use super::*;
    use crate::encode_params;

    #[test]
    fn runs_console_calls() {
        let host = RecordingHost::new();
        host.run_script("console.log('hello')").expect("should run");
        host.run_script("console.warn('a\\'b\\\\c\\n');")
            .expect("should run");

        assert_eq!(
            vec![
                ConsoleEntry {
                    target: "console.log".into(),
                    text: "hello".into()
                },
                ConsoleEntry {
                    target: "console.warn".into(),
                    text: "a'b\\c\n".into()
                },
            ],
            host.entries()
        );
    }

    #[test]
    fn decodes_hex_and_unicode_escapes() {
        let host = RecordingHost::new();
        host.run_script("console.log('\\x41\\u00e9\\0')")
            .expect("should run");
        assert_eq!(vec!["Aé\0".to_string()], host.messages());
    }

    #[test]
    fn decodes_braced_escapes_and_surrogate_pairs() {
        let host = RecordingHost::new();
        host.run_script("console.log('\\u{1F980} \\u{41}')")
            .expect("should run");
        host.run_script("console.log('\\uD83D\\uDE00!')")
            .expect("should run");
        host.run_script("console.log('\\uD83D alone \\uDE00')")
            .expect("should run");

        assert_eq!(
            vec![
                "🦀 A".to_string(),
                "😀!".into(),
                "\u{FFFD} alone \u{FFFD}".into()
            ],
            host.messages()
        );
    }

    #[test]
    fn rejects_malformed_statements() {
        let host = RecordingHost::new();
        let statements = [
            "console.log('it's broken')",
            "console.log('open",
            "console.log('line\nbreak')",
            "console.log(\"double\")",
            "alert",
            "console.log('x') + 1",
            "console.log('\\u{}')",
            "console.log('\\u{110000}')",
            "console.log('\\xZZ')",
        ];

        for statement in statements {
            assert!(
                matches!(host.run_script(statement), Err(HostError::SyntaxError(_))),
                "{statement} should be rejected"
            );
        }

        assert!(host.entries().is_empty());
        assert_eq!(statements.len(), host.rejected_statements().len());
    }

    #[test]
    fn invokes_registered_functions() {
        let host = RecordingHost::new();
        let handle = host
            .register_function("function(message){ console.error(message); }")
            .expect("should register");

        host.invoke_function(handle, &encode_params(&["it's fine"]))
            .expect("should invoke");
        host.invoke_function(handle, &encode_params(&[]))
            .expect("should invoke");

        assert_eq!(
            vec!["it's fine".to_string(), "undefined".into()],
            host.messages()
        );
        assert_eq!("console.error", host.entries()[0].target);
    }

    #[test]
    fn rejects_unknown_handles_and_bad_frames() {
        let host = RecordingHost::new();
        let handle = host
            .register_function("function(message){ console.log(message); }")
            .expect("should register");

        assert_eq!(
            Err(HostError::UnknownFunction(FunctionHandle::handle(99))),
            host.invoke_function(FunctionHandle::handle(99), &encode_params(&[]))
        );
        assert!(matches!(
            host.invoke_function(handle, &[7]),
            Err(HostError::InvalidParams(_))
        ));
    }

    #[test]
    fn forgotten_functions_are_unknown() {
        let host = RecordingHost::new();
        let handle = host
            .register_function("function(message){ console.log(message); }")
            .expect("should register");

        host.forget_functions();

        assert_eq!(0, host.registered_functions());
        assert_eq!(
            Err(HostError::UnknownFunction(handle)),
            host.invoke_function(handle, &encode_params(&["lost"]))
        );
    }

    #[test]
    fn rejects_unexpected_function_bodies() {
        let host = RecordingHost::new();
        assert!(host.register_function("function(){ alert(1); }").is_err());
        assert!(host
            .register_function("function(message){ eval(message) + 1; }")
            .is_err());
        assert_eq!(0, host.registered_functions());
    }
}
