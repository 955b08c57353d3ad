use alloc::string::String;
use core::ffi::{c_char, CStr};

use spin::Mutex;

use crate::{
    encode_params, ConsoleTarget, ForwardMode, ForwardResult, ForwarderConfig, FunctionHandle,
    Host, HostError, HostResult, Message, Statement,
};

/// [`console_function_body`] is the function registered with the host in
/// [`ForwardMode::Structured`], it takes the message as its only argument.
pub fn console_function_body(target: &ConsoleTarget) -> String {
    let mut body = String::with_capacity(target.as_str().len() + 40);
    body.push_str("function(message){ ");
    body.push_str(target.as_str());
    body.push_str("(message); }");
    body
}

/// [`LogForwarder`] prints messages on the console of a [`Host`].
///
/// Every call results in one request to the host and, when the host accepts
/// it, one console entry. Nothing is buffered or deduplicated.
pub struct LogForwarder<H> {
    host: H,
    config: ForwarderConfig,
    console_fn: Mutex<Option<FunctionHandle>>,
}

impl<H: Host> LogForwarder<H> {
    pub fn new(host: H, config: ForwarderConfig) -> Self {
        Self {
            host,
            config,
            console_fn: Mutex::new(None),
        }
    }

    pub fn with_defaults(host: H) -> Self {
        Self::new(host, ForwarderConfig::default())
    }

    pub fn config(&self) -> &ForwarderConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// [`forward`] sends the message and forgets about it, host failures
    /// only show up as a `warn` trace.
    pub fn forward<'a, M>(&self, message: M)
    where
        M: Into<Message<'a>>,
    {
        if let Err(err) = self.try_forward(message) {
            tracing::warn!("Console message dropped by host: {}", err);
        }
    }

    /// [`forward_c_ptr`] forwards a NUL-terminated string handed over by C
    /// code. A null pointer is ignored.
    ///
    /// # Safety
    ///
    /// `message` must be null or point to a NUL-terminated string that stays
    /// valid and unchanged for the duration of the call.
    pub unsafe fn forward_c_ptr(&self, message: *const c_char) {
        if message.is_null() {
            tracing::debug!("Ignoring null console message pointer");
            return;
        }
        let text = unsafe { CStr::from_ptr(message) };
        self.forward(text);
    }

    /// [`forward_utf8_raw`] forwards `len` bytes starting at `start`, invalid
    /// UTF-8 is replaced rather than refused. A `len` of `0` is an empty
    /// message whatever `start` is, otherwise a null `start` or a `len` that
    /// does not fit the address space is ignored.
    ///
    /// # Safety
    ///
    /// When `start` is not null and `len` is not `0`, `len` bytes from
    /// `start` must be readable and stay unchanged for the duration of the
    /// call.
    pub unsafe fn forward_utf8_raw(&self, start: *const u8, len: u64) {
        if len == 0 {
            self.forward("");
            return;
        }
        if start.is_null() {
            tracing::debug!("Ignoring null console message pointer");
            return;
        }
        let Ok(len) = usize::try_from(len) else {
            tracing::warn!("Ignoring console message of {} bytes", len);
            return;
        };
        let bytes = unsafe { core::slice::from_raw_parts(start, len) };
        self.forward(Message::from_utf8_lossy(bytes));
    }

    /// [`try_forward`] sends the message and reports what the host said.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ForwardError::Host`] when registering the console
    /// function or executing the call failed on the host side.
    pub fn try_forward<'a, M>(&self, message: M) -> ForwardResult<()>
    where
        M: Into<Message<'a>>,
    {
        let message = message.into();
        match self.config.mode {
            ForwardMode::Structured => {
                let frame = encode_params(&[message.as_str()]);
                self.invoke_console_function(&frame)?;
            }
            ForwardMode::EscapedStatement => {
                let statement = Statement::escaped(&self.config.target, &message);
                self.host.run_script(statement.as_str())?;
            }
            ForwardMode::RawStatement => {
                let statement = Statement::raw(&self.config.target, &message);
                self.host.run_script(statement.as_str())?;
            }
        }

        tracing::debug!(
            "Forwarded {} byte message to {} ({:?})",
            message.len(),
            self.config.target,
            self.config.mode
        );
        Ok(())
    }

    // A host that lost the function (runtime reset) gets it registered again,
    // once per call.
    fn invoke_console_function(&self, frame: &[u8]) -> HostResult {
        let handle = self.console_function()?;
        match self.host.invoke_function(handle, frame) {
            Err(HostError::UnknownFunction(stale)) => {
                tracing::debug!(
                    "Host forgot console function {:?}, registering again",
                    stale
                );
                self.forget_console_function(stale);
                let handle = self.console_function()?;
                self.host.invoke_function(handle, frame)
            }
            result => result,
        }
    }

    // Registration is retried on the next call if the host refused it.
    fn console_function(&self) -> HostResult<FunctionHandle> {
        let mut cached = self.console_fn.lock();
        if let Some(handle) = *cached {
            return Ok(handle);
        }

        let handle = self
            .host
            .register_function(&console_function_body(&self.config.target))?;
        tracing::debug!(
            "Registered console function for {} as {:?}",
            self.config.target,
            handle
        );
        *cached = Some(handle);
        Ok(handle)
    }

    fn forget_console_function(&self, stale: FunctionHandle) {
        let mut cached = self.console_fn.lock();
        if *cached == Some(stale) {
            *cached = None;
        }
    }
}

#[cfg(test)]
mod forwarder_tests {
    use super::*;
    use crate::{ForwardError, HostError, RecordingHost};
    use tracing_test::traced_test;

    #[test]
    fn builds_console_function_body() {
        let target = ConsoleTarget::parse("console.info").expect("valid target");
        assert_eq!(
            "function(message){ console.info(message); }",
            console_function_body(&target)
        );
    }

    #[test]
    fn structured_mode_registers_once() {
        let forwarder = LogForwarder::with_defaults(RecordingHost::new());

        forwarder.forward("one");
        forwarder.forward("two");
        forwarder.forward("three");

        assert_eq!(1, forwarder.host().registered_functions());
        assert_eq!(
            vec!["one".to_string(), "two".into(), "three".into()],
            forwarder.host().messages()
        );
    }

    #[test]
    fn failed_registration_is_retried() {
        let host = RecordingHost::new();
        host.fail_next_registration();
        let forwarder = LogForwarder::with_defaults(&host);

        assert_eq!(
            Err(ForwardError::Host(HostError::Rejected(1))),
            forwarder.try_forward("first")
        );
        assert_eq!(Ok(()), forwarder.try_forward("second"));
        assert_eq!(vec!["second".to_string()], host.messages());
    }

    #[test]
    #[traced_test]
    fn forward_swallows_host_errors() {
        let forwarder = LogForwarder::new(
            RecordingHost::new(),
            ForwarderConfig::with_mode(ForwardMode::RawStatement),
        );

        forwarder.forward("it's broken");

        assert!(forwarder.host().messages().is_empty());
        assert!(logs_contain("Console message dropped by host"));
    }

    #[test]
    #[traced_test]
    fn traces_each_forwarded_message() {
        let forwarder = LogForwarder::new(
            RecordingHost::new(),
            ForwarderConfig::with_mode(ForwardMode::EscapedStatement),
        );

        forwarder.forward("hello");

        assert!(logs_contain("Forwarded 5 byte message to console.log"));
    }

    #[test]
    fn reregisters_when_host_forgets_the_function() {
        let forwarder = LogForwarder::with_defaults(RecordingHost::new());

        forwarder.forward("before reset");
        forwarder.host().forget_functions();

        assert_eq!(Ok(()), forwarder.try_forward("after reset"));
        assert_eq!(Ok(()), forwarder.try_forward("still there"));
        assert_eq!(1, forwarder.host().registered_functions());
        assert_eq!(
            vec![
                "before reset".to_string(),
                "after reset".into(),
                "still there".into()
            ],
            forwarder.host().messages()
        );
    }

    #[test]
    fn null_c_pointer_prints_nothing() {
        let forwarder = LogForwarder::with_defaults(RecordingHost::new());

        unsafe {
            forwarder.forward_c_ptr(core::ptr::null());
            forwarder.forward_utf8_raw(core::ptr::null(), 12);
        }

        assert!(forwarder.host().entries().is_empty());
        assert!(forwarder.host().rejected_statements().is_empty());
    }

    #[test]
    fn empty_c_string_prints_one_empty_entry() {
        let forwarder = LogForwarder::with_defaults(RecordingHost::new());
        let empty = c"";

        unsafe { forwarder.forward_c_ptr(empty.as_ptr()) };

        assert_eq!(vec![String::new()], forwarder.host().messages());
    }

    #[test]
    fn c_pointer_is_read_up_to_the_nul() {
        for mode in [ForwardMode::Structured, ForwardMode::RawStatement] {
            let forwarder =
                LogForwarder::new(RecordingHost::new(), ForwarderConfig::with_mode(mode));
            let text = c"hello";

            unsafe { forwarder.forward_c_ptr(text.as_ptr()) };

            assert_eq!(vec!["hello".to_string()], forwarder.host().messages());
        }
    }

    #[test]
    fn raw_utf8_pointer_is_decoded_lossily() {
        let forwarder = LogForwarder::with_defaults(RecordingHost::new());
        let bytes = b"bad \xc3\x28 byte, trailing bytes ignored";

        unsafe { forwarder.forward_utf8_raw(bytes.as_ptr(), 11) };

        assert_eq!(
            vec!["bad \u{FFFD}( byte".to_string()],
            forwarder.host().messages()
        );
    }

    #[test]
    fn zero_length_utf8_is_one_empty_entry() {
        let forwarder = LogForwarder::with_defaults(RecordingHost::new());
        let bytes = b"ignored";

        unsafe {
            forwarder.forward_utf8_raw(bytes.as_ptr(), 0);
            forwarder.forward_utf8_raw(core::ptr::null(), 0);
        }

        assert_eq!(
            vec![String::new(), String::new()],
            forwarder.host().messages()
        );
    }
}
