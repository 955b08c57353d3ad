use core::ffi::c_char;

use spin::Once;

use crate::{
    message_buffer_layout, ForwarderConfig, FunctionHandle, Host, HostError, HostResult,
    LogForwarder,
};

/// Marks the code passed to the host as UTF-8, UTF-16 is `16`.
const UTF8_ENCODING: u8 = 8;

/// Status `js_invoke_function` returns for a handle it does not know.
const UNKNOWN_FUNCTION_STATUS: u16 = 3;

/// [`host_runtime`] is the interface the JS host must provide under the
/// `abi` import module, see `runtime/hostlog.js`.
pub mod host_runtime {
    pub mod web {
        #[link(wasm_import_module = "abi")]
        extern "C" {
            /// [`js_run_script`] evaluates the code found at `start` for `len`
            /// bytes and returns `0` on success or a non-zero error status.
            pub fn js_run_script(start: u64, len: u64, encoding: u8) -> u16;

            /// [`js_register_function`] compiles the function body found at
            /// `start` for `len` bytes and returns its handle, `0` means the
            /// body was rejected.
            pub fn js_register_function(start: u64, len: u64, encoding: u8) -> u64;

            /// [`js_invoke_function`] calls a registered function with the
            /// parameter frame found at `parameters_start`, returning `0` on
            /// success or a non-zero error status.
            pub fn js_invoke_function(
                handler: u64,
                parameters_start: *const u8,
                parameters_length: u64,
            ) -> u16;
        }
    }
}

/// [`WebHost`] talks to the JS host through the `abi` imports.
#[derive(Clone, Copy, Debug, Default)]
pub struct WebHost;

impl Host for WebHost {
    fn run_script(&self, statement: &str) -> HostResult {
        let status = unsafe {
            host_runtime::web::js_run_script(
                statement.as_ptr() as u64,
                statement.len() as u64,
                UTF8_ENCODING,
            )
        };
        match status {
            0 => Ok(()),
            code => Err(HostError::Rejected(code)),
        }
    }

    fn register_function(&self, body: &str) -> HostResult<FunctionHandle> {
        let handle = unsafe {
            host_runtime::web::js_register_function(
                body.as_ptr() as u64,
                body.len() as u64,
                UTF8_ENCODING,
            )
        };
        match handle {
            0 => Err(HostError::Rejected(1)),
            handle => Ok(FunctionHandle::handle(handle)),
        }
    }

    fn invoke_function(&self, handle: FunctionHandle, params: &[u8]) -> HostResult {
        let status = unsafe {
            host_runtime::web::js_invoke_function(
                handle.into_inner(),
                params.as_ptr(),
                params.len() as u64,
            )
        };
        match status {
            0 => Ok(()),
            UNKNOWN_FUNCTION_STATUS => Err(HostError::UnknownFunction(handle)),
            code => Err(HostError::Rejected(code)),
        }
    }
}

static FORWARDER: Once<LogForwarder<WebHost>> = Once::new();

/// [`configure`] installs the forwarder used by the exposed entry points.
///
/// Returns `false` when a forwarder was already in place, either from an
/// earlier call or because a message was logged before configuration.
pub fn configure(config: ForwarderConfig) -> bool {
    let mut installed = false;
    FORWARDER.call_once(|| {
        installed = true;
        LogForwarder::new(WebHost, config)
    });
    installed
}

fn forwarder() -> &'static LogForwarder<WebHost> {
    FORWARDER.call_once(|| LogForwarder::with_defaults(WebHost))
}

/// [`console_log`] prints a message on the host console from Rust code.
pub fn console_log(message: &str) {
    forwarder().forward(message);
}

/// [`exposed_runtime`] are the functions the module exports to the host
/// and to C callers linked into the same module.
pub mod exposed_runtime {
    use super::*;

    /// [`log_message`] prints a NUL-terminated string on the host console.
    /// A null pointer is ignored.
    ///
    /// # Safety
    ///
    /// `message` must be null or point to a NUL-terminated string that stays
    /// valid for the duration of the call.
    #[no_mangle]
    pub unsafe extern "C" fn log_message(message: *const c_char) {
        unsafe { forwarder().forward_c_ptr(message) };
    }

    /// [`log_message_utf8`] prints `len` bytes starting at `start`,
    /// invalid UTF-8 is replaced rather than refused.
    ///
    /// # Safety
    ///
    /// Unless `len` is `0`, `start` must be `0` or the address of `len`
    /// readable bytes, for example a buffer from [`create_allocation`].
    #[no_mangle]
    pub unsafe extern "C" fn log_message_utf8(start: u64, len: u64) {
        let Ok(address) = usize::try_from(start) else {
            return;
        };
        unsafe { forwarder().forward_utf8_raw(address as *const u8, len) };
    }

    /// [`create_allocation`] hands the host a buffer to write a message into
    /// before calling [`log_message_utf8`]. Returns null for a size of `0`
    /// or one that does not fit the address space.
    #[no_mangle]
    pub extern "C" fn create_allocation(size: u64) -> *mut u8 {
        match message_buffer_layout(size) {
            Some(layout) => unsafe { alloc::alloc::alloc(layout) },
            None => core::ptr::null_mut(),
        }
    }

    /// [`clear_allocation`] releases a buffer from [`create_allocation`].
    ///
    /// # Safety
    ///
    /// `start` must be null or a pointer returned by [`create_allocation`]
    /// that was not released yet, and `size` must be the size it was
    /// requested with.
    #[no_mangle]
    pub unsafe extern "C" fn clear_allocation(start: *mut u8, size: u64) {
        if start.is_null() {
            return;
        }
        if let Some(layout) = message_buffer_layout(size) {
            unsafe { alloc::alloc::dealloc(start, layout) };
        }
    }
}
