use crate::HostResult;

/// [`FunctionHandle`] identifies a function body the host registered for us
/// and can later invoke by id instead of re-parsing code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FunctionHandle(u64);

impl From<u64> for FunctionHandle {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl FunctionHandle {
    pub const fn handle(value: u64) -> Self {
        Self(value)
    }

    pub fn into_inner(self) -> u64 {
        self.0
    }
}

/// [`Host`] is the surface the surrounding runtime (a web page, a JS engine)
/// offers to the guest for producing console output.
///
/// Implementations decide how a request is carried out, the forwarder only
/// relies on each successful call printing at most one console entry.
pub trait Host {
    /// [`run_script`] asks the host to execute `statement` as code.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::HostError`] when the host could not run the statement.
    fn run_script(&self, statement: &str) -> HostResult;

    /// [`register_function`] hands the host a function body to compile once.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::HostError`] when the body was not accepted.
    fn register_function(&self, body: &str) -> HostResult<FunctionHandle>;

    /// [`invoke_function`] calls a registered function with a parameter frame
    /// built by [`crate::encode_params`].
    ///
    /// # Errors
    ///
    /// Returns a [`crate::HostError`] for unknown handles, bad frames or a
    /// failing call.
    fn invoke_function(&self, handle: FunctionHandle, params: &[u8]) -> HostResult;
}

impl<T: Host + ?Sized> Host for &T {
    fn run_script(&self, statement: &str) -> HostResult {
        (**self).run_script(statement)
    }

    fn register_function(&self, body: &str) -> HostResult<FunctionHandle> {
        (**self).register_function(body)
    }

    fn invoke_function(&self, handle: FunctionHandle, params: &[u8]) -> HostResult {
        (**self).invoke_function(handle, params)
    }
}

impl<T: Host + ?Sized> Host for alloc::sync::Arc<T> {
    fn run_script(&self, statement: &str) -> HostResult {
        (**self).run_script(statement)
    }

    fn register_function(&self, body: &str) -> HostResult<FunctionHandle> {
        (**self).register_function(body)
    }

    fn invoke_function(&self, handle: FunctionHandle, params: &[u8]) -> HostResult {
        (**self).invoke_function(handle, params)
    }
}
