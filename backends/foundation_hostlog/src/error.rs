//! Module for crate errors

use alloc::string::FromUtf8Error;
use alloc::string::String;

use derive_more::From;

use crate::FunctionHandle;

pub type ParamsResult<T> = core::result::Result<T, ParamsError>;

/// [`ParamsError`] is returned when a parameter frame received from the
/// other side of the boundary does not follow the
/// `[Start, (Begin, ValueType, payload, End)*, Stop]` layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamsError {
    MissingStart,
    MissingStop,
    UnexpectedMarker(u8),
    UnknownValueType(u8),
    Truncated,
    NotValidUTF8(FromUtf8Error),
}

impl From<FromUtf8Error> for ParamsError {
    fn from(value: FromUtf8Error) -> Self {
        Self::NotValidUTF8(value)
    }
}

impl core::error::Error for ParamsError {}

impl core::fmt::Display for ParamsError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{self:?}")
    }
}

pub type HostResult<T = ()> = core::result::Result<T, HostError>;

/// [`HostError`] is what a [`crate::Host`] reports back when it could not
/// carry out a request.
#[derive(Debug, Clone, PartialEq, Eq, From)]
pub enum HostError {
    /// The host returned a non-zero status code.
    #[from(ignore)]
    Rejected(u16),

    /// The statement handed to the host could not be parsed.
    #[from(ignore)]
    SyntaxError(String),

    UnknownFunction(FunctionHandle),

    InvalidParams(ParamsError),
}

impl core::error::Error for HostError {}

impl core::fmt::Display for HostError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{self:?}")
    }
}

pub type ForwardResult<T> = core::result::Result<T, ForwardError>;

#[derive(Debug, Clone, PartialEq, Eq, From)]
pub enum ForwardError {
    #[from(ignore)]
    InvalidTarget(String),

    Host(HostError),
}

impl core::error::Error for ForwardError {}

impl core::fmt::Display for ForwardError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{self:?}")
    }
}
