use alloc::borrow::Cow;
use core::ffi::CStr;

/// [`Message`] is the text handed to the forwarder for a single call.
///
/// It is never stored past the call. There is no length limit and no
/// encoding check beyond what the host accepts, text that came in as a
/// C string with invalid UTF-8 is decoded lossily.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message<'a>(Cow<'a, str>);

impl<'a> Message<'a> {
    pub fn new(text: &'a str) -> Self {
        Self(Cow::Borrowed(text))
    }

    pub fn from_c_str(text: &'a CStr) -> Self {
        Self(text.to_string_lossy())
    }

    /// [`from_utf8_lossy`] builds a message from raw bytes, replacing
    /// invalid sequences with U+FFFD.
    pub fn from_utf8_lossy(bytes: &'a [u8]) -> Self {
        Self(alloc::string::String::from_utf8_lossy(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> From<&'a str> for Message<'a> {
    fn from(value: &'a str) -> Self {
        Self::new(value)
    }
}

impl<'a> From<&'a alloc::string::String> for Message<'a> {
    fn from(value: &'a alloc::string::String) -> Self {
        Self::new(value.as_str())
    }
}

impl<'a> From<&'a CStr> for Message<'a> {
    fn from(value: &'a CStr) -> Self {
        Self::from_c_str(value)
    }
}

/// [`message_buffer_layout`] is the layout of a host-written message buffer
/// of `size` bytes. `None` for `0` or a size past the address space, those
/// never reach the allocator.
pub fn message_buffer_layout(size: u64) -> Option<core::alloc::Layout> {
    let size = usize::try_from(size).ok().filter(|size| *size > 0)?;
    core::alloc::Layout::array::<u8>(size).ok()
}

impl core::fmt::Display for Message<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod message_tests {
    use super::*;

    #[test]
    fn borrows_plain_text() {
        let message = Message::from("hello");
        assert_eq!("hello", message.as_str());
        assert!(matches!(message.0, Cow::Borrowed(_)));
    }

    #[test]
    fn decodes_c_strings_lossily() {
        let raw = CStr::from_bytes_with_nul(b"caf\xff\0").expect("valid c string");
        let message = Message::from_c_str(raw);
        assert_eq!("caf\u{FFFD}", message.as_str());
    }

    #[test]
    fn empty_message_is_allowed() {
        let raw = CStr::from_bytes_with_nul(b"\0").expect("valid c string");
        let message = Message::from(raw);
        assert!(message.is_empty());
        assert_eq!(0, message.len());
    }

    #[test]
    fn message_buffers_are_never_zero_sized() {
        assert_eq!(None, message_buffer_layout(0));

        let layout = message_buffer_layout(5).expect("five bytes fit");
        assert_eq!(5, layout.size());
        assert_eq!(1, layout.align());
    }

    #[test]
    fn message_buffers_past_the_address_space_are_refused() {
        assert_eq!(None, message_buffer_layout(u64::MAX));
    }
}
