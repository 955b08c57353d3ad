//! Binary frame used to pass the message to the registered console function.
//!
//! Layout: `[Start, (Begin, Text8, length, bytes, End)*, Stop]`. The length
//! is a little-endian `u64` followed by the UTF-8 bytes, so the host can copy
//! the frame in one go.

use alloc::string::String;
use alloc::vec::Vec;

use crate::{ParamsError, ParamsResult};

/// [`ArgumentOperations`] are the single byte markers framing the
/// argument list and each argument within it.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArgumentOperations {
    Start = 1,
    Begin = 2,
    End = 3,
    Stop = 4,
}

#[allow(clippy::from_over_into)]
impl Into<u8> for ArgumentOperations {
    fn into(self) -> u8 {
        self as u8
    }
}

/// Type id of a UTF-8 text argument, the only kind the frame carries.
pub const TEXT8_VALUE_TYPE: u8 = 3;

pub fn encode_params(texts: &[&str]) -> Vec<u8> {
    let payload: usize = texts.iter().map(|text| text.len() + 11).sum();
    let mut buffer = Vec::with_capacity(payload + 2);
    buffer.push(ArgumentOperations::Start.into());
    for text in texts {
        buffer.push(ArgumentOperations::Begin.into());
        buffer.push(TEXT8_VALUE_TYPE);
        buffer.extend_from_slice(&(text.len() as u64).to_le_bytes());
        buffer.extend_from_slice(text.as_bytes());
        buffer.push(ArgumentOperations::End.into());
    }
    buffer.push(ArgumentOperations::Stop.into());
    buffer
}

/// [`decode_params`] reads back a frame produced by [`encode_params`].
///
/// # Errors
///
/// Returns a [`ParamsError`] describing the first byte that does not fit
/// the frame layout.
pub fn decode_params(frame: &[u8]) -> ParamsResult<Vec<String>> {
    let mut reader = FrameReader { frame, index: 0 };

    if reader.byte()? != ArgumentOperations::Start as u8 {
        return Err(ParamsError::MissingStart);
    }

    let mut texts = Vec::new();
    loop {
        let marker = reader.byte().map_err(|_| ParamsError::MissingStop)?;
        if marker == ArgumentOperations::Stop as u8 {
            break;
        }
        if marker != ArgumentOperations::Begin as u8 {
            return Err(ParamsError::UnexpectedMarker(marker));
        }

        let value_type = reader.byte()?;
        if value_type != TEXT8_VALUE_TYPE {
            return Err(ParamsError::UnknownValueType(value_type));
        }

        let length = u64::from_le_bytes(reader.array()?);
        let length = usize::try_from(length).map_err(|_| ParamsError::Truncated)?;
        let bytes = reader.take(length)?;
        texts.push(String::from_utf8(bytes.to_vec())?);

        let end = reader.byte()?;
        if end != ArgumentOperations::End as u8 {
            return Err(ParamsError::UnexpectedMarker(end));
        }
    }

    if let Some(trailing) = frame.get(reader.index) {
        return Err(ParamsError::UnexpectedMarker(*trailing));
    }

    Ok(texts)
}

struct FrameReader<'a> {
    frame: &'a [u8],
    index: usize,
}

impl<'a> FrameReader<'a> {
    fn take(&mut self, length: usize) -> ParamsResult<&'a [u8]> {
        let end = self
            .index
            .checked_add(length)
            .ok_or(ParamsError::Truncated)?;
        let slice = self
            .frame
            .get(self.index..end)
            .ok_or(ParamsError::Truncated)?;
        self.index = end;
        Ok(slice)
    }

    fn byte(&mut self) -> ParamsResult<u8> {
        Ok(self.take(1)?[0])
    }

    fn array<const N: usize>(&mut self) -> ParamsResult<[u8; N]> {
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(self.take(N)?);
        Ok(bytes)
    }
}
