//! Command and response framing.
//!
//! Every frame, in both directions, has the layout
//!
//! ```text
//! FF FF <code> <size: 1 or 2 bytes BE> <payload ...> <checksum>
//! ```
//!
//! where `size` counts the code, the size field itself, the payload and the
//! checksum, and the checksum is the sum of every byte from the code through
//! the end of the payload, modulo 256.

use crate::commands::Command;
use crate::error::{Error, Result};

/// Frame preamble.
pub const HEADER: [u8; 2] = [0xFF, 0xFF];

/// Smallest well-formed frame: header, code, one-byte size, checksum.
pub const MIN_FRAME_LEN: usize = 5;

/// Width of a frame's size field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LengthField {
    /// One byte.
    Short,
    /// Two bytes, big-endian.
    Long,
}

impl LengthField {
    /// Number of bytes the size field occupies.
    #[must_use]
    pub fn width(&self) -> usize {
        match self {
            LengthField::Short => 1,
            LengthField::Long => 2,
        }
    }

    fn max_size(&self) -> usize {
        match self {
            LengthField::Short => usize::from(u8::MAX),
            LengthField::Long => usize::from(u16::MAX),
        }
    }
}

/// Sum of `bytes` modulo 256.
#[must_use]
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// Build a command packet with a one-byte size field.
///
/// # Examples
///
/// ```
/// use ecowitt_core::frame::build_command;
///
/// assert_eq!(build_command(0x50, &[]).unwrap(), [0xFF, 0xFF, 0x50, 0x03, 0x53]);
/// ```
pub fn build_command(code: u8, payload: &[u8]) -> Result<Vec<u8>> {
    build_command_with(code, payload, LengthField::Short)
}

/// Build a command packet with the given size field width.
pub fn build_command_with(code: u8, payload: &[u8], length: LengthField) -> Result<Vec<u8>> {
    let size = 1 + length.width() + payload.len() + 1;
    if size > length.max_size() {
        return Err(Error::PayloadTooLarge {
            length: payload.len(),
            max: length.max_size() - 2 - length.width(),
        });
    }

    let mut packet = Vec::with_capacity(HEADER.len() + size);
    packet.extend_from_slice(&HEADER);
    packet.push(code);
    match length {
        LengthField::Short => packet.push(size as u8),
        LengthField::Long => packet.extend_from_slice(&(size as u16).to_be_bytes()),
    }
    packet.extend_from_slice(payload);
    let sum = checksum(&packet[HEADER.len()..]);
    packet.push(sum);
    Ok(packet)
}

/// Check a response's checksum and echoed command code.
///
/// The checksum is verified first so that a corrupted frame is never
/// reported as a command mismatch.
pub fn validate(response: &[u8], expected_code: u8) -> Result<()> {
    if response.len() < MIN_FRAME_LEN {
        return Err(Error::ResponseTooShort {
            length: response.len(),
        });
    }
    let last = response.len() - 1;
    let expected = checksum(&response[2..last]);
    let actual = response[last];
    if expected != actual {
        return Err(Error::InvalidChecksum { expected, actual });
    }
    if response[2] != expected_code {
        return Err(Error::InvalidCommandCode {
            expected: expected_code,
            actual: response[2],
        });
    }
    Ok(())
}

/// Read the declared size of a frame, if enough of it has arrived.
#[must_use]
pub fn declared_size(frame: &[u8], length: LengthField) -> Option<usize> {
    match length {
        LengthField::Short => frame.get(3).map(|&b| usize::from(b)),
        LengthField::Long => frame
            .get(3..5)
            .map(|b| usize::from(u16::from_be_bytes([b[0], b[1]]))),
    }
}

/// Total frame length (header included) declared by a partial frame.
#[must_use]
pub fn declared_frame_len(frame: &[u8], length: LengthField) -> Option<usize> {
    declared_size(frame, length).map(|size| HEADER.len() + size)
}

/// The payload of a validated response to `command`.
///
/// The slice is bounded by the declared size and by the bytes actually
/// present, and never includes the checksum.
#[must_use]
pub fn payload(response: &[u8], command: Command) -> &[u8] {
    let length = command.length_field();
    let start = HEADER.len() + 1 + length.width();
    let overhead = 1 + length.width() + 1;
    let Some(size) = declared_size(response, length) else {
        return &[];
    };
    let end = (start + size.saturating_sub(overhead)).min(response.len().saturating_sub(1));
    response.get(start..end).unwrap_or(&[])
}

/// Interpret the status byte of a write command's response.
pub fn confirm_write(response: &[u8], command: Command) -> Result<()> {
    match response.get(4) {
        Some(0x00) => Ok(()),
        _ => Err(Error::WriteFailed {
            command: command.name(),
        }),
    }
}

/// Format bytes as space separated upper-case hex, for logging.
pub(crate) fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
