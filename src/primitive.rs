//! Simple building-block data that can be read in one go.
//! Reading a primitive advances the cursor.

use crate::{cursor::Cursor, prelude::*};

/// Reads a variable-length quantity: big-endian base-128 digits, where every byte except the last
/// has its top bit set.
///
/// There is no limit on the amount of bytes. Bits shifted out of the top of the `u64` are lost,
/// and an unterminated quantity fails once the cursor runs out of bytes.
pub(crate) fn read_varlen(raw: &mut Cursor) -> Result<u64> {
    let mut int: u64 = 0;
    loop {
        let byte = raw.read_u8()?;
        int = int << 7 | u64::from(byte & 0x7F);
        if byte & 0x80 == 0 {
            return Ok(int);
        }
    }
}

/// Reads a slice represented in the input as a varlen `len` followed by `len` bytes.
pub(crate) fn read_varlen_slice<'a>(raw: &mut Cursor<'a>) -> Result<&'a [u8]> {
    let len = read_varlen(raw).context("reading varlen slice length")?;
    let len = usize::try_from(len).unwrap_or(usize::MAX);
    raw.read(len).context("reading varlen slice")
}

/// Decode a variable-length quantity at the start of `raw`.
///
/// Returns the decoded integer along with the amount of bytes it occupied.
pub fn read_varlen_prefix(raw: &[u8]) -> Result<(u64, usize)> {
    let mut cursor = Cursor::new(raw);
    let int = read_varlen(&mut cursor)?;
    Ok((int, cursor.offset()))
}

/// Append the shortest variable-length encoding of `int` to `out`.
pub fn write_varlen(int: u64, out: &mut Vec<u8>) {
    let mut digits = [0u8; 10];
    let mut len = 0;
    let mut rest = int;
    loop {
        digits[len] = (rest & 0x7F) as u8;
        len += 1;
        rest >>= 7;
        if rest == 0 {
            break;
        }
    }
    for i in (0..len).rev() {
        //Every byte but the last one carries the continuation bit
        let cont = if i == 0 { 0 } else { 0x80 };
        out.push(digits[i] | cont);
    }
}

/// A 15-bit integer type.
///
/// Wraps the `u16` type and ensures that the top bit is always zero.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Default)]
#[repr(transparent)]
#[allow(non_camel_case_types)]
pub struct u15(u16);
impl u15 {
    const MASK: u16 = (1 << 15) - 1;

    /// Creates a restricted int from its non-restricted counterpart by masking off the extra
    /// bits.
    #[inline]
    pub const fn new(raw: u16) -> u15 {
        u15(raw & Self::MASK)
    }

    /// Get the inner integer out of the wrapper.
    #[inline]
    pub fn as_int(self) -> u16 {
        self.0
    }
}

/// The order in which tracks should be laid out when playing back this SMF file.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Format {
    /// Format 0: this file should have a single track only.
    SingleTrack,
    /// Format 1: this file has several tracks that should be played simultaneously.
    ///
    /// Usually the first track controls tempo and other song metadata.
    Parallel,
    /// Format 2: this file has several tracks, each one a separate song.
    Sequential,
}
impl Format {
    pub(crate) fn read(raw: &mut Cursor) -> Result<Format> {
        let offset = raw.offset();
        let format = raw.read_u16()?;
        Format::from_code(format).ok_or_else(|| Error::new(ErrorKind::InvalidFormat(format), offset))
    }

    /// Converts the raw header field into a `Format`, if it is one of `0`, `1` or `2`.
    #[inline]
    pub fn from_code(code: u16) -> Option<Format> {
        Some(match code {
            0 => Format::SingleTrack,
            1 => Format::Parallel,
            2 => Format::Sequential,
            _ => return None,
        })
    }

    /// The raw header field value.
    #[inline]
    pub fn as_code(self) -> u16 {
        match self {
            Format::SingleTrack => 0,
            Format::Parallel => 1,
            Format::Sequential => 2,
        }
    }
}
#[cfg(feature = "serde")]
impl serde::Serialize for Format {
    fn serialize<S: serde::Serializer>(&self, ser: S) -> StdResult<S::Ok, S::Error> {
        ser.serialize_u16(self.as_code())
    }
}

/// The timing for an SMF file, as encoded by the header division field.
/// This can be in ticks/beat or ticks/second.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Timing {
    /// Specifies ticks/beat as a 15-bit integer.
    ///
    /// The length of a beat is not standard, so in order to fully describe the length of a MIDI
    /// tick a tempo meta event should be present.
    Metrical(u15),
    /// Specifies ticks/second by dividing a second into frames and then into subframes.
    /// Therefore the length of of a tick is `1/fps/subframe`.
    Timecode(Fps, u8),
}
impl Timing {
    /// Interpret a raw division field.
    ///
    /// With the top bit set, the upper byte is the negated frame rate and must be one of the four
    /// SMPTE codes. The returned error carries the offending code byte.
    pub fn from_division(division: u16) -> StdResult<Timing, u8> {
        if division & 0x8000 != 0 {
            let [code, subframe] = division.to_be_bytes();
            let fps = Fps::from_smpte_code(code).ok_or(code)?;
            Ok(Timing::Timecode(fps, subframe))
        } else {
            Ok(Timing::Metrical(u15::new(division)))
        }
    }

    /// Encode as a raw division field.
    pub fn to_division(self) -> u16 {
        match self {
            Timing::Metrical(ticksperbeat) => ticksperbeat.as_int(),
            Timing::Timecode(fps, ticksperframe) => {
                u16::from_be_bytes([fps.as_smpte_code(), ticksperframe])
            }
        }
    }
}

/// One of the four FPS values available for SMPTE times, as defined by the MIDI standard.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Fps {
    /// 24 frames per second.
    Fps24,
    /// 25 frames per second.
    Fps25,
    /// Actually `29.97 = 30 / 1.001` frames per second (drop-frame).
    ///
    /// Quite an exotic value because of interesting historical reasons.
    Fps29,
    /// 30 frames per second.
    Fps30,
}
impl Fps {
    /// Converts the upper byte of a timecode division (the negated fps in two's complement) into
    /// an `Fps` value.
    #[inline]
    pub fn from_smpte_code(code: u8) -> Option<Fps> {
        match code as i8 {
            -24 => Some(Fps::Fps24),
            -25 => Some(Fps::Fps25),
            -29 => Some(Fps::Fps29),
            -30 => Some(Fps::Fps30),
            _ => None,
        }
    }

    /// The upper byte of a timecode division encoding this frame rate.
    #[inline]
    pub fn as_smpte_code(self) -> u8 {
        (-(self.as_int() as i8)) as u8
    }

    /// Get the integral approximate fps out.
    #[inline]
    pub fn as_int(self) -> u8 {
        match self {
            Fps::Fps24 => 24,
            Fps::Fps25 => 25,
            Fps::Fps29 => 29,
            Fps::Fps30 => 30,
        }
    }
}
