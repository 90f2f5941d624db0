use crate::prelude::*;

/// Represents a fatal error while decoding an SMF file.
///
/// Wraps an [`ErrorKind`] naming the violated rule, the absolute byte offset in the input at
/// which decoding stopped, and a chain of context messages describing what was being decoded
/// at the time (innermost first).
///
/// If the `std` feature is enabled, this type implements `std::error::Error`.
#[derive(Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} (at byte {offset})")]
pub struct Error {
    kind: ErrorKind,
    offset: usize,
    context: Vec<&'static str>,
}
impl Error {
    /// Create a new error of the given kind, located at the given input offset.
    #[inline]
    pub fn new(kind: ErrorKind, offset: usize) -> Error {
        Error {
            kind,
            offset,
            context: Vec::new(),
        }
    }

    /// What exact rule of the file format was not respected.
    #[inline]
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Absolute offset into the input buffer where the error was detected.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// What the decoder was doing when the error happened, innermost first.
    #[inline]
    pub fn context(&self) -> &[&'static str] {
        &self.context
    }

    fn chain_ctx(mut self, ctx: &'static str) -> Error {
        self.context.push(ctx);
        self
    }
}
impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} (at byte {})", self.kind, self.offset)?;
        for ctx in &self.context {
            writeln!(f)?;
            write!(f, "  while {}", ctx)?;
        }
        Ok(())
    }
}

/// The rule that was violated while decoding.
///
/// Every variant is fatal: decoding stops and no partial document is produced.
/// The only recovered condition in the format, an unknown chunk tag, never produces an error.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    /// No `MThd` chunk was found before the end of the input.
    #[error("missing MThd header chunk")]
    MissingHeader,
    /// The header was the last thing in the file.
    #[error("missing MTrk track chunk(s)")]
    MissingTracks,
    /// A chunk was decoded at a point where a different tag was required.
    #[error("no {} marker (found {found:02X?})", tag_str(.expected))]
    UnexpectedTag { expected: [u8; 4], found: [u8; 4] },
    /// A chunk declared a length with the sign bit set.
    #[error("negative chunk length {0}")]
    NegativeLength(i32),
    /// A chunk declared more payload bytes than there are left in the input.
    #[error("chunk declares {declared} bytes but only {available} remain")]
    ChunkOverrun { declared: u64, available: usize },
    /// The header format is not 0, 1 or 2.
    #[error("invalid MThd format {0} (expected 0, 1 or 2)")]
    InvalidFormat(u16),
    /// A format 0 file declared more than one track.
    #[error("MIDI format 0 expects 1 track (got {0})")]
    SingleTrackCount(u16),
    /// The SMPTE frame rate code of the header division is not recognized.
    #[error("invalid MThd division SMPTE timecode type {0:02X} (expected E8, E7, E3 or E2)")]
    InvalidSmpte(u8),
    /// A channel event omitted its status byte before any status was established in the track.
    #[error("event missing status with no running status active")]
    NoRunningStatus,
    /// A status byte that cannot start a track event.
    #[error("status byte {0:02X} cannot start a track event")]
    UnsupportedStatus(u8),
    /// A framed region (a chunk) ended in the middle of a read.
    #[error("unexpected end of frame (wanted {wanted} bytes, {available} left)")]
    EndOfFrame { wanted: usize, available: usize },
    /// The input ended in the middle of a read.
    #[error("unexpected end of data (wanted {wanted} bytes, {available} left)")]
    EndOfData { wanted: usize, available: usize },
}
impl ErrorKind {
    /// Whether this error was caused by running out of bytes, either in the whole input or inside
    /// a chunk.
    #[inline]
    pub fn is_truncation(&self) -> bool {
        matches!(self, ErrorKind::EndOfFrame { .. } | ErrorKind::EndOfData { .. })
    }
}

fn tag_str(tag: &[u8; 4]) -> &str {
    core::str::from_utf8(tag).unwrap_or("????")
}

pub(crate) trait ResultExt<T> {
    fn context(self, ctx: &'static str) -> Result<T>;
}
impl<T> ResultExt<T> for Result<T> {
    #[inline]
    fn context(self, ctx: &'static str) -> Result<T> {
        self.map_err(|err| err.chain_ctx(ctx))
    }
}

/// The result type used by the decoder.
pub type Result<T> = StdResult<T, Error>;
