//! Specific to the SMF packaging of MIDI streams: chunks, the header and track framing.

use crate::{
    cursor::Cursor,
    event::{Context, Event},
    prelude::*,
    primitive::{Format, Timing},
};

/// How many bytes must a MIDI body have in order to enable multithreading.
#[cfg(feature = "parallel")]
const PARALLEL_ENABLE_THRESHOLD: usize = 3 * 1024;

/// A single track: simply a list of track events.
pub type Track<'a> = Vec<Event<'a>>;

/// A decoded Standard Midi File.
///
/// Events borrow their payloads from the input buffer, so the buffer must outlive the `Smf`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Smf<'a> {
    pub header: Header,
    pub tracks: Vec<Track<'a>>,
}
impl<'a> Smf<'a> {
    /// Decode a whole file.
    ///
    /// Any error aborts decoding, no partial document is returned.
    pub fn parse(raw: &'a [u8]) -> Result<Smf<'a>> {
        let (header, tracks) = parse(raw)?;
        let tracks = tracks.collect_tracks()?;
        Ok(Smf { header, tracks })
    }
}

/// Decode the header of a file and prepare the tracks for lazy decoding.
///
/// Chunks with unknown tags before the header are skipped.
pub fn parse(raw: &[u8]) -> Result<(Header, TrackIter)> {
    let mut cursor = Cursor::new(raw);
    ensure!(
        Chunk::find(&mut cursor, Chunk::HEADER).context("scanning for header chunk")?,
        Error::new(ErrorKind::MissingHeader, cursor.offset())
    );
    let header = Header::read(&mut cursor).context("reading header chunk")?;
    log::debug!(
        "smf header: format {}, {} tracks, division {:#06X}",
        header.format.as_code(),
        header.track_count,
        header.division
    );
    ensure!(
        cursor.remaining() >= Chunk::HEADER_LEN,
        Error::new(ErrorKind::MissingTracks, cursor.offset())
    );
    let tracks = TrackIter {
        cursor,
        track_count_hint: header.track_count,
    };
    Ok((header, tracks))
}

/// The 8-byte header every chunk starts with.
pub(crate) struct Chunk;
impl Chunk {
    pub(crate) const HEADER: &'static [u8; 4] = b"MThd";
    pub(crate) const TRACK: &'static [u8; 4] = b"MTrk";
    pub(crate) const HEADER_LEN: usize = 8;

    /// Peek the tag and length of the next chunk without consuming anything.
    ///
    /// Returns `None` unless there is at least one byte past a chunk header, marking the end of
    /// the chunk sequence. A bare chunk header at the very end is a trailing fragment.
    pub(crate) fn peek(raw: &Cursor) -> Option<([u8; 4], u32)> {
        if raw.remaining() <= Self::HEADER_LEN {
            return None;
        }
        let bytes = raw.peek(Self::HEADER_LEN).ok()?;
        let mut tag = [0; 4];
        tag.copy_from_slice(&bytes[..4]);
        let len = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        Some((tag, len))
    }

    /// Advance the cursor to the next chunk tagged `tag`, skipping any other chunk.
    ///
    /// Returns `false` if the chunk sequence ended before finding one. Trailing bytes too short to
    /// hold a chunk header are consumed and ignored.
    pub(crate) fn find(raw: &mut Cursor, tag: &[u8; 4]) -> Result<bool> {
        while !raw.is_empty() {
            match Self::peek(raw) {
                Some((found, _)) if &found == tag => return Ok(true),
                Some((found, len)) => {
                    log::debug!(
                        "skipping unknown chunk {:02X?} of {} bytes at byte {}",
                        found,
                        len,
                        raw.offset()
                    );
                    let skip = Self::HEADER_LEN as u64 + u64::from(len);
                    if skip > raw.remaining() as u64 {
                        bail!(Error::new(
                            ErrorKind::ChunkOverrun {
                                declared: u64::from(len),
                                available: raw.remaining() - Self::HEADER_LEN,
                            },
                            raw.offset(),
                        ));
                    }
                    raw.skip(skip as usize)?;
                }
                None => {
                    log::debug!(
                        "ignoring {} trailing bytes at byte {}",
                        raw.remaining(),
                        raw.offset()
                    );
                    raw.exhaust();
                }
            }
        }
        Ok(false)
    }

    /// Consume the chunk header of a chunk that must be tagged `tag`, and frame its payload.
    fn read_framed<'a>(raw: &mut Cursor<'a>, tag: &[u8; 4]) -> Result<Cursor<'a>> {
        let offset = raw.offset();
        raw.require(Self::HEADER_LEN)?;
        let found = raw.read(4)?;
        if found != tag {
            let mut found_tag = [0; 4];
            found_tag.copy_from_slice(found);
            bail!(Error::new(
                ErrorKind::UnexpectedTag {
                    expected: *tag,
                    found: found_tag,
                },
                offset,
            ));
        }
        let len = raw.read_i32()?;
        let len = usize::try_from(len)
            .map_err(|_| Error::new(ErrorKind::NegativeLength(len), offset))?;
        if len > raw.remaining() {
            bail!(Error::new(
                ErrorKind::ChunkOverrun {
                    declared: len as u64,
                    available: raw.remaining(),
                },
                offset,
            ));
        }
        raw.frame(len)
    }
}

/// A MIDI file header.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Header {
    pub format: Format,
    /// The amount of tracks the file declares. Not checked against the actual track chunks.
    #[cfg_attr(feature = "serde", serde(rename = "tracks"))]
    pub track_count: u16,
    /// The raw division field. See [`Header::timing`] for its meaning.
    #[cfg_attr(feature = "serde", serde(rename = "divisions"))]
    pub division: u16,
}
impl Header {
    pub fn new(format: Format, track_count: u16, timing: Timing) -> Header {
        Header {
            format,
            track_count,
            division: timing.to_division(),
        }
    }

    /// The interpreted division field.
    pub fn timing(&self) -> Timing {
        //The division was validated when decoding
        Timing::from_division(self.division).unwrap_or(Timing::Metrical(Default::default()))
    }

    /// Read and validate a `MThd` chunk. Bytes after the known fields are ignored.
    fn read(raw: &mut Cursor) -> Result<Header> {
        let mut chunk = Chunk::read_framed(raw, Chunk::HEADER)?;
        let format = Format::read(&mut chunk)?;
        let offset = chunk.offset();
        let track_count = chunk.read_u16()?;
        ensure!(
            format != Format::SingleTrack || track_count <= 1,
            Error::new(ErrorKind::SingleTrackCount(track_count), offset)
        );
        let offset = chunk.offset();
        let division = chunk.read_u16()?;
        Timing::from_division(division)
            .map_err(|code| Error::new(ErrorKind::InvalidSmpte(code), offset))?;
        Ok(Header {
            format,
            track_count,
            division,
        })
    }
}

/// An iterator over the tracks in a Standard Midi File.
///
/// Each item is the event iterator of the next `MTrk` chunk; other chunks are skipped.
/// After yielding an error the iterator is exhausted.
#[derive(Clone, Debug)]
pub struct TrackIter<'a> {
    cursor: Cursor<'a>,
    track_count_hint: u16,
}
impl<'a> TrackIter<'a> {
    /// Get the remaining unread bytes.
    pub fn unread(&self) -> &'a [u8] {
        self.cursor.unread()
    }

    /// Decode every remaining track, stopping at the first error.
    pub fn collect_tracks(self) -> Result<Vec<Track<'a>>> {
        //Attempt to use multiple threads if possible and advantageous
        #[cfg(feature = "parallel")]
        {
            if self.unread().len() >= PARALLEL_ENABLE_THRESHOLD {
                use rayon::prelude::*;

                let chunk_vec = self.collect::<Result<Vec<_>>>()?;
                return chunk_vec
                    .into_par_iter()
                    .map(EventIter::collect_events)
                    .collect::<Result<Vec<Track>>>();
            }
        }
        //Fall back to single-threaded
        self.map(|r| r.and_then(EventIter::collect_events))
            .collect::<Result<Vec<Track>>>()
    }
}
impl<'a> Iterator for TrackIter<'a> {
    type Item = Result<EventIter<'a>>;

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.track_count_hint as usize, None)
    }

    fn next(&mut self) -> Option<Result<EventIter<'a>>> {
        let found = Chunk::find(&mut self.cursor, Chunk::TRACK)
            .context("scanning for track chunk")
            .and_then(|found| {
                if found {
                    Chunk::read_framed(&mut self.cursor, Chunk::TRACK)
                        .context("reading track chunk")
                        .map(Some)
                } else {
                    Ok(None)
                }
            });
        match found {
            Ok(Some(frame)) => {
                self.track_count_hint = self.track_count_hint.saturating_sub(1);
                log::trace!(
                    "track chunk of {} bytes at byte {}",
                    frame.remaining(),
                    frame.offset()
                );
                Some(Ok(EventIter::new(frame)))
            }
            Ok(None) => None,
            Err(err) => {
                //Ensure no chunk is read from the middle of a malformed one
                self.cursor.exhaust();
                Some(Err(err))
            }
        }
    }
}

/// An iterator of events over a single track.
/// Allows deferring the decoding of tracks for later, on an on-demand basis.
///
/// The iterator owns the decoding context of its track (running status and tick accumulator).
/// After yielding an error the iterator is exhausted.
#[derive(Clone, Debug)]
pub struct EventIter<'a> {
    cursor: Cursor<'a>,
    ctx: Context,
}
impl<'a> EventIter<'a> {
    fn new(frame: Cursor<'a>) -> EventIter<'a> {
        EventIter {
            cursor: frame,
            ctx: Context::default(),
        }
    }

    /// Get the remaining unread bytes of the track.
    pub fn unread(&self) -> &'a [u8] {
        self.cursor.unread()
    }

    /// Get the current decoding context of the track.
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Decode every remaining event of the track, stopping at the first error.
    pub fn collect_events(self) -> Result<Track<'a>> {
        let mut events = Vec::with_capacity(self.unread().len() / 3);
        for ev in self {
            events.push(ev?);
        }
        Ok(events)
    }
}
impl<'a> Iterator for EventIter<'a> {
    type Item = Result<Event<'a>>;

    fn next(&mut self) -> Option<Result<Event<'a>>> {
        if self.cursor.is_empty() {
            return None;
        }
        let result = Event::read(&mut self.cursor, &mut self.ctx).context("reading track event");
        if result.is_err() {
            self.cursor.exhaust();
        }
        Some(result)
    }
}
