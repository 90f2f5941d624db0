//! # Overview
//!
//! `smfscan` is a strict Standard Midi File (SMF) decoder. It splits a `.mid` file into its
//! header and track chunks, and each track into timed events, classified as channel messages,
//! system exclusive messages or meta messages.
//!
//! Event payloads are not interpreted: every event carries its delta time, its absolute tick in the
//! track, its status and its raw payload bytes, borrowed from the input buffer.
//!
//! Usage is as simple as:
//!
//! ```rust
//! use smfscan::{EventClass, Smf};
//!
//! let bytes = [
//!     b'M', b'T', b'h', b'd', 0, 0, 0, 6, 0, 0, 0, 1, 0, 96,
//!     b'M', b'T', b'r', b'k', 0, 0, 0, 8, 0x00, 0x90, 0x40, 0x7F, 0x00, 0xFF, 0x2F, 0x00,
//! ];
//! let smf = Smf::parse(&bytes).unwrap();
//!
//! for (i, track) in smf.tracks.iter().enumerate() {
//!     println!("track {} has {} events", i, track.len());
//! }
//! assert_eq!(smf.tracks[0][1].class(), EventClass::Meta);
//! ```
//!
//! The [`Smf`](struct.Smf.html) struct is the main type in the crate.
//!
//! # Lazy decoding
//!
//! The [`parse`](fn.parse.html) function decodes only the header, returning an iterator over the
//! track chunks. Each track is in turn an iterator over its events, so a file can be traversed
//! without allocating:
//!
//! ```rust
//! # let bytes = [
//! #     b'M', b'T', b'h', b'd', 0, 0, 0, 6, 0, 0, 0, 1, 0, 96,
//! #     b'M', b'T', b'r', b'k', 0, 0, 0, 4, 0x00, 0xFF, 0x2F, 0x00,
//! # ];
//! let (header, tracks) = smfscan::parse(&bytes).unwrap();
//! println!("timing: {:?}", header.timing());
//! for track in tracks {
//!     for event in track.unwrap() {
//!         println!("{:?}", event.unwrap().kind);
//!     }
//! }
//! ```
//!
//! # Errors
//!
//! Decoding is all-or-nothing. Chunks with unknown tags are skipped wherever a chunk is expected,
//! every other deviation from the format aborts decoding with an [`Error`](struct.Error.html)
//! naming the violated rule and the byte offset where it was detected.
//!
//! # About features
//!
//! - The `std` feature (enabled by default)
//!
//!   Implements `std::error::Error` for the error type. Disabling this feature with
//!   `default-features = false` will make the crate `no_std + alloc`.
//!
//! - The `serde` feature
//!
//!   Implements `serde::Serialize` for the decoded document, exposing `header.format`,
//!   `header.tracks`, `header.divisions` and the `tracks` array of events.
//!
//! - The `parallel` feature
//!
//!   Decodes the events of large files on several threads, through the `rayon` dependency.
//!   Chunks are always located sequentially.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

extern crate alloc;

macro_rules! bail {
    ($err:expr) => {{
        return Err($err.into());
    }};
}
macro_rules! ensure {
    ($cond:expr, $err:expr) => {{
        if !$cond {
            bail!($err)
        }
    }};
}

mod prelude {
    pub(crate) use crate::error::{Error, ErrorKind, Result, ResultExt};
    pub(crate) use alloc::vec::Vec;
    pub(crate) use core::{fmt, result::Result as StdResult};
}

mod cursor;
mod error;
mod event;
mod primitive;
mod smf;

pub use crate::{
    error::{Error, ErrorKind, Result},
    event::{Context, Event, EventClass, EventKind},
    primitive::{Format, Fps, Timing},
    smf::{parse, EventIter, Header, Smf, Track, TrackIter},
};

/// Exotically-sized integers used by the MIDI standard.
pub mod num {
    pub use crate::primitive::u15;
}

/// The variable-length quantity codec used for delta times and payload lengths.
pub mod varlen {
    pub use crate::primitive::{read_varlen_prefix, write_varlen};
}
