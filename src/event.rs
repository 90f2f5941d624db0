//! Track events and their decoders.

use crate::{
    cursor::Cursor,
    prelude::*,
    primitive::{read_varlen, read_varlen_slice},
};

/// Represents a decoded SMF track event.
///
/// Consists of a delta time (in MIDI ticks relative to the previous event), the absolute tick of
/// the event within its track, the exact bytes the event occupied and the event itself.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Event<'a> {
    /// How many MIDI ticks after the previous event should this event fire.
    pub delta: u64,
    /// How many MIDI ticks after the start of the track should this event fire.
    pub tick: u64,
    /// The raw bytes of the event, including its delta time.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub raw: &'a [u8],
    /// The type of event along with its payload.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub kind: EventKind<'a>,
}
impl<'a> Event<'a> {
    /// Decode a single event, advancing the cursor and updating the track context.
    ///
    /// In case of failure the cursor might be left in the middle of an event!
    pub(crate) fn read(raw: &mut Cursor<'a>, ctx: &mut Context) -> Result<Event<'a>> {
        let start = *raw;
        let ahead = Lookahead::peek(raw).context("looking ahead for the next event")?;
        let delta = read_varlen(raw).context("reading event deltatime")?;
        debug_assert_eq!(delta, ahead.delta);
        ctx.tick = ctx.tick.wrapping_add(delta);
        let kind = match ahead.status {
            0xF0 | 0xF7 => EventKind::read_sysex(raw).context("reading sysex event")?,
            0xFF => EventKind::read_meta(raw).context("reading meta event")?,
            _ => EventKind::read_channel(raw, ctx).context("reading channel event")?,
        };
        debug_assert!(ahead.agrees_with(&kind));
        let consumed = raw.offset() - start.offset();
        Ok(Event {
            delta,
            tick: ctx.tick,
            raw: &start.unread()[..consumed],
            kind,
        })
    }

    /// The broad category of this event.
    #[inline]
    pub fn class(&self) -> EventClass {
        self.kind.class()
    }
}

/// The broad category of a track event, determined by its status byte.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum EventClass {
    /// Statuses `0x80..=0xEF`, explicit or inherited through running status.
    ChannelVoice,
    /// Statuses `0xF0` and `0xF7`.
    SysEx,
    /// Status `0xFF`.
    Meta,
}

/// Represents the different kinds of SMF events and their payloads.
///
/// Payloads are not interpreted beyond what is needed to find out their length.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize),
    serde(tag = "class", rename_all = "snake_case")
)]
pub enum EventKind<'a> {
    /// A message associated to a MIDI channel.
    ///
    /// Usually, the bulk of MIDI data is these kind of messages.
    ChannelVoice {
        /// The status byte in effect for this event, `0x80..=0xEF`.
        status: u8,
        /// `false` if the status byte was omitted from the stream and inherited from the previous
        /// channel event (running status).
        explicit_status: bool,
        /// One or two data bytes, depending on the message type.
        data: &'a [u8],
    },
    /// A System Exclusive message (`0xF0`) or an escape sequence (`0xF7`), carrying arbitrary data.
    ///
    /// The data bytes do not include the status byte or the length prefix.
    SysEx {
        /// Either `0xF0` or `0xF7`.
        status: u8,
        data: &'a [u8],
    },
    /// A meta-message, like tempo, song name, lyrics or end of track.
    Meta {
        /// The meta type byte following the `0xFF` status, for example `0x2F` for end of track.
        meta_type: u8,
        data: &'a [u8],
    },
}
impl<'a> EventKind<'a> {
    fn read_sysex(raw: &mut Cursor<'a>) -> Result<EventKind<'a>> {
        let status = raw.read_u8()?;
        let data = read_varlen_slice(raw)?;
        Ok(EventKind::SysEx { status, data })
    }

    fn read_meta(raw: &mut Cursor<'a>) -> Result<EventKind<'a>> {
        raw.skip(1)?;
        let meta_type = raw.read_u8()?;
        let data = read_varlen_slice(raw)?;
        Ok(EventKind::Meta { meta_type, data })
    }

    fn read_channel(raw: &mut Cursor<'a>, ctx: &mut Context) -> Result<EventKind<'a>> {
        let offset = raw.offset();
        let peeked = raw.peek(1)?[0];
        let (status, explicit_status) = if peeked & 0x80 != 0 {
            (peeked, true)
        } else {
            //Running status!
            let status = ctx
                .running_status
                .ok_or_else(|| Error::new(ErrorKind::NoRunningStatus, offset))?;
            (status, false)
        };
        let len = channel_data_len(status)
            .ok_or_else(|| Error::new(ErrorKind::UnsupportedStatus(status), offset))?;
        if explicit_status {
            raw.skip(1)?;
            ctx.running_status = Some(status);
        }
        let data = raw.read(len)?;
        Ok(EventKind::ChannelVoice {
            status,
            explicit_status,
            data,
        })
    }

    /// The broad category of this event.
    pub fn class(&self) -> EventClass {
        match self {
            EventKind::ChannelVoice { .. } => EventClass::ChannelVoice,
            EventKind::SysEx { .. } => EventClass::SysEx,
            EventKind::Meta { .. } => EventClass::Meta,
        }
    }

    /// The status byte of this event.
    ///
    /// For meta events this is always `0xFF`.
    pub fn status(&self) -> u8 {
        match *self {
            EventKind::ChannelVoice { status, .. } => status,
            EventKind::SysEx { status, .. } => status,
            EventKind::Meta { .. } => 0xFF,
        }
    }

    /// The payload of this event, without status, meta type or length prefix.
    pub fn data(&self) -> &'a [u8] {
        match *self {
            EventKind::ChannelVoice { data, .. } => data,
            EventKind::SysEx { data, .. } => data,
            EventKind::Meta { data, .. } => data,
        }
    }

    /// The MIDI channel of a channel event.
    pub fn channel(&self) -> Option<u8> {
        match *self {
            EventKind::ChannelVoice { status, .. } => Some(status & 0x0F),
            _ => None,
        }
    }
}

/// Channel messages have a known length, given by the top nibble of their status.
fn channel_data_len(status: u8) -> Option<usize> {
    match status >> 4 {
        0x8 | 0x9 | 0xA | 0xB | 0xE => Some(2),
        0xC | 0xD => Some(1),
        _ => None,
    }
}

/// Mutable state threaded through the events of a single track.
///
/// A fresh context is created at the start of every track and dropped at its end.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct Context {
    tick: u64,
    running_status: Option<u8>,
    quirk: bool,
}
impl Context {
    /// The absolute tick of the last decoded event.
    #[inline]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// The last explicit channel status byte, if any.
    #[inline]
    pub fn running_status(&self) -> Option<u8> {
        self.running_status
    }

    /// Reserved for a vendor running-status quirk. The decoder never sets it.
    #[inline]
    pub fn quirk(&self) -> bool {
        self.quirk
    }
}

/// What the next event looks like, found without consuming any bytes.
///
/// Delta times have variable length, so the status byte cannot be located without first
/// scanning for the end of the delta time.
/// These values are only used to pick a decoder, which then re-reads everything itself.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) struct Lookahead {
    pub delta: u64,
    /// The byte right after the delta time. Might be a data byte, if running status is in use.
    pub status: u8,
    /// The byte after `status`, if the frame has one.
    pub next: Option<u8>,
}
impl Lookahead {
    /// Peek a growing window until it contains the end of the delta time and the status byte.
    ///
    /// The window starts at two bytes and `next` is optional, so that a final running-status
    /// event with a single data byte (`00 05` after a program change) is not cut off.
    pub(crate) fn peek(raw: &Cursor) -> Result<Lookahead> {
        let mut window = 2;
        loop {
            let bytes = raw.peek(window)?;
            let mut delta: u64 = 0;
            for (i, &byte) in bytes[..window - 1].iter().enumerate() {
                delta = delta << 7 | u64::from(byte & 0x7F);
                if byte & 0x80 == 0 {
                    return Ok(Lookahead {
                        delta,
                        status: bytes[i + 1],
                        next: raw.unread().get(i + 2).copied(),
                    });
                }
            }
            window += 1;
        }
    }

    /// Whether the decoder took the branch this lookahead dispatched to.
    fn agrees_with(&self, kind: &EventKind) -> bool {
        match *kind {
            EventKind::SysEx { status, .. } => status == self.status,
            EventKind::Meta { meta_type, .. } => self.status == 0xFF && self.next == Some(meta_type),
            EventKind::ChannelVoice {
                status,
                explicit_status,
                ..
            } => !explicit_status || status == self.status,
        }
    }
}
