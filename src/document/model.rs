//! In-memory MIDI document model
//!
//! An absolute-tick event timeline decoded from a Standard MIDI File.
//! Downstream transforms and the retrieval matcher operate on absolute
//! ticks, never on the container's delta encoding, so reordering or
//! filtering events cannot accumulate timing errors.

use std::collections::HashMap;

/// SMF container format, preserved for round-trip fidelity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmfFormat {
    SingleTrack,
    Parallel,
    Sequential,
}

/// SMPTE frame rate for timecode divisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmpteFps {
    Fps24,
    Fps25,
    Fps29,
    Fps30,
}

/// Global time division of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Division {
    /// Metrical timing: ticks per quarter note (15-bit in the container).
    TicksPerQuarter(u16),
    /// SMPTE timing: frame rate plus ticks per frame.
    Smpte { fps: SmpteFps, ticks_per_frame: u8 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MidiDocument {
    pub format: SmfFormat,
    pub division: Division,
    pub tracks: Vec<Track>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Track {
    /// Events in tick order; ties keep container order.
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Absolute tick from the start of the track. Non-decreasing across
    /// consecutive events within a track.
    pub tick: u64,
    pub kind: EventKind,
}

/// Tagged event variant. Matching on this is exhaustive, which keeps the
/// retrieval normalization and the transforms total.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// A note onset. Velocity 0 is a release in disguise (decoded as-is,
    /// treated as a NoteOff by the pairing logic).
    NoteOn { channel: u8, pitch: u8, velocity: u8 },
    NoteOff { channel: u8, pitch: u8, velocity: u8 },
    TempoChange { micros_per_quarter: u32 },
    TimeSignatureChange {
        numerator: u8,
        /// Raw SMF denominator byte: the denominator is 2^this.
        denominator_log2: u8,
        clocks_per_click: u8,
        notated_32nds_per_quarter: u8,
    },
    /// Channel-voice messages other than notes, kept for losslessness.
    OtherChannel { channel: u8, message: ChannelVoice },
    /// Meta events other than tempo and time signature.
    OtherMeta(MetaEvent),
    SysEx(Vec<u8>),
    Escape(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelVoice {
    PolyphonicPressure { pitch: u8, pressure: u8 },
    Controller { controller: u8, value: u8 },
    ProgramChange { program: u8 },
    ChannelPressure { pressure: u8 },
    /// Raw 14-bit bend value, 0..=16383, 8192 = center.
    PitchBend { value: u16 },
}

/// Text-carrying meta event classes (FF 01 through FF 09).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextClass {
    Text,
    Copyright,
    TrackName,
    InstrumentName,
    Lyric,
    Marker,
    CuePoint,
    ProgramName,
    DeviceName,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MetaEvent {
    SequenceNumber(Option<u16>),
    Text { class: TextClass, data: Vec<u8> },
    MidiChannel(u8),
    MidiPort(u8),
    SmpteOffset(midly::SmpteTime),
    KeySignature { sharps_flats: i8, minor: bool },
    SequencerSpecific(Vec<u8>),
    Unknown { kind: u8, data: Vec<u8> },
}

/// One entry of the derived tempo map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TempoEntry {
    pub tick: u64,
    pub micros_per_quarter: u32,
}

/// A paired note: a NoteOn and the release that closes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteSpan {
    /// Index of the NoteOn event within the track.
    pub on_index: usize,
    /// Index of the closing NoteOff (or NoteOn velocity 0).
    pub off_index: usize,
    pub channel: u8,
    pub pitch: u8,
    pub velocity: u8,
    pub onset: u64,
    pub duration: u64,
}

impl MidiDocument {
    /// Ticks per quarter note, or `None` for SMPTE divisions.
    pub fn ticks_per_quarter(&self) -> Option<u16> {
        match self.division {
            Division::TicksPerQuarter(tpq) => Some(tpq),
            Division::Smpte { .. } => None,
        }
    }

    /// Derived tempo map: all TempoChange events across all tracks,
    /// ordered non-decreasing by tick. Empty when the document carries no
    /// tempo events; the tempo scaler materializes the 120 BPM default
    /// before it touches such a document.
    pub fn tempo_map(&self) -> Vec<TempoEntry> {
        let mut entries = Vec::new();
        for track in &self.tracks {
            for event in &track.events {
                if let EventKind::TempoChange { micros_per_quarter } = event.kind {
                    entries.push(TempoEntry {
                        tick: event.tick,
                        micros_per_quarter,
                    });
                }
            }
        }
        entries.sort_by_key(|entry| entry.tick);
        entries
    }

    /// Total note count across all tracks.
    pub fn note_count(&self) -> usize {
        self.tracks.iter().map(|t| t.note_spans().len()).sum()
    }
}

impl Track {
    /// Pair every NoteOn with the release that closes it and return the
    /// spans ordered by onset (ties by NoteOn position).
    ///
    /// Documents produced by [`crate::document::parse_bytes`] are
    /// guaranteed balanced; an unclosed note in a hand-built track is
    /// simply omitted.
    pub fn note_spans(&self) -> Vec<NoteSpan> {
        let mut spans = Vec::new();
        let mut open: HashMap<(u8, u8), (usize, u64, u8)> = HashMap::new();
        for (index, event) in self.events.iter().enumerate() {
            match event.kind {
                EventKind::NoteOn {
                    channel,
                    pitch,
                    velocity,
                } if velocity > 0 => {
                    open.insert((channel, pitch), (index, event.tick, velocity));
                }
                EventKind::NoteOn { channel, pitch, .. }
                | EventKind::NoteOff { channel, pitch, .. } => {
                    if let Some((on_index, onset, velocity)) = open.remove(&(channel, pitch)) {
                        spans.push(NoteSpan {
                            on_index,
                            off_index: index,
                            channel,
                            pitch,
                            velocity,
                            onset,
                            duration: event.tick - onset,
                        });
                    }
                }
                _ => {}
            }
        }
        spans.sort_by_key(|span| (span.onset, span.on_index));
        spans
    }
}
