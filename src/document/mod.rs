//! MIDI document model and container codec
//!
//! [`parse_bytes`] decodes a Standard MIDI File into an absolute-tick
//! [`MidiDocument`]; [`write_bytes`] re-encodes a document as SMF bytes.
//! Serialization is the identity transform (structurally) on a document
//! that was parsed and not mutated.

pub mod defaults;
mod model;
mod parse;
mod write;

pub use model::*;
pub use parse::parse_bytes;
pub use write::write_bytes;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("container parse error: {0}")]
    Container(String),
    #[error(
        "track {track}: note on for already-sounding pitch {pitch} on channel {channel} at tick {tick}"
    )]
    OverlappingNoteOn {
        track: usize,
        channel: u8,
        pitch: u8,
        tick: u64,
    },
    #[error(
        "track {track}: note off without a matching note on (channel {channel}, pitch {pitch}) at tick {tick}"
    )]
    UnmatchedNoteOff {
        track: usize,
        channel: u8,
        pitch: u8,
        tick: u64,
    },
    #[error("track {track}: {count} note(s) still sounding at end of track")]
    DanglingNoteOn { track: usize, count: usize },
    #[error("midi write error: {0}")]
    Write(String),
}

pub type Result<T> = std::result::Result<T, DocumentError>;
