//! Query normalization
//!
//! A note sequence is reduced to triples relative to its first note:
//! pitch delta, onset delta, and the note's own duration in ticks.
//! Subtracting the anchor makes the pattern transposition- and
//! position-invariant; keeping raw tick distances keeps it tempo-variant.

use crate::document::{MidiDocument, NoteSpan};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteTriple {
    pub pitch_delta: i32,
    pub onset_delta: u64,
    pub duration: u64,
}

/// Build the query pattern from the first track that contains a note.
/// `None` when the query has no notes at all.
pub fn query_pattern(query: &MidiDocument) -> Option<Vec<NoteTriple>> {
    query
        .tracks
        .iter()
        .map(|track| track.note_spans())
        .find(|spans| !spans.is_empty())
        .map(|spans| normalize(&spans, 0, spans.len()))
}

/// Normalize `notes[start..start + len]` against its first note.
pub(crate) fn normalize(notes: &[NoteSpan], start: usize, len: usize) -> Vec<NoteTriple> {
    let anchor = notes[start];
    notes[start..start + len]
        .iter()
        .map(|note| relative_to(note, &anchor))
        .collect()
}

pub(crate) fn relative_to(note: &NoteSpan, anchor: &NoteSpan) -> NoteTriple {
    NoteTriple {
        pitch_delta: i32::from(note.pitch) - i32::from(anchor.pitch),
        onset_delta: note.onset - anchor.onset,
        duration: note.duration,
    }
}
