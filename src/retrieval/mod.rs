//! Exact-occurrence retrieval over a MIDI file database
//!
//! A query excerpt matches a candidate when the query's normalized note
//! sequence appears as a contiguous, order-preserving run inside at least
//! one candidate track. Normalization makes the match transposition- and
//! position-invariant but not tempo-invariant.

mod pattern;
mod scan;

pub use pattern::{query_pattern, NoteTriple};
pub use scan::{ensure_database_dir, hard_match, HardMatchReport, SkippedCandidate};
