//! Tempo scaling
//!
//! Rewrites the tempo map so playback duration scales by `1/ratio` while
//! every event keeps its tick position: relative musical timing (swing,
//! quantization, note order) is untouched, only real-time speed changes.

use crate::document::defaults::{DEFAULT_TEMPO_MICROS_PER_QUARTER, MAX_TEMPO_MICROS_PER_QUARTER};
use crate::document::{Event, EventKind, MidiDocument, Track};
use crate::error::{Result, ServiceError};

/// Reject a non-positive or non-finite ratio before any file I/O happens.
pub fn validate_ratio(ratio: f64) -> Result<()> {
    if !(ratio > 0.0) || !ratio.is_finite() {
        return Err(ServiceError::InvalidArgument(format!(
            "ratio must be a positive finite number, got {ratio}"
        )));
    }
    Ok(())
}

/// Scale every tempo entry by `1/ratio`: a ratio of 2.0 halves the
/// wall-clock duration. A document without tempo events first acquires
/// the default 120 BPM entry at tick 0 so the operation is total.
pub fn scale_tempo(mut doc: MidiDocument, ratio: f64) -> Result<MidiDocument> {
    validate_ratio(ratio)?;

    if doc.tempo_map().is_empty() {
        insert_default_tempo(&mut doc);
    }

    for track in &mut doc.tracks {
        for event in &mut track.events {
            if let EventKind::TempoChange { micros_per_quarter } = &mut event.kind {
                *micros_per_quarter = scale_micros(*micros_per_quarter, ratio);
            }
        }
    }
    Ok(doc)
}

/// Truncating division with a floor of 1 µs and the container's 24-bit cap.
fn scale_micros(micros: u32, ratio: f64) -> u32 {
    let scaled = (f64::from(micros) / ratio) as u64;
    scaled.clamp(1, u64::from(MAX_TEMPO_MICROS_PER_QUARTER)) as u32
}

fn insert_default_tempo(doc: &mut MidiDocument) {
    let entry = Event {
        tick: 0,
        kind: EventKind::TempoChange {
            micros_per_quarter: DEFAULT_TEMPO_MICROS_PER_QUARTER,
        },
    };
    match doc.tracks.first_mut() {
        Some(track) => track.events.insert(0, entry),
        None => doc.tracks.push(Track {
            events: vec![entry],
        }),
    }
}
