//! Straight-to-swing timing conversion
//!
//! Remaps note onsets from a straight eighth-note grid to a swing grid.
//! The beat is one quarter note; within each beat the off-beat eighth
//! (exactly halfway through) is delayed to two-thirds of the beat, the
//! triplet feel. A note's release stays in place, shortening the note by
//! the delay so it cannot overlap the next beat. Everything not exactly
//! on the off-beat boundary keeps its tick, which makes the conversion
//! idempotent: a swung onset sits at 2/3 of the beat, off the straight
//! grid, and is never touched again.

use crate::document::{Division, MidiDocument};
use crate::error::{Result, ServiceError};

/// Convert straight eighth-note timing to swing timing.
pub fn to_swing(mut doc: MidiDocument) -> Result<MidiDocument> {
    let tpq = match doc.division {
        Division::TicksPerQuarter(tpq) if tpq > 0 => u64::from(tpq),
        Division::TicksPerQuarter(_) => {
            return Err(ServiceError::InvalidArgument(
                "document has a zero ticks-per-quarter division".into(),
            ))
        }
        Division::Smpte { .. } => {
            return Err(ServiceError::InvalidArgument(
                "swing conversion requires a metrical (ticks-per-quarter) time division".into(),
            ))
        }
    };

    let swung_offset = (2 * tpq) / 3;
    for track in &mut doc.tracks {
        let mut moved = Vec::new();
        for span in track.note_spans() {
            let within_beat = span.onset % tpq;
            if within_beat * 2 != tpq {
                continue; // not exactly on the off-beat eighth
            }
            let beat_start = span.onset - within_beat;
            let new_onset = beat_start + swung_offset;
            let off_tick = span.onset + span.duration;
            // Release stays put; a note shorter than the delay keeps a
            // one-tick duration rather than inverting.
            let new_off = if off_tick > new_onset {
                off_tick
            } else {
                new_onset + 1
            };
            moved.push((span.on_index, new_onset));
            moved.push((span.off_index, new_off));
        }
        if moved.is_empty() {
            continue;
        }
        for (index, tick) in moved {
            track.events[index].tick = tick;
        }
        // Stable sort keeps container order for ties.
        track.events.sort_by_key(|event| event.tick);
    }
    Ok(doc)
}
