//! Pitch transposition
//!
//! Shifts every note by a signed semitone delta. Out-of-range results are
//! clamped to the valid MIDI range instead of dropped or wrapped, so no
//! note is ever silently lost and the output stays strictly valid.

use crate::document::{EventKind, MidiDocument};

/// Add `delta` semitones to every NoteOn/NoteOff pitch, clamping once to
/// 0..=127. `delta = 0` is the identity transform.
pub fn transpose(mut doc: MidiDocument, delta: i32) -> MidiDocument {
    if delta == 0 {
        return doc;
    }
    for track in &mut doc.tracks {
        for event in &mut track.events {
            match &mut event.kind {
                EventKind::NoteOn { pitch, .. } | EventKind::NoteOff { pitch, .. } => {
                    *pitch = shift_pitch(*pitch, delta);
                }
                _ => {}
            }
        }
    }
    doc
}

fn shift_pitch(pitch: u8, delta: i32) -> u8 {
    (i32::from(pitch) + delta).clamp(0, 127) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Division, Event, SmfFormat, Track};

    fn doc_with_pitches(pitches: &[u8]) -> MidiDocument {
        let mut events = Vec::new();
        for (i, &pitch) in pitches.iter().enumerate() {
            let onset = i as u64 * 480;
            events.push(Event {
                tick: onset,
                kind: EventKind::NoteOn {
                    channel: 0,
                    pitch,
                    velocity: 64,
                },
            });
            events.push(Event {
                tick: onset + 480,
                kind: EventKind::NoteOff {
                    channel: 0,
                    pitch,
                    velocity: 0,
                },
            });
        }
        MidiDocument {
            format: SmfFormat::SingleTrack,
            division: Division::TicksPerQuarter(480),
            tracks: vec![Track { events }],
        }
    }

    fn pitches_of(doc: &MidiDocument) -> Vec<u8> {
        doc.tracks[0]
            .note_spans()
            .iter()
            .map(|span| span.pitch)
            .collect()
    }

    #[test]
    fn test_zero_delta_is_identity() {
        let doc = doc_with_pitches(&[60, 64, 67]);
        assert_eq!(transpose(doc.clone(), 0), doc);
    }

    #[test]
    fn test_shift_up_and_down() {
        let doc = doc_with_pitches(&[60, 64, 67]);
        assert_eq!(pitches_of(&transpose(doc.clone(), 5)), vec![65, 69, 72]);
        assert_eq!(pitches_of(&transpose(doc, -12)), vec![48, 52, 55]);
    }

    #[test]
    fn test_clamps_at_range_boundaries() {
        let doc = doc_with_pitches(&[125, 2]);
        let up = transpose(doc.clone(), 10);
        assert_eq!(pitches_of(&up), vec![127, 12]); // 135 clamps to 127
        let down = transpose(doc, -10);
        assert_eq!(pitches_of(&down), vec![115, 0]); // -8 clamps to 0
    }

    #[test]
    fn test_composition_without_clamping() {
        let doc = doc_with_pitches(&[60, 64]);
        let sequential = transpose(transpose(doc.clone(), 7), -3);
        let combined = transpose(doc, 4);
        assert_eq!(pitches_of(&sequential), pitches_of(&combined));
    }

    #[test]
    fn test_clamp_applies_per_call() {
        // Clamping happens at each transpose boundary: once 125 + 10 has
        // clamped to 127, a later -10 lands on 117, not on 125.
        let doc = doc_with_pitches(&[125]);
        let sequential = transpose(transpose(doc.clone(), 10), -10);
        assert_eq!(pitches_of(&sequential), vec![117]);
        let combined = transpose(doc, 0);
        assert_eq!(pitches_of(&combined), vec![125]);
    }

    #[test]
    fn test_non_note_events_untouched() {
        let mut doc = doc_with_pitches(&[60]);
        doc.tracks[0].events.insert(
            0,
            Event {
                tick: 0,
                kind: EventKind::TempoChange {
                    micros_per_quarter: 500_000,
                },
            },
        );
        let out = transpose(doc, 12);
        assert!(matches!(
            out.tracks[0].events[0].kind,
            EventKind::TempoChange {
                micros_per_quarter: 500_000
            }
        ));
    }
}
