//! SMF bytes → absolute-tick document
//!
//! Delta times are accumulated into absolute ticks during decoding; the
//! note-pairing invariant is validated here so every downstream consumer
//! can assume balanced tracks. Malformed input is a parse error, never
//! silently repaired.

use std::collections::HashMap;

use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};

use crate::document::model::{
    ChannelVoice, Division, Event, EventKind, MetaEvent, MidiDocument, SmfFormat, SmpteFps,
    TextClass, Track,
};
use crate::document::{DocumentError, Result};

/// Parse a Standard MIDI File into a [`MidiDocument`].
pub fn parse_bytes(bytes: &[u8]) -> Result<MidiDocument> {
    let smf = Smf::parse(bytes).map_err(|e| DocumentError::Container(e.to_string()))?;

    let format = match smf.header.format {
        midly::Format::SingleTrack => SmfFormat::SingleTrack,
        midly::Format::Parallel => SmfFormat::Parallel,
        midly::Format::Sequential => SmfFormat::Sequential,
    };
    let division = match smf.header.timing {
        Timing::Metrical(tpq) => Division::TicksPerQuarter(tpq.as_int()),
        Timing::Timecode(fps, ticks_per_frame) => Division::Smpte {
            fps: match fps {
                midly::Fps::Fps24 => SmpteFps::Fps24,
                midly::Fps::Fps25 => SmpteFps::Fps25,
                midly::Fps::Fps29 => SmpteFps::Fps29,
                midly::Fps::Fps30 => SmpteFps::Fps30,
            },
            ticks_per_frame,
        },
    };

    let mut tracks = Vec::with_capacity(smf.tracks.len());
    for (track_index, events) in smf.tracks.iter().enumerate() {
        tracks.push(decode_track(events, track_index)?);
    }

    Ok(MidiDocument {
        format,
        division,
        tracks,
    })
}

fn decode_track(events: &[TrackEvent], track_index: usize) -> Result<Track> {
    let mut tick: u64 = 0;
    let mut decoded = Vec::with_capacity(events.len());
    // (channel, pitch) -> onset tick of the currently sounding note
    let mut sounding: HashMap<(u8, u8), u64> = HashMap::new();

    for event in events {
        tick += u64::from(event.delta.as_int());

        if let TrackEventKind::Midi { channel, message } = &event.kind {
            check_note_pairing(&mut sounding, channel.as_int(), message, track_index, tick)?;
        }

        let kind = match &event.kind {
            TrackEventKind::Midi { channel, message } => {
                decode_channel_message(channel.as_int(), message)
            }
            TrackEventKind::Meta(meta) => match decode_meta(meta) {
                Some(kind) => kind,
                // End-of-track is structural; it is regenerated on write.
                None => continue,
            },
            TrackEventKind::SysEx(data) => EventKind::SysEx(data.to_vec()),
            TrackEventKind::Escape(data) => EventKind::Escape(data.to_vec()),
        };
        decoded.push(Event { tick, kind });
    }

    if !sounding.is_empty() {
        return Err(DocumentError::DanglingNoteOn {
            track: track_index,
            count: sounding.len(),
        });
    }
    Ok(Track { events: decoded })
}

fn check_note_pairing(
    sounding: &mut HashMap<(u8, u8), u64>,
    channel: u8,
    message: &MidiMessage,
    track_index: usize,
    tick: u64,
) -> Result<()> {
    match message {
        MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
            let pitch = key.as_int();
            if sounding.insert((channel, pitch), tick).is_some() {
                return Err(DocumentError::OverlappingNoteOn {
                    track: track_index,
                    channel,
                    pitch,
                    tick,
                });
            }
        }
        MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
            let pitch = key.as_int();
            if sounding.remove(&(channel, pitch)).is_none() {
                return Err(DocumentError::UnmatchedNoteOff {
                    track: track_index,
                    channel,
                    pitch,
                    tick,
                });
            }
        }
        _ => {}
    }
    Ok(())
}

fn decode_channel_message(channel: u8, message: &MidiMessage) -> EventKind {
    match message {
        MidiMessage::NoteOn { key, vel } => EventKind::NoteOn {
            channel,
            pitch: key.as_int(),
            velocity: vel.as_int(),
        },
        MidiMessage::NoteOff { key, vel } => EventKind::NoteOff {
            channel,
            pitch: key.as_int(),
            velocity: vel.as_int(),
        },
        MidiMessage::Aftertouch { key, vel } => EventKind::OtherChannel {
            channel,
            message: ChannelVoice::PolyphonicPressure {
                pitch: key.as_int(),
                pressure: vel.as_int(),
            },
        },
        MidiMessage::Controller { controller, value } => EventKind::OtherChannel {
            channel,
            message: ChannelVoice::Controller {
                controller: controller.as_int(),
                value: value.as_int(),
            },
        },
        MidiMessage::ProgramChange { program } => EventKind::OtherChannel {
            channel,
            message: ChannelVoice::ProgramChange {
                program: program.as_int(),
            },
        },
        MidiMessage::ChannelAftertouch { vel } => EventKind::OtherChannel {
            channel,
            message: ChannelVoice::ChannelPressure {
                pressure: vel.as_int(),
            },
        },
        MidiMessage::PitchBend { bend } => EventKind::OtherChannel {
            channel,
            message: ChannelVoice::PitchBend {
                value: bend.0.as_int(),
            },
        },
    }
}

/// Decode a meta event; `None` for end-of-track markers.
fn decode_meta(meta: &MetaMessage) -> Option<EventKind> {
    let text = |class: TextClass, data: &[u8]| {
        EventKind::OtherMeta(MetaEvent::Text {
            class,
            data: data.to_vec(),
        })
    };
    let kind = match meta {
        MetaMessage::EndOfTrack => return None,
        MetaMessage::Tempo(micros) => EventKind::TempoChange {
            micros_per_quarter: micros.as_int(),
        },
        MetaMessage::TimeSignature(numerator, denominator_log2, clocks, thirty_seconds) => {
            EventKind::TimeSignatureChange {
                numerator: *numerator,
                denominator_log2: *denominator_log2,
                clocks_per_click: *clocks,
                notated_32nds_per_quarter: *thirty_seconds,
            }
        }
        MetaMessage::TrackNumber(number) => {
            EventKind::OtherMeta(MetaEvent::SequenceNumber(*number))
        }
        MetaMessage::Text(data) => text(TextClass::Text, data),
        MetaMessage::Copyright(data) => text(TextClass::Copyright, data),
        MetaMessage::TrackName(data) => text(TextClass::TrackName, data),
        MetaMessage::InstrumentName(data) => text(TextClass::InstrumentName, data),
        MetaMessage::Lyric(data) => text(TextClass::Lyric, data),
        MetaMessage::Marker(data) => text(TextClass::Marker, data),
        MetaMessage::CuePoint(data) => text(TextClass::CuePoint, data),
        MetaMessage::ProgramName(data) => text(TextClass::ProgramName, data),
        MetaMessage::DeviceName(data) => text(TextClass::DeviceName, data),
        MetaMessage::MidiChannel(channel) => {
            EventKind::OtherMeta(MetaEvent::MidiChannel(channel.as_int()))
        }
        MetaMessage::MidiPort(port) => EventKind::OtherMeta(MetaEvent::MidiPort(port.as_int())),
        MetaMessage::SmpteOffset(time) => EventKind::OtherMeta(MetaEvent::SmpteOffset(*time)),
        MetaMessage::KeySignature(sharps_flats, minor) => {
            EventKind::OtherMeta(MetaEvent::KeySignature {
                sharps_flats: *sharps_flats,
                minor: *minor,
            })
        }
        MetaMessage::SequencerSpecific(data) => {
            EventKind::OtherMeta(MetaEvent::SequencerSpecific(data.to_vec()))
        }
        MetaMessage::Unknown(kind, data) => EventKind::OtherMeta(MetaEvent::Unknown {
            kind: *kind,
            data: data.to_vec(),
        }),
    };
    Some(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::write_bytes;

    fn doc_with_events(events: Vec<Event>) -> MidiDocument {
        MidiDocument {
            format: SmfFormat::SingleTrack,
            division: Division::TicksPerQuarter(480),
            tracks: vec![Track { events }],
        }
    }

    fn note_on(tick: u64, pitch: u8, velocity: u8) -> Event {
        Event {
            tick,
            kind: EventKind::NoteOn {
                channel: 0,
                pitch,
                velocity,
            },
        }
    }

    fn note_off(tick: u64, pitch: u8) -> Event {
        Event {
            tick,
            kind: EventKind::NoteOff {
                channel: 0,
                pitch,
                velocity: 0,
            },
        }
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = parse_bytes(b"not a midi file").unwrap_err();
        assert!(matches!(err, DocumentError::Container(_)));
    }

    #[test]
    fn test_parse_accumulates_absolute_ticks() {
        let doc = doc_with_events(vec![
            note_on(0, 60, 64),
            note_off(480, 60),
            note_on(480, 62, 64),
            note_off(960, 62),
        ]);
        let bytes = write_bytes(&doc).unwrap();
        let parsed = parse_bytes(&bytes).unwrap();
        let ticks: Vec<u64> = parsed.tracks[0].events.iter().map(|e| e.tick).collect();
        assert_eq!(ticks, vec![0, 480, 480, 960]);
    }

    #[test]
    fn test_parse_rejects_dangling_note_on() {
        // The writer does not validate, so it can produce a malformed file.
        let doc = doc_with_events(vec![note_on(0, 60, 64)]);
        let bytes = write_bytes(&doc).unwrap();
        let err = parse_bytes(&bytes).unwrap_err();
        assert!(matches!(err, DocumentError::DanglingNoteOn { track: 0, count: 1 }));
    }

    #[test]
    fn test_parse_rejects_unmatched_note_off() {
        let doc = doc_with_events(vec![note_off(120, 60)]);
        let bytes = write_bytes(&doc).unwrap();
        let err = parse_bytes(&bytes).unwrap_err();
        assert!(matches!(
            err,
            DocumentError::UnmatchedNoteOff {
                pitch: 60,
                tick: 120,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_rejects_overlapping_note_on() {
        let doc = doc_with_events(vec![
            note_on(0, 60, 64),
            note_on(240, 60, 80),
            note_off(480, 60),
        ]);
        let bytes = write_bytes(&doc).unwrap();
        let err = parse_bytes(&bytes).unwrap_err();
        assert!(matches!(
            err,
            DocumentError::OverlappingNoteOn {
                pitch: 60,
                tick: 240,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_accepts_velocity_zero_release() {
        let doc = doc_with_events(vec![note_on(0, 60, 64), note_on(480, 60, 0)]);
        let bytes = write_bytes(&doc).unwrap();
        let parsed = parse_bytes(&bytes).unwrap();
        assert_eq!(parsed.tracks[0].note_spans().len(), 1);
    }

    #[test]
    fn test_parse_strips_end_of_track() {
        let doc = doc_with_events(vec![note_on(0, 60, 64), note_off(480, 60)]);
        let bytes = write_bytes(&doc).unwrap();
        let parsed = parse_bytes(&bytes).unwrap();
        // Only the two note events survive; EndOfTrack is structural.
        assert_eq!(parsed.tracks[0].events.len(), 2);
    }

    #[test]
    fn test_parse_preserves_division() {
        let doc = MidiDocument {
            format: SmfFormat::Parallel,
            division: Division::TicksPerQuarter(960),
            tracks: vec![Track::default(), Track::default()],
        };
        let bytes = write_bytes(&doc).unwrap();
        let parsed = parse_bytes(&bytes).unwrap();
        assert_eq!(parsed.format, SmfFormat::Parallel);
        assert_eq!(parsed.ticks_per_quarter(), Some(960));
        assert_eq!(parsed.tracks.len(), 2);
    }
}
