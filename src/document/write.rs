//! Absolute-tick document → SMF bytes
//!
//! Absolute ticks are re-encoded as per-track delta times and an
//! end-of-track marker is appended to every track. The writer does not
//! re-validate note pairing; documents from [`crate::document::parse_bytes`]
//! or the transforms already hold the track invariants.

use midly::num::{u14, u15, u24, u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, PitchBend, Smf, Timing, TrackEvent, TrackEventKind};

use crate::document::model::{
    ChannelVoice, Division, EventKind, MetaEvent, MidiDocument, SmfFormat, SmpteFps, TextClass,
    Track,
};
use crate::document::{DocumentError, Result};

/// Serialize a [`MidiDocument`] to Standard MIDI File bytes.
pub fn write_bytes(doc: &MidiDocument) -> Result<Vec<u8>> {
    let header = Header {
        format: match doc.format {
            SmfFormat::SingleTrack => Format::SingleTrack,
            SmfFormat::Parallel => Format::Parallel,
            SmfFormat::Sequential => Format::Sequential,
        },
        timing: encode_division(doc.division),
    };

    let mut tracks = Vec::with_capacity(doc.tracks.len());
    for track in &doc.tracks {
        tracks.push(encode_track(track));
    }

    let smf = Smf { header, tracks };
    let mut out = Vec::new();
    smf.write(&mut out)
        .map_err(|e| DocumentError::Write(format!("failed to encode midi: {e}")))?;
    Ok(out)
}

fn encode_division(division: Division) -> Timing {
    match division {
        Division::TicksPerQuarter(tpq) => Timing::Metrical(u15::new(tpq)),
        Division::Smpte {
            fps,
            ticks_per_frame,
        } => Timing::Timecode(
            match fps {
                SmpteFps::Fps24 => midly::Fps::Fps24,
                SmpteFps::Fps25 => midly::Fps::Fps25,
                SmpteFps::Fps29 => midly::Fps::Fps29,
                SmpteFps::Fps30 => midly::Fps::Fps30,
            },
            ticks_per_frame,
        ),
    }
}

fn encode_track(track: &Track) -> midly::Track<'_> {
    let mut events = Vec::with_capacity(track.events.len() + 1);
    let mut prev_tick = 0u64;
    for event in &track.events {
        let delta = event.tick.saturating_sub(prev_tick);
        prev_tick = event.tick;
        events.push(TrackEvent {
            delta: u28::new(delta as u32),
            kind: encode_kind(&event.kind),
        });
    }
    events.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    events
}

fn encode_kind(kind: &EventKind) -> TrackEventKind<'_> {
    match kind {
        EventKind::NoteOn {
            channel,
            pitch,
            velocity,
        } => TrackEventKind::Midi {
            channel: u4::new(*channel),
            message: MidiMessage::NoteOn {
                key: u7::new(*pitch),
                vel: u7::new(*velocity),
            },
        },
        EventKind::NoteOff {
            channel,
            pitch,
            velocity,
        } => TrackEventKind::Midi {
            channel: u4::new(*channel),
            message: MidiMessage::NoteOff {
                key: u7::new(*pitch),
                vel: u7::new(*velocity),
            },
        },
        EventKind::TempoChange { micros_per_quarter } => {
            TrackEventKind::Meta(MetaMessage::Tempo(u24::new(*micros_per_quarter)))
        }
        EventKind::TimeSignatureChange {
            numerator,
            denominator_log2,
            clocks_per_click,
            notated_32nds_per_quarter,
        } => TrackEventKind::Meta(MetaMessage::TimeSignature(
            *numerator,
            *denominator_log2,
            *clocks_per_click,
            *notated_32nds_per_quarter,
        )),
        EventKind::OtherChannel { channel, message } => TrackEventKind::Midi {
            channel: u4::new(*channel),
            message: encode_channel_voice(message),
        },
        EventKind::OtherMeta(meta) => TrackEventKind::Meta(encode_meta(meta)),
        EventKind::SysEx(data) => TrackEventKind::SysEx(data),
        EventKind::Escape(data) => TrackEventKind::Escape(data),
    }
}

fn encode_channel_voice(message: &ChannelVoice) -> MidiMessage {
    match message {
        ChannelVoice::PolyphonicPressure { pitch, pressure } => MidiMessage::Aftertouch {
            key: u7::new(*pitch),
            vel: u7::new(*pressure),
        },
        ChannelVoice::Controller { controller, value } => MidiMessage::Controller {
            controller: u7::new(*controller),
            value: u7::new(*value),
        },
        ChannelVoice::ProgramChange { program } => MidiMessage::ProgramChange {
            program: u7::new(*program),
        },
        ChannelVoice::ChannelPressure { pressure } => MidiMessage::ChannelAftertouch {
            vel: u7::new(*pressure),
        },
        ChannelVoice::PitchBend { value } => MidiMessage::PitchBend {
            bend: PitchBend(u14::new(*value)),
        },
    }
}

fn encode_meta(meta: &MetaEvent) -> MetaMessage<'_> {
    match meta {
        MetaEvent::SequenceNumber(number) => MetaMessage::TrackNumber(*number),
        MetaEvent::Text { class, data } => match class {
            TextClass::Text => MetaMessage::Text(data),
            TextClass::Copyright => MetaMessage::Copyright(data),
            TextClass::TrackName => MetaMessage::TrackName(data),
            TextClass::InstrumentName => MetaMessage::InstrumentName(data),
            TextClass::Lyric => MetaMessage::Lyric(data),
            TextClass::Marker => MetaMessage::Marker(data),
            TextClass::CuePoint => MetaMessage::CuePoint(data),
            TextClass::ProgramName => MetaMessage::ProgramName(data),
            TextClass::DeviceName => MetaMessage::DeviceName(data),
        },
        MetaEvent::MidiChannel(channel) => MetaMessage::MidiChannel(u4::new(*channel)),
        MetaEvent::MidiPort(port) => MetaMessage::MidiPort(u7::new(*port)),
        MetaEvent::SmpteOffset(time) => MetaMessage::SmpteOffset(*time),
        MetaEvent::KeySignature {
            sharps_flats,
            minor,
        } => MetaMessage::KeySignature(*sharps_flats, *minor),
        MetaEvent::SequencerSpecific(data) => MetaMessage::SequencerSpecific(data),
        MetaEvent::Unknown { kind, data } => MetaMessage::Unknown(*kind, data),
    }
}
