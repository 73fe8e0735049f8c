// End-to-end service tests: parse → transform → serialize → allocate
// over real files in temporary directories.

use std::fs;
use std::path::PathBuf;

use midi_tool_core::document::{
    parse_bytes, write_bytes, Division, Event, EventKind, MidiDocument, SmfFormat, Track,
};
use midi_tool_core::{ErrorKind, MidiToolService, ServiceConfig};

const TPQ: u16 = 480;

fn service(dir: &tempfile::TempDir) -> MidiToolService {
    MidiToolService::new(ServiceConfig {
        output_dir: dir.path().join("output"),
        ..ServiceConfig::default()
    })
    .unwrap()
}

fn song_document() -> MidiDocument {
    let mut events = vec![Event {
        tick: 0,
        kind: EventKind::TempoChange {
            micros_per_quarter: 500_000,
        },
    }];
    for (i, pitch) in [60u8, 62, 64, 65].iter().enumerate() {
        let onset = i as u64 * u64::from(TPQ);
        events.push(Event {
            tick: onset,
            kind: EventKind::NoteOn {
                channel: 0,
                pitch: *pitch,
                velocity: 72,
            },
        });
        events.push(Event {
            tick: onset + u64::from(TPQ),
            kind: EventKind::NoteOff {
                channel: 0,
                pitch: *pitch,
                velocity: 0,
            },
        });
    }
    events.sort_by_key(|e| e.tick);
    MidiDocument {
        format: SmfFormat::SingleTrack,
        division: Division::TicksPerQuarter(TPQ),
        tracks: vec![Track { events }],
    }
}

fn write_song(dir: &tempfile::TempDir, name: &str, doc: &MidiDocument) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, write_bytes(doc).unwrap()).unwrap();
    path
}

#[test]
fn test_change_tempo_writes_scaled_copy() {
    let dir = tempfile::tempdir().unwrap();
    let service = service(&dir);
    let input = write_song(&dir, "song.mid", &song_document());

    let output = service.change_tempo(&input, 2.0).unwrap();
    assert!(output.is_absolute());
    assert!(output.starts_with(service.output_dir()));
    assert!(output
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("song-tempo-"));

    let result = parse_bytes(&fs::read(&output).unwrap()).unwrap();
    assert_eq!(result.tempo_map()[0].micros_per_quarter, 250_000);
    // Tick positions unchanged; only real-time speed changes.
    let expected_ticks: Vec<u64> = song_document().tracks[0].events.iter().map(|e| e.tick).collect();
    let result_ticks: Vec<u64> = result.tracks[0].events.iter().map(|e| e.tick).collect();
    assert_eq!(result_ticks, expected_ticks);
    // The input file itself is untouched.
    assert_eq!(
        parse_bytes(&fs::read(&input).unwrap()).unwrap(),
        song_document()
    );
}

#[test]
fn test_change_tempo_identity_preserves_document() {
    let dir = tempfile::tempdir().unwrap();
    let service = service(&dir);
    let input = write_song(&dir, "song.mid", &song_document());
    let output = service.change_tempo(&input, 1.0).unwrap();
    assert_eq!(
        parse_bytes(&fs::read(&output).unwrap()).unwrap(),
        song_document()
    );
}

#[test]
fn test_change_tempo_rejects_bad_ratio_before_io() {
    let dir = tempfile::tempdir().unwrap();
    let service = service(&dir);
    // The input path does not even exist: the argument check must win.
    let missing = dir.path().join("missing.mid");
    let err = service.change_tempo(&missing, 0.0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    let err = service.change_tempo(&missing, -2.0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn test_missing_input_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let service = service(&dir);
    let err = service
        .change_tempo(&dir.path().join("missing.mid"), 1.5)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let err = service.transpose(&dir.path().join("missing.mid"), 3).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_corrupt_input_is_parse_failure() {
    let dir = tempfile::tempdir().unwrap();
    let service = service(&dir);
    let input = dir.path().join("garbage.mid");
    fs::write(&input, b"MThd but not really").unwrap();
    let err = service.common_to_swing(&input).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ParseFailure);
    // Nothing was written on the failure path.
    let outputs: Vec<_> = fs::read_dir(service.output_dir()).unwrap().collect();
    assert!(outputs.is_empty());
}

#[test]
fn test_transpose_shifts_and_clamps() {
    let dir = tempfile::tempdir().unwrap();
    let service = service(&dir);
    let input = write_song(&dir, "song.mid", &song_document());

    let output = service.transpose(&input, 70).unwrap();
    let result = parse_bytes(&fs::read(&output).unwrap()).unwrap();
    let pitches: Vec<u8> = result.tracks[0].note_spans().iter().map(|s| s.pitch).collect();
    // 60+70=130 clamps to 127, and so on.
    assert_eq!(pitches, vec![127, 127, 127, 127]);
}

#[test]
fn test_transpose_zero_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let service = service(&dir);
    let input = write_song(&dir, "song.mid", &song_document());
    let output = service.transpose(&input, 0).unwrap();
    assert_eq!(fs::read(&output).unwrap(), fs::read(&input).unwrap());
}

#[test]
fn test_swing_delays_offbeat_eighths() {
    let tpq = u64::from(TPQ);
    let mut events = Vec::new();
    for (onset, pitch) in [(0, 60u8), (tpq / 2, 62), (tpq, 64), (tpq + tpq / 2, 65)] {
        events.push(Event {
            tick: onset,
            kind: EventKind::NoteOn {
                channel: 0,
                pitch,
                velocity: 72,
            },
        });
        events.push(Event {
            tick: onset + tpq / 2,
            kind: EventKind::NoteOff {
                channel: 0,
                pitch,
                velocity: 0,
            },
        });
    }
    events.sort_by_key(|e| e.tick);
    let doc = MidiDocument {
        format: SmfFormat::SingleTrack,
        division: Division::TicksPerQuarter(TPQ),
        tracks: vec![Track { events }],
    };

    let dir = tempfile::tempdir().unwrap();
    let service = service(&dir);
    let input = write_song(&dir, "straight.mid", &doc);

    let output = service.common_to_swing(&input).unwrap();
    let swung = parse_bytes(&fs::read(&output).unwrap()).unwrap();
    let onsets: Vec<u64> = swung.tracks[0].note_spans().iter().map(|s| s.onset).collect();
    assert_eq!(onsets, vec![0, tpq * 2 / 3, tpq, tpq + tpq * 2 / 3]);

    // Applying swing to the swung output changes nothing further.
    let output_again = service.common_to_swing(&output).unwrap();
    assert_eq!(
        parse_bytes(&fs::read(&output_again).unwrap()).unwrap(),
        swung
    );
}

#[test]
fn test_outputs_never_collide() {
    let dir = tempfile::tempdir().unwrap();
    let service = service(&dir);
    let input = write_song(&dir, "song.mid", &song_document());
    let mut seen = std::collections::HashSet::new();
    for _ in 0..20 {
        let output = service.transpose(&input, 1).unwrap();
        assert!(seen.insert(output), "duplicate output path");
    }
}
