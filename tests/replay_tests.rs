//! End-to-end tests: bytes in, screen state and notifications out

use std::time::Duration;

use vtplay::config::Config;
use vtplay::core::{DirtySpans, Emulator, Notification, Recorder, Scrollback, Special};
use vtplay::parser::Parser;
use vtplay::replay::{Player, Replay, ReplayError};
use vtplay::ttyrec::{self, Record};

fn feed<O: vtplay::Observer>(emu: &mut Emulator<O>, bytes: &[u8]) {
    Parser::new().feed(bytes, emu).unwrap();
}

fn scroll_ups(recorder: &Recorder) -> Vec<String> {
    recorder
        .specials()
        .filter_map(|s| match s {
            Special::ScrollLine { line, direction: 1 } => Some(line.text.trim_end().to_string()),
            _ => None,
        })
        .collect()
}

#[test]
fn test_clear_home_and_print() {
    let mut emu = Emulator::with_observer(80, 24, Recorder::new());
    feed(&mut emu, b"\x1b[2J\x1b[1;1Hhello");

    assert_eq!(emu.row_text(0), "hello");
    assert_eq!((emu.cursor().x, emu.cursor().y), (5, 0));

    let changes: Vec<_> = emu.observer().changes().collect();
    assert_eq!(changes.len(), 24 + 5);
    for (row, change) in changes[..24].iter().enumerate() {
        assert_eq!(*change, (row, 0, 79));
    }
    for (x, change) in changes[24..].iter().enumerate() {
        assert_eq!(*change, (0, x, x));
    }
    assert_eq!(emu.observer().last_cursor(), Some((5, 0)));
}

#[test]
fn test_line_feeds_scroll_at_bottom() {
    let mut emu = Emulator::with_observer(80, 24, Recorder::new());
    feed(&mut emu, b"A\r\nB\x1b[H");
    feed(&mut emu, &[b'\n'; 23]);
    assert!(scroll_ups(emu.observer()).is_empty());
    assert_eq!(emu.cursor().y, 23);

    feed(&mut emu, b"\n");
    assert_eq!(scroll_ups(emu.observer()), vec!["A"]);
    assert_eq!(emu.row_text(0), "B");

    feed(&mut emu, b"\n");
    assert_eq!(scroll_ups(emu.observer()), vec!["A", "B"]);
    assert_eq!(emu.row_text(0), "");
    assert_eq!(emu.cursor().y, 23);
}

#[test]
fn test_reverse_video_symmetry() {
    let mut emu = Emulator::new(10, 2);
    feed(&mut emu, b"\x1b[31;42m\x1b[7m\x1b[7mR\x1b[27mN");
    let reversed = emu.cell(0, 0).pen;
    assert_eq!((reversed.fcolor, reversed.bcolor), (2, 1));
    let normal = emu.cell(1, 0).pen;
    assert_eq!((normal.fcolor, normal.bcolor), (1, 2));
}

#[test]
fn test_alternate_screen_round_trip() {
    let mut emu = Emulator::new(20, 4);
    feed(&mut emu, b"prompt$ \x1b[?1049h\x1b[Hvim\r\n~\r\n~");
    assert_eq!(emu.row_text(0), "vim");

    feed(&mut emu, b"\x1b[?1049l");
    assert_eq!(emu.screen_text(), "prompt$\n\n\n");
    assert_eq!((emu.cursor().x, emu.cursor().y), (8, 0));
}

#[test]
fn test_scroll_region_keeps_status_line() {
    let mut emu = Emulator::new(10, 5);
    feed(&mut emu, b"\x1b[5;1Hstatus\x1b[1;4r\x1b[4;1H");
    feed(&mut emu, b"one\r\ntwo\r\nthree");
    assert_eq!(emu.screen_text(), "\none\ntwo\nthree\nstatus");
    feed(&mut emu, b"\r\nfour\r\nfive");
    assert_eq!(emu.row_text(4), "status");
    assert_eq!(emu.row_text(3), "five");
}

#[test]
fn test_reports_reply_bytes() {
    let mut emu = Emulator::with_observer(80, 24, Recorder::new());
    feed(&mut emu, b"\x1b[5;10H\x1b[6n\x1b[5n\x1b[c");
    assert_eq!(emu.observer().replies(), b"\x1b[5;10R\x1b[0n\x1b[?6c".to_vec());
}

#[test]
fn test_unknown_sequences_warn_and_continue() {
    let mut emu = Emulator::with_observer(20, 2, Recorder::new());
    feed(&mut emu, b"a\x1b[?2004hb\x1b]52;c;eA==\x07c\x1b[99md");
    assert_eq!(emu.row_text(0), "abcd");
    assert_eq!(emu.observer().warnings().count(), 3);
}

#[test]
fn test_scrollback_observer_collects_lines() {
    let input: String = (0..30).map(|i| format!("line {i}\r\n")).collect();
    let mut emu = Emulator::with_observer(10, 5, Scrollback::new(100));
    feed(&mut emu, input.as_bytes());

    let scrollback = emu.observer();
    assert_eq!(scrollback.len(), 26);
    assert_eq!(scrollback.get(0).unwrap().text.trim_end(), "line 0");
    assert_eq!(scrollback.get_from_end(0).unwrap().text.trim_end(), "line 25");
    assert_eq!(emu.row_text(0), "line 26");
    assert_eq!(emu.row_text(4), "");
}

#[test]
fn test_thaw_marks_everything_dirty() {
    let mut emu = Emulator::with_observer(8, 3, DirtySpans::new(8, 3));
    feed(&mut emu, b"abc");
    let snapshot = emu.freeze();
    emu.observer_mut().take();

    feed(&mut emu, b"\x1b[2Jxyz");
    emu.observer_mut().take();
    emu.thaw(&snapshot);

    assert_eq!(emu.row_text(0), "abc");
    assert_eq!(emu.observer_mut().take().len(), 3);
}

#[test]
fn test_thaw_notification_order() {
    let mut emu = Emulator::with_observer(8, 3, Recorder::new());
    feed(&mut emu, b"hi");
    let snapshot = emu.freeze();
    emu.observer_mut().take();

    emu.thaw(&snapshot);
    let notes = emu.observer_mut().take();
    assert_eq!(notes.last(), Some(&Notification::Special(Special::Thaw)));
}

#[test]
fn test_ttyrec_file_replay() {
    let records = vec![
        Record::new(Duration::from_secs(100), b"$ ls\r\n".to_vec()),
        Record::new(Duration::from_millis(100_500), b"Cargo.toml  src\r\n".to_vec()),
        Record::new(Duration::from_secs(102), b"$ ".to_vec()),
    ];
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.ttyrec");
    ttyrec::write_file(&path, &records).unwrap();

    let loaded = ttyrec::read_file(&path).unwrap();
    assert_eq!(loaded, records);

    let mut replay = Replay::new(Player::with_size(40, 5), loaded);
    replay.tick(Duration::from_millis(600)).unwrap();
    assert_eq!(replay.position(), 2);
    assert_eq!(replay.emulator().row_text(1), "Cargo.toml  src");

    replay.tick(Duration::from_secs(2)).unwrap();
    assert!(replay.is_finished());
    assert_eq!(replay.emulator().screen_text(), "$ ls\nCargo.toml  src\n$\n\n");
}

#[test]
fn test_replay_from_config_with_observers() {
    let mut config = Config::default();
    config.terminal.columns = 12;
    config.terminal.rows = 3;
    config.terminal.scrollback_lines = 2;
    config.replay.speed = 2.0;

    let records = vec![
        Record::new(Duration::ZERO, b"1\r\n2\r\n3\r\n".to_vec()),
        Record::new(Duration::from_secs(1), b"4\r\n5".to_vec()),
    ];
    let observer = (DirtySpans::new(12, 3), Scrollback::new(2));
    let mut replay = Replay::from_config(&config, records, observer);

    replay.tick(Duration::from_millis(500)).unwrap();
    assert!(replay.is_finished());

    let (_, scrollback) = replay.emulator().observer();
    let lines: Vec<_> = scrollback.iter().map(|l| l.text.trim_end().to_string()).collect();
    assert_eq!(lines, vec!["1", "2"]);
    assert_eq!(replay.emulator().screen_text(), "3\n4\n5");
}

#[test]
fn test_stuck_recording_is_reported() {
    let mut data = b"\x1b]0;".to_vec();
    data.extend(std::iter::repeat(b'x').take(2000));
    let records = vec![Record::new(Duration::ZERO, data)];
    let mut replay = Replay::new(Player::with_size(10, 3), records);

    let err = replay.run_to_end().unwrap_err();
    let ReplayError::Corrupt { record, .. } = err;
    assert_eq!(record, 0);
}
