//! Property-based invariant tests for the parser and emulator.
//!
//! 1. Freezing, thawing into a fresh emulator and freezing again is lossless.
//! 2. How input is chunked never changes the resulting state.
//! 3. Scroll margins always describe a non-empty region inside the grid.
//! 4. Erasing the whole display twice equals erasing it once.
//! 5. Every multi-byte character decodes to exactly one event, and only once
//!    its last byte arrives.
//! 6. SGR 7 followed by 27 restores the colors.

use proptest::prelude::*;
use vtplay::core::{Cell, Emulator, LineAttr};
use vtplay::parser::{Event, Parser};

// ── Helpers ─────────────────────────────────────────────────────────────

fn fixed(bytes: &'static [u8]) -> BoxedStrategy<Vec<u8>> {
    Just(bytes.to_vec()).boxed()
}

fn fragment() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        "[a-z ]{1,8}".prop_map(String::into_bytes).boxed(),
        fixed(b"\r\n"),
        fixed(b"\n\n\n"),
        fixed(b"\t"),
        fixed(b"\x08"),
        fixed("é•😀".as_bytes()),
        (1u16..30, 1u16..90)
            .prop_map(|(r, c)| format!("\x1b[{r};{c}H").into_bytes())
            .boxed(),
        (0u16..30, 0u16..30)
            .prop_map(|(t, b)| format!("\x1b[{t};{b}r").into_bytes())
            .boxed(),
        prop::sample::select(vec![0u16, 1, 4, 5, 7, 27, 31, 42, 99])
            .prop_map(|a| format!("\x1b[{a}m").into_bytes())
            .boxed(),
        (prop::sample::select(vec!['A', 'B', 'C', 'D', 'L', 'M', 'P', '@', 'X', 'S', 'T', 'J', 'K']), 0u16..5)
            .prop_map(|(f, n)| format!("\x1b[{n}{f}").into_bytes())
            .boxed(),
        fixed(b"\x1b[?1049h"),
        fixed(b"\x1b[?1049l"),
        fixed(b"\x1b[?6h"),
        fixed(b"\x1b[?6l"),
        fixed(b"\x1b[4h"),
        fixed(b"\x1b[4l"),
        fixed(b"\x1b[?7l"),
        fixed(b"\x1b7"),
        fixed(b"\x1b8"),
        fixed(b"\x1bM"),
        fixed(b"\x1bD"),
        fixed(b"\x1b(0"),
        fixed(b"\x1b(B"),
        fixed(b"\x0e"),
        fixed(b"\x0f"),
        fixed(b"\x1b#6"),
        fixed(b"\x1bH"),
        fixed(b"\x1b[3g"),
        fixed(b"\x1b]0;title\x07"),
        fixed(b"\x1b[!p"),
        fixed(b"\x1b[6n"),
        fixed(b"\x1b[5n"),
    ]
}

fn input() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(fragment(), 0..40).prop_map(|f| f.concat())
}

fn size() -> impl Strategy<Value = (usize, usize)> {
    (1usize..=40, 2usize..=20)
}

fn run(width: usize, height: usize, bytes: &[u8]) -> Emulator {
    let mut emu = Emulator::new(width, height);
    Parser::new().feed(bytes, &mut emu).unwrap();
    emu
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Freeze/thaw round trip
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn freeze_thaw_round_trip((w, h) in size(), bytes in input()) {
        let emu = run(w, h, &bytes);
        let snapshot = emu.freeze();

        let mut other = Emulator::new(w, h);
        other.thaw(&snapshot);
        prop_assert_eq!(other.freeze(), snapshot);
        prop_assert_eq!(other.screen_text(), emu.screen_text());
        prop_assert_eq!(other.cursor(), emu.cursor());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Chunking independence
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn chunking_does_not_change_state(
        (w, h) in size(),
        bytes in input(),
        sizes in prop::collection::vec(1usize..16, 1..10),
    ) {
        let whole = run(w, h, &bytes);

        let mut emu = Emulator::new(w, h);
        let mut parser = Parser::new();
        let mut rest = &bytes[..];
        for n in sizes.iter().cycle() {
            if rest.is_empty() {
                break;
            }
            let (chunk, tail) = rest.split_at((*n).min(rest.len()));
            parser.feed(chunk, &mut emu).unwrap();
            rest = tail;
        }

        prop_assert!(parser.pending().is_empty());
        prop_assert_eq!(emu.freeze(), whole.freeze());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Margin clamp
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn margins_stay_valid(h in 2usize..=30, top in 0u16..40, bottom in 0u16..40) {
        let emu = run(10, h, format!("\x1b[{top};{bottom}r").as_bytes());
        let margins = emu.margins();
        prop_assert!(margins.top < margins.bottom, "{:?}", margins);
        prop_assert!(margins.bottom < h, "{:?} for height {}", margins, h);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Erase idempotence
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn erase_display_is_idempotent((w, h) in size(), bytes in input()) {
        let mut once = run(w, h, &bytes);
        Parser::new().feed(b"\x1b[2J", &mut once).unwrap();
        let mut twice = run(w, h, &bytes);
        Parser::new().feed(b"\x1b[2J\x1b[2J", &mut twice).unwrap();

        prop_assert_eq!(once.freeze(), twice.freeze());
        let grid = once.grid();
        for y in 0..h {
            prop_assert_eq!(grid.line_attr(y), LineAttr::NORMAL);
            for x in 0..w {
                prop_assert_eq!(grid.cell(x, y), Cell::BLANK);
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. UTF-8 decoding
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn multibyte_char_is_one_event(ch in any::<char>().prop_filter("multi-byte", |c| c.len_utf8() > 1)) {
        let mut buf = [0u8; 4];
        let bytes = ch.encode_utf8(&mut buf).as_bytes();

        let mut parser = Parser::new();
        let (last, head) = bytes.split_last().unwrap();
        for b in head {
            prop_assert!(parser.parse(std::slice::from_ref(b)).unwrap().is_empty());
        }
        let events = parser.parse(std::slice::from_ref(last)).unwrap();
        prop_assert_eq!(events, vec![Event::NormalString(ch.to_string())]);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. Reverse video symmetry
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn reverse_then_unreverse_restores_colors(fg in 30u16..38, bg in 40u16..48, repeats in 1usize..4) {
        let mut seq = format!("\x1b[{fg};{bg}m");
        seq.push_str(&"\x1b[7m".repeat(repeats));
        seq.push_str("\x1b[27mx");
        let emu = run(4, 2, seq.as_bytes());
        let pen = emu.cell(0, 0).pen;
        prop_assert_eq!((u16::from(pen.fcolor), u16::from(pen.bcolor)), (fg - 30, bg - 40));
    }
}
