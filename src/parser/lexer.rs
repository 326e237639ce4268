//! Shortest-match tokenizer
//!
//! Every recognizer looks at the front of the pending buffer and either
//! claims a prefix or declines. Among the claims the shortest wins, and on
//! a tie the recognizer listed first wins. A recognizer declines when the
//! buffer only holds the beginning of its token, so incomplete sequences
//! wait for more input instead of being misread as something shorter.

use super::event::{
    CharsetAction, Direction, EraseScope, Event, GotoTarget, Hardware, IndexKind, Led, ReportKind,
    ShiftSlot, SpecialChar, StackAction, TabAction,
};
use crate::core::{
    CharsetName, KeypadMode, LineAttr, LineHeight, LineWidth, ModeChange, NewLineMode, Origin,
    ScreenBuffer, ScrollMode, Slot,
};

const ESC: u8 = 0x1b;
const BEL: u8 = 0x07;

/// Something a lexeme produces, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Output {
    Event(Event),
    Warn(String),
}

/// A claimed prefix of `len` bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Lexeme {
    pub(crate) len: usize,
    pub(crate) out: Vec<Output>,
}

impl Lexeme {
    fn new(len: usize, out: Vec<Output>) -> Self {
        Self { len, out }
    }

    fn event(len: usize, event: Event) -> Self {
        Self::new(len, vec![Output::Event(event)])
    }

    fn warn(len: usize, message: String) -> Self {
        Self::new(len, vec![Output::Warn(message)])
    }

    fn silent(len: usize) -> Self {
        Self::new(len, Vec::new())
    }
}

type Recognizer = fn(&[u8]) -> Option<Lexeme>;

/// Registration order is the tie-break order
const RECOGNIZERS: &[Recognizer] = &[
    control,
    ignored_control,
    ascii_run,
    utf8_char,
    invalid_utf8,
    csi,
    escape,
    osc,
];

/// Pick the shortest claim on the front of `buf`
pub(crate) fn next_lexeme(buf: &[u8]) -> Option<Lexeme> {
    let mut best: Option<Lexeme> = None;
    for recognize in RECOGNIZERS {
        if let Some(lexeme) = recognize(buf) {
            if lexeme.len > 0 && best.as_ref().map_or(true, |b| lexeme.len < b.len) {
                best = Some(lexeme);
            }
        }
    }
    best
}

// Plain bytes

fn control(buf: &[u8]) -> Option<Lexeme> {
    let event = match *buf.first()? {
        BEL => Event::SpecialChar(SpecialChar::Bell),
        0x08 => Event::SpecialChar(SpecialChar::Backspace),
        0x09 => Event::SpecialChar(SpecialChar::HorizontalTab),
        0x0a => Event::SpecialChar(SpecialChar::LineFeed),
        0x0b => Event::SpecialChar(SpecialChar::VerticalTab),
        0x0c => Event::SpecialChar(SpecialChar::FormFeed),
        0x0d => Event::SpecialChar(SpecialChar::CarriageReturn),
        0x0e => Event::Charset(CharsetAction::Switch(Slot::G1)),
        0x0f => Event::Charset(CharsetAction::Switch(Slot::G0)),
        _ => return None,
    };
    Some(Lexeme::event(1, event))
}

/// C0 bytes without a meaning here, and DEL
fn ignored_control(buf: &[u8]) -> Option<Lexeme> {
    match *buf.first()? {
        b @ (0x00..=0x06 | 0x10..=0x1a | 0x1c..=0x1f | 0x7f) => {
            tracing::trace!(byte = b, "dropping control byte");
            Some(Lexeme::silent(1))
        }
        _ => None,
    }
}

fn ascii_run(buf: &[u8]) -> Option<Lexeme> {
    let len = buf.iter().take_while(|b| (0x20..=0x7e).contains(*b)).count();
    if len == 0 {
        return None;
    }
    // The run is printable ASCII, so it is valid UTF-8
    let text = String::from_utf8_lossy(&buf[..len]).into_owned();
    Some(Lexeme::event(len, Event::NormalString(text)))
}

/// Expected length and allowed range of the second byte for a lead byte
fn utf8_shape(lead: u8) -> Option<(usize, u8, u8)> {
    Some(match lead {
        0xc2..=0xdf => (2, 0x80, 0xbf),
        0xe0 => (3, 0xa0, 0xbf),
        0xe1..=0xec | 0xee..=0xef => (3, 0x80, 0xbf),
        0xed => (3, 0x80, 0x9f),
        0xf0 => (4, 0x90, 0xbf),
        0xf1..=0xf3 => (4, 0x80, 0xbf),
        0xf4 => (4, 0x80, 0x8f),
        _ => return None,
    })
}

enum Utf8Check {
    Complete(usize),
    Truncated,
    Invalid,
}

fn check_utf8(buf: &[u8]) -> Utf8Check {
    let Some((len, lo, hi)) = buf.first().and_then(|&b| utf8_shape(b)) else {
        return Utf8Check::Invalid;
    };
    for i in 1..len {
        let Some(&b) = buf.get(i) else {
            return Utf8Check::Truncated;
        };
        let (min, max) = if i == 1 { (lo, hi) } else { (0x80, 0xbf) };
        if !(min..=max).contains(&b) {
            return Utf8Check::Invalid;
        }
    }
    Utf8Check::Complete(len)
}

/// One multi-byte UTF-8 character
fn utf8_char(buf: &[u8]) -> Option<Lexeme> {
    if *buf.first()? < 0x80 {
        return None;
    }
    let Utf8Check::Complete(len) = check_utf8(buf) else {
        return None;
    };
    let text = std::str::from_utf8(&buf[..len]).ok()?.to_string();
    Some(Lexeme::event(len, Event::NormalString(text)))
}

/// A high byte that cannot start or continue a valid character
fn invalid_utf8(buf: &[u8]) -> Option<Lexeme> {
    let b = *buf.first()?;
    if b < 0x80 || !matches!(check_utf8(buf), Utf8Check::Invalid) {
        return None;
    }
    Some(Lexeme::new(
        1,
        vec![
            Output::Warn(format!("invalid UTF-8 byte 0x{b:02x}")),
            Output::Event(Event::NormalString(char::REPLACEMENT_CHARACTER.to_string())),
        ],
    ))
}

// Escape sequences

fn escape(buf: &[u8]) -> Option<Lexeme> {
    if *buf.first()? != ESC {
        return None;
    }
    let b1 = *buf.get(1)?;
    let event = match b1 {
        b'[' | b']' => return None,
        b'D' => Event::Index(IndexKind::Down),
        b'M' => Event::Index(IndexKind::Up),
        b'E' => Event::Index(IndexKind::NextLine),
        b'7' => Event::CursorStack(StackAction::Push),
        b'8' => Event::CursorStack(StackAction::Pop),
        b'=' => Event::Mode(ModeChange::Keypad(KeypadMode::Application)),
        b'>' => Event::Mode(ModeChange::Keypad(KeypadMode::Numeric)),
        b'H' => Event::TabStop(TabAction::Add),
        b'c' => Event::Reset,
        b'Z' => Event::Report(ReportKind::DeviceAttributes),
        // String terminator with nothing to terminate
        b'\\' => return Some(Lexeme::silent(2)),
        b'N' | b'O' => {
            let slot = if b1 == b'N' { ShiftSlot::G2 } else { ShiftSlot::G3 };
            let b2 = *buf.get(2)?;
            if !(0x20..=0x7e).contains(&b2) {
                return Some(Lexeme::warn(2, format!("single shift cut short by 0x{b2:02x}")));
            }
            return Some(Lexeme::event(3, Event::SingleShift(slot, char::from(b2))));
        }
        b'(' | b')' => return designate(buf, b1),
        b'#' => return line_attr(buf),
        0x20..=0x2f => {
            // Other intermediates: consume through the final byte
            let len = 1 + buf[1..].iter().take_while(|b| (0x20..=0x2f).contains(*b)).count();
            let fin = *buf.get(len)?;
            if !(0x30..=0x7e).contains(&fin) {
                return Some(Lexeme::warn(
                    len,
                    format!("Malformed escape sequence: {}", buf[..len].escape_ascii()),
                ));
            }
            return Some(Lexeme::warn(
                len + 1,
                format!("Unhandled escape sequence: {}", buf[..=len].escape_ascii()),
            ));
        }
        0x30..=0x7e => {
            return Some(Lexeme::warn(
                2,
                format!("Unhandled escape sequence: {}", buf[..2].escape_ascii()),
            ))
        }
        _ => {
            // A control or high byte can't follow ESC; drop the ESC alone
            return Some(Lexeme::warn(1, format!("stray ESC before 0x{b1:02x}")));
        }
    };
    Some(Lexeme::event(2, event))
}

fn designate(buf: &[u8], which: u8) -> Option<Lexeme> {
    let slot = if which == b'(' { Slot::G0 } else { Slot::G1 };
    let name = match *buf.get(2)? {
        b'A' => CharsetName::Uk,
        b'B' => CharsetName::Us,
        b'0' => CharsetName::Line,
        b'1' => CharsetName::Rom,
        b'2' => CharsetName::RomSpecial,
        _ => {
            return Some(Lexeme::warn(
                3,
                format!("Unhandled charset designation: {}", buf[..3].escape_ascii()),
            ))
        }
    };
    Some(Lexeme::event(3, Event::Charset(CharsetAction::Set(slot, name))))
}

fn line_attr(buf: &[u8]) -> Option<Lexeme> {
    let attr = |width, height| Event::LineAttr(LineAttr { width, height });
    let event = match *buf.get(2)? {
        b'3' => attr(LineWidth::Double, LineHeight::Top),
        b'4' => attr(LineWidth::Double, LineHeight::Bottom),
        b'5' => attr(LineWidth::Normal, LineHeight::Normal),
        b'6' => attr(LineWidth::Double, LineHeight::Normal),
        b'8' => Event::Hardware(Hardware::ScreenAlignment),
        _ => {
            return Some(Lexeme::warn(
                3,
                format!("Unhandled escape sequence: {}", buf[..3].escape_ascii()),
            ))
        }
    };
    Some(Lexeme::event(3, event))
}

// Operating system commands

/// `ESC ] code ; text` ended by BEL, by `ESC \`, or by any other ESC (which
/// is left for the next token)
fn osc(buf: &[u8]) -> Option<Lexeme> {
    if buf.len() < 2 || buf[0] != ESC || buf[1] != b']' {
        return None;
    }
    let mut end = None;
    for (i, &b) in buf.iter().enumerate().skip(2) {
        if b == BEL {
            end = Some((i, i + 1));
            break;
        }
        if b == ESC {
            let next = *buf.get(i + 1)?;
            end = Some((i, if next == b'\\' { i + 2 } else { i }));
            break;
        }
    }
    let (body_end, len) = end?;
    let body = &buf[2..body_end];

    let Some(split) = body.iter().position(|&b| b == b';') else {
        return Some(Lexeme::warn(len, format!("Unhandled OSC: {}", body.escape_ascii())));
    };
    let text = String::from_utf8_lossy(&body[split + 1..]).into_owned();
    let event = match &body[..split] {
        b"0" => Event::SetWindowIconTitle(text),
        b"1" => Event::SetIconTitle(text),
        b"2" => Event::SetWindowTitle(text),
        code => {
            return Some(Lexeme::warn(
                len,
                format!("Unhandled OSC {}", code.escape_ascii()),
            ))
        }
    };
    Some(Lexeme::event(len, event))
}

// Control sequences

/// `ESC [ marker? params intermediates final`
fn csi(buf: &[u8]) -> Option<Lexeme> {
    if buf.len() < 2 || buf[0] != ESC || buf[1] != b'[' {
        return None;
    }
    let mut i = 2;
    let marker = match *buf.get(i)? {
        b @ 0x3c..=0x3f => {
            i += 1;
            Some(b)
        }
        _ => None,
    };
    let params_start = i;
    while buf.get(i).is_some_and(|b| (0x30..=0x3b).contains(b)) {
        i += 1;
    }
    let params_end = i;
    while buf.get(i).is_some_and(|b| (0x20..=0x2f).contains(b)) {
        i += 1;
    }
    let inter_end = i;
    let fin = *buf.get(i)?;
    if !(0x40..=0x7e).contains(&fin) {
        // Abandon what we have; the offending byte is lexed on its own
        return Some(Lexeme::warn(
            i,
            format!("Malformed control sequence: {}", buf[..i].escape_ascii()),
        ));
    }
    let seq = Csi {
        raw: &buf[..=i],
        marker,
        params: &buf[params_start..params_end],
        intermediates: &buf[params_end..inter_end],
        fin,
    };
    Some(Lexeme::new(i + 1, seq.dispatch()))
}

struct Csi<'a> {
    raw: &'a [u8],
    marker: Option<u8>,
    params: &'a [u8],
    intermediates: &'a [u8],
    fin: u8,
}

fn parse_number(p: &[u8]) -> Option<Option<u16>> {
    if p.is_empty() {
        return Some(None);
    }
    if !p.iter().all(u8::is_ascii_digit) {
        return None;
    }
    Some(Some(p.iter().fold(0u16, |acc, &d| {
        acc.saturating_mul(10).saturating_add(u16::from(d - b'0'))
    })))
}

impl Csi<'_> {
    fn unhandled(&self) -> Vec<Output> {
        vec![Output::Warn(format!(
            "Unhandled control sequence: {}",
            self.raw.escape_ascii()
        ))]
    }

    fn subparams(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.params.split(|&b| b == b';')
    }

    /// Numeric parameters; `None` entries were empty. Fails on sub-parameter
    /// syntax (`:`) and stray markers.
    fn numbers(&self) -> Option<Vec<Option<u16>>> {
        self.subparams().map(parse_number).collect()
    }

    fn dispatch(&self) -> Vec<Output> {
        match (self.marker, self.intermediates, self.fin) {
            (None, b"", _) => self.dispatch_plain(),
            (Some(b'?'), b"", b'h' | b'l') => self.modes(),
            (Some(b'?'), b"", b'n') => self.reports(),
            (Some(b'>'), b"", b'c') => vec![Output::Event(Event::Report(ReportKind::VersionString))],
            (None, b"!", b'p') => vec![Output::Event(Event::SoftReset)],
            _ => self.unhandled(),
        }
    }

    fn dispatch_plain(&self) -> Vec<Output> {
        match self.fin {
            b'h' | b'l' => return self.modes(),
            b'n' => return self.reports(),
            b'm' => return self.sgr(),
            b'q' => return self.leds(),
            b'y' => {
                let raw = String::from_utf8_lossy(self.params).into_owned();
                return vec![Output::Event(Event::Hardware(Hardware::SelfTest(raw)))];
            }
            _ => {}
        }

        let Some(nums) = self.numbers() else {
            return self.unhandled();
        };
        let first = nums.first().copied().flatten();
        let count = match first {
            None | Some(0) => 1,
            Some(n) => n,
        };
        let second = nums.get(1).copied().flatten();

        let event = match self.fin {
            b'A' => Event::Arrow(Direction::Up, count),
            b'B' => Event::Arrow(Direction::Down, count),
            b'C' => Event::Arrow(Direction::Right, count),
            b'D' => Event::Arrow(Direction::Left, count),
            b'H' | b'f' if self.params.is_empty() => Event::Goto(GotoTarget::Home),
            b'H' | b'f' => Event::Goto(GotoTarget::Position {
                row: first.unwrap_or(1),
                col: second.unwrap_or(1),
            }),
            b'G' => Event::GotoColumn(count),
            b'd' => Event::GotoRow(count),
            b'K' | b'J' => {
                let scope = match first {
                    None | Some(0) => EraseScope::ToEnd,
                    Some(1) => EraseScope::ToStart,
                    Some(2) => EraseScope::Whole,
                    _ => return self.unhandled(),
                };
                if self.fin == b'K' {
                    Event::EraseInLine(scope)
                } else {
                    Event::EraseInDisplay(scope)
                }
            }
            b'@' => Event::InsertChars(count),
            b'P' => Event::DeleteChars(count),
            b'X' => Event::EraseChars(count),
            b'L' => Event::InsertLines(count),
            b'M' => Event::DeleteLines(count),
            b'S' => Event::ScrollUp(count),
            b'T' if nums.len() <= 1 => Event::ScrollDown(count),
            b'g' => match first {
                None | Some(0) => Event::TabStop(TabAction::Remove),
                Some(3) => Event::TabStop(TabAction::Clear),
                _ => return self.unhandled(),
            },
            b'c' if first.unwrap_or(0) == 0 => Event::Report(ReportKind::DeviceAttributes),
            b'r' if self.params.is_empty() => Event::ResetMargins,
            b'r' => Event::SetMargins {
                top: first,
                bottom: second,
            },
            b's' if self.params.is_empty() => Event::CursorStack(StackAction::Push),
            b'u' if self.params.is_empty() => Event::CursorStack(StackAction::Pop),
            _ => return self.unhandled(),
        };
        vec![Output::Event(event)]
    }

    /// One event per parameter; an empty list means 0
    fn sgr(&self) -> Vec<Output> {
        if self.params.is_empty() {
            return vec![Output::Event(Event::SetAttribute(0))];
        }
        self.subparams()
            .map(|p| match parse_number(p) {
                Some(n) => Output::Event(Event::SetAttribute(n.unwrap_or(0))),
                None => Output::Warn(format!("Unhandled attribute: {}", p.escape_ascii())),
            })
            .collect()
    }

    fn leds(&self) -> Vec<Output> {
        self.subparams()
            .map(|p| match parse_number(p) {
                Some(None | Some(0)) => Output::Event(Event::Led(Led::AllOff)),
                Some(Some(n)) => Output::Event(Event::Led(Led::On(n))),
                None => Output::Warn(format!("Unhandled LED: {}", p.escape_ascii())),
            })
            .collect()
    }

    /// Key of a sub-parameter as it appears on the wire, marker included
    fn key(&self, sub: &[u8]) -> String {
        let mut key = String::new();
        if let Some(m) = self.marker {
            key.push(char::from(m));
        }
        key.push_str(&String::from_utf8_lossy(sub));
        key
    }

    fn reports(&self) -> Vec<Output> {
        self.subparams()
            .map(|sub| {
                let key = self.key(sub);
                let kind = match key.as_str() {
                    "5" => ReportKind::Status,
                    "6" => ReportKind::CursorPosition,
                    "?15" => ReportKind::Printer,
                    _ => return Output::Warn(format!("Unhandled report request: \"{key}\"")),
                };
                Output::Event(Event::Report(kind))
            })
            .collect()
    }

    fn modes(&self) -> Vec<Output> {
        let set = self.fin == b'h';
        let mut out = Vec::new();
        for sub in self.subparams() {
            let key = self.key(sub);
            match mode_events(&key, set) {
                Some(events) => out.extend(events.into_iter().map(Output::Event)),
                None => {
                    let verb = if set { "set" } else { "reset" };
                    out.push(Output::Warn(format!("Unhandled {verb} mode: \"{key}\"")));
                }
            }
        }
        out
    }
}

/// Events for one set (`h`) or reset (`l`) mode key
fn mode_events(key: &str, set: bool) -> Option<Vec<Event>> {
    let mode = |change| Some(vec![Event::Mode(change)]);
    let screen = if set {
        ScreenBuffer::Alternate
    } else {
        ScreenBuffer::Primary
    };
    match key {
        "?1" => mode(ModeChange::CursorKeyAnsi(!set)),
        "?2" if !set => mode(ModeChange::Vt52(true)),
        "?3" => mode(ModeChange::Width(if set { 132 } else { 80 })),
        "?4" => mode(ModeChange::Scroll(if set {
            ScrollMode::Smooth
        } else {
            ScrollMode::Jump
        })),
        "?5" => mode(ModeChange::ReverseScreen(set)),
        "?6" => Some(vec![Event::OriginMode(if set {
            Origin::Margin
        } else {
            Origin::Screen
        })]),
        "?7" => mode(ModeChange::AutoWrap(set)),
        "?8" => mode(ModeChange::AutoRepeat(set)),
        "?9" => mode(ModeChange::MouseTrackingDown(set)),
        "?25" => mode(ModeChange::CursorVisible(set)),
        "?47" | "?1047" => mode(ModeChange::CurrentScreen(screen)),
        "?1000" => mode(ModeChange::MouseTrackingUp(set)),
        "?1049" if set => Some(vec![
            Event::CursorStack(StackAction::Push),
            Event::Mode(ModeChange::CurrentScreen(screen)),
            Event::EraseInDisplay(EraseScope::Whole),
        ]),
        "?1049" => Some(vec![
            Event::Mode(ModeChange::CurrentScreen(screen)),
            Event::CursorStack(StackAction::Pop),
        ]),
        "2" => mode(ModeChange::KeyboardLocked(set)),
        "4" => mode(ModeChange::Insert(set)),
        "12" => mode(ModeChange::LocalEcho(!set)),
        "20" => mode(ModeChange::NewLine(if set {
            NewLineMode::CrLf
        } else {
            NewLineMode::Cr
        })),
        _ => None,
    }
}
