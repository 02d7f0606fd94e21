//! Inline annotation tokenizer.
//!
//! Two independent grammars are recognized in a single line of text:
//!
//! - **Ruby**: `漢字《かんじ》` (1–10 ideographs followed by 1–10 kana in
//!   brackets), or the marked form `｜base《text》` where the base is any 0–10
//!   non-bracket characters and the bracketed text is any 1–10 characters.
//! - **Image**: `<i123|45>`.
//!
//! Image placeholders are found first. The text between them is then scanned
//! left to right for ruby, each match consuming the text it covers. Ruby
//! matches whose brackets do not form a registered pair are discarded (their
//! text stays literal). The result is ordered by offset and never overlaps.

use memchr::memchr;
use tracing::debug;

/// Registered opening/closing bracket pairs for ruby readings.
pub const BRACKET_PAIRS: [(char, char); 4] = [('《', '》'), ('〈', '〉'), ('（', '）'), ('(', ')')];

/// Maximum characters in a ruby base or reading.
const MAX_RUN: usize = 10;

/// A matched annotation within a line. Offsets are in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Annotation<'a> {
    pub offset: usize,
    pub len: usize,
    pub kind: AnnotationKind<'a>,
}

impl Annotation<'_> {
    /// Byte offset just past the match.
    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationKind<'a> {
    Ruby(RubyMatch<'a>),
    Image(ImageMatch<'a>),
}

/// Raw pieces of a ruby match, borrowed from the scanned line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RubyMatch<'a> {
    pub marker: Option<char>,
    pub base: &'a str,
    pub open: char,
    pub reading: &'a str,
    pub close: char,
}

impl RubyMatch<'_> {
    /// Whether `open`/`close` form one of [`BRACKET_PAIRS`].
    pub fn is_paired(&self) -> bool {
        closing_bracket(self.open) == Some(self.close)
    }
}

/// Raw pieces of an image placeholder `<user|id>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageMatch<'a> {
    pub user: &'a str,
    pub id: &'a str,
}

impl ImageMatch<'_> {
    /// The placeholder text as written in the source.
    pub fn placeholder(&self) -> String {
        format!("<{}|{}>", self.user, self.id)
    }
}

/// Find every annotation in `line`, ordered by offset and non-overlapping.
///
/// Image placeholders are located first; ruby is only searched for in the
/// text between them, so a `|` inside a placeholder never starts a marked
/// ruby span.
pub fn scan(line: &str) -> Vec<Annotation<'_>> {
    let mut found = Vec::new();
    let mut cursor = 0;
    for image in scan_images(line) {
        push_paired_ruby(&mut found, line, cursor, image.offset);
        cursor = image.end();
        found.push(image);
    }
    push_paired_ruby(&mut found, line, cursor, line.len());
    found
}

/// Ruby matches with registered bracket pairs in `line[from..to]`.
fn push_paired_ruby<'a>(out: &mut Vec<Annotation<'a>>, line: &'a str, from: usize, to: usize) {
    for mut annotation in scan_ruby(&line[from..to]) {
        match annotation.kind {
            AnnotationKind::Ruby(ruby) if !ruby.is_paired() => {
                debug!(
                    offset = from + annotation.offset,
                    open = %ruby.open,
                    close = %ruby.close,
                    "ignoring ruby with mismatched brackets"
                );
            }
            _ => {
                annotation.offset += from;
                out.push(annotation);
            }
        }
    }
}

/// Scan for ruby candidates, including ones with mismatched brackets.
pub fn scan_ruby(line: &str) -> Vec<Annotation<'_>> {
    let mut out = Vec::new();
    let mut pos = 0;
    while pos < line.len() {
        let rest = &line[pos..];
        match match_plain_ruby(rest).or_else(|| match_marked_ruby(rest)) {
            Some((len, ruby)) => {
                out.push(Annotation {
                    offset: pos,
                    len,
                    kind: AnnotationKind::Ruby(ruby),
                });
                pos += len;
            }
            None => pos += rest.chars().next().map_or(1, char::len_utf8),
        }
    }
    out
}

/// Scan for `<i123|45>` image placeholders.
pub fn scan_images(line: &str) -> Vec<Annotation<'_>> {
    let bytes = line.as_bytes();
    let mut out = Vec::new();
    let mut from = 0;
    while let Some(rel) = memchr(b'<', &bytes[from..]) {
        let start = from + rel;
        match match_image(&line[start..]) {
            Some((len, image)) => {
                out.push(Annotation {
                    offset: start,
                    len,
                    kind: AnnotationKind::Image(image),
                });
                from = start + len;
            }
            None => from = start + 1,
        }
    }
    out
}

/// The closing bracket registered for `open`.
pub fn closing_bracket(open: char) -> Option<char> {
    BRACKET_PAIRS
        .iter()
        .find(|(o, _)| *o == open)
        .map(|(_, c)| *c)
}

fn is_open_bracket(c: char) -> bool {
    BRACKET_PAIRS.iter().any(|(o, _)| *o == c)
}

fn is_close_bracket(c: char) -> bool {
    BRACKET_PAIRS.iter().any(|(_, cl)| *cl == c)
}

fn is_marker(c: char) -> bool {
    matches!(c, '|' | '｜')
}

/// Ideographs (including extension B and up), iteration marks and the
/// ideographic space.
fn is_base_char(c: char) -> bool {
    matches!(c,
        '\u{3000}' | '々' | '〇' | '〻'
        | '\u{3400}'..='\u{9FFF}'
        | '\u{F900}'..='\u{FAFF}'
        | '\u{20000}'..='\u{2FFFF}')
}

/// Hiragana, katakana and the ideographic space.
fn is_reading_char(c: char) -> bool {
    matches!(c, '\u{3000}' | '\u{3041}'..='\u{3096}' | '\u{30A1}'..='\u{30FA}')
}

/// Byte length of the leading run of `pred` characters, if the run holds
/// between `min` and `max` characters.
///
/// A longer run yields `None`: whatever follows the first `max` characters
/// still satisfies `pred`, so it can never be the delimiter that ends the run.
fn run_len(s: &str, min: usize, max: usize, pred: impl Fn(char) -> bool) -> Option<usize> {
    let mut count = 0;
    for (idx, c) in s.char_indices() {
        if !pred(c) {
            return (count >= min).then_some(idx);
        }
        count += 1;
        if count > max {
            return None;
        }
    }
    (count >= min).then_some(s.len())
}

fn leading_char(s: &str, pred: impl Fn(char) -> bool) -> Option<char> {
    s.chars().next().filter(|c| pred(*c))
}

/// Parse `open reading close` at the start of `s`, returning the total length.
fn match_bracketed<'a>(
    s: &'a str,
    reading: impl Fn(char) -> bool,
) -> Option<(usize, char, &'a str, char)> {
    let open = leading_char(s, is_open_bracket)?;
    let inner = &s[open.len_utf8()..];
    let reading_len = run_len(inner, 1, MAX_RUN, reading)?;
    let close = leading_char(&inner[reading_len..], is_close_bracket)?;
    let len = open.len_utf8() + reading_len + close.len_utf8();
    Some((len, open, &inner[..reading_len], close))
}

/// `漢字《かんじ》`
fn match_plain_ruby(s: &str) -> Option<(usize, RubyMatch<'_>)> {
    let base_len = run_len(s, 1, MAX_RUN, is_base_char)?;
    let (bracketed, open, reading, close) = match_bracketed(&s[base_len..], is_reading_char)?;
    Some((
        base_len + bracketed,
        RubyMatch {
            marker: None,
            base: &s[..base_len],
            open,
            reading,
            close,
        },
    ))
}

/// `｜base《text》` and the comment form `｜《text》`.
fn match_marked_ruby(s: &str) -> Option<(usize, RubyMatch<'_>)> {
    let marker = leading_char(s, is_marker)?;
    let after = &s[marker.len_utf8()..];
    let base_len = run_len(after, 0, MAX_RUN, |c| !is_open_bracket(c))?;
    let (bracketed, open, reading, close) =
        match_bracketed(&after[base_len..], |c| !is_close_bracket(c))?;
    Some((
        marker.len_utf8() + base_len + bracketed,
        RubyMatch {
            marker: Some(marker),
            base: &after[..base_len],
            open,
            reading,
            close,
        },
    ))
}

fn match_image(s: &str) -> Option<(usize, ImageMatch<'_>)> {
    let bytes = s.as_bytes();
    if bytes.first() != Some(&b'<') || bytes.get(1) != Some(&b'i') {
        return None;
    }
    let digits = |from: usize| {
        bytes[from.min(bytes.len())..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    let user_end = 2 + digits(2);
    if user_end == 2 || bytes.get(user_end) != Some(&b'|') {
        return None;
    }
    let id_start = user_end + 1;
    let id_end = id_start + digits(id_start);
    if id_end == id_start || bytes.get(id_end) != Some(&b'>') {
        return None;
    }
    Some((
        id_end + 1,
        ImageMatch {
            user: &s[1..user_end],
            id: &s[id_start..id_end],
        },
    ))
}
