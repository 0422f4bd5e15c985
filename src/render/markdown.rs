//! Markdown subset used inside text layers.
//!
//! Supported: `#`..`######` headers, `---`/`***` rules, `***bold italic***`,
//! `**bold**`, `*italic*`, and line breaks. Everything else is plain text.
//!
//! Styles do not nest: `**bold *and italic* still bold**` is one bold run
//! followed by literal asterisks, never a composed style.

/// Kind of a parsed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Normal,
    /// Header level 1..=6.
    Header(u8),
    Rule,
}

/// A contiguous piece of text with one style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
}

impl Run {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
            italic: false,
        }
    }
}

/// One input line after classification and inline parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub kind: LineKind,
    pub runs: Vec<Run>,
}

impl Line {
    /// A normal line with no runs: spacing only.
    pub fn is_blank(&self) -> bool {
        self.kind == LineKind::Normal && self.runs.is_empty()
    }
}

/// Inline markers in priority order: (marker, bold, italic).
const MARKERS: [(&str, bool, bool); 3] = [("***", true, true), ("**", true, false), ("*", false, true)];

/// Parse text into classified lines.
pub fn parse(text: &str) -> Vec<Line> {
    text.split('\n').map(parse_line).collect()
}

fn parse_line(raw: &str) -> Line {
    let line = raw.trim();
    if line.is_empty() {
        return Line {
            kind: LineKind::Normal,
            runs: Vec::new(),
        };
    }
    if line.starts_with("---") || line.starts_with("***") {
        return Line {
            kind: LineKind::Rule,
            runs: Vec::new(),
        };
    }

    let hashes = line.bytes().take_while(|&b| b == b'#').count();
    if (1..=6).contains(&hashes) && line[hashes..].starts_with(' ') {
        return Line {
            kind: LineKind::Header(hashes as u8),
            runs: parse_inline(line[hashes..].trim()),
        };
    }

    Line {
        kind: LineKind::Normal,
        runs: parse_inline(line),
    }
}

/// Split a line into styled runs.
///
/// At each `*` the markers are tried longest first; a marker only opens a
/// run when the same marker closes it later with non-empty text in between.
/// Unmatched asterisks stay in the plain text.
pub fn parse_inline(text: &str) -> Vec<Run> {
    let mut runs = Vec::new();
    let mut plain = String::new();
    let mut i = 0;

    'scan: while i < text.len() {
        let rest = &text[i..];
        if rest.starts_with('*') {
            for (marker, bold, italic) in MARKERS {
                if !rest.starts_with(marker) {
                    continue;
                }
                let inner = &rest[marker.len()..];
                if let Some(close) = inner.find(marker)
                    && close > 0
                {
                    if !plain.is_empty() {
                        runs.push(Run::plain(std::mem::take(&mut plain)));
                    }
                    runs.push(Run {
                        text: inner[..close].to_string(),
                        bold,
                        italic,
                    });
                    i += marker.len() * 2 + close;
                    continue 'scan;
                }
            }
            plain.push('*');
            i += 1;
            continue;
        }

        let next = rest.find('*').unwrap_or(rest.len());
        plain.push_str(&rest[..next]);
        i += next;
    }

    if !plain.is_empty() {
        runs.push(Run::plain(plain));
    }
    runs
}

/// Drop every line whose trimmed text starts with `#`.
pub fn strip_headers(text: &str) -> String {
    text.lines()
        .filter(|l| !l.trim_start().starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n")
}
