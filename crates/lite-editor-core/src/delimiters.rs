//! Per-line delimiter index.
//!
//! Every line is scanned once for the structural delimiters `{}`, `()`, `[]` and the quote
//! characters `'` and `"`. The scan knows nothing about strings or comments: brackets are
//! classified by their character, and each quote character toggles between opening and closing
//! independently within a single line.

/// Whether a delimiter opens or closes a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DelimiterRole {
    /// `{`, `(`, `[`, or a quote that starts a pair on its line.
    Open,
    /// `}`, `)`, `]`, or a quote that ends a pair on its line.
    Close,
}

/// A single delimiter found on a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Delimiter {
    /// Zero-based column in characters.
    pub column: usize,
    /// The delimiter character.
    pub ch: char,
    /// Open or close.
    pub role: DelimiterRole,
}

impl Delimiter {
    /// Returns `true` for bracket delimiters (the ones that contribute to brace depth).
    pub fn is_bracket(&self) -> bool {
        is_bracket(self.ch)
    }

    /// Returns `true` if `other` belongs to the same pair type (`{`/`}`, `"`/`"`, ...).
    pub fn same_kind(&self, other: &Delimiter) -> bool {
        pair_kind(self.ch) == pair_kind(other.ch)
    }
}

/// Returns `true` if `ch` is one of the characters the index records.
pub fn is_delimiter(ch: char) -> bool {
    matches!(ch, '{' | '}' | '(' | ')' | '[' | ']' | '\'' | '"')
}

/// Returns `true` if `ch` is a bracket (not a quote).
pub fn is_bracket(ch: char) -> bool {
    matches!(ch, '{' | '}' | '(' | ')' | '[' | ']')
}

/// The partner character of a delimiter (`{` ↔ `}`, quotes map to themselves).
pub fn partner(ch: char) -> Option<char> {
    match ch {
        '{' => Some('}'),
        '}' => Some('{'),
        '(' => Some(')'),
        ')' => Some('('),
        '[' => Some(']'),
        ']' => Some('['),
        '\'' => Some('\''),
        '"' => Some('"'),
        _ => None,
    }
}

/// Returns `true` if `open` immediately followed by `close` forms an adjacent bracket pair.
pub fn is_bracket_pair(open: char, close: char) -> bool {
    matches!((open, close), ('{', '}') | ('(', ')') | ('[', ']'))
}

fn pair_kind(ch: char) -> char {
    match ch {
        '}' => '{',
        ')' => '(',
        ']' => '[',
        other => other,
    }
}

/// Scan `text` (a single line, without its line break) and return its delimiters in column order.
pub fn index_line(text: &str) -> Vec<Delimiter> {
    let mut delimiters = Vec::new();
    let mut single_open = false;
    let mut double_open = false;

    for (column, ch) in text.chars().enumerate() {
        let role = match ch {
            '{' | '(' | '[' => DelimiterRole::Open,
            '}' | ')' | ']' => DelimiterRole::Close,
            '\'' => toggle(&mut single_open),
            '"' => toggle(&mut double_open),
            _ => continue,
        };
        delimiters.push(Delimiter { column, ch, role });
    }

    delimiters
}

fn toggle(open: &mut bool) -> DelimiterRole {
    *open = !*open;
    if *open {
        DelimiterRole::Open
    } else {
        DelimiterRole::Close
    }
}

/// Brace depth after applying `delimiters` to `depth_before`.
///
/// Only brackets count. A close bracket at depth zero leaves the depth at zero.
pub fn depth_after(depth_before: usize, delimiters: &[Delimiter]) -> usize {
    delimiters
        .iter()
        .filter(|d| d.is_bracket())
        .fold(depth_before, |depth, d| match d.role {
            DelimiterRole::Open => depth + 1,
            DelimiterRole::Close => depth.saturating_sub(1),
        })
}
