// src/checker/brackets.rs
// =============================================================================
// A small scanner for markdown link constructs: `[label](target)`.
//
// Both halves may contain their own balanced pairs:
//   [see [the docs]](page(v2))
// The label ends at the `]` that balances the opening `[`, not the first `]`,
// and the target ends at the `)` that balances the opening `(`. Only the pair
// being balanced is counted: parentheses are plain text inside a label and
// square brackets are plain text inside a target.
//
// BracketIndex balances every `[` and `(` of a text in one stack pass, so a
// rule can try a construct at every offset without rescanning the rest of
// the text each time. Unclosed brackets cost nothing after that pass.
//
// This module only finds constructs. Deciding what kind of link a construct
// is happens in patterns.rs.
// =============================================================================

/// One `[label](target)` occurrence in a piece of text.
///
/// `start` and `end` are byte offsets of the whole construct (the opening `[`
/// through the closing `)`, exclusive end). The leading `!` of an image is
/// not part of the construct; callers look at the byte before `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Construct<'a> {
    pub start: usize,
    pub end: usize,
    pub label: &'a str,
    pub target: &'a str,
}

/// Returns the offset of the `close` byte balancing the `open` byte at `at`.
///
/// Returns None when `at` isn't an `open` byte or the text runs out before
/// the pair balances.
pub fn find_close(bytes: &[u8], at: usize, open: u8, close: u8) -> Option<usize> {
    if bytes.get(at) != Some(&open) {
        return None;
    }

    let mut depth = 0usize;
    for (offset, &byte) in bytes[at..].iter().enumerate() {
        if byte == open {
            depth += 1;
        } else if byte == close {
            depth -= 1;
            if depth == 0 {
                return Some(at + offset);
            }
        }
    }

    None
}

/// Parses a link construct whose `[` sits at byte offset `at`.
///
/// The label's closing `]` must be followed immediately by `(`. Anything
/// malformed gives None; there are no partial matches.
///
/// Indexes the whole text on every call. Use [`BracketIndex`] to look up
/// many offsets of the same text.
pub fn construct_at(text: &str, at: usize) -> Option<Construct<'_>> {
    BracketIndex::new(text).construct_at(at)
}

/// Balancing offsets of every `[` and `(` in one text.
///
/// Gives the same answers as [`find_close`]: square brackets and
/// parentheses are balanced independently of each other.
#[derive(Debug, Clone)]
pub struct BracketIndex<'a> {
    text: &'a str,
    // closes[i] is the balancing `]` or `)` of an opening byte at i
    closes: Vec<Option<usize>>,
}

impl<'a> BracketIndex<'a> {
    pub fn new(text: &'a str) -> Self {
        let bytes = text.as_bytes();
        let mut closes = vec![None; bytes.len()];
        let mut squares = Vec::new();
        let mut parens = Vec::new();

        for (offset, &byte) in bytes.iter().enumerate() {
            match byte {
                b'[' => squares.push(offset),
                b'(' => parens.push(offset),
                b']' => {
                    if let Some(open) = squares.pop() {
                        closes[open] = Some(offset);
                    }
                }
                b')' => {
                    if let Some(open) = parens.pop() {
                        closes[open] = Some(offset);
                    }
                }
                _ => {}
            }
        }

        Self { text, closes }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    /// Offset of the byte balancing the `[` or `(` at `at`.
    pub fn close_of(&self, at: usize) -> Option<usize> {
        self.closes.get(at).copied().flatten()
    }

    /// Same as [`construct_at`] on the indexed text.
    pub fn construct_at(&self, at: usize) -> Option<Construct<'a>> {
        let bytes = self.text.as_bytes();
        if bytes.get(at) != Some(&b'[') {
            return None;
        }

        let label_close = self.close_of(at)?;
        let target_open = label_close + 1;
        if bytes.get(target_open) != Some(&b'(') {
            return None;
        }
        let target_close = self.close_of(target_open)?;

        // All four delimiters are ASCII, so these offsets are char boundaries.
        Some(Construct {
            start: at,
            end: target_close + 1,
            label: &self.text[at + 1..label_close],
            target: &self.text[target_open + 1..target_close],
        })
    }
}
