// src/checker/patterns.rs
// =============================================================================
// The seven link classification rules.
//
// Each rule is a construct shape (plain link, image, or image-inside-link)
// plus a test on the target text. Rules run over the source independently:
// one rule never sees another rule's matches, so the same text can land in
// several categories (an image wrapped in a link is both `combined` and a
// `media_*` match, and usually a `page_*` match too).
//
// Within one rule, matches don't overlap. After a match the rule resumes
// right after it; after a miss it moves on by one character. That means a
// link whose outer target fails a rule can still have inner links in its
// label matched by that rule.
// =============================================================================

use super::brackets::{BracketIndex, Construct};
use super::category::LinkCategory;
use std::fmt;

/// Schemes a relative page link must not start with.
const PAGE_SCHEMES: [&str; 5] = ["http:", "https:", "ftp:", "mailto:", "tel:"];

/// Prefixes a relative media link must not start with. The last three are
/// stream prefixes the CMS resolves itself.
const MEDIA_RESERVED: [&str; 4] = ["http", "user", "theme", "plugin"];

/// Which kind of construct a rule looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    /// `[label](target)` not preceded by `!`
    Link,
    /// `![label](target)`
    Image,
    /// `[![alt](image)](target)`
    Combined,
}

/// One named classification rule.
#[derive(Clone, Copy)]
pub struct Pattern {
    category: LinkCategory,
    shape: Shape,
    target: fn(&str) -> Option<&str>,
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pattern")
            .field("name", &self.name())
            .field("shape", &self.shape)
            .finish()
    }
}

impl Pattern {
    pub fn category(&self) -> LinkCategory {
        self.category
    }

    pub fn name(&self) -> &'static str {
        self.category.as_str()
    }

    /// Every match of this rule in `text`, in source order.
    pub fn find_all(&self, text: &str) -> Vec<String> {
        self.find_in(&BracketIndex::new(text))
    }

    /// Like [`Pattern::find_all`], on a text that is already indexed.
    pub fn find_in(&self, index: &BracketIndex<'_>) -> Vec<String> {
        let text = index.text();
        let bytes = text.as_bytes();
        let mut found = Vec::new();
        let mut at = 0;

        while at < bytes.len() {
            // Skip ahead to the next byte a construct can start with
            match bytes[at..].iter().position(|&b| b == b'[' || b == b'!') {
                Some(offset) => at += offset,
                None => break,
            }

            match self.match_at(index, at) {
                Some((end, target)) => {
                    found.push(target);
                    at = end;
                }
                None => at += 1,
            }
        }

        found
    }

    // Returns the end offset of the match and the captured text.
    fn match_at(&self, index: &BracketIndex<'_>, at: usize) -> Option<(usize, String)> {
        let text = index.text();
        let bytes = text.as_bytes();

        match self.shape {
            Shape::Link => {
                if at > 0 && bytes[at - 1] == b'!' {
                    return None;
                }
                let link = index.construct_at(at)?;
                let target = (self.target)(link.target)?;
                Some((link.end, target.to_string()))
            }
            Shape::Image => {
                if bytes[at] != b'!' {
                    return None;
                }
                let image = index.construct_at(at + 1)?;
                let target = (self.target)(image.target)?;
                Some((image.end, target.to_string()))
            }
            Shape::Combined => {
                let link = index.construct_at(at)?;
                if !is_single_image(index, &link) {
                    return None;
                }
                Some((link.end, text[link.start..link.end].to_string()))
            }
        }
    }
}

// The label of a combined construct must be exactly one image.
fn is_single_image(index: &BracketIndex<'_>, link: &Construct<'_>) -> bool {
    if !link.label.starts_with('!') {
        return false;
    }
    // The label runs from start + 1 to its `]` at end of label
    let label_end = link.start + 1 + link.label.len();
    index
        .construct_at(link.start + 2)
        .is_some_and(|image| image.end == label_end)
}

/// The ordered rule set the extractor runs.
#[derive(Debug, Clone)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
}

impl PatternSet {
    /// The standard rules, one per category, in category order.
    pub fn standard() -> Self {
        let patterns = LinkCategory::ALL
            .into_iter()
            .map(|category| {
                let shape = match category {
                    LinkCategory::PageRelative
                    | LinkCategory::PageAbsolute
                    | LinkCategory::PageRemote => Shape::Link,
                    LinkCategory::Combined => Shape::Combined,
                    LinkCategory::MediaRelative
                    | LinkCategory::MediaAbsolute
                    | LinkCategory::MediaRemote => Shape::Image,
                };
                let target: fn(&str) -> Option<&str> = match category {
                    LinkCategory::PageRelative => page_relative,
                    LinkCategory::MediaRelative => media_relative,
                    LinkCategory::PageAbsolute | LinkCategory::MediaAbsolute => absolute,
                    LinkCategory::PageRemote | LinkCategory::MediaRemote => remote,
                    LinkCategory::Combined => whole,
                };
                Pattern {
                    category,
                    shape,
                    target,
                }
            })
            .collect();

        Self { patterns }
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }
}

impl Default for PatternSet {
    fn default() -> Self {
        Self::standard()
    }
}

// -----------------------------------------------------------------------------
// Target rules. Each receives the raw text between the parentheses and
// returns the part to record, or None if the target has the wrong shape.
// -----------------------------------------------------------------------------

fn page_relative(target: &str) -> Option<&str> {
    let target = target.strip_prefix("./").unwrap_or(target);
    if target.starts_with('/') || PAGE_SCHEMES.iter().any(|s| target.starts_with(s)) {
        return None;
    }
    // A malformed title is left in place rather than rejecting the link
    let target = strip_title(target).unwrap_or(target);
    Some(strip_query(target))
}

fn media_relative(target: &str) -> Option<&str> {
    let target = target.strip_prefix("./").unwrap_or(target);
    if target.starts_with('/') || MEDIA_RESERVED.iter().any(|p| target.starts_with(p)) {
        return None;
    }
    let target = strip_title(target)?;
    Some(strip_query(target))
}

fn absolute(target: &str) -> Option<&str> {
    target.starts_with('/').then_some(target)
}

fn remote(target: &str) -> Option<&str> {
    (target.starts_with("http://") || target.starts_with("https://")).then_some(target)
}

fn whole(target: &str) -> Option<&str> {
    Some(target)
}

/// Drops a trailing ` "title"`.
///
/// Returns None when the target ends in a quote that doesn't close a title.
fn strip_title(target: &str) -> Option<&str> {
    let Some(body) = target.strip_suffix('"') else {
        return Some(target);
    };
    let open = body.rfind('"')?;
    body[..open].strip_suffix(' ')
}

/// Drops everything from the first `?` or `#`.
fn strip_query(target: &str) -> &str {
    match target.find(|c: char| c == '?' || c == '#') {
        Some(end) => &target[..end],
        None => target,
    }
}
