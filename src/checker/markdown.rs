// src/checker/markdown.rs
// =============================================================================
// This module extracts links from a page's raw Markdown source.
//
// We don't build a document model. Each rule in the PatternSet scans the
// text on its own and reports the targets it recognizes, grouped by
// category. Anything that doesn't look like a complete link construct is
// simply not reported: there are no partial matches and no errors.
//
// Rust concepts:
// - Pure functions: same input, same output, no I/O
// - Fixed-shape maps: one list per LinkCategory, never a missing key
// =============================================================================

use super::brackets::BracketIndex;
use super::category::CategorizedLinks;
use super::patterns::PatternSet;
use crate::config::InspectionLevel;

/// Turns page source into categorized link targets.
#[derive(Debug, Clone, Default)]
pub struct LinkExtractor {
    patterns: PatternSet,
    level: InspectionLevel,
}

impl LinkExtractor {
    pub fn new(level: InspectionLevel) -> Self {
        Self {
            patterns: PatternSet::standard(),
            level,
        }
    }

    pub fn level(&self) -> InspectionLevel {
        self.level
    }

    // Extracts every link-like construct from a page's source
    //
    // Parameters:
    //   raw: the page's stored markdown (borrowed as &str)
    //
    // Returns: CategorizedLinks, one ordered list per category
    //
    // Example input:
    //   "See [here](missing-page) and ![img](missing.png)"
    //
    // Example output:
    //   page_relative: ["missing-page"], media_relative: ["missing.png"]
    pub fn extract(&self, raw: &str) -> CategorizedLinks {
        let mut links = CategorizedLinks::new();

        match self.level {
            InspectionLevel::Raw => {
                let index = BracketIndex::new(raw);
                for pattern in self.patterns.patterns() {
                    for target in pattern.find_in(&index) {
                        links.push(pattern.category(), target);
                    }
                }
            }
            // Rendered inspection isn't implemented: it finds nothing
            InspectionLevel::Rendered => {}
        }

        links
    }
}

// Extracts links from raw Markdown with the standard rules
//
// Shorthand for LinkExtractor::new(InspectionLevel::Raw).extract(markdown)
pub fn extract_markdown_links(markdown: &str) -> CategorizedLinks {
    LinkExtractor::new(InspectionLevel::Raw).extract(markdown)
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why does one link show up in several categories?
//    - Rules don't know about each other
//    - [![logo](logo.png)](home) is a combined link, an image (logo.png)
//      and a page link (home) all at once
//    - The resolver looks at each category's list separately
//
// 2. Why no errors?
//    - Most text has no links at all, and broken markdown is just text
//    - Returning an empty list is the normal outcome
// -----------------------------------------------------------------------------
