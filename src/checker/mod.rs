// src/checker/mod.rs
// =============================================================================
// This module contains all link checking logic.
//
// Submodules:
// - category: The closed set of link categories
// - brackets: Balanced [label](target) scanner
// - patterns: The seven classification rules
// - markdown: Extracts categorized links from raw page source
// - resolve: Decides which extracted links are broken
//
// This file (mod.rs) is the module root - it ties everything together and
// exports the public API that other parts of our application can use.
// =============================================================================

mod brackets;
mod category;
mod markdown;
mod patterns;
mod resolve;

// Re-export public items from submodules
// This lets users write `checker::LinkExtractor` instead of
// `checker::markdown::LinkExtractor`
pub use brackets::{construct_at, find_close, BracketIndex, Construct};
pub use category::{CategorizedLinks, LinkCategory, UnknownCategory};
pub use markdown::{extract_markdown_links, LinkExtractor};
pub use patterns::{Pattern, PatternSet};
pub use resolve::{join_route, LinkResolver};
