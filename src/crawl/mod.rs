// src/crawl/mod.rs
// =============================================================================
// This module turns a content directory into something the auditor can scan.
//
// Features:
// - Breadth-first walk of the content tree
// - Ordering prefixes ("01.home") dropped from routes
// - Per-page media lookup from the files next to the page source
// - Optional home alias so "/" and "/home" are the same page
//
// Rust concepts:
// - Trait implementations: SiteTree is a RouteIndex, SitePage is a Page
// - Collections: VecDeque for the walk queue, HashMap for route lookup
// =============================================================================

mod queue;
mod site;

pub use queue::load_site;
pub use site::{SitePage, SiteTree};
