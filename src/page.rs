// src/page.rs
// =============================================================================
// What the audit needs from the content system, and nothing more.
//
// The auditor never reaches into a CMS directly. Callers hand it a Page to
// scan and a RouteIndex to resolve against; crawl::SiteTree is the
// filesystem implementation that ships with the binary.
// =============================================================================

/// A page whose source can be audited.
pub trait Page: Send + Sync {
    /// Canonical route, e.g. `/blog/first-post`
    fn route(&self) -> &str;

    /// Stored markup before any rendering
    fn raw_source(&self) -> &str;

    /// Whether a media file with this (already URL-decoded) name is
    /// attached to the page.
    fn has_media(&self, name: &str) -> bool;
}

/// The site's full set of routes.
pub trait RouteIndex: Send + Sync {
    /// Whether a page exists at `path`.
    fn exists(&self, path: &str) -> bool;

    /// Every page in the site, for whole-site scans.
    fn all_pages(&self) -> Vec<&dyn Page>;
}
