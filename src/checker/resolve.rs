// src/checker/resolve.rs
// =============================================================================
// This module decides which extracted links are broken.
//
// Resolution policy per category:
// - page_absolute:  broken if no page exists at the path
// - page_relative:  broken if no page exists under the current page AND no
//                   attached media has that name
// - media_relative: broken if no attached media has that name
// - everything else (remote, combined, absolute media) is never checked
//
// Nothing here touches the network or the database. The RouteIndex and the
// Page answer every question, so resolving is as pure as extracting.
// =============================================================================

use super::category::{CategorizedLinks, LinkCategory};
use crate::page::{Page, RouteIndex};
use std::borrow::Cow;

/// Checks extracted links against the site's routes and a page's media.
pub struct LinkResolver<'a> {
    routes: &'a dyn RouteIndex,
}

impl<'a> LinkResolver<'a> {
    pub fn new(routes: &'a dyn RouteIndex) -> Self {
        Self { routes }
    }

    // Returns the subset of `extracted` that is broken
    //
    // Unchecked categories are always empty in the result.
    pub fn resolve(&self, page: &dyn Page, extracted: &CategorizedLinks) -> CategorizedLinks {
        let mut broken = CategorizedLinks::new();

        for (category, targets) in extracted.iter() {
            if !category.is_checked() {
                continue;
            }
            for target in targets {
                if self.is_broken(page, category, target) {
                    broken.push(category, target.clone());
                }
            }
        }

        broken
    }

    /// Whether a single target of `category`, found on `page`, is broken.
    pub fn is_broken(&self, page: &dyn Page, category: LinkCategory, target: &str) -> bool {
        let target = target.trim();

        match category {
            LinkCategory::PageAbsolute => !self.routes.exists(strip_query(target)),
            LinkCategory::PageRelative => {
                // Fragment- and query-only links point back at this page
                if target.is_empty() {
                    return false;
                }
                let route = join_route(page.route(), target);
                !self.routes.exists(&route) && !page.has_media(&decode(target))
            }
            LinkCategory::MediaRelative => target.is_empty() || !page.has_media(&decode(target)),
            LinkCategory::PageRemote
            | LinkCategory::Combined
            | LinkCategory::MediaAbsolute
            | LinkCategory::MediaRemote => false,
        }
    }
}

// Percent-decodes a link target, keeping the raw text if it isn't valid UTF-8
fn decode(target: &str) -> Cow<'_, str> {
    urlencoding::decode(target).unwrap_or(Cow::Borrowed(target))
}

fn strip_query(target: &str) -> &str {
    match target.find(|c: char| c == '?' || c == '#') {
        Some(end) => &target[..end],
        None => target,
    }
}

/// Joins a relative target onto a page route, folding `.` and `..`.
///
/// `..` never climbs above the site root.
pub fn join_route(base: &str, relative: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in base.split('/').chain(relative.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    format!("/{}", segments.join("/"))
}
