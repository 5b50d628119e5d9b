// src/crawl/site.rs
// =============================================================================
// An in-memory content tree: the pages of a site, their sources and their
// attached media.
//
// SiteTree implements RouteIndex and SitePage implements Page, so the
// auditor can run against a directory on disk (see queue.rs) or against
// pages built by hand in tests.
// =============================================================================

use crate::checker::join_route;
use crate::page::{Page, RouteIndex};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

/// One page of the content tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitePage {
    route: String,
    source: String,
    media: BTreeSet<String>,
    path: Option<PathBuf>,
}

impl SitePage {
    pub fn new(route: &str, source: impl Into<String>) -> Self {
        Self {
            route: normalize(route),
            source: source.into(),
            media: BTreeSet::new(),
            path: None,
        }
    }

    /// Attaches media files by name.
    pub fn with_media<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.media.extend(names.into_iter().map(Into::into));
        self
    }

    /// Records which file the source was read from.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn media(&self) -> impl Iterator<Item = &str> {
        self.media.iter().map(String::as_str)
    }
}

impl Page for SitePage {
    fn route(&self) -> &str {
        &self.route
    }

    fn raw_source(&self) -> &str {
        &self.source
    }

    fn has_media(&self, name: &str) -> bool {
        self.media.contains(name)
    }
}

/// All pages of a site, indexed by route.
#[derive(Debug, Clone, Default)]
pub struct SiteTree {
    pages: Vec<SitePage>,
    by_route: HashMap<String, usize>,
    home_alias: Option<String>,
}

impl SiteTree {
    /// Builds a tree from pages. When two pages share a route the first
    /// one wins.
    pub fn from_pages(pages: Vec<SitePage>) -> Self {
        let mut tree = Self::default();
        for page in pages {
            tree.insert(page);
        }
        tree
    }

    /// Makes `/` and `alias` resolve to each other.
    ///
    /// The page found at `alias` becomes the home page: its route is `/`, so
    /// its records are stored under `/` and shown under the alias.
    pub fn with_home_alias(mut self, alias: Option<String>) -> Self {
        self.home_alias = alias.map(|a| normalize(&a));

        if let Some(alias) = self.home_alias.as_deref() {
            if !self.by_route.contains_key("/") {
                if let Some(index) = self.by_route.remove(alias) {
                    self.pages[index].route = "/".to_string();
                    self.by_route.insert("/".to_string(), index);
                }
            }
        }
        self
    }

    pub(crate) fn insert(&mut self, page: SitePage) -> bool {
        if self.by_route.contains_key(&page.route) {
            tracing::warn!(route = %page.route, "duplicate route, keeping the first page");
            return false;
        }
        self.by_route.insert(page.route.clone(), self.pages.len());
        self.pages.push(page);
        true
    }

    /// The page at `route`, following the home alias.
    pub fn page(&self, route: &str) -> Option<&SitePage> {
        self.index_of(route).map(|index| &self.pages[index])
    }

    fn index_of(&self, route: &str) -> Option<usize> {
        let route = normalize(route);
        if let Some(&index) = self.by_route.get(&route) {
            return Some(index);
        }
        let aliased = match self.home_alias.as_deref() {
            Some(alias) if route == "/" => alias,
            Some(alias) if route == alias => "/",
            _ => return None,
        };
        self.by_route.get(aliased).copied()
    }

    pub fn pages(&self) -> &[SitePage] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

impl RouteIndex for SiteTree {
    fn exists(&self, path: &str) -> bool {
        self.index_of(path).is_some()
    }

    fn all_pages(&self) -> Vec<&dyn Page> {
        self.pages.iter().map(|page| page as &dyn Page).collect()
    }
}

// Routes always start with `/` and never end with one (except the root).
fn normalize(route: &str) -> String {
    join_route("/", route)
}
