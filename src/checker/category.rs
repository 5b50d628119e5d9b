// src/checker/category.rs
// =============================================================================
// The closed set of link categories, and a fixed-shape map from category to
// the ordered list of link targets found for it.
//
// Every category has exactly one slot in CategorizedLinks, so code that walks
// the map can't forget a category and can't invent a new one at runtime.
// =============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The syntactic shape of a link found in page source.
///
/// The declaration order is the order the extractor runs its patterns in,
/// and the order categories are written to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkCategory {
    /// `[label](target)` where target is relative to the page
    PageRelative,
    /// `[label](/target)`
    PageAbsolute,
    /// `[label](https://target)`, never checked
    PageRemote,
    /// `[![alt](image)](target)`, recorded whole, never checked
    Combined,
    /// `![alt](file)` where file is attached to the page
    MediaRelative,
    /// `![alt](/file)`
    MediaAbsolute,
    /// `![alt](https://file)`, never checked
    MediaRemote,
}

impl LinkCategory {
    /// All categories, in extraction order.
    pub const ALL: [LinkCategory; 7] = [
        LinkCategory::PageRelative,
        LinkCategory::PageAbsolute,
        LinkCategory::PageRemote,
        LinkCategory::Combined,
        LinkCategory::MediaRelative,
        LinkCategory::MediaAbsolute,
        LinkCategory::MediaRemote,
    ];

    /// The name stored in the `link_type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkCategory::PageRelative => "page_relative",
            LinkCategory::PageAbsolute => "page_absolute",
            LinkCategory::PageRemote => "page_remote",
            LinkCategory::Combined => "combined",
            LinkCategory::MediaRelative => "media_relative",
            LinkCategory::MediaAbsolute => "media_absolute",
            LinkCategory::MediaRemote => "media_remote",
        }
    }

    /// Remote and combined links are reported by the extractor but the
    /// resolver never decides whether they are broken.
    pub fn is_checked(&self) -> bool {
        matches!(
            self,
            LinkCategory::PageRelative | LinkCategory::PageAbsolute | LinkCategory::MediaRelative
        )
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for LinkCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Returned when a stored `link_type` isn't one of the known names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown link category '{}'", self.0)
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for LinkCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LinkCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Ordered link targets grouped by category.
///
/// Used both for what the extractor found on a page and for the broken
/// subset the resolver hands to the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorizedLinks {
    slots: [Vec<String>; 7],
}

impl CategorizedLinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a target to the end of a category's list.
    pub fn push(&mut self, category: LinkCategory, target: impl Into<String>) {
        self.slots[category.index()].push(target.into());
    }

    pub fn get(&self, category: LinkCategory) -> &[String] {
        &self.slots[category.index()]
    }

    /// Walks every category in extraction order, including empty ones.
    pub fn iter(&self) -> impl Iterator<Item = (LinkCategory, &[String])> + '_ {
        LinkCategory::ALL
            .into_iter()
            .map(move |category| (category, self.get(category)))
    }

    /// Total number of targets across all categories.
    pub fn len(&self) -> usize {
        self.slots.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Vec::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_names_round_trip_through_from_str() {
        for category in LinkCategory::ALL {
            assert_eq!(category.as_str().parse::<LinkCategory>(), Ok(category));
        }
        assert!("page".parse::<LinkCategory>().is_err());
    }

    #[test]
    fn test_only_local_categories_are_checked() {
        let checked: Vec<_> = LinkCategory::ALL
            .into_iter()
            .filter(LinkCategory::is_checked)
            .collect();
        assert_eq!(
            checked,
            vec![
                LinkCategory::PageRelative,
                LinkCategory::PageAbsolute,
                LinkCategory::MediaRelative
            ]
        );
    }

    #[test]
    fn test_categorized_links_keep_insertion_order() {
        let mut links = CategorizedLinks::new();
        assert!(links.is_empty());

        links.push(LinkCategory::MediaRelative, "b.png");
        links.push(LinkCategory::PageAbsolute, "/x");
        links.push(LinkCategory::MediaRelative, "a.png");

        assert_eq!(links.len(), 3);
        assert_eq!(links.get(LinkCategory::MediaRelative), ["b.png", "a.png"]);
        assert!(links.get(LinkCategory::Combined).is_empty());

        let order: Vec<_> = links
            .iter()
            .filter(|(_, targets)| !targets.is_empty())
            .map(|(category, _)| category)
            .collect();
        assert_eq!(order, vec![LinkCategory::PageAbsolute, LinkCategory::MediaRelative]);
    }

    #[test]
    fn test_category_serializes_as_snake_case() {
        let json = serde_json::to_string(&LinkCategory::MediaRemote).unwrap();
        assert_eq!(json, "\"media_remote\"");
    }
}
