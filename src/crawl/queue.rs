// src/crawl/queue.rs
// =============================================================================
// This module loads a content tree from disk with a breadth-first walk.
//
// How it works:
// 1. Start with the root directory in a queue (route "/")
// 2. List the directory
// 3. If it holds a markdown file, it's a page: the first markdown file
//    (by name) is its source, every other file is attached media
// 4. Queue each subdirectory under the child route
// 5. Repeat until the queue is empty
//
// Directory names may carry an ordering prefix, "01.blog", which is not
// part of the route. Hidden entries are skipped, and symlinks are never
// followed so a link loop can't trap the walk.
//
// Rust concepts:
// - VecDeque: Double-ended queue for breadth-first walking
// - tokio::fs: Async directory listing and file reads
// =============================================================================

use super::site::{SitePage, SiteTree};
use crate::checker::join_route;
use crate::error::Result;
use std::collections::{BTreeSet, VecDeque};
use std::path::{Path, PathBuf};
use tokio::fs;

// Represents a directory waiting in the walk queue
#[derive(Debug, Clone)]
struct WalkItem {
    dir: PathBuf,
    route: String,
}

// What one directory contains
#[derive(Debug, Default)]
struct Listing {
    markdown: Vec<PathBuf>,
    media: BTreeSet<String>,
    children: Vec<(String, PathBuf)>,
}

// Loads every page under `root`
//
// Parameters:
//   root: the content directory
//
// Returns: SiteTree with pages in breadth-first order
//
// An unreadable root is an error. An unreadable subdirectory or page file
// is logged and skipped, the rest of the site still loads.
pub async fn load_site(root: &Path) -> Result<SiteTree> {
    let mut queue = VecDeque::new();
    queue.push_back(WalkItem {
        dir: root.to_path_buf(),
        route: "/".to_string(),
    });

    let mut tree = SiteTree::default();

    while let Some(item) = queue.pop_front() {
        let listing = match list_dir(&item.dir).await {
            Ok(listing) => listing,
            Err(e) if item.dir == root => return Err(e.into()),
            Err(e) => {
                tracing::warn!(dir = %item.dir.display(), error = %e, "skipping unreadable directory");
                continue;
            }
        };

        if let Some(source_path) = listing.markdown.first() {
            match fs::read_to_string(source_path).await {
                Ok(source) => {
                    let page = SitePage::new(&item.route, source)
                        .with_media(listing.media)
                        .with_path(source_path);
                    tracing::debug!(route = %item.route, "loaded page");
                    tree.insert(page);
                }
                Err(e) => {
                    tracing::warn!(file = %source_path.display(), error = %e, "skipping unreadable page");
                }
            }
        }

        for (name, dir) in listing.children {
            queue.push_back(WalkItem {
                route: join_route(&item.route, route_segment(&name)),
                dir,
            });
        }
    }

    tracing::info!(root = %root.display(), pages = tree.len(), "content tree loaded");
    Ok(tree)
}

async fn list_dir(dir: &Path) -> std::io::Result<Listing> {
    let mut listing = Listing::default();
    let mut entries = fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }

        // DirEntry::file_type doesn't follow symlinks
        let file_type = entry.file_type().await?;
        if file_type.is_dir() {
            listing.children.push((name, entry.path()));
        } else if file_type.is_file() {
            if name.ends_with(".md") {
                listing.markdown.push(entry.path());
            } else {
                listing.media.insert(name);
            }
        }
    }

    // read_dir order is platform dependent
    listing.markdown.sort();
    listing.children.sort();
    Ok(listing)
}

// "01.blog" -> "blog", anything else unchanged
fn route_segment(name: &str) -> &str {
    match name.split_once('.') {
        Some((prefix, rest))
            if !prefix.is_empty() && !rest.is_empty() && prefix.bytes().all(|b| b.is_ascii_digit()) =>
        {
            rest
        }
        _ => name,
    }
}
