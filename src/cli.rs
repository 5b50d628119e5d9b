// src/cli.rs
// =============================================================================
// Command-line interface, built with clap's derive API.
//
// Subcommands:
// - scan:   rescan every page of a content directory
// - page:   rescan a single page by route
// - report: print the stored broken links, grouped by route
// - count:  print how many routes have broken links
// =============================================================================

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "link-audit",
    version,
    about = "Finds broken internal links and media references in a markdown site",
    long_about = "link-audit scans the raw markdown of every page in a content directory, \
                  records links that point at missing pages or media, and reports them \
                  per route. Results are stored so a report can be printed without rescanning."
)]
pub struct Cli {
    /// Settings file (TOML). Missing file means defaults.
    #[arg(long, global = true, default_value = "link-audit.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rescan every page and drop records of pages that no longer exist
    ///
    /// Example: link-audit scan ./content
    Scan {
        /// Root of the content directory
        site_dir: PathBuf,

        /// Print a JSON status object instead of plain text
        #[arg(long)]
        json: bool,
    },

    /// Rescan one page
    ///
    /// Example: link-audit page ./content /blog/first-post
    Page {
        /// Root of the content directory
        site_dir: PathBuf,

        /// Route of the page, e.g. /blog/first-post
        route: String,

        #[arg(long)]
        json: bool,
    },

    /// Show stored broken links grouped by route and category
    Report {
        /// Only this route
        #[arg(long)]
        route: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Number of routes that have at least one broken link
    Count,
}
