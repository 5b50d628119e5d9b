// src/main.rs
// =============================================================================
// Entry point of the link-audit CLI.
//
// What happens here:
// 1. Parse command-line arguments and set up logging
// 2. Load settings and open the broken-link store
// 3. Dispatch to the subcommand handler
// 4. Exit with proper code (0 = clean, 1 = broken links, 2 = error)
// =============================================================================

mod cli;

use anyhow::{bail, Result};
use clap::Parser;
use cli::{Cli, Commands};
use link_audit::crawl::{load_site, SiteTree};
use link_audit::{AuditConfig, AuditReport, Auditor, AuditorState};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    init_tracing();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Logs go to stderr so stdout stays clean for --json output.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("link_audit=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    let config = AuditConfig::load_with_env(&cli.config)?;

    let state = AuditorState::connect(&config).await;
    let auditor = state.auditor()?;

    let code = match cli.command {
        Commands::Scan { site_dir, json } => handle_scan(auditor, &config, &site_dir, json).await,
        Commands::Page {
            site_dir,
            route,
            json,
        } => handle_page(auditor, &config, &site_dir, &route, json).await,
        Commands::Report { route, json } => {
            handle_report(auditor, &config, route.as_deref(), json).await
        }
        Commands::Count => handle_count(auditor).await,
    };

    auditor.store().close().await;
    code
}

/// Body printed for `--json` on scan commands.
#[derive(Debug, Serialize)]
struct StatusBody {
    status: &'static str,
    message: String,
}

async fn open_site(config: &AuditConfig, site_dir: &Path) -> Result<SiteTree> {
    let site = load_site(site_dir).await?;
    Ok(site.with_home_alias(config.home_alias.clone()))
}

// Handles the 'scan' subcommand
async fn handle_scan(
    auditor: &Auditor,
    config: &AuditConfig,
    site_dir: &Path,
    json: bool,
) -> Result<i32> {
    let site = open_site(config, site_dir).await?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current page");
            on_signal.cancel();
        }
    });

    let summary = auditor.scan_all_pages_until(&site, &cancel).await?;
    let body = if summary.cancelled {
        StatusBody {
            status: "cancelled",
            message: format!("Cancelled after {} pages", summary.pages_scanned),
        }
    } else {
        StatusBody {
            status: "success",
            message: format!("Checked {} pages", summary.pages_scanned),
        }
    };
    print_status(&body, json)?;

    if summary.cancelled {
        return Ok(2);
    }
    let routes = auditor.count_distinct_routes().await?;
    Ok(if routes > 0 { 1 } else { 0 })
}

// Handles the 'page' subcommand
async fn handle_page(
    auditor: &Auditor,
    config: &AuditConfig,
    site_dir: &Path,
    route: &str,
    json: bool,
) -> Result<i32> {
    let site = open_site(config, site_dir).await?;
    let Some(page) = site.page(route) else {
        bail!("no page at route {}", route);
    };

    let scan = auditor.scan_page(page, &site).await?;
    let body = StatusBody {
        status: "success",
        message: format!(
            "Checked {}: {} links, {} broken",
            display_route(&scan.route, config),
            scan.found,
            scan.broken
        ),
    };
    print_status(&body, json)?;

    Ok(if scan.broken > 0 { 1 } else { 0 })
}

// Handles the 'report' subcommand
async fn handle_report(
    auditor: &Auditor,
    config: &AuditConfig,
    route: Option<&str>,
    json: bool,
) -> Result<i32> {
    let route = route.map(|route| stored_route(route, config));
    let report = auditor.list_by_route(route).await?;
    let report = with_display_routes(report, config);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_table(&report);
    }

    Ok(if report.is_empty() { 0 } else { 1 })
}

// Handles the 'count' subcommand
async fn handle_count(auditor: &Auditor) -> Result<i32> {
    let routes = auditor.count_distinct_routes().await?;
    println!("{}", routes);
    Ok(if routes > 0 { 1 } else { 0 })
}

fn print_status(body: &StatusBody, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(body)?);
    } else {
        println!("{}", body.message);
    }
    Ok(())
}

fn print_table(report: &AuditReport) {
    if report.is_empty() {
        println!("No broken links");
        return;
    }

    println!("{:<40} {:<16} {}", "ROUTE", "TYPE", "LINK");
    println!("{}", "=".repeat(96));

    let mut total = 0;
    for (route, categories) in report {
        for (category, links) in categories {
            for link in links {
                println!("{:<40} {:<16} {}", route, category, link);
                total += 1;
            }
        }
    }

    println!();
    println!("{} broken link(s) on {} route(s)", total, report.len());
}

// The home page is stored as `/` but shown under its alias.
fn display_route<'a>(route: &'a str, config: &'a AuditConfig) -> &'a str {
    match config.home_alias.as_deref() {
        Some(alias) if route == "/" => alias,
        _ => route,
    }
}

// The reverse of display_route: the alias looks up the records stored under `/`.
fn stored_route<'a>(route: &'a str, config: &'a AuditConfig) -> &'a str {
    match config.home_alias.as_deref() {
        Some(alias) if route == alias => "/",
        _ => route,
    }
}

fn with_display_routes(report: AuditReport, config: &AuditConfig) -> AuditReport {
    let mut shown: AuditReport = BTreeMap::new();
    for (route, categories) in report {
        let entry = shown
            .entry(display_route(&route, config).to_string())
            .or_default();
        for (category, links) in categories {
            entry.entry(category).or_default().extend(links);
        }
    }
    shown
}
