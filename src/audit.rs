// src/audit.rs
// =============================================================================
// The auditor: extract, resolve and record, per page or for a whole site.
//
// Construction can fail (bad storage settings, unreachable database). That
// failure is captured in AuditorState::Unavailable rather than raised, so a
// caller can keep running with the feature switched off. Once an Auditor
// exists, every operation reports storage failures as errors.
//
// Locking:
// - Page scans share scan_lock
// - The orphan cleanup of a site scan holds it exclusively, so a page
//   written during a site scan is never judged against the old route list
// =============================================================================

use crate::checker::{LinkExtractor, LinkResolver};
use crate::config::{AuditConfig, InspectionLevel};
use crate::error::{AuditError, Result};
use crate::page::{Page, RouteIndex};
use crate::store::{AuditReport, AuditStore};
use serde::Serialize;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Outcome of scanning one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageScan {
    pub route: String,
    /// Links the extractor found, across all categories
    pub found: usize,
    /// Links recorded as broken
    pub broken: usize,
}

/// Outcome of a whole-site scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteScan {
    pub pages_scanned: usize,
    pub orphans_removed: u64,
    /// The scan stopped early; pages already scanned keep their results
    pub cancelled: bool,
}

/// Scans pages and keeps the broken-link store current.
#[derive(Debug)]
pub struct Auditor {
    store: AuditStore,
    extractor: LinkExtractor,
    // Shared by page scans, held exclusively by orphan cleanup
    scan_lock: RwLock<()>,
}

impl Auditor {
    pub fn new(store: AuditStore, level: InspectionLevel) -> Self {
        Self {
            store,
            extractor: LinkExtractor::new(level),
            scan_lock: RwLock::new(()),
        }
    }

    pub fn store(&self) -> &AuditStore {
        &self.store
    }

    pub fn inspection_level(&self) -> InspectionLevel {
        self.extractor.level()
    }

    /// Rescans one page and replaces its stored broken links.
    ///
    /// # Errors
    /// Returns `AuditError::Storage` if the store can't be written.
    pub async fn scan_page(&self, page: &dyn Page, routes: &dyn RouteIndex) -> Result<PageScan> {
        let _shared = self.scan_lock.read().await;

        let extracted = self.extractor.extract(page.raw_source());
        let broken = LinkResolver::new(routes).resolve(page, &extracted);
        self.store.replace_route(page.route(), &broken).await?;

        debug!(
            route = page.route(),
            found = extracted.len(),
            broken = broken.len(),
            "Scanned page"
        );

        Ok(PageScan {
            route: page.route().to_string(),
            found: extracted.len(),
            broken: broken.len(),
        })
    }

    /// Drops records of removed pages, then rescans every page.
    ///
    /// # Errors
    /// Returns `AuditError::Storage` on the first store failure. Pages
    /// scanned before it keep their new results.
    pub async fn scan_all_pages(&self, routes: &dyn RouteIndex) -> Result<SiteScan> {
        self.scan_all_pages_until(routes, &CancellationToken::new())
            .await
    }

    /// Like [`Auditor::scan_all_pages`], stopping between pages once `cancel`
    /// fires.
    ///
    /// # Errors
    /// Returns `AuditError::Storage` on the first store failure.
    pub async fn scan_all_pages_until(
        &self,
        routes: &dyn RouteIndex,
        cancel: &CancellationToken,
    ) -> Result<SiteScan> {
        let orphans_removed = {
            let _exclusive = self.scan_lock.write().await;
            self.store.clear_orphaned(routes).await?
        };

        let pages = routes.all_pages();
        let total = pages.len();
        let mut pages_scanned = 0;

        for page in pages {
            if cancel.is_cancelled() {
                warn!(pages_scanned, total, "Site scan cancelled");
                return Ok(SiteScan {
                    pages_scanned,
                    orphans_removed,
                    cancelled: true,
                });
            }
            self.scan_page(page, routes).await?;
            pages_scanned += 1;
        }

        info!(pages = pages_scanned, orphans_removed, "Site scan complete");
        Ok(SiteScan {
            pages_scanned,
            orphans_removed,
            cancelled: false,
        })
    }

    /// Number of routes with broken links.
    ///
    /// # Errors
    /// Returns `AuditError::Storage` if the store can't be read.
    pub async fn count_distinct_routes(&self) -> Result<i64> {
        self.store.count_distinct_routes().await
    }

    /// Stored broken links grouped for display, optionally for one route.
    ///
    /// # Errors
    /// Returns `AuditError::Storage` or `AuditError::Decode`.
    pub async fn list_by_route(&self, route: Option<&str>) -> Result<AuditReport> {
        self.store.list_by_route(route).await
    }
}

/// Either a working auditor or the reason there isn't one.
#[derive(Debug)]
pub enum AuditorState {
    Available(Auditor),
    Unavailable(String),
}

impl AuditorState {
    /// Opens the configured store. Any failure leaves the audit unavailable
    /// instead of returning an error.
    pub async fn connect(config: &AuditConfig) -> Self {
        match AuditStore::open(&config.report_storage).await {
            Ok(store) => AuditorState::Available(Auditor::new(store, config.inspection_level)),
            Err(e) => {
                warn!(error = %e, "Link audit disabled");
                AuditorState::Unavailable(e.to_string())
            }
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, AuditorState::Available(_))
    }

    /// The auditor, or `AuditError::Unavailable` with the reason.
    pub fn auditor(&self) -> Result<&Auditor> {
        match self {
            AuditorState::Available(auditor) => Ok(auditor),
            AuditorState::Unavailable(reason) => Err(AuditError::Unavailable(reason.clone())),
        }
    }

    pub fn unavailable_reason(&self) -> Option<&str> {
        match self {
            AuditorState::Available(_) => None,
            AuditorState::Unavailable(reason) => Some(reason),
        }
    }
}
