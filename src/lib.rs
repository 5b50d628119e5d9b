// src/lib.rs
// =============================================================================
// Library root for link-audit.
//
// The binary in main.rs is a thin shell around these modules:
// - checker: extraction, categorization and resolution of page links
// - crawl: loading a content directory into pages and routes
// - store: the per-route broken-link table
// - audit: ties the three together for one page or a whole site
// - config / error: settings file and error types
// - page: the traits a site has to provide
// =============================================================================

pub mod audit;
pub mod checker;
pub mod config;
pub mod crawl;
pub mod error;
pub mod page;
pub mod store;

pub use audit::{Auditor, AuditorState, PageScan, SiteScan};
pub use checker::{CategorizedLinks, LinkCategory};
pub use config::{AuditConfig, InspectionLevel, StorageConfig};
pub use error::{AuditError, ConfigError, Result};
pub use page::{Page, RouteIndex};
pub use store::{AuditReport, AuditStore, BrokenLinkRecord};
