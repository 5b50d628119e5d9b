// src/store/mod.rs
// =============================================================================
// Durable record of broken links, keyed by page route.
//
// Every row is one broken link on one page:
//   route       page the link was found on
//   link_type   LinkCategory name
//   link        target as written, trimmed
//   last_found  Unix seconds of the scan that last saw it
//
// A route's rows are always the complete result of its latest scan:
// replace_route deletes and rewrites them in one transaction, so readers
// never see a half-written set.
//
// Queries go through the sqlx Any driver. SQLite is the default backend; a
// PostgreSQL server works with the same statements.
// =============================================================================

pub mod schema;

use crate::checker::{CategorizedLinks, LinkCategory};
use crate::config::StorageConfig;
use crate::error::{AuditError, Result};
use crate::page::RouteIndex;
use chrono::Utc;
use futures::TryStreamExt;
use serde::Serialize;
use sqlx::any::{AnyPoolOptions, AnyRow};
use sqlx::{AnyPool, Row};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Broken links grouped by route, then by category.
pub type AuditReport = BTreeMap<String, BTreeMap<LinkCategory, Vec<String>>>;

const UPSERT_LINK: &str = "INSERT INTO per_route (route, link_type, link, last_found)
     VALUES ($1, $2, $3, $4)
     ON CONFLICT (route, link)
     DO UPDATE SET link_type = excluded.link_type, last_found = excluded.last_found";

const SELECT_ALL: &str = "SELECT route, link_type, link, last_found
     FROM per_route
     ORDER BY route, link";

const SELECT_ROUTE: &str = "SELECT route, link_type, link, last_found
     FROM per_route
     WHERE route = $1
     ORDER BY link";

/// One stored broken link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrokenLinkRecord {
    pub route: String,
    pub link_type: LinkCategory,
    pub link: String,
    pub last_found: i64,
}

/// Handle to the broken-link table. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AuditStore {
    pool: AnyPool,
    // Highest timestamp issued so far; stamps never go backwards
    last_stamp: Arc<AtomicI64>,
}

impl AuditStore {
    /// Opens the configured backend and makes sure the schema exists.
    ///
    /// For SQLite the data directory is created if missing.
    ///
    /// # Errors
    /// `AuditError::Config` for unusable settings, `AuditError::Storage`
    /// when the database can't be reached.
    pub async fn open(config: &StorageConfig) -> Result<Self> {
        let url = config.connection_url()?;

        if let Some(dir) = config.sqlite_file().as_deref().and_then(|f| f.parent()) {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                tokio::fs::create_dir_all(dir).await?;
                tracing::info!("Created link audit data folder at {}", dir.display());
            }
        }

        // A single SQLite connection serializes writers to the file
        let max_connections = match config {
            StorageConfig::Sqlite { .. } => 1,
            StorageConfig::Postgres { .. } => 5,
        };

        let store = Self::connect(&url, max_connections).await?;
        tracing::info!(backend = config.backend_name(), "Link audit store ready");
        Ok(store)
    }

    /// Connects to a database URL understood by `sqlx`'s `Any` driver.
    ///
    /// # Errors
    /// Returns `AuditError::Storage` if the connection or schema setup fails.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        sqlx::any::install_default_drivers();

        let pool = AnyPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;

        Self::from_pool(pool).await
    }

    /// A private in-memory SQLite database. Used by tests.
    ///
    /// # Errors
    /// Returns `AuditError::Storage` if SQLite can't be initialized.
    pub async fn in_memory() -> Result<Self> {
        sqlx::any::install_default_drivers();

        // Each in-memory connection is its own database, so keep exactly one
        // and never let the pool recycle it.
        let pool = AnyPoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect("sqlite::memory:")
            .await?;

        Self::from_pool(pool).await
    }

    async fn from_pool(pool: AnyPool) -> Result<Self> {
        schema::ensure_schema(&pool).await?;
        Ok(Self {
            pool,
            last_stamp: Arc::new(AtomicI64::new(0)),
        })
    }

    /// Replaces every record of `route` with `links`.
    ///
    /// Runs as one transaction. A link listed under several categories ends
    /// up as a single row carrying the last category written.
    ///
    /// # Errors
    /// Returns `AuditError::Storage` if any statement fails; nothing is
    /// changed in that case.
    pub async fn replace_route(&self, route: &str, links: &CategorizedLinks) -> Result<()> {
        let stamp = self.next_stamp();
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM per_route WHERE route = $1")
            .bind(route)
            .execute(&mut *tx)
            .await?;

        for (category, targets) in links.iter() {
            for link in targets {
                sqlx::query(UPSERT_LINK)
                    .bind(route)
                    .bind(category.as_str())
                    .bind(link.trim())
                    .bind(stamp)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;
        tracing::debug!(route, broken = links.len(), "Replaced route records");
        Ok(())
    }

    /// Deletes every record of `route`, returning how many were removed.
    ///
    /// # Errors
    /// Returns `AuditError::Storage` if the delete fails.
    pub async fn clear_route(&self, route: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM per_route WHERE route = $1")
            .bind(route)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Deletes records whose route no longer exists in `routes`.
    ///
    /// # Errors
    /// Returns `AuditError::Storage` if a query fails.
    pub async fn clear_orphaned(&self, routes: &dyn RouteIndex) -> Result<u64> {
        let stored: Vec<String> = sqlx::query_scalar("SELECT DISTINCT route FROM per_route")
            .fetch_all(&self.pool)
            .await?;

        let orphans: Vec<String> = stored
            .into_iter()
            .filter(|route| !routes.exists(route))
            .collect();

        if orphans.is_empty() {
            return Ok(0);
        }

        let mut removed = 0;
        let mut tx = self.pool.begin().await?;
        for route in &orphans {
            removed += sqlx::query("DELETE FROM per_route WHERE route = $1")
                .bind(route.as_str())
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }
        tx.commit().await?;

        tracing::info!(routes = orphans.len(), records = removed, "Cleared orphaned records");
        Ok(removed)
    }

    /// Number of routes with at least one broken link.
    ///
    /// # Errors
    /// Returns `AuditError::Storage` if the query fails.
    pub async fn count_distinct_routes(&self) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(DISTINCT route) FROM per_route")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Stored records, optionally for one route, ordered by route then link.
    ///
    /// # Errors
    /// `AuditError::Storage` if the query fails, `AuditError::Decode` if a
    /// row holds an unknown category.
    pub async fn records(&self, route: Option<&str>) -> Result<Vec<BrokenLinkRecord>> {
        let query = match route {
            Some(route) => sqlx::query(SELECT_ROUTE).bind(route),
            None => sqlx::query(SELECT_ALL),
        };

        let mut rows = query.fetch(&self.pool);
        let mut records = Vec::new();
        while let Some(row) = rows.try_next().await? {
            records.push(record_from_row(&row)?);
        }

        Ok(records)
    }

    /// Records grouped for display: route, then category, then links.
    ///
    /// # Errors
    /// Same as [`AuditStore::records`].
    pub async fn list_by_route(&self, route: Option<&str>) -> Result<AuditReport> {
        let mut report = AuditReport::new();
        for record in self.records(route).await? {
            report
                .entry(record.route)
                .or_default()
                .entry(record.link_type)
                .or_default()
                .push(record.link);
        }
        Ok(report)
    }

    /// Closes the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    fn next_stamp(&self) -> i64 {
        let now = Utc::now().timestamp();
        let previous = self.last_stamp.fetch_max(now, Ordering::SeqCst);
        previous.max(now)
    }
}

fn record_from_row(row: &AnyRow) -> Result<BrokenLinkRecord> {
    let link_type: String = row.try_get("link_type")?;
    let link_type = link_type
        .parse::<LinkCategory>()
        .map_err(|e| AuditError::Decode(format!("{e} in per_route table")))?;

    Ok(BrokenLinkRecord {
        route: row.try_get("route")?,
        link_type,
        link: row.try_get("link")?,
        last_found: row.try_get("last_found")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawl::{SitePage, SiteTree};
    use std::path::PathBuf;

    fn links(entries: &[(LinkCategory, &str)]) -> CategorizedLinks {
        let mut links = CategorizedLinks::new();
        for (category, target) in entries {
            links.push(*category, *target);
        }
        links
    }

    #[tokio::test]
    async fn test_replace_route_writes_records() {
        let store = AuditStore::in_memory().await.expect("open store");
        store
            .replace_route(
                "/docs",
                &links(&[
                    (LinkCategory::PageRelative, "missing-page"),
                    (LinkCategory::MediaRelative, "missing.png"),
                ]),
            )
            .await
            .expect("replace route");

        let records = store.records(Some("/docs")).await.expect("read records");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].link, "missing-page");
        assert_eq!(records[0].link_type, LinkCategory::PageRelative);
        assert_eq!(records[1].link, "missing.png");
        assert_eq!(records[1].link_type, LinkCategory::MediaRelative);
        assert!(records.iter().all(|r| r.last_found > 0));
    }

    #[tokio::test]
    async fn test_rescan_is_idempotent() {
        let store = AuditStore::in_memory().await.expect("open store");
        let broken = links(&[
            (LinkCategory::PageAbsolute, "/gone"),
            (LinkCategory::MediaRelative, "x.png"),
        ]);

        store.replace_route("/a", &broken).await.expect("first scan");
        let first = store.records(None).await.expect("read records");

        store.replace_route("/a", &broken).await.expect("second scan");
        let second = store.records(None).await.expect("read records");

        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 2);
        for (before, after) in first.iter().zip(&second) {
            assert_eq!(before.route, after.route);
            assert_eq!(before.link, after.link);
            assert_eq!(before.link_type, after.link_type);
            assert!(after.last_found >= before.last_found);
        }
    }

    #[tokio::test]
    async fn test_replace_drops_links_no_longer_broken() {
        let store = AuditStore::in_memory().await.expect("open store");
        store
            .replace_route(
                "/a",
                &links(&[
                    (LinkCategory::PageAbsolute, "/old"),
                    (LinkCategory::PageAbsolute, "/still"),
                ]),
            )
            .await
            .expect("first scan");
        store
            .replace_route("/a", &links(&[(LinkCategory::PageAbsolute, "/still")]))
            .await
            .expect("second scan");

        let report = store.list_by_route(Some("/a")).await.expect("report");
        assert_eq!(report["/a"][&LinkCategory::PageAbsolute], vec!["/still"]);
    }

    #[tokio::test]
    async fn test_same_link_in_two_categories_keeps_one_row() {
        let store = AuditStore::in_memory().await.expect("open store");
        store
            .replace_route(
                "/a",
                &links(&[
                    (LinkCategory::PageRelative, "chart.png"),
                    (LinkCategory::MediaRelative, "chart.png"),
                ]),
            )
            .await
            .expect("replace route");

        let records = store.records(Some("/a")).await.expect("read records");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].link_type, LinkCategory::MediaRelative);
    }

    #[tokio::test]
    async fn test_links_are_trimmed() {
        let store = AuditStore::in_memory().await.expect("open store");
        store
            .replace_route(
                "/a",
                &links(&[
                    (LinkCategory::PageRelative, " spaced "),
                    (LinkCategory::PageRelative, "spaced"),
                ]),
            )
            .await
            .expect("replace route");

        let records = store.records(None).await.expect("read records");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].link, "spaced");
    }

    #[tokio::test]
    async fn test_clear_route_only_touches_that_route() {
        let store = AuditStore::in_memory().await.expect("open store");
        let broken = links(&[(LinkCategory::PageAbsolute, "/gone")]);
        store.replace_route("/a", &broken).await.expect("scan a");
        store.replace_route("/b", &broken).await.expect("scan b");

        assert_eq!(store.clear_route("/a").await.expect("clear"), 1);
        assert_eq!(store.clear_route("/a").await.expect("clear again"), 0);

        let report = store.list_by_route(None).await.expect("report");
        assert_eq!(report.keys().collect::<Vec<_>>(), vec!["/b"]);
    }

    #[tokio::test]
    async fn test_clear_orphaned_removes_unknown_routes() {
        let store = AuditStore::in_memory().await.expect("open store");
        let broken = links(&[(LinkCategory::PageAbsolute, "/gone")]);
        store.replace_route("/kept", &broken).await.expect("scan kept");
        store.replace_route("/deleted", &broken).await.expect("scan deleted");

        let site = SiteTree::from_pages(vec![SitePage::new("/kept", "")]);
        assert_eq!(store.clear_orphaned(&site).await.expect("clear orphans"), 1);
        assert_eq!(store.clear_orphaned(&site).await.expect("clear again"), 0);

        let report = store.list_by_route(None).await.expect("report");
        assert!(report.contains_key("/kept"));
        assert!(!report.contains_key("/deleted"));
    }

    #[tokio::test]
    async fn test_count_distinct_routes() {
        let store = AuditStore::in_memory().await.expect("open store");
        assert_eq!(store.count_distinct_routes().await.expect("count"), 0);

        store
            .replace_route(
                "/a",
                &links(&[
                    (LinkCategory::PageAbsolute, "/x"),
                    (LinkCategory::PageAbsolute, "/y"),
                ]),
            )
            .await
            .expect("scan a");
        store
            .replace_route("/b", &links(&[(LinkCategory::MediaRelative, "z.png")]))
            .await
            .expect("scan b");
        store
            .replace_route("/c", &CategorizedLinks::new())
            .await
            .expect("scan c");

        assert_eq!(store.count_distinct_routes().await.expect("count"), 2);
    }

    #[tokio::test]
    async fn test_list_by_route_groups_by_category() {
        let store = AuditStore::in_memory().await.expect("open store");
        store
            .replace_route(
                "/a",
                &links(&[
                    (LinkCategory::PageAbsolute, "/x"),
                    (LinkCategory::MediaRelative, "m.png"),
                    (LinkCategory::PageAbsolute, "/w"),
                ]),
            )
            .await
            .expect("scan a");
        store
            .replace_route("/b", &links(&[(LinkCategory::PageRelative, "sub")]))
            .await
            .expect("scan b");

        let all = store.list_by_route(None).await.expect("report");
        assert_eq!(all.len(), 2);
        assert_eq!(all["/a"][&LinkCategory::PageAbsolute], vec!["/w", "/x"]);
        assert_eq!(all["/a"][&LinkCategory::MediaRelative], vec!["m.png"]);

        let only_b = store.list_by_route(Some("/b")).await.expect("report");
        assert_eq!(only_b.len(), 1);
        assert_eq!(only_b["/b"][&LinkCategory::PageRelative], vec!["sub"]);
    }

    #[tokio::test]
    async fn test_unknown_category_is_decode_error() {
        let store = AuditStore::in_memory().await.expect("open store");
        sqlx::query(
            "INSERT INTO per_route (route, link_type, link, last_found)
             VALUES ('/a', 'page', 'x', 1)",
        )
        .execute(&store.pool)
        .await
        .expect("insert bad row");

        match store.records(None).await {
            Err(AuditError::Decode(msg)) => assert!(msg.contains("'page'")),
            other => panic!("Expected Decode error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failed_replace_keeps_previous_records() {
        let store = AuditStore::in_memory().await.expect("open store");
        store
            .replace_route("/a", &links(&[(LinkCategory::PageAbsolute, "/kept")]))
            .await
            .expect("first scan");

        // Make the second write fail after its delete and first upsert ran
        sqlx::query(
            "CREATE TRIGGER reject_link BEFORE INSERT ON per_route
             WHEN NEW.link = 'rejected'
             BEGIN SELECT RAISE(ABORT, 'rejected link'); END",
        )
        .execute(&store.pool)
        .await
        .expect("create trigger");

        let result = store
            .replace_route(
                "/a",
                &links(&[
                    (LinkCategory::PageAbsolute, "/new"),
                    (LinkCategory::MediaRelative, "rejected"),
                ]),
            )
            .await;
        assert!(matches!(result, Err(AuditError::Storage(_))));

        let records = store.records(Some("/a")).await.expect("read records");
        let kept: Vec<_> = records.iter().map(|r| r.link.as_str()).collect();
        assert_eq!(kept, vec!["/kept"]);
    }

    #[tokio::test]
    async fn test_stamps_never_go_backwards() {
        let store = AuditStore::in_memory().await.expect("open store");
        store.last_stamp.store(i64::MAX - 1, Ordering::SeqCst);
        assert_eq!(store.next_stamp(), i64::MAX - 1);
    }

    #[tokio::test]
    async fn test_open_creates_sqlite_data_dir() {
        let root = tempfile::tempdir().expect("temp dir");
        let data_dir: PathBuf = root.path().join("data").join("link-audit");
        let config = StorageConfig::Sqlite {
            data_dir: data_dir.clone(),
            language: "en".to_string(),
        };

        let store = AuditStore::open(&config).await.expect("open sqlite store");
        store
            .replace_route("/a", &links(&[(LinkCategory::PageAbsolute, "/x")]))
            .await
            .expect("write");
        store.close().await;

        assert!(data_dir.join("en.sqlite").exists());
    }

    #[tokio::test]
    async fn test_open_sqlite_data_dir_with_url_characters() {
        let root = tempfile::tempdir().expect("temp dir");
        let data_dir = root.path().join("what? #1 100%");
        let config = StorageConfig::Sqlite {
            data_dir: data_dir.clone(),
            language: "en".to_string(),
        };

        let store = AuditStore::open(&config).await.expect("open sqlite store");
        store
            .replace_route("/a", &links(&[(LinkCategory::PageAbsolute, "/x")]))
            .await
            .expect("write");
        store.close().await;

        assert!(data_dir.join("en.sqlite").exists());
    }

    #[tokio::test]
    async fn test_open_postgres_without_password_is_config_error() {
        let config = StorageConfig::Postgres {
            host: Some("localhost".to_string()),
            port: 5432,
            dbname: Some("links".to_string()),
            username: Some("audit".to_string()),
            password: None,
        };
        assert!(matches!(
            AuditStore::open(&config).await,
            Err(AuditError::Config(_))
        ));
    }
}
