// src/store/schema.rs
// =============================================================================
// Schema for the broken-link table.
//
// The same statements run on SQLite and PostgreSQL, so they stick to the SQL
// both accept.
// =============================================================================

use sqlx::AnyPool;

/// The table every backend stores records in.
pub const TABLE: &str = "per_route";

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS per_route (
    route TEXT NOT NULL,
    link_type TEXT NOT NULL,
    link TEXT NOT NULL,
    last_found BIGINT NOT NULL
)";

// One row per (route, link), whatever the category.
const CREATE_UNIQUE_INDEX: &str =
    "CREATE UNIQUE INDEX IF NOT EXISTS per_route_route_link ON per_route (route, link)";

/// Creates the table and its unique index if they don't exist yet.
///
/// # Errors
/// Returns `sqlx::Error` if either statement fails.
pub async fn ensure_schema(pool: &AnyPool) -> Result<(), sqlx::Error> {
    sqlx::query(CREATE_TABLE).execute(pool).await?;
    sqlx::query(CREATE_UNIQUE_INDEX).execute(pool).await?;
    tracing::debug!("Schema for {} is in place", TABLE);
    Ok(())
}
