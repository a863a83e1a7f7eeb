use libsql::{Connection, params};
use tracing::{debug, info};

/// Schema version, bump together with a new `run_migration_vN`
const SCHEMA_VERSION: i64 = 1;

/// Bring the key-value schema up to date. Safe to run on every start.
pub async fn run_migrations(conn: &Connection) -> Result<(), libsql::Error> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL,
            description TEXT
        )",
        (),
    )
    .await?;

    let current_version = current_version(conn).await?;
    if current_version >= SCHEMA_VERSION {
        debug!("Key-value schema is up to date (version {})", current_version);
        return Ok(());
    }

    if current_version < 1 {
        run_migration_v1(conn).await?;
        record_migration(conn, 1, "Key-value entries").await?;
    }

    info!("Key-value schema migrated to version {}", SCHEMA_VERSION);
    Ok(())
}

async fn current_version(conn: &Connection) -> Result<i64, libsql::Error> {
    let mut rows = conn.query("SELECT MAX(version) FROM schema_migrations", ()).await?;

    match rows.next().await? {
        Some(row) => Ok(row.get::<Option<i64>>(0)?.unwrap_or(0)),
        None => Ok(0),
    }
}

async fn record_migration(conn: &Connection, version: i64, description: &str) -> Result<(), libsql::Error> {
    conn.execute(
        "INSERT INTO schema_migrations (version, applied_at, description) VALUES (?1, ?2, ?3)",
        params![version, chrono::Utc::now().timestamp(), description],
    )
    .await?;
    Ok(())
}

async fn run_migration_v1(conn: &Connection) -> Result<(), libsql::Error> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv_entries (
            key TEXT PRIMARY KEY NOT NULL,
            value TEXT NOT NULL,
            updated_at INTEGER NOT NULL
        )",
        (),
    )
    .await?;
    Ok(())
}
