// Database schema — table creation.
//
// A `schema_version` table tracks which schema revisions have been
// applied, so future column additions can run as versioned migrations
// without touching existing rows.

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Create all tables if they don't exist yet.
///
/// This is idempotent — safe to call on every startup.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        -- Tracks schema version for future migrations
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Analyzed posts. Rows are written once and never updated or
        -- deleted; the toxicity score map is stored as JSON so the
        -- label space can evolve without migrations.
        CREATE TABLE IF NOT EXISTS posts (
            id TEXT PRIMARY KEY,               -- UUIDv4
            text TEXT NOT NULL,
            toxicity TEXT NOT NULL,            -- JSON map label -> score
            fake_label TEXT NOT NULL,
            fake_score REAL NOT NULL,          -- 0.0 to 1.0
            hate_label TEXT NOT NULL,
            hate_score REAL NOT NULL,          -- 0.0 to 1.0
            created_at TEXT NOT NULL           -- RFC 3339 UTC
        );

        -- User interactions with posts. Append-only. post_id is not a
        -- foreign key: interactions against unknown posts are accepted.
        CREATE TABLE IF NOT EXISTS interactions (
            id TEXT PRIMARY KEY,               -- UUIDv4
            post_id TEXT NOT NULL,
            action TEXT NOT NULL,              -- free-form: 'like', 'report', ...
            timestamp TEXT NOT NULL            -- RFC 3339 UTC
        );

        -- Index for listing posts newest first
        CREATE INDEX IF NOT EXISTS idx_posts_created
            ON posts(created_at);

        -- Index for looking up interactions by post
        CREATE INDEX IF NOT EXISTS idx_interactions_post
            ON interactions(post_id);
        ",
    )
    .context("Failed to create database tables")?;

    // Record initial schema version if not already set
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [1],
    )?;

    Ok(())
}

/// Count the number of tables in the database (useful for init confirmation).
pub fn table_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_tables_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        // Running create_tables twice should not error
        create_tables(&conn).unwrap();
        create_tables(&conn).unwrap();
    }

    #[test]
    fn test_table_count() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        let count = table_count(&conn).unwrap();
        // schema_version, posts, interactions = 3 tables
        assert_eq!(count, 3i64);
    }

    #[test]
    fn test_interactions_have_no_foreign_key() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();

        // An interaction against a post that doesn't exist must insert fine
        conn.execute(
            "INSERT INTO interactions (id, post_id, action, timestamp)
             VALUES ('i-1', 'no-such-post', 'like', '2025-01-01T00:00:00Z')",
            [],
        )
        .unwrap();
    }
}
