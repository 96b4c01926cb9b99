//! Database layer for PaperScout
//!
//! Provides:
//! - SeaORM entity models
//! - Repository pattern for data access
//! - The `PaperStore` seam the scoring engine is written against
//! - Connection pool management and schema bootstrap

pub mod models;
mod repository;
mod store;

pub use repository::{NewPaper, PaperQuery, Repository, SortColumn};
pub use store::PaperStore;

use crate::config::DatabaseConfig;
use crate::errors::{AppError, Result};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use std::time::Duration;
use tracing::{debug, info};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS papers (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        external_id TEXT NOT NULL UNIQUE,
        title TEXT NOT NULL,
        abstract_text TEXT,
        categories TEXT,
        published_date TEXT,
        url TEXT,
        citation_count INTEGER DEFAULT 0,
        heuristic_score REAL,
        judgment_score INTEGER,
        judgment_summary TEXT,
        combined_score REAL,
        fetched_at TEXT,
        judged_at TEXT,
        enrichment_attempted_at TEXT,
        enrichment_found INTEGER NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS authors (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        external_id TEXT UNIQUE,
        h_index INTEGER,
        citation_count INTEGER
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS paper_authors (
        paper_id INTEGER NOT NULL REFERENCES papers(id),
        author_id INTEGER NOT NULL REFERENCES authors(id),
        position INTEGER NOT NULL,
        PRIMARY KEY (paper_id, author_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS affiliations (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        author_id INTEGER NOT NULL REFERENCES authors(id),
        institution_name TEXT NOT NULL,
        matched_keyword TEXT
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_papers_heuristic ON papers (heuristic_score)",
    "CREATE INDEX IF NOT EXISTS idx_papers_combined ON papers (combined_score)",
    "CREATE INDEX IF NOT EXISTS idx_affiliations_author ON affiliations (author_id)",
];

/// Database connection pool wrapper
#[derive(Clone, Debug)]
pub struct DbPool {
    conn: DatabaseConnection,
}

impl DbPool {
    /// Create a new database pool from configuration and bootstrap the schema
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        info!("Connecting to database...");

        let mut opts = ConnectOptions::new(&config.url);
        opts.max_connections(config.max_connections)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .sqlx_logging(false);

        Self::connect(opts).await
    }

    /// Private in-memory database. A single long-lived connection keeps the
    /// data alive for as long as the pool exists.
    pub async fn in_memory() -> Result<Self> {
        let mut opts = ConnectOptions::new("sqlite::memory:");
        opts.max_connections(1)
            .min_connections(1)
            .idle_timeout(Duration::from_secs(24 * 3600))
            .max_lifetime(Duration::from_secs(24 * 3600))
            .sqlx_logging(false);

        Self::connect(opts).await
    }

    async fn connect(opts: ConnectOptions) -> Result<Self> {
        let conn = Database::connect(opts)
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Failed to connect: {}", e),
            })?;

        let pool = Self { conn };
        pool.init_schema().await?;

        info!("Database connection established");
        Ok(pool)
    }

    async fn init_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            self.conn.execute_unprepared(statement).await?;
        }
        debug!(statements = SCHEMA.len(), "Schema ensured");
        Ok(())
    }

    /// Get the underlying connection
    pub fn conn(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Ping the database to check connectivity
    pub async fn ping(&self) -> Result<()> {
        self.conn
            .execute_unprepared("SELECT 1")
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Ping failed: {}", e),
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_pool_bootstraps_schema() {
        let pool = DbPool::in_memory().await.unwrap();
        pool.ping().await.unwrap();

        // Re-running the bootstrap must be harmless
        pool.init_schema().await.unwrap();
    }
}
