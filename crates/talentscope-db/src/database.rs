//! Database connection and table management.

use crate::error::Result;
use crate::schema;
use arrow_array::RecordBatchIterator;
use arrow_schema::Schema;
use lancedb::connection::Connection;
use std::path::Path;
use std::sync::Arc;

/// Main database handle.
#[derive(Clone)]
pub struct Database {
    conn: Connection,
    path: String,
}

impl Database {
    /// Open or create a database at the specified path.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        if !path.as_ref().exists() {
            std::fs::create_dir_all(path.as_ref())?;
        }

        let conn = lancedb::connect(&path_str).execute().await?;

        tracing::debug!(path = %path_str, "Opened LanceDB database");

        Ok(Self { conn, path: path_str })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Create any missing tables.
    pub async fn initialize(&self) -> Result<()> {
        self.ensure_table(schema::TABLE_USERS, schema::user_schema()).await?;
        self.ensure_table(schema::TABLE_ASSESSMENTS, schema::assessment_schema()).await?;
        self.ensure_table(schema::TABLE_BENCHMARKS, schema::benchmark_schema()).await?;
        Ok(())
    }

    pub async fn table_exists(&self, name: &str) -> Result<bool> {
        let tables = self.conn.table_names().execute().await?;
        Ok(tables.contains(&name.to_string()))
    }

    async fn ensure_table(&self, name: &str, schema: Arc<Schema>) -> Result<()> {
        if self.table_exists(name).await? {
            return Ok(());
        }

        // LanceDB infers the table schema from the (empty) batch iterator.
        let empty_iter = RecordBatchIterator::new(vec![], schema);
        self.conn.create_table(name, empty_iter).execute().await?;

        tracing::info!(table = name, "Created table");
        Ok(())
    }
}
