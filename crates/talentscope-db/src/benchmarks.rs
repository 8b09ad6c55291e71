//! Cohort benchmark repository. One row per cohort key.

use crate::database::Database;
use crate::error::Result;
use crate::schema::TABLE_BENCHMARKS;
use crate::schema_arrow::{benchmark_to_record, record_to_benchmark};
use futures::StreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use std::sync::Arc;
use talentscope_common::entities::CohortBenchmark;
use talentscope_common::CohortKey;

#[derive(Clone)]
pub struct BenchmarkRepository {
    db: Arc<Database>,
}

impl BenchmarkRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert or replace the aggregate for its cohort.
    pub async fn upsert(&self, benchmark: &CohortBenchmark) -> Result<()> {
        let table = self.db.connection().open_table(TABLE_BENCHMARKS).execute().await?;

        let record = benchmark_to_record(benchmark)?;
        let schema = record.schema();
        let iter = arrow_array::RecordBatchIterator::new(vec![Ok(record)], schema);

        let mut builder = table.merge_insert(&["cohort_key"]);
        builder.when_matched_update_all(None).when_not_matched_insert_all();
        builder.execute(Box::new(iter)).await?;
        Ok(())
    }

    pub async fn find(&self, cohort: CohortKey) -> Result<Option<CohortBenchmark>> {
        let table = self.db.connection().open_table(TABLE_BENCHMARKS).execute().await?;

        let escaped = cohort.to_string().replace('\'', "''");
        let mut stream = table
            .query()
            .only_if(&format!("cohort_key = '{}'", escaped))
            .execute()
            .await?;

        while let Some(batch) = stream.next().await {
            let batch = batch?;
            if batch.num_rows() > 0 {
                return Ok(Some(record_to_benchmark(&batch, 0)?));
            }
        }
        Ok(None)
    }
}
