//! Assessment repository.
//!
//! Provides CRUD and cohort queries over the `assessments` table.

use crate::database::Database;
use crate::error::Result;
use crate::schema::TABLE_ASSESSMENTS;
use crate::schema_arrow::{assessment_to_record, record_to_assessment, scores_from_batch};
use futures::StreamExt;
use lancedb::query::{ExecutableQuery, QueryBase, Select};
use std::sync::Arc;
use talentscope_common::entities::{Assessment, VerificationStatus};
use talentscope_common::CohortKey;

/// Repository for assessment operations.
#[derive(Clone)]
pub struct AssessmentRepository {
    db: Arc<Database>,
}

impl AssessmentRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn insert(&self, assessment: &Assessment) -> Result<()> {
        let table = self.db.connection().open_table(TABLE_ASSESSMENTS).execute().await?;

        let record = assessment_to_record(assessment)?;
        let schema = record.schema();
        let iter = arrow_array::RecordBatchIterator::new(vec![Ok(record)], schema);

        table.add(iter).execute().await?;
        Ok(())
    }

    pub async fn update(&self, assessment: &Assessment) -> Result<()> {
        let table = self.db.connection().open_table(TABLE_ASSESSMENTS).execute().await?;

        let record = assessment_to_record(assessment)?;
        let schema = record.schema();
        let iter = arrow_array::RecordBatchIterator::new(vec![Ok(record)], schema);

        let mut builder = table.merge_insert(&["id"]);
        builder.when_matched_update_all(None);
        builder.execute(Box::new(iter)).await?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: uuid::Uuid) -> Result<Option<Assessment>> {
        Ok(self.find_where(Some(format!("id = '{}'", id))).await?.into_iter().next())
    }

    /// All assessments matching an optional SQL predicate.
    pub async fn find_where(&self, filter: Option<String>) -> Result<Vec<Assessment>> {
        let table = self.db.connection().open_table(TABLE_ASSESSMENTS).execute().await?;

        let mut stream = match filter {
            Some(filter) => table.query().only_if(&filter).execute().await?,
            None => table.query().execute().await?,
        };

        let mut assessments = Vec::new();
        while let Some(batch) = stream.next().await {
            let batch = batch?;
            for i in 0..batch.num_rows() {
                assessments.push(record_to_assessment(&batch, i)?);
            }
        }
        Ok(assessments)
    }

    pub async fn count_where(&self, filter: Option<String>) -> Result<u64> {
        let table = self.db.connection().open_table(TABLE_ASSESSMENTS).execute().await?;
        Ok(table.count_rows(filter).await? as u64)
    }

    /// Verified normalized scores in a cohort. Only the score column is read.
    pub async fn cohort_scores(&self, cohort: CohortKey, exclude: Option<uuid::Uuid>) -> Result<Vec<f64>> {
        let table = self.db.connection().open_table(TABLE_ASSESSMENTS).execute().await?;

        let mut filter = format!(
            "test_type = '{}' AND age_group = '{}' AND gender = '{}' \
             AND verification_status = '{}' AND normalized_score IS NOT NULL",
            cohort.test_type.as_str(),
            cohort.age_group.as_str(),
            cohort.gender.as_str(),
            VerificationStatus::Verified.as_str(),
        );
        if let Some(id) = exclude {
            filter.push_str(&format!(" AND id != '{}'", id));
        }

        let mut stream = table
            .query()
            .only_if(&filter)
            .select(Select::columns(&["normalized_score"]))
            .execute()
            .await?;

        let mut scores = Vec::new();
        while let Some(batch) = stream.next().await {
            scores.extend(scores_from_batch(&batch?)?);
        }
        Ok(scores)
    }
}
