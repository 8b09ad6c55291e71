//! User repository.

use crate::database::Database;
use crate::error::Result;
use crate::schema::TABLE_USERS;
use crate::schema_arrow::{record_to_user, user_to_record};
use futures::StreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use std::sync::Arc;
use talentscope_common::entities::{User, UserRole};

/// Repository for user profile operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<Database>,
}

impl UserRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn insert(&self, user: &User) -> Result<()> {
        let table = self.db.connection().open_table(TABLE_USERS).execute().await?;

        let record = user_to_record(user)?;
        let schema = record.schema();
        let iter = arrow_array::RecordBatchIterator::new(vec![Ok(record)], schema);

        table.add(iter).execute().await?;
        Ok(())
    }

    pub async fn update(&self, user: &User) -> Result<()> {
        let table = self.db.connection().open_table(TABLE_USERS).execute().await?;

        let record = user_to_record(user)?;
        let schema = record.schema();
        let iter = arrow_array::RecordBatchIterator::new(vec![Ok(record)], schema);

        let mut builder = table.merge_insert(&["id"]);
        builder.when_matched_update_all(None);
        builder.execute(Box::new(iter)).await?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: uuid::Uuid) -> Result<Option<User>> {
        Ok(self.find_where(&format!("id = '{}'", id)).await?.into_iter().next())
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let escaped = email.to_lowercase().replace('\'', "''");
        Ok(self.find_where(&format!("email = '{}'", escaped)).await?.into_iter().next())
    }

    pub async fn find_by_role(&self, role: UserRole) -> Result<Vec<User>> {
        self.find_where(&format!("role = '{}'", role.as_str())).await
    }

    pub async fn list(&self) -> Result<Vec<User>> {
        let table = self.db.connection().open_table(TABLE_USERS).execute().await?;
        let mut stream = table.query().execute().await?;

        let mut users = Vec::new();
        while let Some(batch) = stream.next().await {
            let batch = batch?;
            for i in 0..batch.num_rows() {
                users.push(record_to_user(&batch, i)?);
            }
        }
        Ok(users)
    }

    async fn find_where(&self, filter: &str) -> Result<Vec<User>> {
        let table = self.db.connection().open_table(TABLE_USERS).execute().await?;

        let mut stream = table.query().only_if(filter).execute().await?;

        let mut users = Vec::new();
        while let Some(batch) = stream.next().await {
            let batch = batch?;
            for i in 0..batch.num_rows() {
                users.push(record_to_user(&batch, i)?);
            }
        }
        Ok(users)
    }

    pub async fn count(&self) -> Result<u64> {
        let table = self.db.connection().open_table(TABLE_USERS).execute().await?;
        Ok(table.count_rows(None).await? as u64)
    }
}
