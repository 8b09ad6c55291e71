//! TalentScope Database Layer
//!
//! Persistence for users, assessments and per-cohort benchmark aggregates.
//! The embedded LanceDB store needs no external server; the in-memory
//! store backs tests and throwaway runs.
//!
//! # Example
//!
//! ```rust,no_run
//! use talentscope_db::{LanceScoreStore, ScoreStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = LanceScoreStore::open("./data/talentscope.db").await?;
//!     let users = store.list_users(None).await?;
//!     println!("{} users", users.len());
//!     Ok(())
//! }
//! ```

pub mod assessments;
pub mod benchmarks;
pub mod database;
pub mod error;
pub mod lance_store;
pub mod memory;
pub mod schema;
pub mod schema_arrow;
pub mod store;
pub mod users;

pub use assessments::AssessmentRepository;
pub use benchmarks::BenchmarkRepository;
pub use database::Database;
pub use error::{DbError, Result};
pub use lance_store::LanceScoreStore;
pub use memory::MemoryScoreStore;
pub use schema::{TABLE_ASSESSMENTS, TABLE_BENCHMARKS, TABLE_USERS};
pub use store::{AssessmentQuery, ScoreStore, SortOrder};
pub use users::UserRepository;
