//! Storage seam used by the scoring engine

use crate::db::models::{Affiliation, Author, Paper};
use crate::errors::Result;
use async_trait::async_trait;

/// Durable keyed storage for papers and their score columns.
///
/// Every method is a single statement against the backing store; callers
/// must not assume atomicity across calls.
#[async_trait]
pub trait PaperStore: Send + Sync {
    /// Papers whose heuristic score has not been written yet
    async fn papers_missing_heuristic(&self) -> Result<Vec<Paper>>;

    /// Papers with a heuristic score but no combined score
    async fn papers_missing_combined(&self) -> Result<Vec<Paper>>;

    async fn set_heuristic(&self, paper_id: i64, score: f64) -> Result<()>;

    /// Store a judgment and stamp `judged_at`
    async fn set_judgment(&self, paper_id: i64, score: i32, summary: &str) -> Result<()>;

    async fn set_combined(&self, paper_id: i64, score: f64) -> Result<()>;

    /// Authors linked to a paper, in author-list order
    async fn authors_of(&self, paper_id: i64) -> Result<Vec<Author>>;

    async fn affiliations_of(&self, author_id: i64) -> Result<Vec<Affiliation>>;
}
