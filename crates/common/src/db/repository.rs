//! Repository pattern for database operations
//!
//! Provides a clean interface for all data access operations
//! with proper error handling.

use crate::db::models::*;
use crate::db::store::PaperStore;
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, NotSet,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};

/// A paper as produced by the feed collaborator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPaper {
    pub external_id: String,
    pub title: String,
    #[serde(default, rename = "abstract")]
    pub abstract_text: Option<String>,
    #[serde(default)]
    pub categories: Option<String>,
    #[serde(default)]
    pub published_date: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Columns the ranking query may order by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortColumn {
    #[default]
    CombinedScore,
    HeuristicScore,
    JudgmentScore,
    PublishedDate,
    FetchedAt,
    CitationCount,
}

impl SortColumn {
    fn column(self) -> PaperColumn {
        match self {
            SortColumn::CombinedScore => PaperColumn::CombinedScore,
            SortColumn::HeuristicScore => PaperColumn::HeuristicScore,
            SortColumn::JudgmentScore => PaperColumn::JudgmentScore,
            SortColumn::PublishedDate => PaperColumn::PublishedDate,
            SortColumn::FetchedAt => PaperColumn::FetchedAt,
            SortColumn::CitationCount => PaperColumn::CitationCount,
        }
    }
}

/// Unknown column names fall back to the combined score
impl From<&str> for SortColumn {
    fn from(s: &str) -> Self {
        match s {
            "heuristic_score" => SortColumn::HeuristicScore,
            "judgment_score" => SortColumn::JudgmentScore,
            "published_date" => SortColumn::PublishedDate,
            "fetched_at" => SortColumn::FetchedAt,
            "citation_count" => SortColumn::CitationCount,
            _ => SortColumn::CombinedScore,
        }
    }
}

/// Ranking query for presentation
#[derive(Debug, Clone)]
pub struct PaperQuery {
    /// Lower bound on the combined score; unscored papers never match
    pub min_score: f64,
    /// Substring of the category tags
    pub category: Option<String>,
    /// Only papers fetched at or after this instant
    pub since: Option<DateTime<Utc>>,
    pub sort: SortColumn,
    pub limit: u64,
    pub offset: u64,
}

impl Default for PaperQuery {
    fn default() -> Self {
        Self {
            min_score: 0.0,
            category: None,
            since: None,
            sort: SortColumn::CombinedScore,
            limit: 50,
            offset: 0,
        }
    }
}

/// Repository for data access operations
#[derive(Clone, Debug)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> &DatabaseConnection {
        self.pool.conn()
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // Paper Operations
    // ========================================================================

    /// Insert a paper unless its external id is already known.
    ///
    /// Returns the new row id, or `None` for a duplicate.
    pub async fn insert_paper(&self, paper: &NewPaper) -> Result<Option<i64>> {
        if self.find_paper_by_external_id(&paper.external_id).await?.is_some() {
            return Ok(None);
        }

        let model = PaperActiveModel {
            id: NotSet,
            external_id: Set(paper.external_id.clone()),
            title: Set(paper.title.clone()),
            abstract_text: Set(paper.abstract_text.clone()),
            categories: Set(paper.categories.clone()),
            published_date: Set(paper.published_date.clone()),
            url: Set(paper.url.clone()),
            citation_count: Set(Some(0)),
            heuristic_score: Set(None),
            judgment_score: Set(None),
            judgment_summary: Set(None),
            combined_score: Set(None),
            fetched_at: Set(Some(Utc::now())),
            judged_at: Set(None),
            enrichment_attempted_at: Set(None),
            enrichment_found: Set(false),
        }
        .insert(self.conn())
        .await?;

        Ok(Some(model.id))
    }

    /// Find paper by row id
    pub async fn find_paper_by_id(&self, id: i64) -> Result<Option<Paper>> {
        PaperEntity::find_by_id(id)
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    /// Find paper by feed identifier
    pub async fn find_paper_by_external_id(&self, external_id: &str) -> Result<Option<Paper>> {
        PaperEntity::find()
            .filter(PaperColumn::ExternalId.eq(external_id))
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    pub async fn set_citation_count(&self, paper_id: i64, count: i64) -> Result<()> {
        self.update_paper_column(paper_id, PaperColumn::CitationCount, Expr::value(count.max(0)))
            .await
    }

    /// Record an enrichment attempt made just now
    pub async fn mark_enrichment_attempted(&self, paper_id: i64, found: bool) -> Result<()> {
        self.mark_enrichment_attempted_at(paper_id, found, Utc::now()).await
    }

    pub async fn mark_enrichment_attempted_at(
        &self,
        paper_id: i64,
        found: bool,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let result = PaperEntity::update_many()
            .col_expr(PaperColumn::EnrichmentAttemptedAt, Expr::value(at))
            .col_expr(PaperColumn::EnrichmentFound, Expr::value(found))
            .filter(PaperColumn::Id.eq(paper_id))
            .exec(self.conn())
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::PaperNotFound { id: paper_id.to_string() });
        }
        Ok(())
    }

    /// Papers the enrichment collaborator should look up.
    ///
    /// Never-attempted papers always qualify. Papers the metadata service did
    /// not know are retried once `retry_after` has passed since the last
    /// attempt, but only while they were fetched within `window`.
    pub async fn papers_needing_enrichment(
        &self,
        now: DateTime<Utc>,
        retry_after: Duration,
        window: Duration,
    ) -> Result<Vec<Paper>> {
        let retry_cutoff = now - retry_after;
        let window_cutoff = now - window;

        PaperEntity::find()
            .filter(
                Condition::any()
                    .add(PaperColumn::EnrichmentAttemptedAt.is_null())
                    .add(
                        Condition::all()
                            .add(PaperColumn::EnrichmentFound.eq(false))
                            .add(PaperColumn::EnrichmentAttemptedAt.lt(retry_cutoff))
                            .add(PaperColumn::FetchedAt.gt(window_cutoff)),
                    ),
            )
            .order_by_asc(PaperColumn::Id)
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    /// Ranked papers for presentation, highest first
    pub async fn top_papers(&self, query: &PaperQuery) -> Result<Vec<Paper>> {
        let mut select =
            PaperEntity::find().filter(PaperColumn::CombinedScore.gte(query.min_score));

        if let Some(ref category) = query.category {
            select = select.filter(PaperColumn::Categories.contains(category.as_str()));
        }

        if let Some(since) = query.since {
            select = select.filter(PaperColumn::FetchedAt.gte(since));
        }

        select
            .order_by_desc(query.sort.column())
            .order_by_asc(PaperColumn::Id)
            .limit(query.limit)
            .offset(query.offset)
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    async fn update_paper_column(
        &self,
        paper_id: i64,
        column: PaperColumn,
        value: sea_orm::sea_query::SimpleExpr,
    ) -> Result<()> {
        let result = PaperEntity::update_many()
            .col_expr(column, value)
            .filter(PaperColumn::Id.eq(paper_id))
            .exec(self.conn())
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::PaperNotFound { id: paper_id.to_string() });
        }
        Ok(())
    }

    // ========================================================================
    // Author Operations
    // ========================================================================

    /// Insert or update an author.
    ///
    /// Authors with a reputation-service id are updated in place when that id
    /// is already stored; authors without one always get a fresh row.
    pub async fn upsert_author(
        &self,
        name: &str,
        external_id: Option<&str>,
        h_index: Option<i32>,
        citation_count: Option<i64>,
    ) -> Result<i64> {
        if let Some(external_id) = external_id {
            let existing = AuthorEntity::find()
                .filter(AuthorColumn::ExternalId.eq(external_id))
                .one(self.conn())
                .await?;

            if let Some(existing) = existing {
                let id = existing.id;
                let mut author: AuthorActiveModel = existing.into();
                author.name = Set(name.to_string());
                author.h_index = Set(h_index);
                author.citation_count = Set(citation_count);
                author.update(self.conn()).await?;
                return Ok(id);
            }
        }

        let author = AuthorActiveModel {
            id: NotSet,
            name: Set(name.to_string()),
            external_id: Set(external_id.map(str::to_string)),
            h_index: Set(h_index),
            citation_count: Set(citation_count),
        }
        .insert(self.conn())
        .await?;

        Ok(author.id)
    }

    /// Link an author to a paper at a position; existing links are kept as is
    pub async fn link_paper_author(
        &self,
        paper_id: i64,
        author_id: i64,
        position: i32,
    ) -> Result<()> {
        let existing = PaperAuthorEntity::find_by_id((paper_id, author_id))
            .one(self.conn())
            .await?;
        if existing.is_some() {
            return Ok(());
        }

        let link = PaperAuthorActiveModel {
            paper_id: Set(paper_id),
            author_id: Set(author_id),
            position: Set(position),
        };
        PaperAuthorEntity::insert(link)
            .exec_without_returning(self.conn())
            .await?;
        Ok(())
    }

    pub async fn find_author_by_id(&self, id: i64) -> Result<Option<Author>> {
        AuthorEntity::find_by_id(id)
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // Affiliation Operations
    // ========================================================================

    pub async fn insert_affiliation(
        &self,
        author_id: i64,
        institution_name: &str,
        matched_keyword: Option<&str>,
    ) -> Result<i64> {
        let affiliation = AffiliationActiveModel {
            id: NotSet,
            author_id: Set(author_id),
            institution_name: Set(institution_name.to_string()),
            matched_keyword: Set(matched_keyword.map(str::to_string)),
        }
        .insert(self.conn())
        .await?;

        Ok(affiliation.id)
    }
}

#[async_trait]
impl PaperStore for Repository {
    async fn papers_missing_heuristic(&self) -> Result<Vec<Paper>> {
        PaperEntity::find()
            .filter(PaperColumn::HeuristicScore.is_null())
            .order_by_asc(PaperColumn::Id)
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    async fn papers_missing_combined(&self) -> Result<Vec<Paper>> {
        PaperEntity::find()
            .filter(PaperColumn::HeuristicScore.is_not_null())
            .filter(PaperColumn::CombinedScore.is_null())
            .order_by_asc(PaperColumn::Id)
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    async fn set_heuristic(&self, paper_id: i64, score: f64) -> Result<()> {
        self.update_paper_column(paper_id, PaperColumn::HeuristicScore, Expr::value(score))
            .await
    }

    async fn set_judgment(&self, paper_id: i64, score: i32, summary: &str) -> Result<()> {
        let result = PaperEntity::update_many()
            .col_expr(PaperColumn::JudgmentScore, Expr::value(score))
            .col_expr(PaperColumn::JudgmentSummary, Expr::value(summary.to_string()))
            .col_expr(PaperColumn::JudgedAt, Expr::value(Utc::now()))
            .filter(PaperColumn::Id.eq(paper_id))
            .exec(self.conn())
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::PaperNotFound { id: paper_id.to_string() });
        }
        Ok(())
    }

    async fn set_combined(&self, paper_id: i64, score: f64) -> Result<()> {
        self.update_paper_column(paper_id, PaperColumn::CombinedScore, Expr::value(score))
            .await
    }

    async fn authors_of(&self, paper_id: i64) -> Result<Vec<Author>> {
        AuthorEntity::find()
            .inner_join(PaperAuthorEntity)
            .filter(PaperAuthorColumn::PaperId.eq(paper_id))
            .order_by_asc(PaperAuthorColumn::Position)
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    async fn affiliations_of(&self, author_id: i64) -> Result<Vec<Affiliation>> {
        AffiliationEntity::find()
            .filter(AffiliationColumn::AuthorId.eq(author_id))
            .order_by_asc(AffiliationColumn::Id)
            .all(self.conn())
            .await
            .map_err(Into::into)
    }
}
