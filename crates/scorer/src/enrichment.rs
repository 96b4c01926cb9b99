//! Enrichment reconciliation and feed ingest
//!
//! Feed papers arrive with author names only. Enrichment records later attach
//! citation counts, author reputation, and affiliations, which are matched
//! against the institution watch-list.

use crate::errors::Result;
use chrono::{DateTime, Duration, Utc};
use paperscout_common::config::EnrichmentConfig;
use paperscout_common::db::models::Paper;
use paperscout_common::db::{NewPaper, Repository};
use paperscout_common::metrics;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

/// A paper as delivered by the feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedPaper {
    pub external_id: String,
    pub title: String,
    #[serde(default, rename = "abstract")]
    pub abstract_text: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub published_date: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
}

impl FeedPaper {
    fn to_new_paper(&self) -> NewPaper {
        NewPaper {
            external_id: self.external_id.clone(),
            title: self.title.clone(),
            abstract_text: Some(self.abstract_text.clone()),
            categories: Some(self.categories.join(", ")),
            published_date: self.published_date.clone(),
            url: self.url.clone(),
        }
    }
}

/// Author metadata from the reputation service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnrichedAuthor {
    pub name: String,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub h_index: Option<i32>,
    #[serde(default)]
    pub citation_count: Option<i64>,
    #[serde(default)]
    pub affiliations: Vec<String>,
}

/// Everything the metadata service knows about one paper
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnrichmentRecord {
    #[serde(default)]
    pub external_id: String,
    #[serde(default)]
    pub citation_count: i64,
    #[serde(default)]
    pub authors: Vec<EnrichedAuthor>,
}

/// One line of an enrichment file. A null record means the service had no
/// entry for the paper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentEntry {
    pub paper: String,
    #[serde(default)]
    pub record: Option<EnrichmentRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnrichmentSummary {
    pub found: usize,
    pub not_found: usize,
    /// Entries for papers that were unknown or not due
    pub skipped: usize,
}

/// Keywords that occur (case-insensitively) in any affiliation.
///
/// Keyword order is preserved and each keyword is reported once.
pub fn match_affiliations(affiliations: &[String], keywords: &[String]) -> Vec<String> {
    let lowered: Vec<String> = affiliations.iter().map(|a| a.to_lowercase()).collect();

    keywords
        .iter()
        .filter(|kw| {
            let kw = kw.to_lowercase();
            lowered.iter().any(|aff| aff.contains(&kw))
        })
        .cloned()
        .collect()
}

/// First matched keyword contained in this affiliation
fn keyword_for<'a>(affiliation: &str, matched: &'a [String]) -> Option<&'a str> {
    let affiliation = affiliation.to_lowercase();
    matched
        .iter()
        .find(|kw| affiliation.contains(&kw.to_lowercase()))
        .map(String::as_str)
}

/// Apply one enrichment result to a paper.
///
/// Returns whether the metadata service knew the paper.
#[instrument(skip(repo, keywords, paper, record), fields(paper_id = paper.id))]
pub async fn apply_enrichment(
    repo: &Repository,
    keywords: &[String],
    paper: &Paper,
    record: Option<&EnrichmentRecord>,
) -> Result<bool> {
    let Some(record) = record else {
        repo.mark_enrichment_attempted(paper.id, false).await?;
        metrics::record_enrichment(false);
        debug!("Paper not known to metadata service");
        return Ok(false);
    };

    repo.set_citation_count(paper.id, record.citation_count).await?;

    for (position, author) in record.authors.iter().enumerate() {
        let author_id = repo
            .upsert_author(
                &author.name,
                author.external_id.as_deref(),
                author.h_index,
                author.citation_count,
            )
            .await?;
        repo.link_paper_author(paper.id, author_id, position as i32).await?;

        let matched = match_affiliations(&author.affiliations, keywords);
        for affiliation in &author.affiliations {
            repo.insert_affiliation(author_id, affiliation, keyword_for(affiliation, &matched))
                .await?;
        }
    }

    repo.mark_enrichment_attempted(paper.id, true).await?;
    metrics::record_enrichment(true);
    debug!(authors = record.authors.len(), "Enrichment applied");
    Ok(true)
}

/// Apply a batch of enrichment entries to the papers currently due for enrichment
pub async fn enrich_papers(
    repo: &Repository,
    config: &EnrichmentConfig,
    entries: &[EnrichmentEntry],
    now: DateTime<Utc>,
) -> Result<EnrichmentSummary> {
    let due = repo
        .papers_needing_enrichment(
            now,
            Duration::hours(config.retry_after_hours),
            Duration::days(config.retry_window_days),
        )
        .await?;

    let by_paper: HashMap<&str, Option<&EnrichmentRecord>> = entries
        .iter()
        .map(|e| (e.paper.as_str(), e.record.as_ref()))
        .collect();

    let mut summary = EnrichmentSummary::default();
    for paper in &due {
        let Some(record) = by_paper.get(paper.external_id.as_str()) else {
            continue;
        };
        if apply_enrichment(repo, &config.affiliation_keywords, paper, *record).await? {
            summary.found += 1;
        } else {
            summary.not_found += 1;
        }
    }
    summary.skipped = entries.len() - summary.found - summary.not_found;

    if summary.skipped > 0 {
        warn!(
            skipped = summary.skipped,
            "Enrichment entries did not match any paper due for enrichment"
        );
    }
    info!(
        due = due.len(),
        found = summary.found,
        not_found = summary.not_found,
        "Enrichment complete"
    );
    Ok(summary)
}

/// Insert new feed papers and their name-only authors.
///
/// Returns the number of papers that were not already stored.
#[instrument(skip(repo, papers), fields(count = papers.len()))]
pub async fn ingest_feed(repo: &Repository, papers: &[FeedPaper]) -> Result<usize> {
    let mut inserted = 0;

    for paper in papers {
        let Some(paper_id) = repo.insert_paper(&paper.to_new_paper()).await? else {
            debug!(external_id = %paper.external_id, "Paper already stored");
            continue;
        };

        let names = paper.authors.iter().map(|n| n.trim()).filter(|n| !n.is_empty());
        for (position, name) in names.enumerate() {
            let author_id = repo.upsert_author(name, None, None, None).await?;
            repo.link_paper_author(paper_id, author_id, position as i32).await?;
        }
        inserted += 1;
    }

    metrics::record_ingestion(inserted);
    info!(new_papers = inserted, "Ingest complete");
    Ok(inserted)
}
