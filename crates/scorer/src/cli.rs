//! Command-line interface

use crate::enrichment::{enrich_papers, ingest_feed, EnrichmentEntry, FeedPaper};
use crate::errors::{Result, ScoringError};
use crate::orchestrator::{ScoringOrchestrator, ScoringReport};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use paperscout_common::config::AppConfig;
use paperscout_common::db::{PaperQuery, Repository, SortColumn};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::info;

/// Command-line arguments for paperscout
#[derive(Parser, Debug)]
#[command(name = "paperscout")]
#[command(about = "Score and rank new preprints")]
#[command(version)]
pub struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, global = true, env = "PAPERSCOUT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Database URL, overrides database.url
    #[arg(long, global = true)]
    pub database: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Store new papers from a JSON feed file
    Ingest { file: PathBuf },

    /// Apply enrichment results to papers due for enrichment
    Enrich { file: PathBuf },

    /// Run heuristic scoring and model judgment
    Score,

    /// Print ranked papers as JSON lines
    Top {
        #[arg(long, default_value_t = 20)]
        limit: u64,

        #[arg(long, default_value_t = 0)]
        offset: u64,

        #[arg(long, default_value_t = 0.0)]
        min_score: f64,

        /// Category substring, e.g. hep-ph
        #[arg(long)]
        category: Option<String>,

        /// Ordering column; unknown names rank by combined score
        #[arg(long, default_value = "combined_score")]
        sort: String,

        /// Only papers fetched since this date (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        since: Option<String>,
    },

    /// Ingest, enrich, then score
    RunAll {
        feed: PathBuf,

        #[arg(long)]
        enrichment: Option<PathBuf>,
    },
}

/// Execute a subcommand against an open repository
pub async fn execute(command: Command, config: &AppConfig, repo: Repository) -> Result<()> {
    match command {
        Command::Ingest { file } => {
            ingest(&repo, &file).await?;
        }
        Command::Enrich { file } => {
            enrich(&repo, config, &file).await?;
        }
        Command::Score => {
            let report = score(repo, config).await?;
            print_report(&report)?;
        }
        Command::Top {
            limit,
            offset,
            min_score,
            category,
            sort,
            since,
        } => {
            let query = PaperQuery {
                min_score,
                category,
                since: since.as_deref().map(parse_since).transpose()?,
                sort: SortColumn::from(sort.as_str()),
                limit,
                offset,
            };
            for paper in repo.top_papers(&query).await? {
                let line = serde_json::to_string(&paper)?;
                println!("{}", line);
            }
        }
        Command::RunAll { feed, enrichment } => {
            ingest(&repo, &feed).await?;
            if let Some(file) = enrichment {
                enrich(&repo, config, &file).await?;
            }
            let report = score(repo, config).await?;
            print_report(&report)?;
        }
    }
    Ok(())
}

async fn ingest(repo: &Repository, file: &Path) -> Result<usize> {
    let papers: Vec<FeedPaper> = read_json(file).await?;
    let inserted = ingest_feed(repo, &papers).await?;
    info!(file = %file.display(), received = papers.len(), inserted, "Feed ingested");
    Ok(inserted)
}

async fn enrich(repo: &Repository, config: &AppConfig, file: &Path) -> Result<()> {
    let entries: Vec<EnrichmentEntry> = read_json(file).await?;
    enrich_papers(repo, &config.enrichment, &entries, Utc::now()).await?;
    Ok(())
}

async fn score(repo: Repository, config: &AppConfig) -> Result<ScoringReport> {
    ScoringOrchestrator::new(repo, config).run().await
}

fn print_report(report: &ScoringReport) -> Result<()> {
    let text = serde_json::to_string_pretty(report)?;
    println!("{}", text);
    Ok(())
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ScoringError::Input {
            path: path.to_path_buf(),
            source,
        })?;
    serde_json::from_str(&contents).map_err(|source| ScoringError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Accepts a calendar date (midnight UTC) or a full RFC 3339 timestamp
pub fn parse_since(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| ScoringError::InvalidDate(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use paperscout_common::db::DbPool;
    use std::io::Write;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_top_arguments() {
        let cli = Cli::try_parse_from([
            "paperscout",
            "--database",
            "sqlite::memory:",
            "top",
            "--limit",
            "5",
            "--sort",
            "heuristic_score",
        ])
        .unwrap();
        assert_eq!(cli.database.as_deref(), Some("sqlite::memory:"));
        match cli.command {
            Command::Top { limit, sort, min_score, .. } => {
                assert_eq!(limit, 5);
                assert_eq!(sort, "heuristic_score");
                assert_eq!(min_score, 0.0);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_since() {
        let date = parse_since("2026-02-01").unwrap();
        assert_eq!(date.to_rfc3339(), "2026-02-01T00:00:00+00:00");

        let ts = parse_since("2026-02-01T12:30:00+02:00").unwrap();
        assert_eq!(ts.to_rfc3339(), "2026-02-01T10:30:00+00:00");

        assert!(matches!(parse_since("last week"), Err(ScoringError::InvalidDate(_))));
    }

    #[tokio::test]
    async fn test_run_all_with_mock_judge() {
        let dir = std::env::temp_dir().join(format!("paperscout-cli-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();

        let feed = dir.join("feed.json");
        let mut file = std::fs::File::create(&feed).unwrap();
        write!(
            file,
            r#"[{{"external_id": "2602.1", "title": "T", "abstract": "A",
                  "categories": ["hep-ph"], "authors": ["X"]}}]"#
        )
        .unwrap();

        let enrichment = dir.join("enrichment.json");
        std::fs::write(&enrichment, r#"[{"paper": "2602.1", "record": null}]"#).unwrap();

        let mut config = AppConfig::default();
        config.judgment.provider = "mock".to_string();
        let repo = Repository::new(DbPool::in_memory().await.unwrap());

        let command = Command::RunAll {
            feed,
            enrichment: Some(enrichment),
        };
        tokio_test::assert_ok!(execute(command, &config, repo.clone()).await);

        let paper = repo.find_paper_by_external_id("2602.1").await.unwrap().unwrap();
        assert!(paper.enrichment_missed());
        // Mock judge scores 5; 0.4 * 0 + 0.6 * 5
        assert_eq!(paper.judgment_score, Some(5));
        assert_eq!(paper.combined_score, Some(3.0));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_missing_input_file() {
        let repo = Repository::new(DbPool::in_memory().await.unwrap());
        let err = tokio_test::assert_err!(ingest(&repo, Path::new("/nonexistent/feed.json")).await);
        assert!(matches!(err, ScoringError::Input { .. }));
    }
}
