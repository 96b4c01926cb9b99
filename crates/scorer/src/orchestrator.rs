//! Scoring orchestrator
//!
//! Drives every stored paper through
//! `Unscored -> HeuristicOnly -> Combined` in two sequential phases:
//!
//! 1. Heuristic fill: every paper without a heuristic score gets one.
//! 2. Judgment + combined fill: every paper with a heuristic but no combined
//!    score gets a combined score, after a model judgment when the paper is
//!    eligible and the per-run cap allows.
//!
//! The state lives entirely in the store's score columns, so an interrupted
//! run is picked up by the next one.

use crate::errors::Result;
use crate::heuristic::{compute_heuristic, round2};
use paperscout_common::config::{AppConfig, ScoringConfig};
use paperscout_common::db::models::{Paper, ScoreState};
use paperscout_common::db::PaperStore;
use paperscout_common::judgment::{create_judge, Judge, Judgment, JudgmentRequest};
use paperscout_common::metrics::{self, CombinedPath, JudgmentOutcome};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Builds the judgment client at the start of phase 2
pub type JudgeFactory =
    Box<dyn Fn() -> paperscout_common::Result<Arc<dyn Judge>> + Send + Sync>;

/// Outcome of one orchestrator run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScoringReport {
    pub run_id: Uuid,
    /// Heuristic scores written in phase 1
    pub heuristic_scored: usize,
    /// Combined scores written from a judgment
    pub judged: usize,
    /// Combined scores written from the heuristic alone
    pub heuristic_only: usize,
    /// Judgment calls that failed or returned an unusable reply
    pub judgment_failures: usize,
    pub warnings: Vec<String>,
}

pub struct ScoringOrchestrator<S> {
    store: S,
    scoring: ScoringConfig,
    judge_factory: JudgeFactory,
}

impl<S: PaperStore> ScoringOrchestrator<S> {
    /// Orchestrator whose judge is built from the judgment configuration
    pub fn new(store: S, config: &AppConfig) -> Self {
        let judgment = config.judgment.clone();
        let interests = config.interests().cloned();
        let factory: JudgeFactory = Box::new(move || create_judge(&judgment, interests.as_ref()));
        Self::with_judge_factory(store, config.scoring.clone(), factory)
    }

    pub fn with_judge_factory(
        store: S,
        scoring: ScoringConfig,
        judge_factory: JudgeFactory,
    ) -> Self {
        Self {
            store,
            scoring,
            judge_factory,
        }
    }

    /// Run both phases once.
    ///
    /// Judgment problems never fail the run; storage errors do.
    pub async fn run(&self) -> Result<ScoringReport> {
        self.run_with_id(Uuid::new_v4()).await
    }

    #[instrument(name = "scoring_run", skip(self))]
    async fn run_with_id(&self, run_id: Uuid) -> Result<ScoringReport> {
        let mut report = ScoringReport {
            run_id,
            ..Default::default()
        };

        report.heuristic_scored = self.fill_heuristics().await?;
        self.fill_combined(&mut report).await?;

        info!(
            heuristic_scored = report.heuristic_scored,
            judged = report.judged,
            heuristic_only = report.heuristic_only,
            judgment_failures = report.judgment_failures,
            warnings = report.warnings.len(),
            "Scoring run complete"
        );
        Ok(report)
    }

    async fn fill_heuristics(&self) -> Result<usize> {
        let papers = self.store.papers_missing_heuristic().await?;
        debug!(count = papers.len(), "Papers awaiting heuristic score");

        for paper in &papers {
            let score = self.heuristic_for(paper).await?;
            self.store.set_heuristic(paper.id, score).await?;
            metrics::record_heuristic();
            debug!(paper_id = paper.id, score, "Heuristic score written");
        }
        Ok(papers.len())
    }

    async fn heuristic_for(&self, paper: &Paper) -> Result<f64> {
        let mut keywords = HashSet::new();
        let mut max_h_index = 0i64;

        for author in self.store.authors_of(paper.id).await? {
            max_h_index = max_h_index.max(author.h_index.unwrap_or(0) as i64);
            for affiliation in self.store.affiliations_of(author.id).await? {
                if let Some(keyword) = affiliation.matched_keyword.filter(|k| !k.is_empty()) {
                    keywords.insert(keyword);
                }
            }
        }

        Ok(compute_heuristic(
            &keywords,
            Some(max_h_index),
            paper.citation_count.unwrap_or(0),
        ))
    }

    async fn fill_combined(&self, report: &mut ScoringReport) -> Result<()> {
        let pending = self.store.papers_missing_combined().await?;
        if pending.is_empty() {
            return Ok(());
        }

        let judge = match (self.judge_factory)() {
            Ok(judge) => Some(judge),
            Err(e) => {
                warn!(
                    error = %e,
                    pending = pending.len(),
                    "Judgment unavailable, falling back to heuristic scores"
                );
                report.warnings.push(format!(
                    "judgment unavailable ({}); {} papers scored on heuristic only",
                    e,
                    pending.len()
                ));
                None
            }
        };

        let cap = self.scoring.max_judgments_per_run;
        let mut successful: u32 = 0;

        for paper in &pending {
            let ScoreState::HeuristicOnly { heuristic } = paper.score_state() else {
                continue;
            };

            let judgment = match judge {
                Some(ref judge) if successful < cap && self.is_eligible(paper, heuristic) => {
                    self.request_judgment(judge.as_ref(), paper, report).await
                }
                _ => None,
            };

            match judgment {
                Some(judgment) => {
                    let score = i32::from(judgment.score);
                    let combined = round2(
                        self.scoring.heuristic_weight * heuristic
                            + self.scoring.judgment_weight * f64::from(score),
                    );
                    self.store.set_judgment(paper.id, score, &judgment.summary).await?;
                    self.store.set_combined(paper.id, combined).await?;
                    metrics::record_combined(CombinedPath::Judged);
                    successful += 1;
                    report.judged += 1;
                    debug!(paper_id = paper.id, score, combined, "Judged score written");
                }
                None => {
                    let combined = round2(self.scoring.heuristic_weight * heuristic);
                    self.store.set_combined(paper.id, combined).await?;
                    metrics::record_combined(CombinedPath::HeuristicOnly);
                    report.heuristic_only += 1;
                    debug!(paper_id = paper.id, combined, "Heuristic-only score written");
                }
            }
        }

        if judge.is_some() && successful >= cap {
            info!(cap, "Judgment cap reached for this run");
        }
        Ok(())
    }

    /// Papers the metadata service missed get judged regardless of their
    /// heuristic, which is depressed by the missing author data.
    fn is_eligible(&self, paper: &Paper, heuristic: f64) -> bool {
        heuristic >= self.scoring.min_heuristic_score_for_judgment || paper.enrichment_missed()
    }

    async fn request_judgment(
        &self,
        judge: &dyn Judge,
        paper: &Paper,
        report: &mut ScoringReport,
    ) -> Option<Judgment> {
        let request = JudgmentRequest {
            title: &paper.title,
            abstract_text: paper.abstract_text.as_deref().unwrap_or_default(),
            categories: paper.categories.as_deref().unwrap_or_default(),
        };

        let started = Instant::now();
        let result = judge.judge(&request).await;
        let elapsed = started.elapsed();

        match result {
            Ok(Some(judgment)) => {
                metrics::record_judgment(JudgmentOutcome::Success, judge.model_name(), elapsed);
                Some(judgment)
            }
            Ok(None) => {
                metrics::record_judgment(JudgmentOutcome::Malformed, judge.model_name(), elapsed);
                warn!(paper_id = paper.id, "Malformed judgment reply");
                report.judgment_failures += 1;
                None
            }
            Err(e) => {
                metrics::record_judgment(JudgmentOutcome::Error, judge.model_name(), elapsed);
                warn!(
                    paper_id = paper.id,
                    error = %e,
                    code = ?e.code(),
                    transient = e.is_transient(),
                    "Judgment request failed"
                );
                report.judgment_failures += 1;
                None
            }
        }
    }
}
