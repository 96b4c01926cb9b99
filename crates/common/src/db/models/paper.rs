//! Paper entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "papers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Feed identifier (e.g. arXiv id), unique
    #[sea_orm(column_type = "Text", unique)]
    pub external_id: String,

    #[sea_orm(column_type = "Text")]
    pub title: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub abstract_text: Option<String>,

    /// Comma separated category tags
    #[sea_orm(column_type = "Text", nullable)]
    pub categories: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub published_date: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub url: Option<String>,

    pub citation_count: Option<i64>,

    pub heuristic_score: Option<f64>,

    pub judgment_score: Option<i32>,

    #[sea_orm(column_type = "Text", nullable)]
    pub judgment_summary: Option<String>,

    pub combined_score: Option<f64>,

    pub fetched_at: Option<ChronoDateTimeUtc>,

    pub judged_at: Option<ChronoDateTimeUtc>,

    pub enrichment_attempted_at: Option<ChronoDateTimeUtc>,

    pub enrichment_found: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::paper_author::Entity")]
    PaperAuthors,
}

impl Related<super::paper_author::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaperAuthors.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Scoring progress of a paper, read off its persisted score columns.
///
/// The null/non-null state of `heuristic_score` and `combined_score` is the
/// only scoring state there is; nothing is kept in memory between runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreState {
    /// No heuristic yet
    Unscored,
    /// Heuristic written, combined still pending
    HeuristicOnly { heuristic: f64 },
    /// Terminal
    Combined {
        heuristic: f64,
        judgment: Option<i32>,
        combined: f64,
    },
}

impl ScoreState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScoreState::Combined { .. })
    }
}

impl Model {
    pub fn score_state(&self) -> ScoreState {
        match (self.heuristic_score, self.combined_score) {
            (None, _) => ScoreState::Unscored,
            (Some(heuristic), None) => ScoreState::HeuristicOnly { heuristic },
            (Some(heuristic), Some(combined)) => ScoreState::Combined {
                heuristic,
                judgment: self.judgment_score,
                combined,
            },
        }
    }

    /// Enrichment ran but the metadata service had no record of the paper.
    ///
    /// Such papers carry an artificially low heuristic (no authors, no
    /// affiliations), so judgment eligibility must not depend on it.
    pub fn enrichment_missed(&self) -> bool {
        self.enrichment_attempted_at.is_some() && !self.enrichment_found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paper() -> Model {
        Model {
            id: 1,
            external_id: "2602.00001".to_string(),
            title: "A paper".to_string(),
            abstract_text: None,
            categories: None,
            published_date: None,
            url: None,
            citation_count: Some(0),
            heuristic_score: None,
            judgment_score: None,
            judgment_summary: None,
            combined_score: None,
            fetched_at: None,
            judged_at: None,
            enrichment_attempted_at: None,
            enrichment_found: false,
        }
    }

    #[test]
    fn test_score_state_follows_columns() {
        let mut p = paper();
        assert_eq!(p.score_state(), ScoreState::Unscored);

        p.heuristic_score = Some(2.5);
        assert_eq!(p.score_state(), ScoreState::HeuristicOnly { heuristic: 2.5 });
        assert!(!p.score_state().is_terminal());

        p.judgment_score = Some(8);
        p.combined_score = Some(5.8);
        assert_eq!(
            p.score_state(),
            ScoreState::Combined { heuristic: 2.5, judgment: Some(8), combined: 5.8 }
        );
        assert!(p.score_state().is_terminal());
    }

    #[test]
    fn test_enrichment_missed() {
        let mut p = paper();
        assert!(!p.enrichment_missed());

        p.enrichment_attempted_at = Some(chrono::Utc::now());
        assert!(p.enrichment_missed());

        p.enrichment_found = true;
        assert!(!p.enrichment_missed());
    }
}
