//! Core domain types shared by the extraction, media, and batch crates.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Terms
// ---------------------------------------------------------------------------

/// Broad kind of a game term, used for logging and lexicon grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermCategory {
    Spell,
    Item,
    Race,
    Class,
    Ability,
}

impl TermCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spell => "spell",
            Self::Item => "item",
            Self::Race => "race",
            Self::Class => "class",
            Self::Ability => "ability",
        }
    }
}

impl fmt::Display for TermCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named entity found in generated text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Canonical (English) spelling of the term.
    pub term: String,
    /// Category, when the term came from the curated lexicon.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<TermCategory>,
    /// Korean display name, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl Candidate {
    /// A candidate with no lexicon metadata.
    pub fn plain(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            category: None,
            alias: None,
        }
    }
}

/// A term together with the image the wiki returned for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedImage {
    pub term: String,
    pub image_url: String,
    /// The spelling variant that produced the hit.
    pub variant: String,
}

/// Output of the annotation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotatedDocument {
    pub markdown: String,
    /// Terms that now have an image snippet in the document, in insertion order.
    pub inserted: Vec<String>,
    /// Resolved terms with no recognizable occurrence in the text.
    pub unmatched: Vec<String>,
}

// ---------------------------------------------------------------------------
// Guides
// ---------------------------------------------------------------------------

/// Size statistics for a finalized guide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideStats {
    /// Number of `<img ` tags in the markdown.
    pub image_count: usize,
    /// Length of the markdown in characters.
    pub char_count: usize,
}

impl GuideStats {
    /// Compute stats for a finished markdown document.
    pub fn of(markdown: &str) -> Self {
        Self {
            image_count: markdown.matches("<img ").count(),
            char_count: markdown.chars().count(),
        }
    }
}

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

/// Default category for build names listed before any `## Category` line.
pub const DEFAULT_CATEGORY: &str = "일반";

/// One (name, category) pair from the build list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItem {
    pub name: String,
    pub category: String,
    /// Publish time, when the run is scheduled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl BatchItem {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            scheduled_at: None,
        }
    }
}

/// Outcome of processing one batch item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemResult {
    pub build_name: String,
    pub category: String,
    pub success: bool,
    pub post_url: Option<String>,
    pub stats: Option<GuideStats>,
    pub error: Option<String>,
    /// Wall-clock seconds spent on the item.
    pub execution_time: f64,
    pub scheduled_time: Option<DateTime<Utc>>,
}

/// Aggregate report for a batch run, written as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub run_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    /// Percentage of processed items that succeeded.
    pub success_rate: f64,
    pub total_time_minutes: f64,
    pub avg_time_per_build_seconds: f64,
    pub results: Vec<ItemResult>,
}

impl BatchReport {
    /// Build a report from per-item results and the total elapsed time.
    pub fn from_results(results: Vec<ItemResult>, elapsed_secs: f64) -> Self {
        let total = results.len();
        let completed = results.iter().filter(|r| r.success).count();
        let failed = total - completed;
        let (success_rate, avg) = if total == 0 {
            (0.0, 0.0)
        } else {
            (
                completed as f64 / total as f64 * 100.0,
                elapsed_secs / total as f64,
            )
        };

        Self {
            run_id: Uuid::now_v7(),
            timestamp: Utc::now(),
            total,
            completed,
            failed,
            success_rate,
            total_time_minutes: elapsed_secs / 60.0,
            avg_time_per_build_seconds: avg,
            results,
        }
    }
}
