// crates/containership/src/document/mod.rs
// Authoritative per-session analysis state

pub mod index;
pub mod navigation;
pub mod segment;

pub use index::{LineClauseIndex, LineRole};
pub use navigation::{Direction, Navigator};

use crate::error::Result;
use containership_types::{BatchAnalysis, Clause};
use std::fmt;
use tracing::{debug, warn};

/// How much of the analysis result has been committed to the model.
///
/// Advances monotonically; `Failed` is terminal and reachable from any state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Progress {
    #[default]
    NotStarted,
    OriginalLoaded,
    /// Clause structure received, with the clause count
    StructureLoaded(usize),
    /// Highest `index + 1` seen in a clause update
    ClauseInProgress(usize),
    OptimizedLoaded,
    Complete,
    Failed(String),
}

impl Progress {
    fn rank(&self) -> (u8, usize) {
        match self {
            Progress::NotStarted => (0, 0),
            Progress::OriginalLoaded => (1, 0),
            Progress::StructureLoaded(_) => (2, 0),
            Progress::ClauseInProgress(count) => (3, *count),
            Progress::OptimizedLoaded => (4, 0),
            Progress::Complete => (5, 0),
            Progress::Failed(_) => (6, 0),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Progress::Failed(_))
    }

    /// Complete or failed
    pub fn is_terminal(&self) -> bool {
        matches!(self, Progress::Complete | Progress::Failed(_))
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Progress::NotStarted => write!(f, "not started"),
            Progress::OriginalLoaded => write!(f, "original loaded"),
            Progress::StructureLoaded(total) => write!(f, "structure loaded ({} clauses)", total),
            Progress::ClauseInProgress(count) => write!(f, "analyzing clauses ({} done)", count),
            Progress::OptimizedLoaded => write!(f, "optimized loaded"),
            Progress::Complete => write!(f, "complete"),
            Progress::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Analysis state for one upload.
///
/// Every structural change rebuilds the line index before the mutating call
/// returns, so a reader holding the model never sees clauses and index out
/// of step.
#[derive(Debug, Clone, Default)]
pub struct DocumentModel {
    original_text: Option<String>,
    optimized_text: Option<String>,
    clauses: Vec<Clause>,
    index: LineClauseIndex,
    navigator: Navigator,
    progress: Progress,
    streaming_index: Option<usize>,
    items_complete: bool,
}

impl DocumentModel {
    pub fn new() -> Self {
        Self::default()
    }

    // ═══════════════════════════════════════
    // STREAM TRANSITIONS
    // ═══════════════════════════════════════

    pub fn apply_original(&mut self, text: String) {
        self.original_text = Some(text);
        self.advance(Progress::OriginalLoaded);
    }

    /// Replace the clause list wholesale
    pub fn apply_structure(&mut self, clauses: Vec<Clause>) {
        let total = clauses.len();
        self.clauses = clauses;
        self.index.rebuild(&self.clauses);
        self.navigator.clamp(total);
        self.streaming_index = None;
        self.items_complete = false;
        self.advance(Progress::StructureLoaded(total));
    }

    /// Replace one clause with its analyzed version.
    ///
    /// Returns false, leaving clauses and progress untouched, when `index` is
    /// not covered by the current structure.
    pub fn apply_clause_update(&mut self, index: usize, clause: Clause) -> bool {
        let len = self.clauses.len();
        let Some(slot) = self.clauses.get_mut(index) else {
            warn!(index, len, "Clause update outside known structure, skipping");
            return false;
        };

        let lines_changed = slot.line_numbers != clause.line_numbers;
        *slot = clause;
        if lines_changed {
            debug!(index, "Clause update changed line numbers, rebuilding index");
            self.index.rebuild(&self.clauses);
        }
        self.advance(Progress::ClauseInProgress(index + 1));
        true
    }

    pub fn apply_optimized(&mut self, text: String) {
        self.optimized_text = Some(text);
        self.advance(Progress::OptimizedLoaded);
    }

    /// Apply a one-shot analysis as a single update
    pub fn apply_batch(&mut self, batch: BatchAnalysis) {
        self.apply_original(batch.original_dockerfile);
        self.apply_structure(batch.clauses);
        if let Some(optimized) = batch.optimized_dockerfile {
            self.apply_optimized(optimized);
        }
    }

    pub fn fail(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        debug!(from = %self.progress, reason = %reason, "Analysis failed");
        self.progress = Progress::Failed(reason);
    }

    pub fn complete(&mut self) {
        self.advance(Progress::Complete);
    }

    fn advance(&mut self, next: Progress) {
        if self.progress.is_failed() {
            debug!(next = %next, "Ignoring progress after failure");
            return;
        }
        if next.rank() >= self.progress.rank() {
            debug!(from = %self.progress, to = %next, "Progress advanced");
            self.progress = next;
        }
    }

    // ═══════════════════════════════════════
    // PER-ITEM ACCUMULATION
    // ═══════════════════════════════════════

    /// Mark `index` as the item currently streaming and clear its text
    pub fn begin_item(&mut self, index: usize) -> bool {
        let Some(clause) = self.clauses.get_mut(index) else {
            return false;
        };
        clause.recommendation.clear();
        self.streaming_index = Some(index);
        self.items_complete = false;
        true
    }

    pub fn append_item_text(&mut self, index: usize, text: &str) -> bool {
        match self.clauses.get_mut(index) {
            Some(clause) => {
                clause.recommendation.push_str(text);
                true
            }
            None => false,
        }
    }

    /// Overwrite an item's accumulated text
    pub fn set_item_text(&mut self, index: usize, text: impl Into<String>) -> bool {
        match self.clauses.get_mut(index) {
            Some(clause) => {
                clause.recommendation = text.into();
                true
            }
            None => false,
        }
    }

    /// Clear the streaming pointer and flag the sequential pass as done
    pub fn finish_items(&mut self) {
        self.streaming_index = None;
        self.items_complete = true;
    }

    // ═══════════════════════════════════════
    // NAVIGATION
    // ═══════════════════════════════════════

    pub fn next(&mut self) -> Option<usize> {
        self.navigator.next(self.clauses.len())
    }

    pub fn prev(&mut self) -> Option<usize> {
        self.navigator.prev(self.clauses.len())
    }

    pub fn step(&mut self, direction: Direction) -> Option<usize> {
        self.navigator.step(direction, self.clauses.len())
    }

    /// Activate the clause owning `line`; no change for unflagged lines
    pub fn select_by_line(&mut self, line: u32) -> Option<usize> {
        self.navigator.select_line(line, &self.index)
    }

    pub fn select_by_index(&mut self, index: usize) -> Result<usize> {
        self.navigator.select_index(index, self.clauses.len())
    }

    // ═══════════════════════════════════════
    // READERS
    // ═══════════════════════════════════════

    pub fn original_text(&self) -> Option<&str> {
        self.original_text.as_deref()
    }

    pub fn optimized_text(&self) -> Option<&str> {
        self.optimized_text.as_deref()
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn clause(&self, index: usize) -> Option<&Clause> {
        self.clauses.get(index)
    }

    pub fn index(&self) -> &LineClauseIndex {
        &self.index
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    /// Active clause index; only meaningful when clauses exist
    pub fn active_index(&self) -> Option<usize> {
        (!self.clauses.is_empty()).then(|| self.navigator.active())
    }

    pub fn active_clause(&self) -> Option<&Clause> {
        self.active_index().and_then(|i| self.clauses.get(i))
    }

    pub fn clause_for_line(&self, line: u32) -> Option<&Clause> {
        self.index.clause_of(line).and_then(|i| self.clauses.get(i))
    }

    /// 1-based active position and clause count
    pub fn position(&self) -> Option<(usize, usize)> {
        self.navigator.position(self.clauses.len())
    }

    pub fn streaming_index(&self) -> Option<usize> {
        self.streaming_index
    }

    pub fn items_complete(&self) -> bool {
        self.items_complete
    }
}
