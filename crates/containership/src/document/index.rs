// crates/containership/src/document/index.rs
// Derived line <-> clause lookup, rebuilt wholesale from the clause list

use containership_types::Clause;
use std::collections::BTreeMap;
use tracing::warn;

/// Position of a flagged line inside its owning clause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRole {
    /// The clause owns only this line
    Single,
    First,
    Middle,
    Last,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LineEntry {
    clause: usize,
    role: LineRole,
}

/// Maps every flagged source line to the index of the clause that owns it.
///
/// Never patched in place: [`LineClauseIndex::build`] recomputes everything
/// from the current clause list, so the index can only be as stale as the
/// last rebuild.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineClauseIndex {
    warning_lines: Vec<u32>,
    entries: BTreeMap<u32, LineEntry>,
}

impl LineClauseIndex {
    /// Build the index in one pass over all clause line numbers
    pub fn build(clauses: &[Clause]) -> Self {
        let mut entries = BTreeMap::new();

        for (clause_index, clause) in clauses.iter().enumerate() {
            let count = clause.line_numbers.len();
            for (position, &line) in clause.line_numbers.iter().enumerate() {
                let role = match (count, position) {
                    (1, _) => LineRole::Single,
                    (_, 0) => LineRole::First,
                    (n, p) if p + 1 == n => LineRole::Last,
                    _ => LineRole::Middle,
                };
                let previous = entries.insert(
                    line,
                    LineEntry {
                        clause: clause_index,
                        role,
                    },
                );
                if let Some(prev) = previous {
                    warn!(
                        line,
                        first = prev.clause,
                        second = clause_index,
                        "Line claimed by two clauses, keeping the later one"
                    );
                }
            }
        }

        // BTreeMap keys are already sorted and unique
        let warning_lines = entries.keys().copied().collect();

        Self {
            warning_lines,
            entries,
        }
    }

    /// Replace this index with one built from `clauses`
    pub fn rebuild(&mut self, clauses: &[Clause]) {
        *self = Self::build(clauses);
    }

    /// Every flagged line, ascending
    pub fn warning_lines(&self) -> &[u32] {
        &self.warning_lines
    }

    pub fn contains(&self, line: u32) -> bool {
        self.entries.contains_key(&line)
    }

    /// Index of the clause owning `line`
    pub fn clause_of(&self, line: u32) -> Option<usize> {
        self.entries.get(&line).map(|e| e.clause)
    }

    pub fn line_role(&self, line: u32) -> Option<LineRole> {
        self.entries.get(&line).map(|e| e.role)
    }

    /// Snapshot of the full line -> clause mapping
    pub fn line_to_clause(&self) -> BTreeMap<u32, usize> {
        self.entries.iter().map(|(&line, e)| (line, e.clause)).collect()
    }

    pub fn len(&self) -> usize {
        self.warning_lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warning_lines.is_empty()
    }
}
