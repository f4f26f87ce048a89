// crates/containership/src/document/navigation.rs
// Active clause selection with wrap-around stepping

use super::index::LineClauseIndex;
use crate::error::{ContainershipError, Result};

/// Step direction for clause navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Prev,
    Next,
}

/// Tracks which clause is active.
///
/// Holds only the active index; every operation takes the current clause
/// count so the caller's model stays the single source of truth for size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Navigator {
    active: usize,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> usize {
        self.active
    }

    /// Move one clause forward, wrapping to 0 after the last
    pub fn next(&mut self, len: usize) -> Option<usize> {
        self.step(Direction::Next, len)
    }

    /// Move one clause back, wrapping to the last from 0
    pub fn prev(&mut self, len: usize) -> Option<usize> {
        self.step(Direction::Prev, len)
    }

    /// No-op on an empty clause list
    pub fn step(&mut self, direction: Direction, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let current = self.active % len;
        self.active = match direction {
            Direction::Next => (current + 1) % len,
            Direction::Prev => (current + len - 1) % len,
        };
        Some(self.active)
    }

    pub fn select_index(&mut self, index: usize, len: usize) -> Result<usize> {
        if index >= len {
            return Err(ContainershipError::IndexOutOfRange { index, len });
        }
        self.active = index;
        Ok(index)
    }

    /// Activate the clause owning `line`; unflagged lines leave state unchanged
    pub fn select_line(&mut self, line: u32, index: &LineClauseIndex) -> Option<usize> {
        let clause = index.clause_of(line)?;
        self.active = clause;
        Some(clause)
    }

    /// Pull the active index back into `[0, len)` after the clause list changes
    pub fn clamp(&mut self, len: usize) {
        if len == 0 || self.active >= len {
            self.active = 0;
        }
    }

    /// 1-based position and total, for "N of M" displays
    pub fn position(&self, len: usize) -> Option<(usize, usize)> {
        (len > 0).then(|| (self.active.min(len - 1) + 1, len))
    }
}
