//! Snapshot history store.
//!
//! The cursor is `Option<usize>`: `None` is the empty state (position `-1`),
//! `Some(i)` points at the snapshot currently shown on the canvas.

use std::time::Instant;
use tracing::{debug, trace};

use crate::{HistoryConfig, HistoryError, Snapshot, UndoBoundary};

/// What the canvas should show after an undo or redo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Restore<S> {
    Snapshot(S),
    /// Stepped back past the first snapshot. Only reachable with `UndoBoundary::AllowEmpty`.
    Empty,
}

/// Bookkeeping from a single `record` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordOutcome {
    /// Redo entries dropped because the cursor was behind the end.
    pub discarded_redo: usize,
    /// Oldest entries dropped to respect `max_states`.
    pub evicted: usize,
    /// The snapshot replaced the latest entry instead of being appended.
    pub coalesced: bool,
}

#[derive(Debug, Clone)]
pub struct History<S = Snapshot> {
    states: Vec<S>,
    cursor: Option<usize>,
    config: HistoryConfig,
    // Time of the previous record, cleared by anything that moves the cursor.
    last_record: Option<Instant>,
}

impl<S: Clone> Default for History<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Clone> History<S> {
    pub fn new() -> Self {
        Self {
            states: Vec::new(),
            cursor: None,
            config: HistoryConfig::default(),
            last_record: None,
        }
    }

    pub fn with_config(config: HistoryConfig) -> Result<Self, HistoryError> {
        config.validate()?;
        debug!(?config, "Creating history");
        Ok(Self {
            config,
            ..Self::new()
        })
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Signed cursor: `-1` for the empty state, otherwise the index.
    pub fn position(&self) -> isize {
        self.cursor.map_or(-1, |c| c as isize)
    }

    pub fn current(&self) -> Option<&S> {
        self.cursor.and_then(|c| self.states.get(c))
    }

    pub fn get(&self, index: usize) -> Option<&S> {
        self.states.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &S> {
        self.states.iter()
    }

    pub fn can_undo(&self) -> bool {
        match (self.cursor, self.config.boundary) {
            (None, _) => false,
            (Some(c), UndoBoundary::KeepFirst) => c > 0,
            (Some(_), UndoBoundary::AllowEmpty) => true,
        }
    }

    pub fn can_redo(&self) -> bool {
        self.next_index() < self.states.len()
    }

    fn next_index(&self) -> usize {
        self.cursor.map_or(0, |c| c + 1)
    }

    fn at_end(&self) -> bool {
        !self.can_redo()
    }

    /// Record a snapshot taken now.
    pub fn record(&mut self, snapshot: S) -> RecordOutcome {
        self.record_at(snapshot, Instant::now())
    }

    /// Record a snapshot taken at `now`.
    ///
    /// Drops the redo branch first, then appends. Afterwards the new snapshot is current.
    pub fn record_at(&mut self, snapshot: S, now: Instant) -> RecordOutcome {
        let mut outcome = RecordOutcome::default();

        if self.should_coalesce(now) {
            if let Some(last) = self.states.last_mut() {
                *last = snapshot;
                self.last_record = Some(now);
                outcome.coalesced = true;
                trace!(len = self.states.len(), "Coalesced snapshot into latest entry");
                return outcome;
            }
        }

        let keep = self.next_index();
        if keep < self.states.len() {
            outcome.discarded_redo = self.states.len() - keep;
            self.states.truncate(keep);
            debug!(dropped = outcome.discarded_redo, "Discarded redo branch");
        }

        self.states.push(snapshot);

        if let Some(max) = self.config.max_states {
            if self.states.len() > max {
                outcome.evicted = self.states.len() - max;
                self.states.drain(..outcome.evicted);
                trace!(evicted = outcome.evicted, max, "Evicted oldest snapshots");
            }
        }

        self.cursor = Some(self.states.len() - 1);
        self.last_record = Some(now);
        debug!(
            len = self.states.len(),
            position = self.position(),
            "Recorded snapshot"
        );
        outcome
    }

    fn should_coalesce(&self, now: Instant) -> bool {
        let (Some(window), Some(last)) = (self.config.coalesce_window(), self.last_record) else {
            return false;
        };
        self.cursor.is_some() && self.at_end() && now.saturating_duration_since(last) < window
    }

    /// Step the cursor back one entry. `None` when there is nothing to undo.
    pub fn undo(&mut self) -> Option<Restore<S>> {
        if !self.can_undo() {
            trace!(position = self.position(), "Undo ignored at lower bound");
            return None;
        }

        self.last_record = None;
        self.cursor = match self.cursor {
            Some(0) | None => None,
            Some(c) => Some(c - 1),
        };
        debug!(position = self.position(), len = self.states.len(), "Undo");

        Some(match self.current() {
            Some(snapshot) => Restore::Snapshot(snapshot.clone()),
            None => Restore::Empty,
        })
    }

    /// Step the cursor forward one entry. `None` when there is nothing to redo.
    pub fn redo(&mut self) -> Option<Restore<S>> {
        if !self.can_redo() {
            trace!(position = self.position(), "Redo ignored at upper bound");
            return None;
        }

        self.last_record = None;
        let next = self.next_index();
        self.cursor = Some(next);
        debug!(position = self.position(), len = self.states.len(), "Redo");

        Some(Restore::Snapshot(self.states[next].clone()))
    }

    /// Move the cursor without touching the entries.
    ///
    /// Used to roll back a step whose restore failed, or to jump within the history.
    pub fn seek(&mut self, cursor: Option<usize>) -> Result<(), HistoryError> {
        let valid = match cursor {
            Some(c) => c < self.states.len(),
            None => self.states.is_empty() || self.config.boundary == UndoBoundary::AllowEmpty,
        };
        if !valid {
            return Err(HistoryError::PositionOutOfRange {
                position: cursor.map_or(-1, |c| c as isize),
                len: self.states.len(),
            });
        }

        self.last_record = None;
        self.cursor = cursor;
        trace!(position = self.position(), "Seek");
        Ok(())
    }

    /// End the current coalescing run so the next record is always appended.
    pub fn seal(&mut self) {
        self.last_record = None;
    }

    pub fn clear(&mut self) {
        debug!(dropped = self.states.len(), "Clearing history");
        self.states.clear();
        self.cursor = None;
        self.last_record = None;
    }
}
