//! Bounded ring of recent server output lines.
//!
//! Stream readers push every stdout/stderr line here so readiness and exit
//! failures can carry the tail of what the server printed.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Default number of lines kept.
pub const DEFAULT_DIAGNOSTIC_LINES: usize = 200;

/// Lines attached to a failure error.
pub const FAILURE_TAIL_LINES: usize = 50;

/// Shared, cloneable ring buffer of output lines.
#[derive(Debug, Clone)]
pub struct DiagnosticsBuffer {
    lines: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
}

impl Default for DiagnosticsBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_DIAGNOSTIC_LINES)
    }
}

impl DiagnosticsBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// Append a line, dropping the oldest once full.
    pub fn push(&self, line: impl Into<String>) {
        let mut lines = self.lock();
        if lines.len() >= self.capacity {
            lines.pop_front();
        }
        lines.push_back(line.into());
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// All retained lines, oldest first.
    pub fn snapshot(&self) -> Vec<String> {
        self.lock().iter().cloned().collect()
    }

    /// The last `n` lines joined with newlines.
    pub fn tail(&self, n: usize) -> String {
        let lines = self.lock();
        let skip = lines.len().saturating_sub(n);
        lines
            .iter()
            .skip(skip)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<String>> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
