//! Solution streams.
//!
//! Enumeration order is deterministic (textual order for alternatives,
//! mapping-iteration order for witnesses, greedy-longest-first for
//! quantifiers). A stream that hit the step budget carries a terminal
//! [`MatchError`] after its (partial) solutions.

use tendril_util::MatchError;

use crate::solution::{LocatedSolution, Solution};

/// The solutions of one `match` invocation.
#[derive(Debug)]
pub struct SolutionStream {
    solutions: std::vec::IntoIter<Solution>,
    error: Option<MatchError>,
}

impl SolutionStream {
    pub(crate) fn new(solutions: Vec<Solution>, error: Option<MatchError>) -> Self {
        Self {
            solutions: solutions.into_iter(),
            error,
        }
    }

    /// The terminal error record, if enumeration was cut short.
    pub fn error(&self) -> Option<&MatchError> {
        self.error.as_ref()
    }

    /// Remaining solutions.
    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solutions.len() == 0
    }
}

impl Iterator for SolutionStream {
    type Item = Solution;

    fn next(&mut self) -> Option<Solution> {
        self.solutions.next()
    }
}

/// The located solutions of one `find` invocation.
#[derive(Debug)]
pub struct LocatedSolutionStream {
    solutions: std::vec::IntoIter<LocatedSolution>,
    error: Option<MatchError>,
}

impl LocatedSolutionStream {
    pub(crate) fn new(solutions: Vec<LocatedSolution>, error: Option<MatchError>) -> Self {
        Self {
            solutions: solutions.into_iter(),
            error,
        }
    }

    pub fn error(&self) -> Option<&MatchError> {
        self.error.as_ref()
    }

    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solutions.len() == 0
    }
}

impl Iterator for LocatedSolutionStream {
    type Item = LocatedSolution;

    fn next(&mut self) -> Option<LocatedSolution> {
        self.solutions.next()
    }
}
