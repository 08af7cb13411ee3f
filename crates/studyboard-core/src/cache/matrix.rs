use chrono::{DateTime, Duration, Utc};

use crate::models::SubmissionMatrix;

/// Time-boxed holder for the last built submission matrix.
///
/// At most one build per validity window: `get` hands back the cached
/// matrix while it is younger than the window, `set` replaces it wholesale.
#[derive(Debug, Clone)]
pub struct MatrixCache {
    matrix: Option<SubmissionMatrix>,
    built_at: Option<DateTime<Utc>>,
    validity: Duration,
}

impl MatrixCache {
    pub fn new(validity: Duration) -> Self {
        Self {
            matrix: None,
            built_at: None,
            validity,
        }
    }

    pub fn built_at(&self) -> Option<DateTime<Utc>> {
        self.built_at
    }

    /// Cached matrix, if one exists and `now` is still inside its window
    pub fn get(&self, now: DateTime<Utc>) -> Option<&SubmissionMatrix> {
        let built_at = self.built_at?;
        if now - built_at < self.validity {
            self.matrix.as_ref()
        } else {
            None
        }
    }

    pub fn set(&mut self, matrix: SubmissionMatrix, now: DateTime<Utc>) {
        self.matrix = Some(matrix);
        self.built_at = Some(now);
    }

    /// Drop the cached matrix so the next read rebuilds
    pub fn invalidate(&mut self) {
        self.matrix = None;
        self.built_at = None;
    }
}
