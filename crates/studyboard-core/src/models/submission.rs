use serde::{Deserialize, Serialize};

use super::ChapterId;
use crate::config::Member;

/// Submission state of one chapter for one member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterStatus {
    pub chapter: ChapterId,
    pub completed: bool,
    pub filename: Option<String>,
    pub url: Option<String>,
}

impl ChapterStatus {
    pub fn pending(chapter: ChapterId) -> Self {
        Self {
            chapter,
            completed: false,
            filename: None,
            url: None,
        }
    }
}

/// One row of the submission matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberProgress {
    pub handle: String,
    pub name: String,
    pub cohort: Option<String>,
    /// One entry per chapter, in chapter order
    pub chapters: Vec<ChapterStatus>,
    pub total_completed: u32,
}

impl MemberProgress {
    /// Fresh row with every chapter incomplete
    pub fn new(member: &Member) -> Self {
        Self {
            handle: member.handle.clone(),
            name: member.name.clone(),
            cohort: member.cohort.clone(),
            chapters: ChapterId::all().map(ChapterStatus::pending).collect(),
            total_completed: 0,
        }
    }

    pub fn status(&self, chapter: ChapterId) -> Option<&ChapterStatus> {
        self.chapters.iter().find(|s| s.chapter == chapter)
    }

    pub fn is_completed(&self, chapter: ChapterId) -> bool {
        self.status(chapter).map(|s| s.completed).unwrap_or(false)
    }

    /// Record a submission for a chapter.
    ///
    /// The first submission seen for a chapter wins; later ones are ignored.
    /// Returns true if the chapter was newly completed.
    pub fn record(&mut self, chapter: ChapterId, filename: &str, url: Option<&str>) -> bool {
        let Some(status) = self.chapters.iter_mut().find(|s| s.chapter == chapter) else {
            return false;
        };
        if status.completed {
            return false;
        }
        status.completed = true;
        status.filename = Some(filename.to_string());
        status.url = url.map(str::to_string);
        self.total_completed += 1;
        true
    }

    /// Percentage of the curriculum completed, rounded
    pub fn completion_rate(&self) -> u32 {
        let rate = f64::from(self.total_completed) / f64::from(ChapterId::COUNT) * 100.0;
        rate.round() as u32
    }

    pub fn in_cohort(&self, cohort: &str) -> bool {
        self.cohort.as_deref() == Some(cohort)
    }
}

/// Per-member, per-chapter completion table for one cache generation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionMatrix {
    /// Rows in roster order
    pub members: Vec<MemberProgress>,
}

impl SubmissionMatrix {
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn member(&self, handle: &str) -> Option<&MemberProgress> {
        self.members.iter().find(|m| m.handle == handle)
    }

    pub fn member_mut(&mut self, handle: &str) -> Option<&mut MemberProgress> {
        self.members.iter_mut().find(|m| m.handle == handle)
    }

    pub fn cohort<'a>(&'a self, cohort: &'a str) -> impl Iterator<Item = &'a MemberProgress> + 'a {
        self.members.iter().filter(move |m| m.in_cohort(cohort))
    }

    pub fn total_completed(&self) -> u32 {
        self.members.iter().map(|m| m.total_completed).sum()
    }
}
