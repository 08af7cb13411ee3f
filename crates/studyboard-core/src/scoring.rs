//! Scores, ranks and badges derived from a built submission matrix.
//!
//! Everything here is a pure function of its inputs.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::models::{ChapterId, MemberProgress, Skill, SubmissionMatrix};

/// Points per completed chapter
pub const CHAPTER_POINTS: u32 = 10;
/// Points per completed quiz
pub const QUIZ_POINTS: u32 = 5;
/// Points per shared paper
pub const PAPER_POINTS: u32 = 2;

/// Quiz and paper counts per member display name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Activity {
    pub quizzes: HashMap<String, u32>,
    pub papers: HashMap<String, u32>,
}

impl Activity {
    pub fn quizzes_for(&self, name: &str) -> u32 {
        self.quizzes.get(name).copied().unwrap_or(0)
    }

    pub fn papers_for(&self, name: &str) -> u32 {
        self.papers.get(name).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChapterCount {
    pub chapter: ChapterId,
    pub label: String,
    pub completed: usize,
}

/// How many of the given members completed each chapter
pub fn chapter_completion_counts<'a, I>(members: I) -> Vec<ChapterCount>
where
    I: IntoIterator<Item = &'a MemberProgress>,
{
    let members: Vec<&MemberProgress> = members.into_iter().collect();
    ChapterId::all()
        .map(|chapter| ChapterCount {
            chapter,
            label: chapter.label(),
            completed: members.iter().filter(|m| m.is_completed(chapter)).count(),
        })
        .collect()
}

/// Rounded share of `completed` out of `members * 10` chapters
pub fn progress_percent(completed: u32, members: usize) -> u32 {
    let possible = members as f64 * f64::from(ChapterId::COUNT);
    if possible == 0.0 {
        0
    } else {
        (f64::from(completed) / possible * 100.0).round() as u32
    }
}

pub type SkillScores = BTreeMap<Skill, f64>;

/// Per-skill score normalised to 0..=100
pub fn skill_scores(member: &MemberProgress) -> SkillScores {
    Skill::ALL
        .iter()
        .map(|&skill| {
            let raw: u32 = member
                .chapters
                .iter()
                .filter(|s| s.completed)
                .map(|s| skill.points_for(s.chapter))
                .sum();
            let max = skill.max_points();
            let normalized = if max == 0 {
                0.0
            } else {
                (f64::from(raw) / f64::from(max) * 100.0).min(100.0)
            };
            (skill, normalized)
        })
        .collect()
}

/// Mean of all skill scores, rounded to one decimal
pub fn average_skill(scores: &SkillScores) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    let mean = scores.values().sum::<f64>() / scores.len() as f64;
    (mean * 10.0).round() / 10.0
}

/// Competition ranks for scores already sorted in descending order.
///
/// Tied scores share a rank; the next distinct score is ranked by its
/// 1-based position, e.g. `[100, 90, 90, 50]` ranks as `[1, 2, 2, 4]`.
pub fn competition_ranks(sorted_desc: &[u32]) -> Vec<usize> {
    let mut ranks = Vec::with_capacity(sorted_desc.len());
    let mut current = 0;
    let mut previous: Option<u32> = None;
    for (idx, &score) in sorted_desc.iter().enumerate() {
        if previous != Some(score) {
            current = idx + 1;
            previous = Some(score);
        }
        ranks.push(current);
    }
    ranks
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Badge {
    /// Every chapter completed
    Perfectionist,
    /// 10 or more quizzes completed
    QuizMaster,
    /// 5 or more papers shared
    Bookworm,
    /// 6 or more chapters completed
    GoldRunner,
    /// 3 or more chapters completed
    BlazingLearner,
}

impl Badge {
    pub fn icon(self) -> &'static str {
        match self {
            Badge::Perfectionist => "💎",
            Badge::QuizMaster => "🎯",
            Badge::Bookworm => "📚",
            Badge::GoldRunner => "🥇",
            Badge::BlazingLearner => "🔥",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Badge::Perfectionist => "Perfectionist",
            Badge::QuizMaster => "Quiz Master",
            Badge::Bookworm => "Bookworm",
            Badge::GoldRunner => "Gold Runner",
            Badge::BlazingLearner => "Blazing Learner",
        }
    }

    /// Badges earned for the given activity, in display order
    pub fn earned(chapters: u32, quizzes: u32, papers: u32) -> Vec<Badge> {
        let mut badges = Vec::new();
        if chapters >= u32::from(ChapterId::COUNT) {
            badges.push(Badge::Perfectionist);
        }
        if quizzes >= 10 {
            badges.push(Badge::QuizMaster);
        }
        if papers >= 5 {
            badges.push(Badge::Bookworm);
        }
        if chapters >= 6 {
            badges.push(Badge::GoldRunner);
        }
        if chapters >= 3 {
            badges.push(Badge::BlazingLearner);
        }
        badges
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Beginner,
    Enthusiast,
    Expert,
    Master,
    GrandMaster,
}

impl Level {
    pub fn from_score(total: u32) -> Self {
        match total {
            150.. => Level::GrandMaster,
            100..=149 => Level::Master,
            70..=99 => Level::Expert,
            40..=69 => Level::Enthusiast,
            _ => Level::Beginner,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Level::GrandMaster => "🏆 Grand Master",
            Level::Master => "💎 Master",
            Level::Expert => "⭐ Expert",
            Level::Enthusiast => "🔥 Enthusiastic Learner",
            Level::Beginner => "🌱 Beginner",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Level::GrandMaster => "#FFD700",
            Level::Master => "#C0C0C0",
            Level::Expert => "#CD7F32",
            Level::Enthusiast => "#FF6B6B",
            Level::Beginner => "#51CF66",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingEntry {
    pub rank: usize,
    pub handle: String,
    pub name: String,
    pub total_score: u32,
    pub chapter_score: u32,
    pub quiz_score: u32,
    pub paper_score: u32,
    pub chapters_completed: u32,
    pub quiz_count: u32,
    pub paper_count: u32,
    pub badges: Vec<Badge>,
    pub level: Level,
}

impl RankingEntry {
    fn unranked(member: &MemberProgress, activity: &Activity) -> Self {
        let quiz_count = activity.quizzes_for(&member.name);
        let paper_count = activity.papers_for(&member.name);
        let chapter_score = member.total_completed * CHAPTER_POINTS;
        let quiz_score = quiz_count * QUIZ_POINTS;
        let paper_score = paper_count * PAPER_POINTS;
        let total_score = chapter_score + quiz_score + paper_score;

        Self {
            rank: 0,
            handle: member.handle.clone(),
            name: member.name.clone(),
            total_score,
            chapter_score,
            quiz_score,
            paper_score,
            chapters_completed: member.total_completed,
            quiz_count,
            paper_count,
            badges: Badge::earned(member.total_completed, quiz_count, paper_count),
            level: Level::from_score(total_score),
        }
    }
}

/// Overall ranking by total score. Ties keep roster order and share a rank.
pub fn leaderboard(matrix: &SubmissionMatrix, activity: &Activity) -> Vec<RankingEntry> {
    let mut entries: Vec<RankingEntry> = matrix
        .members
        .iter()
        .map(|m| RankingEntry::unranked(m, activity))
        .collect();
    entries.sort_by(|a, b| b.total_score.cmp(&a.total_score));

    let scores: Vec<u32> = entries.iter().map(|e| e.total_score).collect();
    for (entry, rank) in entries.iter_mut().zip(competition_ranks(&scores)) {
        entry.rank = rank;
    }
    entries
}

/// Entries ranked 1 to 3, grouped by rank
pub fn podium(entries: &[RankingEntry]) -> BTreeMap<usize, Vec<&RankingEntry>> {
    let mut podium: BTreeMap<usize, Vec<&RankingEntry>> = BTreeMap::new();
    for entry in entries.iter().filter(|e| e.rank <= 3) {
        podium.entry(entry.rank).or_default().push(entry);
    }
    podium
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Member;

    fn ch(n: u32) -> ChapterId {
        ChapterId::new(n).unwrap()
    }

    fn progress(handle: &str, chapters: &[u32]) -> MemberProgress {
        let mut row = MemberProgress::new(&Member {
            handle: handle.to_string(),
            name: handle.to_uppercase(),
            cohort: None,
        });
        for &n in chapters {
            row.record(ch(n), &format!("ch{:02}.ipynb", n), None);
        }
        row
    }

    #[test]
    fn test_competition_ranks() {
        assert_eq!(competition_ranks(&[100, 90, 90, 50]), vec![1, 2, 2, 4]);
        assert_eq!(competition_ranks(&[100, 100, 80]), vec![1, 1, 3]);
        assert_eq!(competition_ranks(&[70, 70, 70]), vec![1, 1, 1]);
        assert_eq!(competition_ranks(&[5]), vec![1]);
        assert!(competition_ranks(&[]).is_empty());
    }

    #[test]
    fn test_chapter_completion_counts() {
        let members = [progress("a", &[1, 2]), progress("b", &[2]), progress("c", &[])];
        let counts = chapter_completion_counts(&members);
        assert_eq!(counts.len(), 10);
        assert_eq!(counts[0].completed, 1);
        assert_eq!(counts[1].completed, 2);
        assert_eq!(counts[1].label, "Ch02");
        assert_eq!(counts[9].completed, 0);
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(0, 0), 0);
        assert_eq!(progress_percent(15, 3), 50);
        assert_eq!(progress_percent(1, 3), 3);
    }

    #[test]
    fn test_skill_scores() {
        let none = skill_scores(&progress("a", &[]));
        assert!(none.values().all(|&v| v == 0.0));
        assert_eq!(none.len(), Skill::ALL.len());

        let early = skill_scores(&progress("b", &[1, 2]));
        // 5 + 20 out of 45
        let preprocessing = early[&Skill::DataPreprocessing];
        assert!((preprocessing - 25.0 / 45.0 * 100.0).abs() < 1e-9);
        // 3 + 5 out of 11
        assert!((early[&Skill::GitTooling] - 8.0 / 11.0 * 100.0).abs() < 1e-9);
        assert_eq!(early[&Skill::Cnn], 0.0);

        let all = skill_scores(&progress("c", &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]));
        assert_eq!(all[&Skill::Cnn], 100.0);
        assert_eq!(all[&Skill::DataPreprocessing], 100.0);
        assert!(all[&Skill::MlFundamentals] < 100.0);
        assert!(all.values().all(|&v| v <= 100.0));
    }

    #[test]
    fn test_average_skill_rounds() {
        let mut scores = SkillScores::new();
        scores.insert(Skill::Cnn, 100.0);
        scores.insert(Skill::Rnn, 0.0);
        scores.insert(Skill::Llm, 0.0);
        assert_eq!(average_skill(&scores), 33.3);
        assert_eq!(average_skill(&SkillScores::new()), 0.0);
    }

    #[test]
    fn test_badges_and_levels() {
        assert!(Badge::earned(0, 0, 0).is_empty());
        assert_eq!(Badge::earned(3, 0, 0), vec![Badge::BlazingLearner]);
        assert_eq!(
            Badge::earned(10, 10, 5),
            vec![
                Badge::Perfectionist,
                Badge::QuizMaster,
                Badge::Bookworm,
                Badge::GoldRunner,
                Badge::BlazingLearner
            ]
        );

        assert_eq!(Level::from_score(0), Level::Beginner);
        assert_eq!(Level::from_score(39), Level::Beginner);
        assert_eq!(Level::from_score(40), Level::Enthusiast);
        assert_eq!(Level::from_score(70), Level::Expert);
        assert_eq!(Level::from_score(100), Level::Master);
        assert_eq!(Level::from_score(150), Level::GrandMaster);
    }

    #[test]
    fn test_idle_member_scores_zero() {
        let matrix = SubmissionMatrix {
            members: vec![progress("idle", &[])],
        };
        let board = leaderboard(&matrix, &Activity::default());
        assert_eq!(board[0].total_score, 0);
        assert!(board[0].badges.is_empty());
        assert_eq!(board[0].level, Level::Beginner);
        assert_eq!(board[0].rank, 1);
    }

    #[test]
    fn test_leaderboard_scores_and_ties() {
        let matrix = SubmissionMatrix {
            members: vec![
                progress("a", &[1, 2, 3]),
                progress("b", &[1, 2, 3, 4, 5]),
                progress("c", &[1, 2, 3, 4]),
                progress("d", &[1]),
            ],
        };
        let mut activity = Activity::default();
        // a: 30 + 2 quizzes (10) + 5 papers (10) = 50
        activity.quizzes.insert("A".into(), 2);
        activity.papers.insert("A".into(), 5);
        // c: 40 + 2 quizzes (10) = 50
        activity.quizzes.insert("C".into(), 2);

        let board = leaderboard(&matrix, &activity);
        let ranked: Vec<(&str, u32, usize)> = board
            .iter()
            .map(|e| (e.handle.as_str(), e.total_score, e.rank))
            .collect();
        assert_eq!(
            ranked,
            vec![("a", 50, 1), ("b", 50, 1), ("c", 50, 1), ("d", 10, 4)]
        );

        let a = &board[0];
        assert_eq!(a.chapter_score, 30);
        assert_eq!(a.quiz_score, 10);
        assert_eq!(a.paper_score, 10);
        assert_eq!(a.badges, vec![Badge::Bookworm, Badge::BlazingLearner]);
        assert_eq!(a.level, Level::Enthusiast);

        let podium = podium(&board);
        assert_eq!(podium.len(), 1);
        assert_eq!(podium[&1].len(), 3);
    }
}
