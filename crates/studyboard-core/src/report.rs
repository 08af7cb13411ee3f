//! Read-only views over the submission matrix and study configuration:
//! the cohort dashboard, per-cohort progress, learning profiles, weekly
//! reports, portfolio cards and the detector audit.

use serde::Serialize;

use crate::config::{ChapterInfo, Section, StudyConfig};
use crate::detector::detect_chapter;
use crate::models::{ChapterId, MemberProgress, Paper, SubmissionMatrix};
use crate::scoring::{
    average_skill, chapter_completion_counts, progress_percent, skill_scores, Activity,
    ChapterCount, SkillScores,
};

/// Number of entries in the per-cohort top lists
const TOP_N: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopMember {
    pub handle: String,
    pub name: String,
    pub total_completed: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizCount {
    pub name: String,
    pub completed: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CohortSummary {
    pub id: String,
    pub label: String,
    /// Range string as configured, e.g. "1-2"
    pub current_chapters: String,
    pub member_count: usize,
    /// Members who completed every chapter in the current range
    pub submitted: usize,
    pub submit_rate: u32,
    pub not_submit_rate: u32,
    pub average_progress: u32,
    pub top_members: Vec<TopMember>,
    pub chapter_counts: Vec<ChapterCount>,
    pub quiz_top: Vec<QuizCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    /// Textbook the group is studying, shown as the page heading
    pub book_name: Option<String>,
    pub member_count: usize,
    pub average_progress: u32,
    pub chapter_counts: Vec<ChapterCount>,
    pub cohorts: Vec<CohortSummary>,
    pub recent_papers: Vec<Paper>,
}

fn cohort_summary(
    config: &StudyConfig,
    cohort_id: &str,
    matrix: &SubmissionMatrix,
    activity: &Activity,
) -> Option<CohortSummary> {
    let cohort = config.cohort(cohort_id)?;
    let range = cohort.current_chapter_range();
    let roster: Vec<_> = config.cohort_members(cohort_id).collect();
    let rows: Vec<&MemberProgress> = matrix.cohort(cohort_id).collect();

    let submitted = rows
        .iter()
        .filter(|row| range.iter().all(|&ch| row.is_completed(ch)))
        .count();
    let submit_rate = if roster.is_empty() {
        0
    } else {
        (submitted as f64 / roster.len() as f64 * 100.0).round() as u32
    };

    let completed: u32 = rows.iter().map(|r| r.total_completed).sum();

    let mut top: Vec<&MemberProgress> = rows.clone();
    top.sort_by(|a, b| b.total_completed.cmp(&a.total_completed));
    let top_members = top
        .into_iter()
        .take(TOP_N)
        .map(|r| TopMember {
            handle: r.handle.clone(),
            name: r.name.clone(),
            total_completed: r.total_completed,
        })
        .collect();

    let mut quiz_top: Vec<QuizCount> = roster
        .iter()
        .map(|m| QuizCount {
            name: m.name.clone(),
            completed: activity.quizzes_for(&m.name),
        })
        .filter(|q| q.completed > 0)
        .collect();
    quiz_top.sort_by(|a, b| b.completed.cmp(&a.completed).then_with(|| a.name.cmp(&b.name)));
    quiz_top.truncate(TOP_N);

    Some(CohortSummary {
        id: cohort.id.clone(),
        label: cohort.label.clone(),
        current_chapters: cohort.current_chapters.clone(),
        member_count: roster.len(),
        submitted,
        submit_rate,
        not_submit_rate: 100 - submit_rate.min(100),
        average_progress: progress_percent(completed, roster.len()),
        top_members,
        chapter_counts: chapter_completion_counts(rows),
        quiz_top,
    })
}

/// Landing summary across all cohorts
pub fn dashboard(
    config: &StudyConfig,
    matrix: &SubmissionMatrix,
    activity: &Activity,
    recent_papers: Vec<Paper>,
) -> Dashboard {
    let member_count = config.members.len();
    Dashboard {
        book_name: config.book_name.clone(),
        member_count,
        average_progress: progress_percent(matrix.total_completed(), member_count),
        chapter_counts: chapter_completion_counts(&matrix.members),
        cohorts: config
            .cohorts
            .iter()
            .filter_map(|c| cohort_summary(config, &c.id, matrix, activity))
            .collect(),
        recent_papers,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CohortProgress {
    pub id: String,
    pub label: String,
    /// Sorted by display name
    pub members: Vec<MemberProgress>,
    pub chapter_counts: Vec<ChapterCount>,
}

/// Per-cohort progress grid
pub fn cohort_progress(config: &StudyConfig, matrix: &SubmissionMatrix) -> Vec<CohortProgress> {
    config
        .cohorts
        .iter()
        .map(|cohort| {
            let mut members: Vec<MemberProgress> = matrix.cohort(&cohort.id).cloned().collect();
            members.sort_by(|a, b| a.name.cmp(&b.name));
            CohortProgress {
                id: cohort.id.clone(),
                label: cohort.label.clone(),
                chapter_counts: chapter_completion_counts(&members),
                members,
            }
        })
        .collect()
}

/// Push items not already present, keeping first-seen order
fn extend_unique(target: &mut Vec<String>, items: &[String]) {
    for item in items {
        if !target.contains(item) {
            target.push(item.clone());
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChapterView {
    pub chapter: ChapterId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub sections: Vec<Section>,
    pub completed: bool,
    pub filename: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LearningProfile {
    pub handle: String,
    pub name: String,
    pub repo_url: String,
    /// Catalogued chapters only
    pub chapters: Vec<ChapterView>,
    pub skill_scores: SkillScores,
    pub total_chapters: u32,
    pub completion_rate: u32,
    pub learned_concepts: Vec<String>,
    pub learned_keywords: Vec<String>,
    pub quiz_count: u32,
}

pub fn learning_profile(
    config: &StudyConfig,
    member: &MemberProgress,
    quiz_count: u32,
) -> LearningProfile {
    let mut chapters = Vec::new();
    let mut learned_concepts = Vec::new();
    let mut learned_keywords = Vec::new();

    for status in &member.chapters {
        let Some(info) = config.chapters.get(&status.chapter) else {
            continue;
        };
        if status.completed {
            for section in &info.sections {
                extend_unique(&mut learned_concepts, &section.concepts);
                extend_unique(&mut learned_keywords, &section.keywords);
            }
        }
        chapters.push(ChapterView {
            chapter: status.chapter,
            title: info.title.clone(),
            subtitle: info.subtitle.clone(),
            sections: info.sections.clone(),
            completed: status.completed,
            filename: status.filename.clone(),
            url: status.url.clone(),
        });
    }

    LearningProfile {
        handle: member.handle.clone(),
        name: member.name.clone(),
        repo_url: config.repo_url(&member.handle),
        chapters,
        skill_scores: skill_scores(member),
        total_chapters: member.total_completed,
        completion_rate: member.completion_rate(),
        learned_concepts,
        learned_keywords,
        quiz_count,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Performance {
    /// Every chapter of the week completed
    AllGoals,
    /// At least 70% of the week's chapters completed
    MostGoals,
    KeepGoing,
}

impl Performance {
    pub fn assess(completed: usize, total: usize) -> Self {
        if completed == total {
            Performance::AllGoals
        } else if completed as f64 >= total as f64 * 0.7 {
            Performance::MostGoals
        } else {
            Performance::KeepGoing
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Performance::AllGoals => "reached every chapter goal for the week 🏆",
            Performance::MostGoals => "reached most of the week's goals 👍",
            Performance::KeepGoing => "keep going, steady progress counts 💪",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletedSection {
    pub chapter_title: String,
    pub section_title: String,
    pub section_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeeklyReport {
    pub user_name: String,
    pub week: u32,
    pub chapters: Vec<ChapterId>,
    pub completed_sections: Vec<CompletedSection>,
    pub learned_concepts: Vec<String>,
    pub learned_keywords: Vec<String>,
    pub code_practices: Vec<String>,
    pub completed_count: usize,
    pub total_count: usize,
    pub performance: Performance,
    pub summary: String,
}

/// Report for one member and week, `None` when the week is not scheduled
pub fn weekly_report(config: &StudyConfig, member: &MemberProgress, week: u32) -> Option<WeeklyReport> {
    let chapters = config.week_chapters(week)?.to_vec();

    let mut completed_sections = Vec::new();
    let mut learned_concepts = Vec::new();
    let mut learned_keywords = Vec::new();
    let mut code_practices = Vec::new();

    let completed: Vec<ChapterId> = chapters
        .iter()
        .copied()
        .filter(|&ch| member.is_completed(ch))
        .collect();

    for info in completed.iter().filter_map(|ch| config.chapters.get(ch)) {
        collect_sections(info, &mut completed_sections);
        for section in &info.sections {
            extend_unique(&mut learned_concepts, &section.concepts);
            extend_unique(&mut learned_keywords, &section.keywords);
            extend_unique(&mut code_practices, &section.practice);
        }
    }

    let performance = Performance::assess(completed.len(), chapters.len());
    let summary = format!(
        "Week {}: {} sections completed, {}",
        week,
        completed_sections.len(),
        performance.message()
    );

    Some(WeeklyReport {
        user_name: member.name.clone(),
        week,
        total_count: chapters.len(),
        chapters,
        completed_sections,
        learned_concepts,
        learned_keywords,
        code_practices,
        completed_count: completed.len(),
        performance,
        summary,
    })
}

fn collect_sections(info: &ChapterInfo, out: &mut Vec<CompletedSection>) {
    out.extend(info.sections.iter().map(|s| CompletedSection {
        chapter_title: info.title.clone(),
        section_title: s.title.clone(),
        section_id: s.id.clone(),
    }));
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillProfile {
    pub handle: String,
    pub name: String,
    pub skills: SkillScores,
}

/// Skill scores for every member, in roster order
pub fn skill_comparison(matrix: &SubmissionMatrix) -> Vec<SkillProfile> {
    matrix
        .members
        .iter()
        .map(|m| SkillProfile {
            handle: m.handle.clone(),
            name: m.name.clone(),
            skills: skill_scores(m),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioCard {
    pub handle: String,
    pub name: String,
    pub total_completed: u32,
    pub avg_skill_score: f64,
    pub repo_url: String,
}

/// Portfolio cards for one cohort (or everyone), sorted by name
pub fn portfolio_cards(
    config: &StudyConfig,
    matrix: &SubmissionMatrix,
    cohort: Option<&str>,
) -> Vec<PortfolioCard> {
    let mut cards: Vec<PortfolioCard> = matrix
        .members
        .iter()
        .filter(|m| cohort.map_or(true, |id| m.in_cohort(id)))
        .map(|m| PortfolioCard {
            handle: m.handle.clone(),
            name: m.name.clone(),
            total_completed: m.total_completed,
            avg_skill_score: average_skill(&skill_scores(m)),
            repo_url: config.repo_url(&m.handle),
        })
        .collect();
    cards.sort_by(|a, b| a.name.cmp(&b.name));
    cards
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditFile {
    pub filename: String,
    pub detected: Option<ChapterId>,
    pub recorded_as: ChapterId,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditRow {
    pub handle: String,
    pub name: String,
    pub total: u32,
    pub files: Vec<AuditFile>,
}

/// Recorded filenames next to what the detector makes of them today
pub fn submission_audit(matrix: &SubmissionMatrix) -> Vec<AuditRow> {
    matrix
        .members
        .iter()
        .map(|m| AuditRow {
            handle: m.handle.clone(),
            name: m.name.clone(),
            total: m.total_completed,
            files: m
                .chapters
                .iter()
                .filter(|s| s.completed)
                .filter_map(|s| {
                    let filename = s.filename.clone()?;
                    Some(AuditFile {
                        detected: detect_chapter(&filename),
                        filename,
                        recorded_as: s.chapter,
                        url: s.url.clone(),
                    })
                })
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Cohort, Member};
    use crate::models::Skill;

    fn ch(n: u32) -> ChapterId {
        ChapterId::new(n).unwrap()
    }

    fn member(handle: &str, name: &str, cohort: &str) -> Member {
        Member {
            handle: handle.to_string(),
            name: name.to_string(),
            cohort: Some(cohort.to_string()),
        }
    }

    fn section(id: &str, concepts: &[&str], keywords: &[&str], practice: &[&str]) -> Section {
        let owned = |v: &[&str]| v.iter().map(|s| s.to_string()).collect();
        Section {
            id: id.to_string(),
            title: format!("Section {}", id),
            concepts: owned(concepts),
            keywords: owned(keywords),
            practice: owned(practice),
        }
    }

    fn config() -> StudyConfig {
        let mut config = StudyConfig {
            cohorts: vec![
                Cohort {
                    id: "part1".into(),
                    label: "Part 1".into(),
                    current_chapters: "1-2".into(),
                },
                Cohort {
                    id: "part2".into(),
                    label: "Part 2".into(),
                    current_chapters: "3".into(),
                },
            ],
            members: vec![
                member("amy", "Amy", "part1"),
                member("bob", "Bob", "part1"),
                member("cat", "Cat", "part1"),
                member("dan", "Dan", "part2"),
            ],
            ..StudyConfig::default()
        };
        config.chapters.insert(
            ch(1),
            ChapterInfo {
                title: "Intro".into(),
                subtitle: None,
                sections: vec![
                    section("1.1", &["features", "labels"], &["numpy"], &["load data"]),
                    section("1.2", &["labels"], &["pandas"], &[]),
                ],
            },
        );
        config.chapters.insert(
            ch(2),
            ChapterInfo {
                title: "Pipelines".into(),
                subtitle: Some("End to end".into()),
                sections: vec![section("2.1", &["pipeline", "features"], &["sklearn"], &["fit"])],
            },
        );
        config.weeks.insert(1, vec![ch(1), ch(2)]);
        config.weeks.insert(2, vec![ch(3)]);
        config.weeks.insert(5, vec![ch(1), ch(2), ch(3), ch(4)]);
        config
    }

    fn matrix(config: &StudyConfig, done: &[(&str, &[u32])]) -> SubmissionMatrix {
        let mut matrix = SubmissionMatrix {
            members: config.members.iter().map(MemberProgress::new).collect(),
        };
        for (handle, chapters) in done {
            let row = matrix.member_mut(handle).unwrap();
            for &n in *chapters {
                row.record(ch(n), &format!("ch{:02}_hw.ipynb", n), None);
            }
        }
        matrix
    }

    #[test]
    fn test_dashboard_cohort_summary() {
        let mut config = config();
        config.book_name = Some("Hands-on ML".into());
        let matrix = matrix(
            &config,
            &[("amy", &[1, 2, 3]), ("bob", &[1]), ("cat", &[1, 2]), ("dan", &[3])],
        );
        let mut activity = Activity::default();
        activity.quizzes.insert("Bob".into(), 4);
        activity.quizzes.insert("Amy".into(), 4);
        activity.quizzes.insert("Dan".into(), 1);
        activity.quizzes.insert("Stranger".into(), 9);

        let dash = dashboard(&config, &matrix, &activity, Vec::new());
        assert_eq!(dash.book_name.as_deref(), Some("Hands-on ML"));
        assert_eq!(dash.member_count, 4);
        // 7 of 40
        assert_eq!(dash.average_progress, 18);
        assert_eq!(dash.chapter_counts[0].completed, 3);

        let part1 = &dash.cohorts[0];
        assert_eq!(part1.member_count, 3);
        assert_eq!(part1.submitted, 2);
        assert_eq!(part1.submit_rate, 67);
        assert_eq!(part1.not_submit_rate, 33);
        // 6 of 30
        assert_eq!(part1.average_progress, 20);
        let top: Vec<&str> = part1.top_members.iter().map(|t| t.handle.as_str()).collect();
        assert_eq!(top, vec!["amy", "cat", "bob"]);
        let quiz: Vec<(&str, u32)> = part1
            .quiz_top
            .iter()
            .map(|q| (q.name.as_str(), q.completed))
            .collect();
        assert_eq!(quiz, vec![("Amy", 4), ("Bob", 4)]);

        let part2 = &dash.cohorts[1];
        assert_eq!(part2.submit_rate, 100);
        assert_eq!(part2.chapter_counts[2].completed, 1);
        assert_eq!(part2.chapter_counts[0].completed, 0);
    }

    #[test]
    fn test_dashboard_with_empty_matrix() {
        let config = config();
        let dash = dashboard(&config, &SubmissionMatrix::default(), &Activity::default(), Vec::new());
        assert_eq!(dash.book_name, None);
        assert_eq!(dash.average_progress, 0);
        assert_eq!(dash.cohorts[0].submit_rate, 0);
        assert_eq!(dash.cohorts[0].not_submit_rate, 100);
        assert!(dash.cohorts[0].top_members.is_empty());
    }

    #[test]
    fn test_cohort_progress_sorted_by_name() {
        let mut config = config();
        config.members[0].name = "Zed".into();
        let matrix = matrix(&config, &[("amy", &[1])]);
        let grids = cohort_progress(&config, &matrix);
        let names: Vec<&str> = grids[0].members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Bob", "Cat", "Zed"]);
        assert_eq!(grids[0].chapter_counts[0].completed, 1);
        assert_eq!(grids[1].members.len(), 1);
    }

    #[test]
    fn test_learning_profile() {
        let config = config();
        let matrix = matrix(&config, &[("amy", &[1, 2, 7])]);
        let profile = learning_profile(&config, matrix.member("amy").unwrap(), 3);

        assert_eq!(profile.repo_url, "https://github.com/oracleaistudy/amy");
        assert_eq!(profile.chapters.len(), 2);
        assert!(profile.chapters.iter().all(|c| c.completed));
        assert_eq!(profile.total_chapters, 3);
        assert_eq!(profile.completion_rate, 30);
        assert_eq!(profile.learned_concepts, vec!["features", "labels", "pipeline"]);
        assert_eq!(profile.learned_keywords, vec!["numpy", "pandas", "sklearn"]);
        assert_eq!(profile.quiz_count, 3);
        assert_eq!(profile.skill_scores.len(), Skill::ALL.len());
    }

    #[test]
    fn test_learning_profile_pending_chapters_learn_nothing() {
        let config = config();
        let matrix = matrix(&config, &[]);
        let profile = learning_profile(&config, matrix.member("bob").unwrap(), 0);
        assert_eq!(profile.chapters.len(), 2);
        assert!(profile.learned_concepts.is_empty());
        assert!(profile.learned_keywords.is_empty());
    }

    #[test]
    fn test_weekly_report() {
        let config = config();
        let matrix = matrix(&config, &[("amy", &[1, 2]), ("bob", &[1])]);

        let amy = weekly_report(&config, matrix.member("amy").unwrap(), 1).unwrap();
        assert_eq!(amy.completed_count, 2);
        assert_eq!(amy.total_count, 2);
        assert_eq!(amy.performance, Performance::AllGoals);
        assert_eq!(amy.completed_sections.len(), 3);
        assert_eq!(amy.completed_sections[2].chapter_title, "Pipelines");
        assert_eq!(amy.code_practices, vec!["load data", "fit"]);
        assert!(amy.summary.contains("3 sections"));

        let bob = weekly_report(&config, matrix.member("bob").unwrap(), 1).unwrap();
        assert_eq!(bob.performance, Performance::KeepGoing);
        assert_eq!(bob.learned_keywords, vec!["numpy", "pandas"]);

        // chapter 3 has no catalog entry but still counts as a goal
        let week2 = weekly_report(&config, matrix.member("amy").unwrap(), 2).unwrap();
        assert_eq!(week2.completed_count, 0);
        assert!(week2.completed_sections.is_empty());

        assert!(weekly_report(&config, matrix.member("amy").unwrap(), 12).is_none());
    }

    #[test]
    fn test_performance_tiers() {
        assert_eq!(Performance::assess(4, 4), Performance::AllGoals);
        assert_eq!(Performance::assess(3, 4), Performance::MostGoals);
        assert_eq!(Performance::assess(2, 4), Performance::KeepGoing);
        assert_eq!(Performance::assess(0, 0), Performance::AllGoals);
    }

    #[test]
    fn test_portfolio_cards() {
        let config = config();
        let matrix = matrix(&config, &[("cat", &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10])]);

        let part1 = portfolio_cards(&config, &matrix, Some("part1"));
        let names: Vec<&str> = part1.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Amy", "Bob", "Cat"]);
        assert_eq!(part1[0].avg_skill_score, 0.0);
        assert!(part1[2].avg_skill_score > 90.0);
        assert_eq!(portfolio_cards(&config, &matrix, None).len(), 4);
    }

    #[test]
    fn test_skill_comparison_covers_everyone() {
        let config = config();
        let matrix = matrix(&config, &[("dan", &[6])]);
        let comparison = skill_comparison(&matrix);
        assert_eq!(comparison.len(), 4);
        assert_eq!(comparison[3].skills[&Skill::UnsupervisedLearning], 100.0);
        assert_eq!(comparison[0].skills[&Skill::UnsupervisedLearning], 0.0);
    }

    #[test]
    fn test_submission_audit() {
        let config = config();
        let mut matrix = matrix(&config, &[("amy", &[2])]);
        matrix
            .member_mut("bob")
            .unwrap()
            .record(ch(4), "week4.ipynb", Some("https://example.com/week4"));

        let audit = submission_audit(&matrix);
        assert_eq!(audit.len(), 4);
        assert_eq!(
            audit[0].files,
            vec![AuditFile {
                filename: "ch02_hw.ipynb".into(),
                detected: Some(ch(2)),
                recorded_as: ch(2),
                url: None,
            }]
        );
        assert_eq!(audit[1].files[0].detected, Some(ch(4)));
        assert!(audit[2].files.is_empty());
    }
}
