//! Study group configuration.
//!
//! The roster, cohorts, quiz catalog and chapter metadata are data, not
//! code: they live in a JSON file, by default at
//! `~/.config/studyboard/config.json`. Secrets (GitHub token, database
//! key) come from the environment instead.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::ChapterId;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "studyboard";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Default matrix cache validity, matching the dashboard's five minute refresh
pub const DEFAULT_CACHE_DURATION_SECS: i64 = 300;

fn default_cache_duration() -> i64 {
    DEFAULT_CACHE_DURATION_SECS
}

/// A roster entry. `handle` is the member's repository name in the organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub handle: String,
    pub name: String,
    #[serde(default)]
    pub cohort: Option<String>,
}

/// A group of members studying on the same schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cohort {
    pub id: String,
    pub label: String,
    /// Chapter or chapter range currently assigned, e.g. `"8"` or `"3-4"`
    pub current_chapters: String,
}

impl Cohort {
    pub fn current_chapter_range(&self) -> Vec<ChapterId> {
        parse_chapter_range(&self.current_chapters)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: String,
    pub chapter: ChapterId,
    pub title: String,
    #[serde(default)]
    pub link: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub concepts: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub practice: Vec<String>,
}

/// Display metadata for one chapter of the textbook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterInfo {
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyConfig {
    /// GitHub organization holding one repository per member
    pub org_name: String,
    #[serde(default)]
    pub book_name: Option<String>,
    #[serde(default = "default_cache_duration")]
    pub cache_duration_secs: i64,
    #[serde(default)]
    pub cohorts: Vec<Cohort>,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub quizzes: Vec<Quiz>,
    #[serde(default)]
    pub chapters: BTreeMap<ChapterId, ChapterInfo>,
    /// Week number to the chapters covered that week
    #[serde(default)]
    pub weeks: BTreeMap<u32, Vec<ChapterId>>,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            org_name: "oracleaistudy".to_string(),
            book_name: None,
            cache_duration_secs: DEFAULT_CACHE_DURATION_SECS,
            cohorts: Vec::new(),
            members: Vec::new(),
            quizzes: Vec::new(),
            chapters: BTreeMap::new(),
            weeks: BTreeMap::new(),
        }
    }
}

impl StudyConfig {
    /// Load from the default location, falling back to defaults if absent
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            debug!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.warn_inconsistencies();
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME).join(&self.org_name))
    }

    pub fn cache_duration(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.cache_duration_secs.max(0))
    }

    pub fn member(&self, handle: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.handle == handle)
    }

    pub fn cohort(&self, id: &str) -> Option<&Cohort> {
        self.cohorts.iter().find(|c| c.id == id)
    }

    pub fn cohort_members<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Member> + 'a {
        self.members
            .iter()
            .filter(move |m| m.cohort.as_deref() == Some(id))
    }

    pub fn week_chapters(&self, week: u32) -> Option<&[ChapterId]> {
        self.weeks.get(&week).map(|v| v.as_slice())
    }

    /// Link to a member's repository
    pub fn repo_url(&self, handle: &str) -> String {
        format!("https://github.com/{}/{}", self.org_name, handle)
    }

    /// Display names of all members, sorted
    pub fn user_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.members.iter().map(|m| m.name.clone()).collect();
        names.sort();
        names
    }

    fn warn_inconsistencies(&self) {
        let mut seen = std::collections::HashSet::new();
        for member in &self.members {
            if !seen.insert(member.handle.as_str()) {
                warn!(member = %member.handle, "Duplicate roster handle");
            }
            if let Some(ref cohort) = member.cohort {
                if self.cohort(cohort).is_none() {
                    warn!(member = %member.handle, cohort = %cohort, "Member references unknown cohort");
                }
            }
        }
    }
}

/// Parse a chapter range like `"1-2"` or `"6"` into chapter ids.
///
/// Anything unparseable falls back to chapter 1. Numbers outside 1..=10 are dropped.
pub fn parse_chapter_range(range: &str) -> Vec<ChapterId> {
    let fallback = || ChapterId::new(1).into_iter().collect::<Vec<_>>();

    let numbers = match range.split_once('-') {
        Some((start, end)) => match (start.trim().parse::<u32>(), end.trim().parse::<u32>()) {
            (Ok(start), Ok(end)) => (start..=end).collect::<Vec<_>>(),
            _ => return fallback(),
        },
        None => match range.trim().parse::<u32>() {
            Ok(n) => vec![n],
            Err(_) => return fallback(),
        },
    };

    let chapters: Vec<ChapterId> = numbers.into_iter().filter_map(ChapterId::new).collect();
    if chapters.is_empty() {
        fallback()
    } else {
        chapters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(chapters: &[ChapterId]) -> Vec<u8> {
        chapters.iter().map(|c| c.number()).collect()
    }

    #[test]
    fn test_parse_chapter_range() {
        assert_eq!(numbers(&parse_chapter_range("1-2")), vec![1, 2]);
        assert_eq!(numbers(&parse_chapter_range("6")), vec![6]);
        assert_eq!(numbers(&parse_chapter_range(" 3 - 4 ")), vec![3, 4]);
        assert_eq!(numbers(&parse_chapter_range("abc")), vec![1]);
        assert_eq!(numbers(&parse_chapter_range("")), vec![1]);
        assert_eq!(numbers(&parse_chapter_range("9-12")), vec![9, 10]);
        assert_eq!(numbers(&parse_chapter_range("5-3")), vec![1]);
    }

    #[test]
    fn test_parse_config_json() {
        let json = r#"{
            "org_name": "oracleaistudy",
            "cohorts": [{"id": "part1", "label": "PART 1", "current_chapters": "7-8"}],
            "members": [
                {"handle": "hayoung-kim", "name": "Hayoung Kim", "cohort": "part1"},
                {"handle": "yeji-kim", "name": "Yeji Kim"}
            ],
            "quizzes": [{"id": "ch02-1", "chapter": "ch02", "title": "Train and test sets"}],
            "chapters": {"ch01": {"title": "Chapter 01 - My first ML"}},
            "weeks": {"1": ["ch01", "ch02"]}
        }"#;
        let config: StudyConfig = serde_json::from_str(json).expect("Failed to parse config JSON");

        assert_eq!(config.cache_duration_secs, DEFAULT_CACHE_DURATION_SECS);
        assert_eq!(config.members.len(), 2);
        assert_eq!(config.cohort_members("part1").count(), 1);
        assert_eq!(
            numbers(&config.cohort("part1").unwrap().current_chapter_range()),
            vec![7, 8]
        );
        assert_eq!(config.quizzes[0].chapter.number(), 2);
        assert!(config.chapters.contains_key(&ChapterId::new(1).unwrap()));
        assert_eq!(config.week_chapters(1).map(|c| c.len()), Some(2));
        assert!(config.week_chapters(2).is_none());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut config = StudyConfig::default();
        config.members.push(Member {
            handle: "zeho-oh".to_string(),
            name: "Zeho Oh".to_string(),
            cohort: None,
        });

        config.save_to(&path).unwrap();
        let loaded = StudyConfig::load_from(&path).unwrap();
        assert_eq!(loaded.members, config.members);
        assert_eq!(loaded.org_name, "oracleaistudy");
    }

    #[test]
    fn test_repo_url_and_user_names() {
        let mut config = StudyConfig::default();
        config.members = vec![
            Member { handle: "b".into(), name: "Zed".into(), cohort: None },
            Member { handle: "a".into(), name: "Amy".into(), cohort: None },
        ];
        assert_eq!(config.repo_url("a"), "https://github.com/oracleaistudy/a");
        assert_eq!(config.user_names(), vec!["Amy", "Zed"]);
    }
}
