use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::models::SubmissionMatrix;

/// Cache file holding the last built submission matrix
const MATRIX_SNAPSHOT: &str = "submissions";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T, cached_at: DateTime<Utc>) -> Self {
        Self { data, cached_at }
    }

    pub fn age_minutes(&self, now: DateTime<Utc>) -> i64 {
        (now - self.cached_at).num_minutes()
    }

    pub fn age_display(&self, now: DateTime<Utc>) -> String {
        let minutes = self.age_minutes(now);
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            let remaining_mins = minutes % 60;
            if remaining_mins >= 30 {
                // Round up: 1h 30m+ becomes 2h
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            let remaining_hours = (minutes % 1440) / 60;
            if remaining_hours >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }
}

/// On-disk JSON snapshots, so a short-lived process can reuse the last build.
pub struct SnapshotStore {
    cache_dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create cache dir: {}", cache_dir.display()))?;
        Ok(Self { cache_dir })
    }

    fn cache_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", name))
    }

    fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Option<CachedData<T>>> {
        let path = self.cache_path(name);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache file: {}", name))?;

        let cached: CachedData<T> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache file: {}", name))?;

        Ok(Some(cached))
    }

    fn save<T: Serialize>(&self, name: &str, data: &T, cached_at: DateTime<Utc>) -> Result<()> {
        let cached = CachedData::new(data, cached_at);
        let path = self.cache_path(name);
        let contents = serde_json::to_string_pretty(&cached)?;
        std::fs::write(&path, contents)?;
        debug!(cache = name, path = %path.display(), "Saved snapshot");
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<()> {
        let path = self.cache_path(name);
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove cache file: {}", name))?;
        }
        Ok(())
    }

    pub fn load_matrix(&self) -> Result<Option<CachedData<SubmissionMatrix>>> {
        self.load(MATRIX_SNAPSHOT)
    }

    pub fn save_matrix(&self, matrix: &SubmissionMatrix, built_at: DateTime<Utc>) -> Result<()> {
        self.save(MATRIX_SNAPSHOT, matrix, built_at)
    }

    pub fn clear_matrix(&self) -> Result<()> {
        self.remove(MATRIX_SNAPSHOT)
    }

    /// Age of the saved matrix for display, logging read errors instead of failing
    pub fn matrix_age(&self, now: DateTime<Utc>) -> String {
        match self.load_matrix() {
            Ok(Some(cached)) => cached.age_display(now),
            Ok(None) => "never".to_string(),
            Err(e) => {
                debug!(cache = MATRIX_SNAPSHOT, error = %e, "Failed to load cache for age display");
                "never".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Member;
    use crate::models::{ChapterId, MemberProgress};
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_age_display() {
        let cached = CachedData::new((), t0());
        assert_eq!(cached.age_display(t0()), "just now");
        assert_eq!(cached.age_display(t0() - Duration::minutes(5)), "just now");
        assert_eq!(cached.age_display(t0() + Duration::minutes(5)), "5m ago");
        assert_eq!(cached.age_display(t0() + Duration::minutes(89)), "1h ago");
        assert_eq!(cached.age_display(t0() + Duration::minutes(90)), "2h ago");
        assert_eq!(cached.age_display(t0() + Duration::hours(36)), "2d ago");
        assert_eq!(cached.age_display(t0() + Duration::hours(30)), "1d ago");
    }

    #[test]
    fn test_matrix_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("cache")).unwrap();
        assert!(store.load_matrix().unwrap().is_none());
        assert_eq!(store.matrix_age(t0()), "never");

        let mut row = MemberProgress::new(&Member {
            handle: "zeho-oh".into(),
            name: "Zeho Oh".into(),
            cohort: Some("part1".into()),
        });
        row.record(ChapterId::new(4).unwrap(), "ch04.ipynb", Some("https://example.com/ch04"));
        let matrix = SubmissionMatrix { members: vec![row] };

        store.save_matrix(&matrix, t0()).unwrap();
        let loaded = store.load_matrix().unwrap().expect("snapshot saved");
        assert_eq!(loaded.data, matrix);
        assert_eq!(loaded.cached_at, t0());
        assert_eq!(store.matrix_age(t0() + Duration::minutes(3)), "3m ago");

        store.clear_matrix().unwrap();
        assert!(store.load_matrix().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_snapshot_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().to_path_buf()).unwrap();
        std::fs::write(dir.path().join("submissions.json"), "{not json").unwrap();

        assert!(store.load_matrix().is_err());
        assert_eq!(store.matrix_age(t0()), "never");
    }
}
