use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Canonical chapter identifier, `ch01` through `ch10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChapterId(u8);

impl ChapterId {
    /// Number of chapters in the curriculum
    pub const COUNT: u8 = 10;

    /// Build a chapter id from its number, rejecting anything outside 1..=10
    pub fn new(number: u32) -> Option<Self> {
        if (1..=u32::from(Self::COUNT)).contains(&number) {
            Some(Self(number as u8))
        } else {
            None
        }
    }

    pub fn number(self) -> u8 {
        self.0
    }

    /// All chapters in curriculum order
    pub fn all() -> impl Iterator<Item = ChapterId> {
        (1..=Self::COUNT).map(ChapterId)
    }

    /// Chart label, e.g. `Ch03`
    pub fn label(self) -> String {
        format!("Ch{:02}", self.0)
    }
}

impl fmt::Display for ChapterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch{:02}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseChapterIdError(String);

impl fmt::Display for ParseChapterIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid chapter id: {:?}", self.0)
    }
}

impl std::error::Error for ParseChapterIdError {}

impl FromStr for ChapterId {
    type Err = ParseChapterIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        lower
            .strip_prefix("ch")
            .and_then(|digits| digits.parse::<u32>().ok())
            .and_then(ChapterId::new)
            .ok_or_else(|| ParseChapterIdError(s.to_string()))
    }
}

impl Serialize for ChapterId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ChapterId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chapter_id_range() {
        assert!(ChapterId::new(0).is_none());
        assert!(ChapterId::new(11).is_none());
        assert_eq!(ChapterId::new(1).map(|c| c.number()), Some(1));
        assert_eq!(ChapterId::new(10).map(|c| c.number()), Some(10));
        assert_eq!(ChapterId::all().count(), 10);
    }

    #[test]
    fn test_chapter_id_display_and_parse() {
        let ch = ChapterId::new(3).unwrap();
        assert_eq!(ch.to_string(), "ch03");
        assert_eq!(ch.label(), "Ch03");
        assert_eq!("ch03".parse::<ChapterId>(), Ok(ch));
        assert_eq!("CH10".parse::<ChapterId>().map(|c| c.number()), Ok(10));
        assert!("ch11".parse::<ChapterId>().is_err());
        assert!("week3".parse::<ChapterId>().is_err());
    }

    #[test]
    fn test_chapter_id_serde_as_string() {
        let ch = ChapterId::new(7).unwrap();
        assert_eq!(serde_json::to_string(&ch).unwrap(), "\"ch07\"");
        let parsed: ChapterId = serde_json::from_str("\"ch07\"").unwrap();
        assert_eq!(parsed, ch);
        assert!(serde_json::from_str::<ChapterId>("\"ch00\"").is_err());
    }
}
