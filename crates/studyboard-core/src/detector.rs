//! Filename to chapter detection.
//!
//! Members name their notebooks freely (`ch01_homework.ipynb`,
//! `Chapter 2 - intro.ipynb`, `09과제.ipynb`, ...). Detection lower-cases
//! the name, folds full-width digits to ASCII, drops Hangul syllables so
//! descriptive Korean text cannot interfere, then tries a fixed list of patterns from most to least
//! specific. The first pattern whose leftmost match carries a number in
//! 1..=10 decides the chapter.

use std::sync::OnceLock;

use regex::Regex;

use crate::models::ChapterId;

/// File extension of a submittable notebook
pub const NOTEBOOK_EXTENSION: &str = ".ipynb";

/// Patterns in priority order. Group 1 captures the chapter number.
///
/// Digits are ASCII only; full-width digits are folded before matching.
/// `regex` has no look-ahead, so "single digit not followed by another digit"
/// is written as a trailing `(?:[^0-9]|$)`.
const PATTERNS: [&str; 10] = [
    r"ch[_\-\s]?([0-9]{2})",
    r"chapter[_\-\s]?([0-9]{2})",
    r"ch[_\-\s]?([1-9])(?:[^0-9]|$)",
    r"chapter[_\-\s]?([1-9])(?:[^0-9]|$)",
    r"chap[_\-\s]?([0-9]{2})",
    r"chap[_\-\s]?([1-9])(?:[^0-9]|$)",
    r"week[_\-\s]?([0-9]{2})",
    r"week[_\-\s]?([1-9])(?:[^0-9]|$)",
    r"^([0-9]{1,2})[_\-\s]",
    r"^([0-9]{1,2})\.",
];

static COMPILED: OnceLock<Vec<Regex>> = OnceLock::new();

fn patterns() -> &'static [Regex] {
    COMPILED.get_or_init(|| {
        PATTERNS
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect()
    })
}

fn is_hangul_syllable(c: char) -> bool {
    ('\u{AC00}'..='\u{D7A3}').contains(&c)
}

/// `０`..`９` to `0`..`9`
fn fold_fullwidth_digit(c: char) -> char {
    match c {
        '\u{FF10}'..='\u{FF19}' => char::from_u32(c as u32 - 0xFF10 + '0' as u32).unwrap_or(c),
        _ => c,
    }
}

/// Lower-case a filename, fold full-width digits and strip Hangul syllables
pub fn normalize_filename(filename: &str) -> String {
    filename
        .to_lowercase()
        .chars()
        .map(fold_fullwidth_digit)
        .filter(|c| !is_hangul_syllable(*c))
        .collect()
}

/// Detect the chapter a submitted file belongs to
pub fn detect_chapter(filename: &str) -> Option<ChapterId> {
    let cleaned = normalize_filename(filename);

    patterns().iter().find_map(|re| {
        re.captures(&cleaned)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .and_then(ChapterId::new)
    })
}

/// Whether a file is a notebook that counts as a submission
pub fn is_notebook(filename: &str) -> bool {
    filename.ends_with(NOTEBOOK_EXTENSION)
}
