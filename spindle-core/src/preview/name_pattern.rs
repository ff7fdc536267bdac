//! Stage 2: regex the disc name for series/season hints.

use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq)]
pub struct NamePatternResult {
    pub is_tv: bool,
    pub show_name: Option<String>,
    pub season_number: Option<u32>,
    /// Short, ambiguous name with no movie indicators — a weak TV guess
    /// only surfaced when ambiguous-search is enabled by configuration.
    pub maybe_tv_ambiguous: bool,
}

impl NamePatternResult {
    fn movie_like(name: &str) -> bool {
        let lower = name.to_lowercase();
        ["blu-ray", "bluray", "dvd", "edition"].iter().any(|kw| lower.contains(kw)) || YEAR_RE.get_or_init(build_year_re).is_match(name)
    }
}

static SEASON_RE: OnceLock<Regex> = OnceLock::new();
static SEASON_WORD_RE: OnceLock<Regex> = OnceLock::new();
static DISC_RE: OnceLock<Regex> = OnceLock::new();
static YEAR_RE: OnceLock<Regex> = OnceLock::new();

fn build_season_re() -> Regex {
    Regex::new(r"(?i)^(.*?)[\s._-]+s(?:eason)?\s*0*(\d{1,2})\b").unwrap()
}
fn build_season_word_re() -> Regex {
    Regex::new(r"(?i)^(.*?)[\s._-]+season\s*0*(\d{1,2})\b").unwrap()
}
fn build_disc_re() -> Regex {
    Regex::new(r"(?i)^(.*?)[\s._-]+disc\s*0*(\d{1,2})\b").unwrap()
}
fn build_year_re() -> Regex {
    Regex::new(r"\((19|20)\d{2}\)").unwrap()
}

const COLLECTION_KEYWORDS: &[&str] = &["complete series", "collection", "box set", "anthology"];

/// Parses a disc name looking for series/season structure. Falls through
/// the three recognized patterns in spec order, then the keyword/ambiguous
/// fallback.
pub fn detect_from_name(name: &str, ambiguous_search_enabled: bool) -> NamePatternResult {
    let season_re = SEASON_RE.get_or_init(build_season_re);
    if let Some(caps) = season_re.captures(name) {
        let show = caps.get(1).map(|m| m.as_str().trim().to_string()).filter(|s| !s.is_empty());
        let season: u32 = caps.get(2).and_then(|m| m.as_str().parse().ok()).unwrap_or(1);
        return NamePatternResult {
            is_tv: true,
            show_name: show,
            season_number: Some(season),
            maybe_tv_ambiguous: false,
        };
    }

    let season_word_re = SEASON_WORD_RE.get_or_init(build_season_word_re);
    if let Some(caps) = season_word_re.captures(name) {
        let show = caps.get(1).map(|m| m.as_str().trim().to_string()).filter(|s| !s.is_empty());
        let season: u32 = caps.get(2).and_then(|m| m.as_str().parse().ok()).unwrap_or(1);
        return NamePatternResult {
            is_tv: true,
            show_name: show,
            season_number: Some(season),
            maybe_tv_ambiguous: false,
        };
    }

    let disc_re = DISC_RE.get_or_init(build_disc_re);
    if let Some(caps) = disc_re.captures(name) {
        let show = caps.get(1).map(|m| m.as_str().trim().to_string()).filter(|s| !s.is_empty());
        return NamePatternResult {
            is_tv: true,
            show_name: show,
            season_number: Some(1),
            maybe_tv_ambiguous: false,
        };
    }

    let lower = name.to_lowercase();
    if COLLECTION_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        return NamePatternResult {
            is_tv: true,
            show_name: Some(name.trim().to_string()),
            season_number: Some(1),
            maybe_tv_ambiguous: false,
        };
    }

    let word_count = name.split_whitespace().count();
    let ambiguous = ambiguous_search_enabled && (1..=3).contains(&word_count) && !NamePatternResult::movie_like(name);

    NamePatternResult {
        is_tv: false,
        show_name: if ambiguous { Some(name.trim().to_string()) } else { None },
        season_number: if ambiguous { Some(1) } else { None },
        maybe_tv_ambiguous: ambiguous,
    }
}

/// Pulls a `"(YYYY)"` year out of a disc/movie name, if present.
pub fn parse_year(name: &str) -> Option<i32> {
    let re = YEAR_RE.get_or_init(build_year_re);
    re.find(name).and_then(|m| m.as_str().trim_matches(|c| c == '(' || c == ')').parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn season_abbreviation_is_detected() {
        let result = detect_from_name("The Wire S02", false);
        assert!(result.is_tv);
        assert_eq!(result.season_number, Some(2));
        assert_eq!(result.show_name.as_deref(), Some("The Wire"));
    }

    #[test]
    fn season_word_is_detected() {
        let result = detect_from_name("Breaking Bad Season 3", false);
        assert!(result.is_tv);
        assert_eq!(result.season_number, Some(3));
    }

    #[test]
    fn disc_only_defaults_to_season_one() {
        let result = detect_from_name("Firefly Disc 1", false);
        assert!(result.is_tv);
        assert_eq!(result.season_number, Some(1));
    }

    #[test]
    fn movie_year_is_not_ambiguous() {
        let result = detect_from_name("Heat (1995)", true);
        assert!(!result.is_tv);
        assert!(!result.maybe_tv_ambiguous);
    }

    #[test]
    fn short_plain_name_is_ambiguous_when_enabled() {
        let result = detect_from_name("Firefly", true);
        assert!(result.maybe_tv_ambiguous);
    }

    #[test]
    fn year_parses_out_of_name() {
        assert_eq!(parse_year("Heat (1995)"), Some(1995));
        assert_eq!(parse_year("Firefly"), None);
    }
}
