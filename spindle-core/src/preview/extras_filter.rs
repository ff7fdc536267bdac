//! Stage 5: flag bonus-content titles, grounded on
//! `original_source/server/.../extras_filter.py`.

use spindle_model::Title;

pub const DEFAULT_MIN_DURATION_SECS: u64 = 600;
pub const DEFAULT_VARIANCE_THRESHOLD: f64 = 0.40;

const BONUS_KEYWORDS: &[&str] = &[
    "commentary",
    "featurette",
    "trailer",
    "deleted scene",
    "behind the scenes",
    "making of",
    "gag reel",
    "bloopers",
];

pub struct ExtrasFilterConfig {
    pub min_duration_secs: u64,
    pub variance_threshold: f64,
}

impl Default for ExtrasFilterConfig {
    fn default() -> Self {
        Self {
            min_duration_secs: DEFAULT_MIN_DURATION_SECS,
            variance_threshold: DEFAULT_VARIANCE_THRESHOLD,
        }
    }
}

/// Marks `is_extra` on every title that fails the short-duration, keyword,
/// or deviation-from-median rules. Deviation is computed only over the set
/// that survived the first two rules, matching the Python original's
/// two-pass structure.
pub fn mark_extras(titles: &mut [Title], config: &ExtrasFilterConfig) {
    for title in titles.iter_mut() {
        title.is_extra = (title.duration_seconds as u64) < config.min_duration_secs || contains_bonus_keyword(&title.name);
    }

    let survivors: Vec<u64> = titles.iter().filter(|t| !t.is_extra).map(|t| t.duration_seconds).collect();
    if survivors.len() < 2 {
        return;
    }
    let median = median(&survivors);
    if median == 0.0 {
        return;
    }

    for title in titles.iter_mut() {
        if title.is_extra {
            continue;
        }
        let deviation = (title.duration_seconds as f64 - median).abs() / median;
        if deviation > config.variance_threshold {
            title.is_extra = true;
        }
    }
}

fn contains_bonus_keyword(name: &str) -> bool {
    let lower = name.to_lowercase();
    BONUS_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

fn median(values: &[u64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) as f64 / 2.0
    } else {
        sorted[mid] as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn title(index: u32, secs: u64, name: &str) -> Title {
        Title::new(index, name, secs, 0)
    }

    #[test]
    fn short_titles_are_extras() {
        let mut titles = vec![title(0, 1800, "Episode 1"), title(1, 90, "Bonus Clip")];
        mark_extras(&mut titles, &ExtrasFilterConfig::default());
        assert!(!titles[0].is_extra);
        assert!(titles[1].is_extra);
    }

    #[test]
    fn keyword_titles_are_extras_regardless_of_length() {
        let mut titles = vec![title(0, 1800, "Episode 1"), title(1, 1500, "Audio Commentary")];
        mark_extras(&mut titles, &ExtrasFilterConfig::default());
        assert!(titles[1].is_extra);
    }

    #[test]
    fn outlier_duration_among_mains_is_demoted() {
        let mut titles = vec![
            title(0, 1800, "Episode 1"),
            title(1, 1820, "Episode 2"),
            title(2, 1790, "Episode 3"),
            title(3, 3600, "Extended Special"),
        ];
        mark_extras(&mut titles, &ExtrasFilterConfig::default());
        assert!(titles[3].is_extra);
        assert!(!titles[0].is_extra);
    }
}
