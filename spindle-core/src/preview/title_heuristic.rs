//! Stage 1: classify a disc by its title-duration distribution.

use spindle_model::{MediaType, Title};

const MOVIE_MIN_SECS: u64 = 70 * 60;
const TV_MIN_SECS: u64 = 18 * 60;
const TV_MAX_SECS: u64 = 65 * 60;

pub struct DurationVerdict {
    pub media_type: MediaType,
    pub confidence: f64,
}

pub fn classify_by_duration(titles: &[Title]) -> DurationVerdict {
    let long: Vec<&Title> = titles.iter().filter(|t| t.duration_seconds as u64 > MOVIE_MIN_SECS).collect();
    let tv_length: Vec<&Title> = titles
        .iter()
        .filter(|t| (TV_MIN_SECS..=TV_MAX_SECS).contains(&t.duration_seconds))
        .collect();

    if long.len() == 1 && tv_length.is_empty() {
        let extras = titles.len().saturating_sub(1);
        let confidence = (0.7 + 0.05 * extras.min(4) as f64).min(0.9);
        return DurationVerdict {
            media_type: MediaType::Movie,
            confidence,
        };
    }

    if tv_length.len() >= 3 {
        let durations: Vec<f64> = tv_length.iter().map(|t| t.duration_seconds as f64).collect();
        if std_dev(&durations) < 5.0 * 60.0 {
            let confidence = (0.6 + 0.05 * tv_length.len() as f64).min(0.95);
            return DurationVerdict {
                media_type: MediaType::TvShow,
                confidence,
            };
        }
    }

    if long.len() == 2 && tv_length.is_empty() {
        return DurationVerdict {
            media_type: MediaType::Movie,
            confidence: 0.6,
        };
    }

    DurationVerdict {
        media_type: MediaType::Unknown,
        confidence: 0.3,
    }
}

fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn title(index: u32, secs: u64) -> Title {
        Title::new(index, format!("Title {index}"), secs, 0)
    }

    #[test]
    fn single_long_title_is_a_movie() {
        let titles = vec![title(0, 110 * 60), title(1, 5 * 60), title(2, 4 * 60)];
        let verdict = classify_by_duration(&titles);
        assert_eq!(verdict.media_type, MediaType::Movie);
        assert!(verdict.confidence >= 0.7 && verdict.confidence <= 0.9);
    }

    #[test]
    fn several_similar_length_titles_are_a_tv_season() {
        let titles = vec![title(0, 22 * 60), title(1, 23 * 60), title(2, 21 * 60), title(3, 24 * 60)];
        let verdict = classify_by_duration(&titles);
        assert_eq!(verdict.media_type, MediaType::TvShow);
    }

    #[test]
    fn two_long_titles_with_no_tv_length_are_a_movie() {
        let titles = vec![title(0, 100 * 60), title(1, 90 * 60)];
        let verdict = classify_by_duration(&titles);
        assert_eq!(verdict.media_type, MediaType::Movie);
        assert_eq!(verdict.confidence, 0.6);
    }

    #[test]
    fn ambiguous_durations_are_unknown() {
        let titles = vec![title(0, 5 * 60), title(1, 8 * 60)];
        let verdict = classify_by_duration(&titles);
        assert_eq!(verdict.media_type, MediaType::Unknown);
        assert_eq!(verdict.confidence, 0.3);
    }
}
