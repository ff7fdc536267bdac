//! Stage 6: TV episode matching against the season's episode list.

use spindle_model::{Confidence, MediaType, Title, TvSeason};

/// Confidence banding on absolute/relative duration difference between a
/// title and its candidate episode's runtime.
fn score_match(title_secs: u64, episode_runtime_minutes: Option<u32>) -> f64 {
    let Some(runtime_min) = episode_runtime_minutes else {
        return Confidence::VeryLow.score();
    };
    let episode_secs = (runtime_min as f64) * 60.0;
    if episode_secs <= 0.0 {
        return Confidence::VeryLow.score();
    }
    let diff = (title_secs as f64 - episode_secs).abs();
    let ratio = diff / episode_secs;

    if diff <= 120.0 || ratio <= 0.10 {
        Confidence::High.score()
    } else if diff <= 300.0 || ratio <= 0.20 {
        Confidence::Medium.score()
    } else if ratio <= 0.50 {
        Confidence::Low.score()
    } else {
        Confidence::VeryLow.score()
    }
}

/// Walks surviving main titles in disc-authoring order (`index` ascending)
/// and assigns sequential episode numbers starting from the season's
/// resolved starting point, updating episode fields and confidence in
/// place and advancing `season.last_episode_assigned` monotonically.
///
/// Returns the highest episode number actually assigned during this call
/// (or `starting_episode_number - 1` if there were no main titles), so a
/// caller re-running the matcher for a single disc (an operator correction)
/// can reset the watermark to that value instead of the merged, possibly
/// stale, maximum this function leaves in `season`.
pub fn match_episodes(titles: &mut [Title], season: &mut TvSeason, starting_episode_number: u32) -> u32 {
    let mut main_indices: Vec<usize> = titles
        .iter()
        .enumerate()
        .filter(|(_, t)| !t.is_extra)
        .map(|(i, _)| i)
        .collect();
    main_indices.sort_by_key(|&i| titles[i].index);

    let mut next_episode = starting_episode_number;
    let mut highest_assigned = season.last_episode_assigned;
    let mut highest_assigned_this_call = starting_episode_number.saturating_sub(1);

    for idx in main_indices {
        let episode = season.episode(next_episode).cloned();
        let confidence = score_match(titles[idx].duration_seconds, episode.as_ref().and_then(|e| e.runtime_minutes));
        let episode_title = episode.map(|e| e.name).unwrap_or_else(|| format!("Episode {next_episode}"));

        titles[idx].set_episode(MediaType::TvShow, next_episode, episode_title);
        titles[idx].confidence = confidence;

        highest_assigned = highest_assigned.max(next_episode);
        highest_assigned_this_call = next_episode;
        next_episode += 1;
    }

    season.advance_last_episode(highest_assigned);
    highest_assigned_this_call
}

#[cfg(test)]
mod tests {
    use super::*;
    use spindle_model::TvEpisode;

    fn season_with_episodes() -> TvSeason {
        let mut season = TvSeason::new("The Wire", 1);
        season.episodes = vec![
            TvEpisode {
                episode_number: 1,
                name: "The Target".into(),
                season_number: 1,
                runtime_minutes: Some(60),
                overview: None,
            },
            TvEpisode {
                episode_number: 2,
                name: "The Detail".into(),
                season_number: 1,
                runtime_minutes: Some(58),
                overview: None,
            },
        ];
        season
    }

    #[test]
    fn assigns_sequential_episodes_and_high_confidence_on_close_match() {
        let mut titles = vec![Title::new(0, "Title 1", 60 * 60, 0), Title::new(1, "Title 2", 58 * 60 + 30, 0)];
        let mut season = season_with_episodes();
        match_episodes(&mut titles, &mut season, 1);

        assert_eq!(titles[0].episode_number, Some(1));
        assert_eq!(titles[0].episode_title.as_deref(), Some("The Target"));
        assert_eq!(titles[0].confidence, Confidence::High.score());
        assert_eq!(titles[1].episode_number, Some(2));
        assert_eq!(season.last_episode_assigned, 2);
    }

    #[test]
    fn large_duration_gap_is_very_low_confidence() {
        let mut titles = vec![Title::new(0, "Title 1", 10 * 60, 0)];
        let mut season = season_with_episodes();
        match_episodes(&mut titles, &mut season, 1);
        assert_eq!(titles[0].confidence, Confidence::VeryLow.score());
    }

    #[test]
    fn last_episode_assigned_never_goes_backwards() {
        let mut titles = vec![Title::new(0, "Title 1", 60 * 60, 0)];
        let mut season = season_with_episodes();
        season.last_episode_assigned = 5;
        match_episodes(&mut titles, &mut season, 1);
        assert_eq!(season.last_episode_assigned, 5);
    }
}
