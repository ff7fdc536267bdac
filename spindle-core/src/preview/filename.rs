//! Stage 7: filename/path synthesis.

use spindle_model::disc::sanitize_filename_component as sanitize;
use spindle_model::ModelError;

pub fn tv_main_path(show: &str, season_number: u32, episode_number: u32, episode_title: &str) -> Result<String, ModelError> {
    let show = sanitize(show)?;
    let episode_title = sanitize(episode_title)?;
    Ok(format!(
        "{show}/Season {season_number:02}/{show} - S{season_number:02}E{episode_number:02} - {episode_title}.mkv"
    ))
}

pub fn tv_extra_path(show: &str, season_number: u32, extra_name: &str) -> Result<String, ModelError> {
    let show = sanitize(show)?;
    let extra_name = sanitize(extra_name)?;
    Ok(format!("{show}/Season {season_number:02}/Extras/{extra_name}.mkv"))
}

pub fn movie_main_path(title: &str, year: Option<i32>) -> Result<String, ModelError> {
    let title = sanitize(title)?;
    Ok(match year {
        Some(year) => format!("{title} ({year})/{title} ({year}).mkv"),
        None => format!("{title}/{title}.mkv"),
    })
}

pub fn movie_extra_path(title: &str, year: Option<i32>, extra_name: &str) -> Result<String, ModelError> {
    let title = sanitize(title)?;
    let extra_name = sanitize(extra_name)?;
    Ok(match year {
        Some(year) => format!("{title} ({year})/Extras/{extra_name}.mkv"),
        None => format!("{title}/Extras/{extra_name}.mkv"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tv_main_path_matches_spec_shape() {
        let path = tv_main_path("The Wire", 1, 1, "The Target").unwrap();
        assert_eq!(path, "The Wire/Season 01/The Wire - S01E01 - The Target.mkv");
    }

    #[test]
    fn movie_path_with_year() {
        let path = movie_main_path("Heat", Some(1995)).unwrap();
        assert_eq!(path, "Heat (1995)/Heat (1995).mkv");
    }

    #[test]
    fn sanitization_strips_reserved_characters() {
        let path = movie_main_path("Se7en: Director's Cut?", None).unwrap();
        assert!(!path.contains(':'));
        assert!(!path.contains('?'));
    }
}
