use regex::Regex;
use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

use crate::{
    config::SorterConfig,
    movie::{MovieIdentity, year_label},
    overrides::Overrides,
    reconcile::{ReconciledEpisode, ReconciledMovie},
    tv::TvIdentity,
    video::episode_id,
};

/// Where a sorted file ends up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedName {
    pub directory: PathBuf,
    /// Includes the extension.
    pub filename: String,
}

impl ResolvedName {
    pub fn path(&self) -> PathBuf {
        self.directory.join(&self.filename)
    }

    /// Filename without the extension, as shown in log lines.
    pub fn display_name<'a>(&'a self, extension: &str) -> &'a str {
        self.filename
            .strip_suffix(extension)
            .unwrap_or(&self.filename)
    }
}

/// Tokens fully matching `pattern` tag the filename with `label`.
#[derive(Debug, Clone)]
pub struct MetainfoRule {
    pub pattern: Regex,
    pub label: String,
}

static RE_LEADING_THE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?i:the)\s+(.+)$").unwrap());

/// "The Matrix" -> "Matrix, The"
pub fn suffix_the(title: &str) -> String {
    match RE_LEADING_THE.captures(title) {
        Some(caps) => format!("{}, The", &caps[1]),
        None => title.to_string(),
    }
}

fn path_segment(title: &str) -> String {
    title.replace('/', "-")
}

/// Turn a provider title into the title used in paths: display override,
/// optional article suffix, slash sanitization.
pub fn display_title(title: &str, overrides: &Overrides, suffix: bool) -> String {
    let title = overrides.apply(title);
    let title = if suffix { suffix_the(&title) } else { title };
    path_segment(&title)
}

/// Labels of every rule matched by some token, in rule order, each once.
pub fn metainfo_tags(tokens: &[String], rules: &[MetainfoRule]) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for rule in rules {
        let matched = tokens.iter().any(|token| rule.pattern.is_match(token));
        if matched && !tags.contains(&rule.label) {
            tags.push(rule.label.clone());
        }
    }
    tags
}

pub fn format_tv(
    destination: &Path,
    identity: &TvIdentity,
    reconciled: &ReconciledEpisode,
    extension: &str,
    config: &SorterConfig,
) -> ResolvedName {
    let series = display_title(
        &reconciled.series_title,
        &config.tv_name_overrides,
        config.suffix_the,
    );

    ResolvedName {
        directory: destination
            .join(&series)
            .join(format!("Season {}", identity.season)),
        filename: format!(
            "{} - {} - {}{}",
            series,
            episode_id(identity.season, identity.episode),
            path_segment(&reconciled.episode_title),
            extension
        ),
    }
}

pub fn format_movie(
    destination: &Path,
    identity: &MovieIdentity,
    reconciled: &ReconciledMovie,
    extension: &str,
    config: &SorterConfig,
    tag_metainfo: bool,
) -> ResolvedName {
    let movie = display_title(
        &reconciled.title,
        &config.movie_name_overrides,
        config.suffix_the,
    );
    let name = format!("{} ({})", movie, year_label(reconciled.year));

    let tags = if tag_metainfo {
        metainfo_tags(&identity.tokens, &config.metainfo_map)
    } else {
        Vec::new()
    };
    let filename = if tags.is_empty() {
        format!("{}{}", name, extension)
    } else {
        format!("{} - [{}]{}", name, tags.join(" "), extension)
    };

    ResolvedName {
        directory: destination.join(&name),
        filename,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn config(suffix: bool) -> SorterConfig {
        let mut config = Config::default();
        config.parameters.suffix_the = suffix;
        config
            .name_overrides
            .tv
            .insert("Doctor Who (2005)".to_string(), "Doctor Who".to_string());
        config.parameters.metainfo_map = [
            ("(?i)2160p|4k", "4K"),
            ("(?i)1080p", "1080p"),
            ("(?i)hdr|hdr10", "HDR"),
            ("(?i)x265|hevc", "HEVC"),
        ]
        .into_iter()
        .map(|(pattern, label)| crate::config::MetainfoEntry {
            pattern: pattern.to_string(),
            label: label.to_string(),
        })
        .collect();
        config.sorter_config().unwrap()
    }

    fn tokens(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    fn tv_identity(season: u32, episode: u32) -> TvIdentity {
        TvIdentity {
            search_title: "show".to_string(),
            season,
            episode,
            title_token_end: 1,
            tokens: tokens(&["Show", "S01E01"]),
        }
    }

    fn movie_identity(items: &[&str]) -> MovieIdentity {
        MovieIdentity {
            search_title: "matrix".to_string(),
            year: Some(1999),
            title_token_end: 2,
            tokens: tokens(items),
        }
    }

    #[test]
    fn test_suffix_the() {
        assert_eq!(suffix_the("The Matrix"), "Matrix, The");
        assert_eq!(suffix_the("the   office"), "office, The");
        assert_eq!(suffix_the("Theodore Rex"), "Theodore Rex");
        assert_eq!(suffix_the("The"), "The");
    }

    #[test]
    fn test_format_tv() {
        let reconciled = ReconciledEpisode {
            series_title: "Doctor Who (2005)".to_string(),
            episode_title: "Rise of the Cybermen".to_string(),
        };
        let resolved = format_tv(Path::new("/media/tv"), &tv_identity(2, 5), &reconciled, ".mkv", &config(true));

        assert_eq!(resolved.directory, Path::new("/media/tv/Doctor Who/Season 2"));
        assert_eq!(resolved.filename, "Doctor Who - S02E05 - Rise of the Cybermen.mkv");
        assert_eq!(
            resolved.path(),
            Path::new("/media/tv/Doctor Who/Season 2/Doctor Who - S02E05 - Rise of the Cybermen.mkv")
        );
        assert_eq!(resolved.display_name(".mkv"), "Doctor Who - S02E05 - Rise of the Cybermen");
    }

    #[test]
    fn test_format_tv_suffix_the_and_slashes() {
        let reconciled = ReconciledEpisode {
            series_title: "The Office (US/UK)".to_string(),
            episode_title: "Pilot".to_string(),
        };
        let resolved = format_tv(Path::new("/tv"), &tv_identity(1, 12), &reconciled, ".avi", &config(true));
        assert_eq!(resolved.directory, Path::new("/tv/Office (US-UK), The/Season 1"));
        assert_eq!(resolved.filename, "Office (US-UK), The - S01E12 - Pilot.avi");
    }

    #[test]
    fn test_format_movie_suffix_the() {
        let reconciled = ReconciledMovie {
            title: "The Matrix".to_string(),
            year: Some(1999),
        };
        let resolved = format_movie(
            Path::new("/movies"),
            &movie_identity(&["The", "Matrix", "1999"]),
            &reconciled,
            ".mkv",
            &config(true),
            false,
        );
        assert_eq!(resolved.directory, Path::new("/movies/Matrix, The (1999)"));
        assert_eq!(resolved.filename, "Matrix, The (1999).mkv");

        let resolved = format_movie(
            Path::new("/movies"),
            &movie_identity(&["The", "Matrix", "1999"]),
            &reconciled,
            ".mkv",
            &config(false),
            false,
        );
        assert_eq!(resolved.filename, "The Matrix (1999).mkv");
    }

    #[test]
    fn test_format_movie_unknown_year() {
        let reconciled = ReconciledMovie {
            title: "AC/DC: Live".to_string(),
            year: None,
        };
        let resolved = format_movie(Path::new("/m"), &movie_identity(&["acdc", "live"]), &reconciled, ".mp4", &config(false), false);
        assert_eq!(resolved.directory, Path::new("/m/AC-DC: Live (0000)"));
        assert_eq!(resolved.filename, "AC-DC: Live (0000).mp4");
    }

    #[test]
    fn test_format_movie_metainfo_tags() {
        let reconciled = ReconciledMovie {
            title: "Dune".to_string(),
            year: Some(2021),
        };
        let identity = movie_identity(&["Dune", "2021", "HEVC", "HDR", "1080p", "x265", "hdr10"]);
        let resolved = format_movie(Path::new("/m"), &identity, &reconciled, ".mkv", &config(false), true);
        assert_eq!(resolved.filename, "Dune (2021) - [1080p HDR HEVC].mkv");
        assert_eq!(resolved.directory, Path::new("/m/Dune (2021)"));
    }

    #[test]
    fn test_format_movie_metainfo_without_matches() {
        let reconciled = ReconciledMovie {
            title: "Dune".to_string(),
            year: Some(2021),
        };
        let identity = movie_identity(&["Dune", "2021", "WEB"]);
        let resolved = format_movie(Path::new("/m"), &identity, &reconciled, ".mkv", &config(false), true);
        assert_eq!(resolved.filename, "Dune (2021).mkv");
    }

    #[test]
    fn test_metainfo_tags_rule_order_and_uniqueness() {
        let config = config(false);
        let tags = metainfo_tags(&tokens(&["x265", "2160p", "HEVC", "4K"]), &config.metainfo_map);
        assert_eq!(tags, vec!["4K", "HEVC"]);
    }

    #[test]
    fn test_metainfo_tags_require_full_token_match() {
        let config = config(false);
        let tags = metainfo_tags(&tokens(&["1080p-x265", "notHDR"]), &config.metainfo_map);
        assert!(tags.is_empty());
    }

    #[test]
    fn test_display_override_uses_provider_title() {
        let config = config(false);
        assert_eq!(display_title("Doctor Who (2005)", &config.tv_name_overrides, false), "Doctor Who");
        assert_eq!(display_title("doctor who", &config.tv_name_overrides, false), "doctor who");
    }
}
