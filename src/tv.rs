use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::{
    error::{SortError, SortResult},
    overrides::Overrides,
};

/// Season/episode guess parsed from a tokenized filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TvIdentity {
    pub search_title: String,
    pub season: u32,
    pub episode: u32,
    /// Index one past the last token that went into the title.
    pub title_token_end: usize,
    pub tokens: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    /// `S01E02`, ends the scan.
    SeasonEpisode,
    /// `S01`
    Season,
    /// `E02`
    Episode,
    /// `Episode`, with or without trailing digits.
    EpisodeWord,
}

/// Marker patterns in the order they are tried against each token.
pub static MARKER_RULES: LazyLock<[(MarkerKind, Regex); 4]> = LazyLock::new(|| {
    [
        (MarkerKind::SeasonEpisode, Regex::new(r"[Ss](\d+)[Ee](\d+)").unwrap()),
        (MarkerKind::Season, Regex::new(r"[Ss](\d+)").unwrap()),
        (MarkerKind::Episode, Regex::new(r"[Ee](\d+)").unwrap()),
        (MarkerKind::EpisodeWord, Regex::new(r"[Ee]pisode\D*(\d+)?").unwrap()),
    ]
});

static RE_SEASON_EPISODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[Ss]\d+[Ee]\d+").unwrap());

static RE_PAREN_YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\(\d{4}\)$").unwrap());

static RE_DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

#[derive(Debug, Default)]
struct MarkerScan {
    season: u32,
    episode: Option<u32>,
    split: Option<usize>,
    episode_in_next_token: bool,
}

impl MarkerScan {
    fn mark(&mut self, idx: usize) {
        self.split.get_or_insert(idx);
    }

    fn run(tokens: &[String]) -> Self {
        let mut scan = Self::default();

        'tokens: for (idx, token) in tokens.iter().enumerate() {
            let consume_digits = std::mem::take(&mut scan.episode_in_next_token);

            for (kind, pattern) in MARKER_RULES.iter() {
                let Some(caps) = pattern.captures(token) else {
                    continue;
                };
                let number = |group: usize| -> Option<u32> {
                    caps.get(group).and_then(|m| m.as_str().parse().ok())
                };

                match kind {
                    MarkerKind::SeasonEpisode => {
                        if let (Some(season), Some(episode)) = (number(1), number(2)) {
                            scan.season = season;
                            scan.episode = Some(episode);
                            scan.split = Some(idx);
                            break 'tokens;
                        }
                    }
                    MarkerKind::Season => {
                        if let Some(season) = number(1) {
                            scan.mark(idx);
                            scan.season = season;
                        }
                    }
                    MarkerKind::Episode => {
                        if let Some(episode) = number(1) {
                            scan.mark(idx);
                            scan.episode = Some(episode);
                        }
                    }
                    MarkerKind::EpisodeWord => {
                        scan.mark(idx);
                        match number(1) {
                            Some(episode) => scan.episode = Some(episode),
                            None => {
                                scan.episode_in_next_token = true;
                                continue 'tokens;
                            }
                        }
                    }
                }
            }

            if consume_digits {
                if let Some(episode) = RE_DIGITS
                    .find(token)
                    .and_then(|m| m.as_str().parse().ok())
                {
                    scan.episode = Some(episode);
                }
            }

            if scan.episode.is_some() {
                if scan.season == 0 {
                    scan.season = 1;
                }
                break;
            }
        }

        scan
    }
}

/// Find the season/episode marker in `tokens` and derive the series search
/// title from the tokens before it.
pub fn extract_tv(tokens: &[String], search_overrides: &Overrides) -> SortResult<TvIdentity> {
    let scan = MarkerScan::run(tokens);
    let Some(split) = scan.split else {
        return Err(SortError::NoMarkerFound(tokens.join(" ")));
    };
    // A season-only marker still identifies the series; the lookup decides
    // whether episode 0 exists.
    let episode = scan.episode.unwrap_or(0);

    // Titles glued to the marker ("DexterS01E03") keep the marker token.
    let title_token_end = if split == 0 { 1 } else { split };

    let raw_title = tokens[..title_token_end]
        .iter()
        .map(|token| RE_SEASON_EPISODE.replace_all(token, ""))
        .filter(|token| !RE_PAREN_YEAR.is_match(token))
        .map(|token| token.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");
    let search_title = search_overrides.apply(&raw_title);

    debug!(
        series = %search_title,
        season = scan.season,
        episode,
        "parsed TV filename"
    );

    Ok(TvIdentity {
        search_title,
        season: scan.season,
        episode,
        title_token_end,
        tokens: tokens.to_vec(),
    })
}
