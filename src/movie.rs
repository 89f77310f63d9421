use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::overrides::Overrides;

/// Title/year guess parsed from a tokenized filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieIdentity {
    pub search_title: String,
    /// `None` when the filename carries no year; matches any release year.
    pub year: Option<u16>,
    pub title_token_end: usize,
    pub tokens: Vec<String>,
}

static RE_YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\(?(\d{4})\)?$").unwrap());

/// Render a year the way it appears in library paths, `0000` when unknown.
pub fn year_label(year: Option<u16>) -> String {
    match year {
        Some(year) => format!("{:04}", year),
        None => "0000".to_string(),
    }
}

/// Find the release year in `tokens` and derive the `+`-joined search query
/// from the tokens before it.
///
/// The last year-looking token wins, so "2001.A.Space.Odyssey.1968" searches
/// for "2001+a+space+odyssey" from 1968.
pub fn extract_movie(tokens: &[String], search_overrides: &Overrides) -> MovieIdentity {
    let (title_token_end, year) = tokens
        .iter()
        .enumerate()
        .filter_map(|(idx, token)| {
            let caps = RE_YEAR.captures(token)?;
            Some((idx, caps[1].parse::<u16>().ok()?))
        })
        .last()
        .map_or((tokens.len(), None), |(idx, year)| (idx, Some(year)));
    let year = year.filter(|year| *year > 0);

    let query = tokens[..title_token_end]
        .iter()
        .map(|token| token.to_lowercase())
        .collect::<Vec<_>>()
        .join("+");
    let query = query.strip_prefix("the+").unwrap_or(&query);
    let search_title = search_overrides.apply(query);

    debug!(movie = %search_title, year = %year_label(year), "parsed movie filename");

    MovieIdentity {
        search_title,
        year,
        title_token_end,
        tokens: tokens.to_vec(),
    }
}
