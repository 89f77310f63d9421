use tracing::debug;

use crate::{
    error::{SortError, SortResult},
    metadata::{MovieCandidate, SeriesCandidate, TvMetadata},
    movie::year_label,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciledEpisode {
    pub series_title: String,
    pub episode_title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciledMovie {
    pub title: String,
    pub year: Option<u16>,
}

/// Episode titles become filename components: no slashes, no double quotes.
pub fn sanitize_episode_title(title: &str) -> String {
    title.replace('/', "-").replace('"', "")
}

/// Walk `candidates` in provider order and take the first series that has an
/// episode numbered `season`/`episode`. A failed lookup only rules out that
/// one series.
pub async fn reconcile_tv<P>(
    provider: &P,
    search_title: &str,
    season: u32,
    episode: u32,
    candidates: &[SeriesCandidate],
) -> SortResult<ReconciledEpisode>
where
    P: TvMetadata + ?Sized,
{
    for series in candidates {
        let lookup = match provider.lookup_episodes(&series.id, season, episode).await {
            Ok(lookup) => lookup,
            Err(err) => {
                debug!(series = %series.name, id = %series.id, error = %err, "episode lookup failed");
                continue;
            }
        };
        let Some(found) = lookup.episodes.first() else {
            debug!(series = %series.name, id = %series.id, "no matching episode");
            continue;
        };

        return Ok(ReconciledEpisode {
            series_title: lookup.series_name.unwrap_or_else(|| series.name.clone()),
            episode_title: sanitize_episode_title(&found.name),
        });
    }

    Err(SortError::NoCandidateMatch(search_title.to_string()))
}

/// Pick the movie whose release year matches `target_year`.
///
/// A lone candidate is always taken. Otherwise the first exact match (or the
/// first candidate at all when the filename had no year) wins; failing that,
/// the first candidate released one year either side.
pub fn reconcile_movie(
    search_title: &str,
    candidates: &[MovieCandidate],
    target_year: Option<u16>,
) -> SortResult<ReconciledMovie> {
    if let [only] = candidates {
        return Ok(ReconciledMovie {
            title: only.title.clone(),
            year: only.release_year,
        });
    }

    let mut fallback: Option<&MovieCandidate> = None;
    for movie in candidates {
        match target_year {
            None => return Ok(accept(movie)),
            Some(target) if movie.release_year == Some(target) => return Ok(accept(movie)),
            Some(target) => {
                let near = movie
                    .release_year
                    .is_some_and(|year| year.abs_diff(target) == 1);
                if near && fallback.is_none() {
                    debug!(
                        title = %movie.title,
                        year = %year_label(movie.release_year),
                        "keeping near-year candidate"
                    );
                    fallback = Some(movie);
                }
            }
        }
    }

    fallback
        .map(accept)
        .ok_or_else(|| SortError::NoCandidateMatch(search_title.to_string()))
}

fn accept(movie: &MovieCandidate) -> ReconciledMovie {
    ReconciledMovie {
        title: movie.title.clone(),
        year: movie.release_year,
    }
}
