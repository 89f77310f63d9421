use sanitize_filename::{OptionsForCheck, is_sanitized_with_options};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::{
    action::{self, ActionOptions, Applied},
    config::SorterConfig,
    error::{SortError, SortResult},
    format::{ResolvedName, format_movie, format_tv},
    metadata::{MovieMetadata, TvMetadata},
    movie::{extract_movie, year_label},
    reconcile::{reconcile_movie, reconcile_tv},
    tokenize::tokenize,
    tv::extract_tv,
    video::{MediaKind, RawFilename, episode_id},
};

/// What to do with each file of a batch.
#[derive(Debug, Clone)]
pub struct SortRequest {
    pub kind: MediaKind,
    pub destination: PathBuf,
    pub tag_metainfo: bool,
    pub actions: ActionOptions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Sorted(PathBuf),
    /// Dry run; carries the command that would have run.
    Planned(String),
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub source: PathBuf,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
    /// The user stopped the batch before every file was visited.
    pub aborted: bool,
}

impl BatchReport {
    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.files.iter().filter(|file| pred(&file.outcome)).count()
    }

    pub fn succeeded(&self) -> usize {
        self.count(|outcome| matches!(outcome, Outcome::Sorted(_) | Outcome::Planned(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, Outcome::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, Outcome::Failed(_)))
    }

    pub fn is_success(&self) -> bool {
        !self.aborted && self.failed() == 0
    }
}

pub struct Sorter<'a> {
    config: &'a SorterConfig,
    tv: &'a dyn TvMetadata,
    movies: &'a dyn MovieMetadata,
}

/// Directory and file names of `resolved` that some filesystems reject.
fn unportable_names(resolved: &ResolvedName) -> Vec<String> {
    let directory = resolved
        .directory
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    [directory, resolved.filename.clone()]
        .into_iter()
        .filter(|name| {
            let options = OptionsForCheck {
                windows: true,
                truncate: true,
            };
            !is_sanitized_with_options(name, options)
        })
        .collect()
}

impl<'a> Sorter<'a> {
    pub fn new(
        config: &'a SorterConfig,
        tv: &'a dyn TvMetadata,
        movies: &'a dyn MovieMetadata,
    ) -> Self {
        Self { config, tv, movies }
    }

    fn split(&self, source: &Path) -> SortResult<(RawFilename, Vec<String>)> {
        let raw = RawFilename::parse(source, &self.config.valid_extensions)?;
        let tokens = tokenize(
            &raw.stem,
            &self.config.split_characters,
            self.config.min_split_length,
        )?;
        Ok((raw, tokens))
    }

    pub async fn resolve_tv(&self, source: &Path, destination: &Path) -> SortResult<ResolvedName> {
        let (raw, tokens) = self.split(source)?;
        let identity = extract_tv(&tokens, &self.config.search_overrides)?;
        info!(
            series = %identity.search_title,
            episode = %episode_id(identity.season, identity.episode),
            "raw file info"
        );

        let candidates = self
            .tv
            .search_series(&identity.search_title)
            .await
            .map_err(|source| SortError::MetadataLookupFailed {
                query: identity.search_title.clone(),
                source,
            })?;
        debug!(provider = self.tv.name(), count = candidates.len(), "series candidates");

        let reconciled = reconcile_tv(
            self.tv,
            &identity.search_title,
            identity.season,
            identity.episode,
            &candidates,
        )
        .await?;

        Ok(format_tv(
            destination,
            &identity,
            &reconciled,
            &raw.extension,
            self.config,
        ))
    }

    pub async fn resolve_movie(
        &self,
        source: &Path,
        destination: &Path,
        tag_metainfo: bool,
    ) -> SortResult<ResolvedName> {
        let (raw, tokens) = self.split(source)?;
        let identity = extract_movie(&tokens, &self.config.search_overrides);
        info!(
            movie = %identity.search_title,
            year = %year_label(identity.year),
            "raw file info"
        );

        let candidates = self
            .movies
            .search_movies(&identity.search_title)
            .await
            .map_err(|source| SortError::MetadataLookupFailed {
                query: identity.search_title.clone(),
                source,
            })?;
        debug!(provider = self.movies.name(), count = candidates.len(), "movie candidates");

        let reconciled = reconcile_movie(&identity.search_title, &candidates, identity.year)?;

        Ok(format_movie(
            destination,
            &identity,
            &reconciled,
            &raw.extension,
            self.config,
            tag_metainfo,
        ))
    }

    pub async fn resolve(
        &self,
        kind: MediaKind,
        source: &Path,
        destination: &Path,
        tag_metainfo: bool,
    ) -> SortResult<ResolvedName> {
        match kind {
            MediaKind::Tv => self.resolve_tv(source, destination).await,
            MediaKind::Movie => self.resolve_movie(source, destination, tag_metainfo).await,
        }
    }

    /// Resolve one file and hand it to the filesystem actor.
    pub async fn sort_file(&self, source: &Path, request: &SortRequest) -> SortResult<Applied> {
        let resolved = self
            .resolve(
                request.kind,
                source,
                &request.destination,
                request.tag_metainfo,
            )
            .await?;
        info!(destination = %resolved.path().display(), "sorted full filepath");
        for name in unportable_names(&resolved) {
            warn!(file_name = %name, "name contains characters that are not portable to every filesystem");
        }

        action::apply(source, &resolved, &request.actions)
    }

    /// Sort `source`, recursing depth-first through directories in filename
    /// order. A failing file is recorded and the walk moves on.
    pub async fn sort_path(&self, source: &Path, request: &SortRequest) -> BatchReport {
        let mut report = BatchReport::default();

        for entry in WalkDir::new(source).follow_links(true).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                    warn!(path = %path.display(), error = %err, "cannot read directory entry");
                    report.files.push(FileReport {
                        source: path,
                        outcome: Outcome::Failed(err.to_string()),
                    });
                    continue;
                }
            };
            if entry.file_type().is_dir() {
                continue;
            }

            let path = entry.path();
            debug!(path = %path.display(), kind = %request.kind, "parsing");
            let outcome = match self.sort_file(path, request).await {
                Ok(Applied::Done(target)) => Outcome::Sorted(target),
                Ok(Applied::DryRun(command)) => {
                    info!(command = %command, "sort command");
                    Outcome::Planned(command)
                }
                Err(SortError::Aborted) => {
                    warn!("sorting aborted");
                    report.aborted = true;
                    break;
                }
                Err(err @ SortError::UnsupportedExtension(_)) => {
                    debug!(path = %path.display(), "not a media file");
                    Outcome::Skipped(err.to_string())
                }
                Err(err) if err.is_skip() => {
                    info!(path = %path.display(), reason = %err, "skipping file");
                    Outcome::Skipped(err.to_string())
                }
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "failed to sort file");
                    Outcome::Failed(err.to_string())
                }
            };

            report.files.push(FileReport {
                source: path.to_path_buf(),
                outcome,
            });
        }

        report
    }
}
