use clap::ValueEnum;
use core::fmt;
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use crate::error::{SortError, SortResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MediaKind {
    Tv,
    Movie,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Tv => "TV Show",
            MediaKind::Movie => "Movie",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub fn episode_id(season: u32, episode: u32) -> String {
    format!("S{:02}E{:02}", season, episode)
}

/// Lowercase an extension and drop any leading dot so `".MKV"` and `"mkv"`
/// compare equal.
pub fn normalize_extension(ext: &str) -> String {
    ext.trim_start_matches('.').to_lowercase()
}

/// A source file split into the pieces the extractors work on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFilename {
    pub path: PathBuf,
    pub basename: String,
    pub stem: String,
    /// Extension including the leading dot, in its original case.
    pub extension: String,
}

impl RawFilename {
    /// Split `path` and check its extension against `valid_extensions`
    /// (normalized with [`normalize_extension`]).
    pub fn parse(path: &Path, valid_extensions: &HashSet<String>) -> SortResult<Self> {
        let unsupported = || SortError::UnsupportedExtension(path.to_path_buf());

        let basename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(unsupported)?;
        let ext = path
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
            .ok_or_else(unsupported)?;
        if !valid_extensions.contains(&normalize_extension(&ext)) {
            return Err(unsupported());
        }
        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .ok_or_else(unsupported)?;

        Ok(Self {
            path: path.to_path_buf(),
            basename,
            stem,
            extension: format!(".{}", ext),
        })
    }
}
