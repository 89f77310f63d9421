use anyhow::{Context, Result, bail};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, HashSet},
    path::{Path, PathBuf},
};

use crate::{
    format::MetainfoRule,
    metadata::{tmdb, tvdb},
    overrides::Overrides,
    video::normalize_extension,
};

/// Locations searched, in order, when no config path is given.
pub const DEFAULT_PATHS: &[&str] = &[
    "./mediasorter.toml",
    "~/.config/mediasorter/mediasorter.toml",
    "/etc/mediasorter/mediasorter.toml",
];

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub parameters: Parameters,

    /// Normalized search title -> query actually sent to the provider.
    #[serde(default)]
    pub search_overrides: BTreeMap<String, String>,

    #[serde(default)]
    pub name_overrides: NameOverrides,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub tvdb: TvdbConfig,

    #[serde(default)]
    pub tmdb: TmdbConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TvdbConfig {
    #[serde(default = "default_tvdb_url")]
    pub url: String,

    /// Project API key, overridden by `TVDB_API_KEY`.
    #[serde(default)]
    pub key: String,
}

fn default_tvdb_url() -> String {
    tvdb::BASE_URL.to_string()
}

impl Default for TvdbConfig {
    fn default() -> Self {
        Self {
            url: default_tvdb_url(),
            key: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TmdbConfig {
    #[serde(default = "default_tmdb_url")]
    pub url: String,

    /// Read access token, overridden by `TMDB_API_TOKEN`.
    #[serde(default)]
    pub key: String,
}

fn default_tmdb_url() -> String {
    tmdb::BASE_URL.to_string()
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            url: default_tmdb_url(),
            key: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Parameters {
    #[serde(default = "default_valid_extensions")]
    pub valid_extensions: Vec<String>,

    /// Tried in order; the first one giving `min_split_length` tokens is used.
    #[serde(default = "default_split_characters")]
    pub split_characters: Vec<char>,

    #[serde(default = "default_min_split_length")]
    pub min_split_length: usize,

    /// Rename "The Matrix" to "Matrix, The".
    #[serde(default)]
    pub suffix_the: bool,

    #[serde(default)]
    pub metainfo_map: Vec<MetainfoEntry>,
}

fn default_valid_extensions() -> Vec<String> {
    [".avi", ".mkv", ".mp4", ".m4v", ".mov", ".wmv", ".webm", ".mpg", ".ts"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_split_characters() -> Vec<char> {
    vec!['.', ' ', '_']
}

fn default_min_split_length() -> usize {
    3
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            valid_extensions: default_valid_extensions(),
            split_characters: default_split_characters(),
            min_split_length: default_min_split_length(),
            suffix_the: false,
            metainfo_map: Vec::new(),
        }
    }
}

/// One `[[parameters.metainfo_map]]` entry: tokens fully matching `pattern`
/// add `label` to the filename tag list.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetainfoEntry {
    pub pattern: String,
    pub label: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NameOverrides {
    #[serde(default)]
    pub tv: BTreeMap<String, String>,

    #[serde(default)]
    pub movie: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Also append log lines to `logfile`.
    #[serde(default)]
    pub file: bool,

    #[serde(default)]
    pub logfile: Option<PathBuf>,
}

/// Everything the parsing, matching and naming steps read, resolved once.
#[derive(Debug, Clone)]
pub struct SorterConfig {
    /// Lowercase, without the leading dot.
    pub valid_extensions: HashSet<String>,
    pub split_characters: Vec<char>,
    pub min_split_length: usize,
    pub suffix_the: bool,
    pub metainfo_map: Vec<MetainfoRule>,
    pub search_overrides: Overrides,
    pub tv_name_overrides: Overrides,
    pub movie_name_overrides: Overrides,
}

impl Config {
    /// Take API keys from `lookup` (normally the environment) when present.
    pub fn apply_env_keys(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("TVDB_API_KEY").filter(|key| !key.is_empty()) {
            self.api.tvdb.key = key;
        }
        if let Some(key) = lookup("TMDB_API_TOKEN").filter(|key| !key.is_empty()) {
            self.api.tmdb.key = key;
        }
    }

    pub fn validate(&self) -> Result<()> {
        let parameters = &self.parameters;
        if parameters.split_characters.is_empty() {
            bail!("parameters.split_characters cannot be empty");
        }
        if parameters.min_split_length == 0 {
            bail!("parameters.min_split_length must be at least 1");
        }
        if parameters.valid_extensions.is_empty() {
            bail!("parameters.valid_extensions cannot be empty");
        }
        if self.logging.file && self.logging.logfile.is_none() {
            bail!("logging.file is enabled but logging.logfile is not set");
        }
        Ok(())
    }

    pub fn sorter_config(&self) -> Result<SorterConfig> {
        let parameters = &self.parameters;

        let metainfo_map = parameters
            .metainfo_map
            .iter()
            .map(|entry| -> Result<MetainfoRule> {
                let pattern = Regex::new(&format!("^(?:{})$", entry.pattern))
                    .with_context(|| format!("Invalid metainfo pattern: {:?}", entry.pattern))?;
                Ok(MetainfoRule {
                    pattern,
                    label: entry.label.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(SorterConfig {
            valid_extensions: parameters
                .valid_extensions
                .iter()
                .map(|ext| normalize_extension(ext))
                .collect(),
            split_characters: parameters.split_characters.clone(),
            min_split_length: parameters.min_split_length,
            suffix_the: parameters.suffix_the,
            metainfo_map,
            search_overrides: Overrides::new(&self.search_overrides),
            tv_name_overrides: Overrides::new(&self.name_overrides.tv),
            movie_name_overrides: Overrides::new(&self.name_overrides.movie),
        })
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    parse_config(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content)?;
    config.validate()?;
    config.sorter_config()?;
    Ok(config)
}

/// Load config from `custom_path`, else the first default location that
/// exists, else built-in defaults.
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    for path_str in DEFAULT_PATHS {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}
