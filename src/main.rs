use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use mediasort::{
    action::{Action, ActionOptions, Ownership},
    config::{Config, LoggingConfig, load_config_or_default},
    metadata::{tmdb::TmdbClient, tvdb::TvdbClient},
    sorter::{BatchReport, Outcome, SortRequest, Sorter},
    video::MediaKind,
};
use std::{
    fs::OpenOptions,
    path::{Path, PathBuf},
    process::ExitCode,
    sync::Mutex,
};
use tabled::{Table, Tabled, settings::Style};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File or directory to sort
    srcpath: String,

    /// Library root the sorted files are placed under
    #[arg(short, long, default_value = "~/Media")]
    destination: String,

    /// Whether the source holds TV episodes or movies
    #[arg(short = 't', long = "type", value_enum)]
    kind: MediaKind,

    #[arg(short, long, value_enum, default_value_t = Action::Symlink)]
    action: Action,

    /// Write a <destination>.txt file naming the source
    #[arg(short, long)]
    infofile: bool,

    /// Write a <destination>.sha256sum checksum file
    #[arg(short, long)]
    shasum: bool,

    /// Set owner and permissions of sorted files
    #[arg(short = 'o', long)]
    chown: bool,

    #[arg(short, long, default_value = "root")]
    user: String,

    #[arg(short, long, default_value = "media")]
    group: String,

    #[arg(long, default_value = "0o644")]
    file_mode: String,

    #[arg(long, default_value = "0o755")]
    directory_mode: String,

    /// Append configured metainfo tags to movie filenames
    #[arg(long)]
    tag_metainfo: bool,

    /// Skip files whose destination already exists instead of replacing it
    #[arg(long)]
    no_upgrade: bool,

    /// Show what would be done without touching any file
    #[arg(short = 'x', long)]
    dryrun: bool,

    /// Ask before sorting each file
    #[arg(long)]
    confirm: bool,

    #[arg(short, long, env = "MEDIASORTER_CONFIG")]
    config: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool, logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "mediasort=debug,info"
        } else {
            "info"
        })
    });

    let file_layer = match (logging.file, &logging.logfile) {
        (true, Some(path)) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {:?}", path))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        _ => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .context("Failed to initialize logging")
}

fn expand_path(path: &str) -> Result<PathBuf> {
    let expanded = shellexpand::tilde(path);
    std::path::absolute(Path::new(expanded.as_ref()))
        .with_context(|| format!("Failed to resolve path {:?}", path))
}

impl Args {
    fn action_options(&self) -> Result<ActionOptions> {
        let ownership = if self.chown {
            Some(Ownership::resolve(
                &self.user,
                &self.group,
                &self.file_mode,
                &self.directory_mode,
            )?)
        } else {
            None
        };

        Ok(ActionOptions {
            action: self.action,
            dry_run: self.dryrun,
            upgrade: !self.no_upgrade,
            infofile: self.infofile,
            shasum: self.shasum,
            ownership,
            confirm: self.confirm,
        })
    }

    fn sort_request(&self) -> Result<SortRequest> {
        Ok(SortRequest {
            kind: self.kind,
            destination: expand_path(&self.destination)?,
            tag_metainfo: self.tag_metainfo,
            actions: self.action_options()?,
        })
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = load_config_or_default(path)?;
    config.apply_env_keys(|name| std::env::var(name).ok());
    Ok(config)
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Result")]
    label: &'static str,
    #[tabled(rename = "Files")]
    count: usize,
}

fn summary_table(report: &BatchReport) -> String {
    let rows = [
        SummaryRow {
            label: "sorted",
            count: report.succeeded(),
        },
        SummaryRow {
            label: "skipped",
            count: report.skipped(),
        },
        SummaryRow {
            label: "failed",
            count: report.failed(),
        },
    ];
    Table::new(rows).with(Style::rounded()).to_string()
}

fn print_report(report: &BatchReport) {
    for file in &report.files {
        let source = file.source.display();
        match &file.outcome {
            Outcome::Sorted(target) => {
                println!("{} {} -> {}", "sorted".green(), source, target.display())
            }
            Outcome::Planned(command) => println!("{} {}", "dryrun".cyan(), command),
            Outcome::Skipped(reason) => {
                println!("{} {}: {}", "skipped".yellow(), source, reason.dimmed())
            }
            Outcome::Failed(reason) => println!("{} {}: {}", "failed".red(), source, reason),
        }
    }
    if report.aborted {
        println!("{}", "Sorting aborted; remaining files were not visited".red());
    }
    println!("{}", summary_table(report));
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let config = load_config(args.config.as_deref())?;
    init_logging(args.verbose, &config.logging)?;

    let sorter_config = config.sorter_config()?;
    let source = expand_path(&args.srcpath)?;
    let request = args.sort_request()?;

    let tvdb = TvdbClient::new(&config.api.tvdb.url, &config.api.tvdb.key);
    let tmdb = TmdbClient::new(&config.api.tmdb.url, &config.api.tmdb.key);
    let sorter = Sorter::new(&sorter_config, &tvdb, &tmdb);

    tracing::info!(
        source = %source.display(),
        destination = %request.destination.display(),
        kind = %request.kind,
        "starting sort"
    );
    let report = sorter.sort_path(&source, &request).await;
    print_report(&report);

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediasort::sorter::FileReport;

    #[test]
    fn test_parse_defaults() {
        let args = Args::try_parse_from(["mediasort", "--type", "tv", "/downloads"]).unwrap();
        assert_eq!(args.srcpath, "/downloads");
        assert_eq!(args.destination, "~/Media");
        assert_eq!(args.kind, MediaKind::Tv);
        assert_eq!(args.action, Action::Symlink);

        let options = args.action_options().unwrap();
        assert!(options.upgrade);
        assert!(!options.dry_run);
        assert!(options.ownership.is_none());
    }

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from([
            "mediasort",
            "-t",
            "movie",
            "-a",
            "copy",
            "-d",
            "/library/movies",
            "-x",
            "-i",
            "-s",
            "--no-upgrade",
            "--tag-metainfo",
            "in",
        ])
        .unwrap();

        let request = args.sort_request().unwrap();
        assert_eq!(request.kind, MediaKind::Movie);
        assert_eq!(request.destination, Path::new("/library/movies"));
        assert!(request.tag_metainfo);
        assert_eq!(request.actions.action, Action::Copy);
        assert!(request.actions.dry_run);
        assert!(request.actions.infofile);
        assert!(request.actions.shasum);
        assert!(!request.actions.upgrade);
    }

    #[test]
    fn test_type_is_required() {
        assert!(Args::try_parse_from(["mediasort", "/downloads"]).is_err());
        assert!(Args::try_parse_from(["mediasort", "-t", "music", "/downloads"]).is_err());
    }

    #[test]
    fn test_expand_path() {
        let expanded = expand_path("relative/dir").unwrap();
        assert!(expanded.is_absolute());
        assert!(expanded.ends_with("relative/dir"));
        assert!(!expand_path("~/Media").unwrap().starts_with("~"));
    }

    #[test]
    fn test_summary_table() {
        let report = BatchReport {
            files: vec![
                FileReport {
                    source: PathBuf::from("a.mkv"),
                    outcome: Outcome::Sorted(PathBuf::from("/m/A (2000)/A (2000).mkv")),
                },
                FileReport {
                    source: PathBuf::from("b.txt"),
                    outcome: Outcome::Skipped("unsupported".to_string()),
                },
            ],
            aborted: false,
        };
        let table = summary_table(&report);
        assert!(table.contains("sorted"), "{}", table);
        assert!(table.contains("Files"), "{}", table);
        assert!(report.is_success());
    }
}
