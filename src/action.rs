use anyhow::Context;
use clap::ValueEnum;
use sha2::{Digest, Sha256};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use crate::{
    error::{SortError, SortResult},
    format::ResolvedName,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Action {
    Symlink,
    Hardlink,
    Copy,
    Move,
}

impl Action {
    /// The shell command equivalent, shown for dry runs.
    pub fn command(&self) -> &'static str {
        match self {
            Action::Symlink => "ln -s",
            Action::Hardlink => "ln",
            Action::Copy => "cp",
            Action::Move => "mv",
        }
    }
}

/// Owner and permission bits applied to sorted files when `--chown` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ownership {
    pub uid: u32,
    pub gid: u32,
    pub file_mode: u32,
    pub directory_mode: u32,
}

/// Parse an octal mode written as `0o644`, `0644` or `644`.
pub fn parse_mode(mode: &str) -> anyhow::Result<u32> {
    let digits = mode.trim_start_matches("0o").trim_start_matches("0O");
    u32::from_str_radix(digits, 8).with_context(|| format!("Invalid octal mode '{}'", mode))
}

impl Ownership {
    #[cfg(unix)]
    pub fn resolve(
        user: &str,
        group: &str,
        file_mode: &str,
        directory_mode: &str,
    ) -> anyhow::Result<Self> {
        use nix::unistd::{Group, User};

        let uid = User::from_name(user)?
            .with_context(|| format!("Unknown user '{}'", user))?
            .uid
            .as_raw();
        let gid = Group::from_name(group)?
            .with_context(|| format!("Unknown group '{}'", group))?
            .gid
            .as_raw();

        Ok(Self {
            uid,
            gid,
            file_mode: parse_mode(file_mode)?,
            directory_mode: parse_mode(directory_mode)?,
        })
    }

    #[cfg(not(unix))]
    pub fn resolve(_: &str, _: &str, _: &str, _: &str) -> anyhow::Result<Self> {
        anyhow::bail!("Changing ownership is only supported on unix")
    }

    #[cfg(unix)]
    fn apply(&self, path: &Path, mode: u32) -> SortResult<()> {
        use nix::unistd::{Gid, Uid, chown};
        use std::os::unix::fs::PermissionsExt;

        chown(
            path,
            Some(Uid::from_raw(self.uid)),
            Some(Gid::from_raw(self.gid)),
        )
        .map_err(|err| SortError::io(format!("Failed to chown {:?}", path), err.into()))?;
        fs::set_permissions(path, fs::Permissions::from_mode(mode))
            .map_err(|err| SortError::io(format!("Failed to chmod {:?}", path), err))
    }

    #[cfg(not(unix))]
    fn apply(&self, _: &Path, _: u32) -> SortResult<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ActionOptions {
    pub action: Action,
    pub dry_run: bool,
    /// Replace an existing destination instead of skipping the file.
    pub upgrade: bool,
    pub infofile: bool,
    pub shasum: bool,
    pub ownership: Option<Ownership>,
    pub confirm: bool,
}

impl Default for ActionOptions {
    fn default() -> Self {
        Self {
            action: Action::Symlink,
            dry_run: false,
            upgrade: true,
            infofile: false,
            shasum: false,
            ownership: None,
            confirm: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// Nothing was touched; carries the equivalent shell command.
    DryRun(String),
    Done(PathBuf),
}

fn sidecar(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Whether `a` and `b` resolve to the same file on disk.
fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn confirm(action: Action, source: &Path, target: &Path) -> SortResult<()> {
    let question = format!("{} {:?} -> {:?}?", action.command(), source, target);
    match inquire::Confirm::new(&question).with_default(true).prompt() {
        Ok(true) => Ok(()),
        Ok(false) => Err(SortError::Declined(source.to_path_buf())),
        Err(
            inquire::InquireError::OperationCanceled | inquire::InquireError::OperationInterrupted,
        ) => Err(SortError::Aborted),
        Err(err) => Err(SortError::io(
            "Confirmation prompt failed",
            io::Error::other(err.to_string()),
        )),
    }
}

fn commit(action: Action, source: &Path, target: &Path) -> io::Result<()> {
    match action {
        Action::Symlink => symlink(source, target),
        Action::Hardlink => fs::hard_link(source, target),
        Action::Copy => fs::copy(source, target).map(|_| ()),
        Action::Move => match fs::rename(source, target) {
            Err(err) if err.kind() == io::ErrorKind::CrossesDevices => {
                fs::copy(source, target)?;
                fs::remove_file(source)
            }
            result => result,
        },
    }
}

#[cfg(unix)]
fn symlink(source: &Path, target: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(source, target)
}

#[cfg(windows)]
fn symlink(source: &Path, target: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(source, target)
}

fn write_infofile(source: &Path, target: &Path) -> SortResult<PathBuf> {
    let path = sidecar(target, ".txt");
    let filename = source
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default();
    let directory = source
        .parent()
        .map(|dir| dir.to_string_lossy())
        .unwrap_or_default();
    let contents = format!(
        "Source filename:  {}\nSource directory: {}\n",
        filename, directory
    );
    fs::write(&path, contents)
        .map_err(|err| SortError::io(format!("Failed to write {:?}", path), err))?;
    Ok(path)
}

/// Hex SHA-256 of the file at `path`.
pub fn sha256_file(path: &Path) -> io::Result<String> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Write `<target>.sha256sum` in `sha256sum -b` format.
fn write_shasum(target: &Path) -> SortResult<PathBuf> {
    let path = sidecar(target, ".sha256sum");
    let digest = sha256_file(target)
        .map_err(|err| SortError::io(format!("Failed to hash {:?}", target), err))?;
    fs::write(&path, format!("{} *{}\n", digest, target.display()))
        .map_err(|err| SortError::io(format!("Failed to write {:?}", path), err))?;
    Ok(path)
}

/// Put `source` at `resolved` the way `options` asks, then write the
/// requested sidecar files.
pub fn apply(source: &Path, resolved: &ResolvedName, options: &ActionOptions) -> SortResult<Applied> {
    let target = resolved.path();

    if options.dry_run {
        return Ok(Applied::DryRun(format!(
            "{} \"{}\" \"{}\"",
            options.action.command(),
            source.display(),
            target.display()
        )));
    }

    // Replacing the target would delete the source itself.
    if same_file(source, &target) {
        info!(destination = %target.display(), "file is already sorted");
        return Ok(Applied::Done(target));
    }

    if options.confirm {
        confirm(options.action, source, &target)?;
    }

    if !resolved.directory.is_dir() {
        info!(directory = %resolved.directory.display(), "creating target directory");
        fs::create_dir_all(&resolved.directory).map_err(|err| {
            SortError::io(format!("Failed to create {:?}", resolved.directory), err)
        })?;
        if let Some(ownership) = &options.ownership {
            ownership.apply(&resolved.directory, ownership.directory_mode)?;
        }
    }

    if fs::symlink_metadata(&target).is_ok() {
        if !options.upgrade {
            return Err(SortError::DestinationExists(target));
        }
        info!(destination = %target.display(), "removing existing destination file for upgrade");
        fs::remove_file(&target)
            .map_err(|err| SortError::io(format!("Failed to remove {:?}", target), err))?;
    }

    debug!(action = ?options.action, source = %source.display(), destination = %target.display(), "running sort action");
    commit(options.action, source, &target).map_err(|err| {
        SortError::io(
            format!("Failed to {} {:?} to {:?}", options.action.command(), source, target),
            err,
        )
    })?;

    let mut sidecars = Vec::new();
    if options.infofile {
        sidecars.push(write_infofile(source, &target)?);
    }
    if options.shasum {
        sidecars.push(write_shasum(&target)?);
    }

    if let Some(ownership) = &options.ownership {
        // chown/chmod follow symlinks and would change the source file.
        if options.action != Action::Symlink {
            ownership.apply(&target, ownership.file_mode)?;
        }
        for path in &sidecars {
            ownership.apply(path, ownership.file_mode)?;
        }
    }

    Ok(Applied::Done(target))
}
