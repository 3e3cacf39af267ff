use std::{
    fs::{self, File},
    io::{self, BufReader},
    path::{Path, PathBuf},
};

use flate2::read::GzDecoder;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::error::ProvisionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    TarGz,
}

impl ArchiveFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_ascii_lowercase();
        if name.ends_with(".zip") {
            Some(ArchiveFormat::Zip)
        } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(ArchiveFormat::TarGz)
        } else {
            None
        }
    }
}

/// What to do when the normalized directory already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizePolicy {
    /// Leave the existing directory alone and discard the fresh extraction.
    KeepExisting,
    /// Delete the existing directory and move the fresh extraction in.
    Replace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeOutcome {
    Renamed,
    KeptExisting,
    Replaced,
}

/// Unpacks `archive` into `dest`.
pub fn extract(archive: &Path, dest: &Path, format: ArchiveFormat) -> Result<(), ProvisionError> {
    let failed = |source| ProvisionError::Extraction {
        archive: archive.to_path_buf(),
        source,
    };

    let file = File::open(archive).map_err(failed)?;
    let reader = BufReader::new(file);
    match format {
        ArchiveFormat::Zip => {
            let mut zip = zip::ZipArchive::new(reader).map_err(|err| failed(err.into()))?;
            zip.extract(dest).map_err(|err| failed(err.into()))?;
        }
        ArchiveFormat::TarGz => {
            let mut tar = tar::Archive::new(GzDecoder::new(reader));
            tar.unpack(dest).map_err(failed)?;
        }
    }
    Ok(())
}

/// Unpacks `archive` into `dest` on the blocking pool, then deletes the archive.
pub async fn extract_and_remove(
    archive: &Path,
    dest: &Path,
    format: ArchiveFormat,
) -> Result<(), ProvisionError> {
    info!(archive = ?archive, dest = ?dest, "extracting");
    let (archive_path, dest_path) = (archive.to_path_buf(), dest.to_path_buf());
    tokio::task::spawn_blocking(move || extract(&archive_path, &dest_path, format))
        .await
        .map_err(|err| ProvisionError::Extraction {
            archive: archive.to_path_buf(),
            source: io::Error::other(format!("extract task join failure: {err}")),
        })??;

    fs::remove_file(archive)
        .map_err(|err| ProvisionError::io(format!("removing archive {:?}", archive), err))
}

/// Finds the first directory in `dir` (by name order) whose name starts with
/// `prefix`, ignoring case. `exclude` names an entry that never matches.
pub fn find_prefixed_dir(
    dir: &Path,
    prefix: &str,
    exclude: Option<&str>,
) -> Result<Option<PathBuf>, ProvisionError> {
    let prefix = prefix.to_lowercase();
    let entries =
        fs::read_dir(dir).map_err(|err| ProvisionError::io(format!("listing {:?}", dir), err))?;

    let mut matches = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| ProvisionError::io(format!("listing {:?}", dir), err))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if Some(name.as_str()) == exclude || !entry.path().is_dir() {
            continue;
        }
        if name.to_lowercase().starts_with(&prefix) {
            matches.push(entry.path());
        }
    }
    matches.sort();
    Ok(matches.into_iter().next())
}

/// Moves `extracted` to `target`, resolving an existing `target` per `policy`.
pub fn normalize_dir(
    extracted: &Path,
    target: &Path,
    policy: NormalizePolicy,
) -> Result<NormalizeOutcome, ProvisionError> {
    let outcome = if target.exists() {
        match policy {
            NormalizePolicy::KeepExisting => {
                warn!(existing = ?target, discarded = ?extracted, "keeping existing directory");
                fs::remove_dir_all(extracted).map_err(|err| {
                    ProvisionError::io(format!("removing {:?}", extracted), err)
                })?;
                return Ok(NormalizeOutcome::KeptExisting);
            }
            NormalizePolicy::Replace => {
                fs::remove_dir_all(target)
                    .map_err(|err| ProvisionError::io(format!("removing {:?}", target), err))?;
                NormalizeOutcome::Replaced
            }
        }
    } else {
        NormalizeOutcome::Renamed
    };

    fs::rename(extracted, target).map_err(|err| {
        ProvisionError::io(format!("renaming {:?} to {:?}", extracted, target), err)
    })?;
    Ok(outcome)
}

/// Archive files anywhere under `root`.
pub fn leftover_archives(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| ArchiveFormat::from_path(entry.path()).is_some())
        .map(|entry| entry.into_path())
        .collect()
}
