//! Project materializer: fetch the packaged project snapshot, unpack it and
//! merge the archive root's children into the installation directory.
//!
//! Replacement rule: for every child of the archive's single top-level root,
//! any same-named entry under the target is removed first, then the new child
//! is moved into place. Re-running materialization over a stale install is
//! therefore idempotent, and operator files outside the archive's namespace
//! survive because the target directory is never deleted wholesale.

use flate2::read::GzDecoder;
use std::fs;
use std::path::{Path, PathBuf};
use tar::Archive;

use crate::error::InstallError;
use crate::fetch::ArtifactFetcher;
use crate::progress::ProgressReporter;

/// Fetch the project archive and materialize it into `target_dir`.
///
/// Failure here is fatal to the whole workflow: without project files no
/// later step is meaningful. Scratch directories are removed on success and
/// failure alike.
pub async fn materialize(
    fetcher: &dyn ArtifactFetcher,
    archive_url: &str,
    expected_sha256: Option<&str>,
    target_dir: &Path,
    reporter: &dyn ProgressReporter,
) -> Result<(), InstallError> {
    tracing::info!(
        "[Materializer] Materializing project into {}",
        target_dir.display()
    );

    let scratch = tempfile::tempdir()?;
    let archive_path = scratch.path().join("snapshot.tar.gz");

    reporter.emit(0, "Downloading project snapshot".to_string());
    fetcher
        .fetch_verified(archive_url, &archive_path, expected_sha256, reporter)
        .await?;

    unpack_into(&archive_path, target_dir)?;

    tracing::info!("[Materializer] Project files extracted successfully");
    Ok(())
}

/// Unpack `archive_path` (gzipped tar with a single top-level root folder)
/// and merge the root's children into `target_dir` with the remove-then-move
/// rule.
pub fn unpack_into(archive_path: &Path, target_dir: &Path) -> Result<(), InstallError> {
    let scratch = tempfile::tempdir()?;
    let unpack_dir = scratch.path().join("unpacked");
    fs::create_dir_all(&unpack_dir)?;

    let file = fs::File::open(archive_path)?;
    let tar = GzDecoder::new(file);
    let mut archive = Archive::new(tar);
    archive.set_preserve_permissions(false);
    archive.set_preserve_ownerships(false);
    archive
        .unpack(&unpack_dir)
        .map_err(|e| InstallError::Materialize(format!("Failed to unpack archive: {}", e)))?;

    let root = archive_root(&unpack_dir)?;
    tracing::debug!(
        "[Materializer] Archive root entry: {:?}",
        root.file_name().unwrap_or_default()
    );

    fs::create_dir_all(target_dir)?;

    for entry in fs::read_dir(&root)? {
        let entry = entry?;
        let dest = target_dir.join(entry.file_name());
        replace_entry(&entry.path(), &dest)?;
    }

    Ok(())
}

/// The archive must contain exactly one top-level directory.
fn archive_root(unpack_dir: &Path) -> Result<PathBuf, InstallError> {
    let mut entries = fs::read_dir(unpack_dir)?;
    let first = entries.next().transpose()?.ok_or_else(|| {
        InstallError::Materialize("Archive is empty".to_string())
    })?;
    if entries.next().is_some() {
        return Err(InstallError::Materialize(
            "Archive has more than one top-level entry".to_string(),
        ));
    }
    let path = first.path();
    if !path.is_dir() {
        return Err(InstallError::Materialize(format!(
            "Archive top-level entry {:?} is not a directory",
            first.file_name()
        )));
    }
    Ok(path)
}

/// Remove any pre-existing entry at `dest`, then move `source` into place.
fn replace_entry(source: &Path, dest: &Path) -> Result<(), InstallError> {
    match fs::symlink_metadata(dest) {
        Ok(metadata) => {
            if metadata.is_dir() {
                fs::remove_dir_all(dest)?;
            } else {
                fs::remove_file(dest)?;
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(InstallError::Io(e)),
    }

    if fs::rename(source, dest).is_err() {
        // Rename across filesystems fails; fall back to copy.
        if source.is_dir() {
            copy_dir_recursive(source, dest)?;
            fs::remove_dir_all(source)?;
        } else {
            fs::copy(source, dest)?;
            fs::remove_file(source)?;
        }
    }
    Ok(())
}

/// Recursively copy a directory, preserving symlinks.
fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<(), InstallError> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let path = entry.path();
        let dst_path = dst.join(entry.file_name());
        let metadata = fs::symlink_metadata(&path)?;

        if metadata.is_dir() {
            copy_dir_recursive(&path, &dst_path)?;
        } else if metadata.file_type().is_symlink() {
            let link_target = fs::read_link(&path)?;
            #[cfg(unix)]
            std::os::unix::fs::symlink(&link_target, &dst_path)?;
            #[cfg(not(unix))]
            {
                let _ = link_target;
                fs::copy(&path, &dst_path)?;
            }
        } else {
            fs::copy(&path, &dst_path)?;
        }
    }
    Ok(())
}
