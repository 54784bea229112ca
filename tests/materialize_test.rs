//! Integration tests for project materialization
//!
//! Exercises the fetch-unpack-merge pipeline end to end with a real gzipped
//! tar snapshot, including the idempotent re-run over a stale install.

use std::fs;
use std::path::Path;

use async_trait::async_trait;
use codexec_installer::error::FetchError;
use codexec_installer::materialize::{materialize, unpack_into};
use codexec_installer::progress::NullProgressReporter;
use codexec_installer::{ArtifactFetcher, ProgressReporter};

/// Build a gzipped tar snapshot with the given (path, content) entries, all
/// under a single `app-main/` root.
fn build_snapshot(dest: &Path, entries: &[(&str, &str)]) {
    let file = fs::File::create(dest).unwrap();
    let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for (path, content) in entries {
        let full = format!("app-main/{}", path);
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, &full, content.as_bytes())
            .unwrap();
    }

    builder.into_inner().unwrap().finish().unwrap();
}

/// Fetcher that serves a pre-built local snapshot regardless of URL.
struct LocalFetcher {
    archive: std::path::PathBuf,
}

#[async_trait]
impl ArtifactFetcher for LocalFetcher {
    async fn fetch(
        &self,
        url: &str,
        dest: &Path,
        reporter: &dyn ProgressReporter,
    ) -> Result<(), FetchError> {
        self.fetch_verified(url, dest, None, reporter).await
    }

    async fn fetch_verified(
        &self,
        _url: &str,
        dest: &Path,
        _expected_sha256: Option<&str>,
        _reporter: &dyn ProgressReporter,
    ) -> Result<(), FetchError> {
        fs::copy(&self.archive, dest)?;
        Ok(())
    }
}

#[test]
fn unpack_merges_archive_root_children_into_target() {
    let scratch = tempfile::tempdir().unwrap();
    let archive = scratch.path().join("snapshot.tar.gz");
    build_snapshot(
        &archive,
        &[
            ("requirements.txt", "fastapi\n"),
            ("docker-compose.yml", "services: {}\n"),
            ("src/app.py", "print('hi')\n"),
        ],
    );

    let target = scratch.path().join("install");
    unpack_into(&archive, &target).unwrap();

    assert_eq!(
        fs::read_to_string(target.join("requirements.txt")).unwrap(),
        "fastapi\n"
    );
    assert_eq!(
        fs::read_to_string(target.join("src/app.py")).unwrap(),
        "print('hi')\n"
    );
    // No archive root folder leaks into the target.
    assert!(!target.join("app-main").exists());
}

#[test]
fn rerun_replaces_stale_entries_and_preserves_operator_files() {
    let scratch = tempfile::tempdir().unwrap();
    let archive = scratch.path().join("snapshot.tar.gz");
    build_snapshot(
        &archive,
        &[
            ("requirements.txt", "fastapi\n"),
            ("docker-compose.yml", "services: {api: {}}\n"),
        ],
    );

    let target = scratch.path().join("install");
    fs::create_dir_all(&target).unwrap();
    fs::write(target.join("docker-compose.yml"), "stale compose\n").unwrap();
    fs::write(target.join("notes.txt"), "operator notes\n").unwrap();

    unpack_into(&archive, &target).unwrap();

    // Same-named entries are replaced by the fresh archive content.
    assert_eq!(
        fs::read_to_string(target.join("docker-compose.yml")).unwrap(),
        "services: {api: {}}\n"
    );
    // Files outside the archive's namespace survive.
    assert_eq!(
        fs::read_to_string(target.join("notes.txt")).unwrap(),
        "operator notes\n"
    );
}

#[test]
fn rerun_is_idempotent() {
    let scratch = tempfile::tempdir().unwrap();
    let archive = scratch.path().join("snapshot.tar.gz");
    build_snapshot(
        &archive,
        &[
            ("requirements.txt", "fastapi\n"),
            ("src/app.py", "print('hi')\n"),
        ],
    );

    let target = scratch.path().join("install");
    unpack_into(&archive, &target).unwrap();
    unpack_into(&archive, &target).unwrap();

    assert_eq!(
        fs::read_to_string(target.join("requirements.txt")).unwrap(),
        "fastapi\n"
    );
    assert_eq!(
        fs::read_to_string(target.join("src/app.py")).unwrap(),
        "print('hi')\n"
    );
}

#[test]
fn directory_entries_are_replaced_wholesale() {
    let scratch = tempfile::tempdir().unwrap();
    let archive = scratch.path().join("snapshot.tar.gz");
    build_snapshot(&archive, &[("src/app.py", "fresh\n")]);

    let target = scratch.path().join("install");
    fs::create_dir_all(target.join("src")).unwrap();
    fs::write(target.join("src/legacy.py"), "old module\n").unwrap();

    unpack_into(&archive, &target).unwrap();

    // The stale directory is removed before the move, not merged into.
    assert!(!target.join("src/legacy.py").exists());
    assert_eq!(
        fs::read_to_string(target.join("src/app.py")).unwrap(),
        "fresh\n"
    );
}

#[tokio::test]
async fn materialize_fetches_and_unpacks() {
    let scratch = tempfile::tempdir().unwrap();
    let archive = scratch.path().join("snapshot.tar.gz");
    build_snapshot(&archive, &[("requirements.txt", "fastapi\n")]);

    let fetcher = LocalFetcher { archive };
    let target = scratch.path().join("install");

    materialize(
        &fetcher,
        "https://example.com/snapshot.tar.gz",
        None,
        &target,
        &NullProgressReporter,
    )
    .await
    .unwrap();

    assert!(target.join("requirements.txt").exists());
}
