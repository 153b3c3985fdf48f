use std::{
    fs,
    io::Write as _,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context as _;

use crate::error::{FramedeckError, FramedeckResult};

/// Delete attempts before giving up on a locked file.
pub const REMOVE_RETRIES: u32 = 5;
const REMOVE_BACKOFF: Duration = Duration::from_millis(50);

/// Write `bytes` to `path` atomically: the data lands in a temporary file in
/// the destination directory and is renamed over the target, so the target
/// is always either fully old or fully new.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> FramedeckResult<()> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let dir = match dir {
        Some(d) => d.to_path_buf(),
        None => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)
        .with_context(|| format!("create output directory '{}'", dir.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir)
        .with_context(|| format!("create temporary file in '{}'", dir.display()))?;
    tmp.write_all(bytes)
        .with_context(|| format!("write temporary file for '{}'", path.display()))?;
    tmp.as_file()
        .sync_all()
        .with_context(|| format!("sync temporary file for '{}'", path.display()))?;
    tmp.persist(path)
        .with_context(|| format!("replace '{}'", path.display()))?;
    Ok(())
}

/// Move a fully built temporary output into its final place. Same-volume
/// moves are a single atomic rename; a cross-volume failure falls back to
/// copy-then-delete-original.
pub fn promote(temp: &Path, dest: &Path) -> FramedeckResult<()> {
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create output directory '{}'", parent.display()))?;
    }

    match fs::rename(temp, dest) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(temp, dest).with_context(|| {
                format!("copy '{}' to '{}'", temp.display(), dest.display())
            })?;
            remove_with_retries(temp);
            Ok(())
        }
    }
}

/// Delete `path`, tolerating transient file-lock contention with a bounded
/// number of retries. Returns whether the file is gone.
pub fn remove_with_retries(path: &Path) -> bool {
    for attempt in 1..=REMOVE_RETRIES {
        match fs::remove_file(path) {
            Ok(()) => return true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return true,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    attempt,
                    error = %e,
                    "failed to remove temporary file"
                );
                if attempt < REMOVE_RETRIES {
                    std::thread::sleep(REMOVE_BACKOFF);
                }
            }
        }
    }
    false
}

/// Copy an existing file to a sibling `<name>.bak` before a destructive
/// overwrite. Returns the backup path.
pub fn backup_file(path: &Path) -> FramedeckResult<PathBuf> {
    if !path.is_file() {
        return Err(FramedeckError::not_found(path));
    }
    let mut backup = path.as_os_str().to_owned();
    backup.push(".bak");
    let backup = PathBuf::from(backup);
    fs::copy(path, &backup)
        .with_context(|| format!("back up '{}'", path.display()))?;
    Ok(backup)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_write_replaces_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.json");

        atomic_write(&target, b"first").unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"first");

        atomic_write(&target, b"second, longer payload").unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"second, longer payload");
    }

    #[test]
    fn promote_moves_temp_to_dest() {
        let dir = tempfile::tempdir().unwrap();
        let temp = dir.path().join("work.gif.tmp");
        let dest = dir.path().join("nested").join("final.gif");
        fs::write(&temp, b"gif bytes").unwrap();

        promote(&temp, &dest).unwrap();
        assert!(!temp.exists());
        assert_eq!(fs::read(&dest).unwrap(), b"gif bytes");
    }

    #[test]
    fn remove_with_retries_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(remove_with_retries(&dir.path().join("never-existed")));
    }

    #[test]
    fn backup_file_creates_bak_sibling() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("session.json");
        fs::write(&target, b"{}").unwrap();

        let bak = backup_file(&target).unwrap();
        assert_eq!(bak, dir.path().join("session.json.bak"));
        assert_eq!(fs::read(&bak).unwrap(), b"{}");

        assert!(matches!(
            backup_file(&dir.path().join("missing.json")),
            Err(FramedeckError::NotFound(_))
        ));
    }
}
