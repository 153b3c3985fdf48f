use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::{
    entry::{ConverterKind, EntryHandle, FileEntry},
    error::{FramedeckError, FramedeckResult},
    fsutil,
    store::EntryStore,
};

/// On-disk snapshot of a collection. Opaque between versions: no
/// cross-version compatibility is promised, and anything serde cannot read
/// is reported as a corrupt session.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct SessionDocument {
    converter: ConverterKind,
    sort_descending: bool,
    entries: Vec<SessionEntry>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct SessionEntry {
    path: PathBuf,
    display_name: String,
    repeat_count: u32,
    note: String,
}

/// Serialize the store snapshot to `path`. The payload is staged in a
/// temporary file in the same directory and atomically renamed over the
/// target, so a crash never leaves a half-written session. Clears the
/// store's dirty flag on success.
pub fn save_session(store: &mut EntryStore, path: &Path) -> FramedeckResult<()> {
    let doc = SessionDocument {
        converter: store.kind(),
        sort_descending: store.sort_descending(),
        entries: store
            .entries()
            .iter()
            .map(|e| SessionEntry {
                path: e.source_path.clone(),
                display_name: e.display_name.clone(),
                repeat_count: e.repeat_count,
                note: e.note.clone(),
            })
            .collect(),
    };
    let bytes = serde_json::to_vec_pretty(&doc)
        .with_context(|| format!("serialize session '{}'", path.display()))?;
    fsutil::atomic_write(path, &bytes)?;
    store.mark_clean();
    tracing::debug!(path = %path.display(), entries = doc.entries.len(), "session saved");
    Ok(())
}

/// Load a session from `path` into `store`, which must track the same
/// converter kind the session was saved with. On success the store's
/// contents are fully replaced, its undo log is cleared (a load is a fresh
/// baseline), and the dirty flag is reset. On any failure — unreadable
/// payload or kind mismatch — the store is left untouched.
pub fn load_session(store: &mut EntryStore, path: &Path) -> FramedeckResult<()> {
    let bytes = std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            FramedeckError::not_found(path)
        } else {
            FramedeckError::corrupt_session(format!("unreadable session file: {e}"))
        }
    })?;
    let doc: SessionDocument = serde_json::from_slice(&bytes)
        .map_err(|e| FramedeckError::corrupt_session(format!("invalid session payload: {e}")))?;

    if doc.converter != store.kind() {
        return Err(FramedeckError::corrupt_session(format!(
            "session was saved for {} collections, this one tracks {}",
            doc.converter,
            store.kind()
        )));
    }

    let entries = doc
        .entries
        .into_iter()
        .enumerate()
        .map(|(i, e)| FileEntry {
            handle: EntryHandle(i as u64 + 1),
            source_path: e.path,
            display_name: e.display_name,
            repeat_count: e.repeat_count.max(1),
            note: e.note,
        })
        .collect();
    store.restore(entries, doc.sort_descending);
    tracing::debug!(path = %path.display(), entries = store.len(), "session loaded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populated_store(dir: &Path) -> EntryStore {
        let mut store = EntryStore::new(ConverterKind::Json);
        for name in ["s2.json", "s1.json"] {
            let p = dir.join(name);
            std::fs::write(&p, b"[]").unwrap();
            store.add(p).unwrap();
        }
        let h = store.entries()[0].handle;
        store.set_repeat(h, 3).unwrap();
        store.set_note(h, "hold").unwrap();
        store.set_sort_descending(true);
        store
    }

    #[test]
    fn save_then_load_reproduces_everything() {
        let dir = tempfile::tempdir().unwrap();
        let session = dir.path().join("session.json");

        let mut store = populated_store(dir.path());
        assert!(store.dirty());
        save_session(&mut store, &session).unwrap();
        assert!(!store.dirty());

        let mut restored = EntryStore::new(ConverterKind::Json);
        load_session(&mut restored, &session).unwrap();

        assert_eq!(restored.len(), 2);
        assert!(restored.sort_descending());
        assert_eq!(restored.entries()[0].display_name, "s1.json");
        assert_eq!(restored.entries()[0].repeat_count, 3);
        assert_eq!(restored.entries()[0].note, "hold");
        assert_eq!(
            restored.entries()[1].source_path,
            store.entries()[1].source_path
        );
        assert!(!restored.dirty());
        assert_eq!(restored.undo_depth(), 0);
    }

    #[test]
    fn load_resets_undo_history() {
        let dir = tempfile::tempdir().unwrap();
        let session = dir.path().join("session.json");
        let mut store = populated_store(dir.path());
        save_session(&mut store, &session).unwrap();

        assert!(store.undo_depth() > 0);
        load_session(&mut store, &session).unwrap();
        assert_eq!(store.undo_depth(), 0);
        assert!(!store.undo());
    }

    #[test]
    fn kind_mismatch_is_corrupt_and_leaves_store_alone() {
        let dir = tempfile::tempdir().unwrap();
        let session = dir.path().join("session.json");
        let mut json_store = populated_store(dir.path());
        save_session(&mut json_store, &session).unwrap();

        let mut image_store = EntryStore::new(ConverterKind::Image);
        let err = load_session(&mut image_store, &session).unwrap_err();
        assert!(matches!(err, FramedeckError::CorruptSession(_)));
        assert!(image_store.is_empty());
    }

    #[test]
    fn garbage_payload_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let session = dir.path().join("session.json");
        std::fs::write(&session, b"{not json").unwrap();

        let mut store = EntryStore::new(ConverterKind::Json);
        assert!(matches!(
            load_session(&mut store, &session),
            Err(FramedeckError::CorruptSession(_))
        ));
    }

    #[test]
    fn missing_session_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = EntryStore::new(ConverterKind::Json);
        assert!(matches!(
            load_session(&mut store, &dir.path().join("nope.json")),
            Err(FramedeckError::NotFound(_))
        ));
    }
}
