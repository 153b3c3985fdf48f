use std::path::{Path, PathBuf};

use crate::{
    entry::{ConverterKind, EntryHandle, FileEntry},
    error::{FramedeckError, FramedeckResult},
    natsort::natural_cmp,
    undo::{UndoLog, UndoRecord},
};

/// Ordered collection of tracked files.
///
/// Invariants: handles are unique; the stored order is always the ascending
/// natural order of display names after any ingestion, rename, or undo;
/// removal keeps the relative order of survivors. The store is exclusively
/// owned by the coordinating component — transcode workers only ever receive
/// [`EntryStore::snapshot`] value copies.
#[derive(Debug)]
pub struct EntryStore {
    kind: ConverterKind,
    entries: Vec<FileEntry>,
    next_handle: u64,
    undo: UndoLog,
    dirty: bool,
    /// Display traversal direction only; never affects the stored order.
    sort_descending: bool,
}

impl EntryStore {
    pub fn new(kind: ConverterKind) -> Self {
        Self {
            kind,
            entries: Vec::new(),
            next_handle: 1,
            undo: UndoLog::default(),
            dirty: false,
            sort_descending: false,
        }
    }

    pub fn kind(&self) -> ConverterKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in canonical (ascending natural) order.
    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    /// Value snapshot for handing to a transcode worker.
    pub fn snapshot(&self) -> Vec<FileEntry> {
        self.entries.clone()
    }

    pub fn get(&self, handle: EntryHandle) -> Option<&FileEntry> {
        self.entries.iter().find(|e| e.handle == handle)
    }

    pub fn dirty(&self) -> bool {
        self.dirty
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn sort_descending(&self) -> bool {
        self.sort_descending
    }

    /// Flip the display traversal direction. Dead state as far as the
    /// transcoder is concerned; see `iter_display`.
    pub fn set_sort_descending(&mut self, descending: bool) {
        self.sort_descending = descending;
    }

    /// Walk entries in display order: canonical order, reversed when the
    /// descending toggle is set.
    pub fn iter_display(&self) -> Box<dyn Iterator<Item = &FileEntry> + '_> {
        if self.sort_descending {
            Box::new(self.entries.iter().rev())
        } else {
            Box::new(self.entries.iter())
        }
    }

    /// Validate and ingest one file. The display name starts as the source
    /// filename; the store re-sorts after the append.
    pub fn add(&mut self, path: impl Into<PathBuf>) -> FramedeckResult<EntryHandle> {
        let path = path.into();
        validate_source(self.kind, &path)?;
        let handle = self.append_entry(path);
        self.undo.push(UndoRecord::Add(vec![handle]));
        self.resort();
        self.dirty = true;
        Ok(handle)
    }

    /// Batch ingestion: invalid files become warnings instead of failing the
    /// batch, and the accepted entries share a single undo record.
    pub fn add_many(
        &mut self,
        paths: impl IntoIterator<Item = PathBuf>,
    ) -> (Vec<EntryHandle>, Vec<String>) {
        let mut handles = Vec::new();
        let mut warnings = Vec::new();
        for path in paths {
            match validate_source(self.kind, &path) {
                Ok(()) => handles.push(self.append_entry(path)),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "rejected during ingestion");
                    warnings.push(format!("{}: {e}", path.display()));
                }
            }
        }
        if !handles.is_empty() {
            self.undo.push(UndoRecord::Add(handles.clone()));
            self.resort();
            self.dirty = true;
        }
        (handles, warnings)
    }

    /// Delete matching entries, returning them in store order. Survivors
    /// keep their relative order.
    pub fn remove(&mut self, handles: &[EntryHandle]) -> Vec<FileEntry> {
        let removed = self.take_entries(handles);
        if !removed.is_empty() {
            self.undo.push(UndoRecord::Remove(removed.clone()));
            self.dirty = true;
        }
        removed
    }

    pub fn rename(&mut self, handle: EntryHandle, new_name: impl Into<String>) -> FramedeckResult<()> {
        let new_name = new_name.into();
        if new_name.is_empty() {
            return Err(FramedeckError::validation("display name must not be empty"));
        }
        let idx = self.index_of(handle)?;
        let old_names = self.capture_names();
        self.undo.push(UndoRecord::RenameAll(old_names));
        self.entries[idx].display_name = new_name;
        self.resort();
        self.dirty = true;
        Ok(())
    }

    /// Rename every entry to `{prefix}{i}{ext}` in current sorted order,
    /// starting at 1 and keeping each entry's extension. One undo step.
    pub fn rename_all(&mut self, prefix: &str) -> FramedeckResult<usize> {
        if prefix.is_empty() {
            return Err(FramedeckError::validation("rename prefix must not be empty"));
        }
        if self.entries.is_empty() {
            return Ok(0);
        }
        let old_names = self.capture_names();
        self.undo.push(UndoRecord::RenameAll(old_names));
        for (i, entry) in self.entries.iter_mut().enumerate() {
            let ext = Path::new(&entry.display_name)
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| format!(".{e}"))
                .unwrap_or_default();
            entry.display_name = format!("{prefix}{}{ext}", i + 1);
        }
        self.resort();
        self.dirty = true;
        Ok(self.entries.len())
    }

    pub fn set_note(&mut self, handle: EntryHandle, note: impl Into<String>) -> FramedeckResult<()> {
        let idx = self.index_of(handle)?;
        let old = std::mem::replace(&mut self.entries[idx].note, note.into());
        self.undo.push(UndoRecord::EditNote(handle, old));
        self.dirty = true;
        Ok(())
    }

    pub fn set_repeat(&mut self, handle: EntryHandle, count: u32) -> FramedeckResult<()> {
        if count < 1 {
            return Err(FramedeckError::validation("repeat count must be at least 1"));
        }
        let idx = self.index_of(handle)?;
        let old = std::mem::replace(&mut self.entries[idx].repeat_count, count);
        self.undo.push(UndoRecord::EditRepeat(handle, old));
        self.dirty = true;
        Ok(())
    }

    pub fn set_all_repeats(&mut self, count: u32) -> FramedeckResult<()> {
        if count < 1 {
            return Err(FramedeckError::validation("repeat count must be at least 1"));
        }
        if self.entries.is_empty() {
            return Ok(());
        }
        let old = self
            .entries
            .iter()
            .map(|e| (e.handle, e.repeat_count))
            .collect();
        for entry in &mut self.entries {
            entry.repeat_count = count;
        }
        self.undo.push(UndoRecord::SetAllRepeats(old));
        self.dirty = true;
        Ok(())
    }

    /// Pop the most recent mutation and apply its inverse. Returns `false`
    /// when the log is empty.
    pub fn undo(&mut self) -> bool {
        let Some(record) = self.undo.pop() else {
            return false;
        };
        match record {
            UndoRecord::Add(handles) => {
                self.take_entries(&handles);
            }
            UndoRecord::Remove(entries) => {
                self.entries.extend(entries);
                self.resort();
            }
            UndoRecord::RenameAll(old_names) => {
                for (handle, name) in old_names {
                    if let Ok(idx) = self.index_of(handle) {
                        self.entries[idx].display_name = name;
                    }
                }
                self.resort();
            }
            UndoRecord::EditNote(handle, old) => {
                if let Ok(idx) = self.index_of(handle) {
                    self.entries[idx].note = old;
                }
            }
            UndoRecord::EditRepeat(handle, old) => {
                if let Ok(idx) = self.index_of(handle) {
                    self.entries[idx].repeat_count = old;
                }
            }
            UndoRecord::SetAllRepeats(old) => {
                for (handle, count) in old {
                    if let Ok(idx) = self.index_of(handle) {
                        self.entries[idx].repeat_count = count;
                    }
                }
            }
        }
        self.dirty = true;
        true
    }

    /// Replace the whole collection from a loaded session: fresh baseline,
    /// no undo history, not dirty.
    pub(crate) fn restore(&mut self, entries: Vec<FileEntry>, sort_descending: bool) {
        self.next_handle = entries
            .iter()
            .map(|e| e.handle.0)
            .max()
            .unwrap_or(0)
            + 1;
        self.entries = entries;
        self.sort_descending = sort_descending;
        self.resort();
        self.undo.clear();
        self.dirty = false;
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }

    fn append_entry(&mut self, path: PathBuf) -> EntryHandle {
        let handle = EntryHandle(self.next_handle);
        self.next_handle += 1;
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        self.entries.push(FileEntry {
            handle,
            source_path: path,
            display_name,
            repeat_count: 1,
            note: String::new(),
        });
        handle
    }

    fn take_entries(&mut self, handles: &[EntryHandle]) -> Vec<FileEntry> {
        let mut removed = Vec::new();
        self.entries.retain(|e| {
            if handles.contains(&e.handle) {
                removed.push(e.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    fn capture_names(&self) -> Vec<(EntryHandle, String)> {
        self.entries
            .iter()
            .map(|e| (e.handle, e.display_name.clone()))
            .collect()
    }

    fn index_of(&self, handle: EntryHandle) -> FramedeckResult<usize> {
        self.entries
            .iter()
            .position(|e| e.handle == handle)
            .ok_or_else(|| FramedeckError::validation(format!("unknown entry handle {handle:?}")))
    }

    // Stable sort: identical names keep insertion order.
    fn resort(&mut self) {
        self.entries
            .sort_by(|a, b| natural_cmp(&a.display_name, &b.display_name));
    }
}

fn validate_source(kind: ConverterKind, path: &Path) -> FramedeckResult<()> {
    if !path.is_file() {
        return Err(FramedeckError::not_found(path));
    }
    match kind {
        ConverterKind::Image => {
            image::ImageReader::open(path)
                .map_err(|e| FramedeckError::validation(format!("unreadable image file: {e}")))?
                .with_guessed_format()
                .map_err(|e| FramedeckError::validation(format!("unreadable image file: {e}")))?
                .into_dimensions()
                .map_err(|e| FramedeckError::validation(format!("not a decodable image: {e}")))?;
            Ok(())
        }
        ConverterKind::Json => {
            let ok = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("json"));
            if ok {
                Ok(())
            } else {
                Err(FramedeckError::validation(
                    "json collections only accept .json files",
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json_store_with(names: &[&str]) -> (tempfile::TempDir, EntryStore) {
        let dir = tempfile::tempdir().unwrap();
        let mut store = EntryStore::new(ConverterKind::Json);
        for name in names {
            let path = dir.path().join(name);
            std::fs::write(&path, b"[]").unwrap();
            store.add(path).unwrap();
        }
        (dir, store)
    }

    fn names(store: &EntryStore) -> Vec<&str> {
        store.entries().iter().map(|e| e.display_name.as_str()).collect()
    }

    #[test]
    fn add_keeps_natural_order() {
        let (_dir, store) = json_store_with(&["clip10.json", "clip2.json", "clip1.json"]);
        assert_eq!(names(&store), ["clip1.json", "clip2.json", "clip10.json"]);
    }

    #[test]
    fn add_rejects_wrong_extension_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = EntryStore::new(ConverterKind::Json);

        let txt = dir.path().join("notes.txt");
        std::fs::write(&txt, b"x").unwrap();
        assert!(matches!(store.add(txt), Err(FramedeckError::Validation(_))));
        assert!(matches!(
            store.add(dir.path().join("gone.json")),
            Err(FramedeckError::NotFound(_))
        ));
        assert!(store.is_empty());
        assert!(!store.dirty());
    }

    #[test]
    fn remove_preserves_survivor_order() {
        let (_dir, mut store) = json_store_with(&["a1.json", "a2.json", "a3.json"]);
        let doomed = store.entries()[1].handle;
        let removed = store.remove(&[doomed]);
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].display_name, "a2.json");
        assert_eq!(names(&store), ["a1.json", "a3.json"]);
    }

    #[test]
    fn undo_add_removes_exactly_the_added_handles() {
        let (dir, mut store) = json_store_with(&["a1.json", "a3.json"]);
        let path = dir.path().join("a2.json");
        std::fs::write(&path, b"[]").unwrap();
        store.add(path).unwrap();
        assert_eq!(names(&store), ["a1.json", "a2.json", "a3.json"]);

        assert!(store.undo());
        assert_eq!(names(&store), ["a1.json", "a3.json"]);
    }

    #[test]
    fn undo_remove_restores_sorted_position() {
        let (_dir, mut store) = json_store_with(&["b1.json", "b2.json", "b10.json"]);
        let before = names(&store)
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>();
        let doomed = store.entries()[0].handle;
        store.remove(&[doomed]);
        assert!(store.undo());
        assert_eq!(names(&store), before);
    }

    #[test]
    fn rename_resorts_and_undo_restores() {
        let (_dir, mut store) = json_store_with(&["c1.json", "c2.json"]);
        let h = store.entries()[0].handle;
        store.rename(h, "c9.json").unwrap();
        assert_eq!(names(&store), ["c2.json", "c9.json"]);

        assert!(store.undo());
        assert_eq!(names(&store), ["c1.json", "c2.json"]);
    }

    #[test]
    fn rename_all_is_sequential_with_one_undo_step() {
        let (_dir, mut store) = json_store_with(&["z.json", "a.json", "m.json"]);
        store.rename_all("take").unwrap();
        assert_eq!(names(&store), ["take1.json", "take2.json", "take3.json"]);

        assert!(store.undo());
        assert_eq!(names(&store), ["a.json", "m.json", "z.json"]);
    }

    #[test]
    fn repeat_and_note_edits_are_reversible() {
        let (_dir, mut store) = json_store_with(&["d1.json"]);
        let h = store.entries()[0].handle;

        assert!(store.set_repeat(h, 0).is_err());
        store.set_repeat(h, 4).unwrap();
        store.set_note(h, "intro loop").unwrap();
        assert_eq!(store.get(h).unwrap().repeat_count, 4);
        assert_eq!(store.get(h).unwrap().note, "intro loop");

        assert!(store.undo());
        assert_eq!(store.get(h).unwrap().note, "");
        assert!(store.undo());
        assert_eq!(store.get(h).unwrap().repeat_count, 1);
    }

    #[test]
    fn set_all_repeats_undoes_to_mixed_counts() {
        let (_dir, mut store) = json_store_with(&["e1.json", "e2.json"]);
        let h0 = store.entries()[0].handle;
        store.set_repeat(h0, 3).unwrap();
        store.set_all_repeats(7).unwrap();
        assert!(store.entries().iter().all(|e| e.repeat_count == 7));

        assert!(store.undo());
        assert_eq!(store.get(h0).unwrap().repeat_count, 3);
        assert_eq!(store.entries()[1].repeat_count, 1);
    }

    #[test]
    fn undo_on_empty_log_is_a_noop() {
        let mut store = EntryStore::new(ConverterKind::Json);
        assert!(!store.undo());
    }

    #[test]
    fn display_iteration_honors_reverse_toggle_without_touching_store_order() {
        let (_dir, mut store) = json_store_with(&["f1.json", "f2.json"]);
        store.set_sort_descending(true);
        let display: Vec<_> = store
            .iter_display()
            .map(|e| e.display_name.as_str())
            .collect();
        assert_eq!(display, ["f2.json", "f1.json"]);
        assert_eq!(names(&store), ["f1.json", "f2.json"]);
    }
}
