use crate::entry::{EntryHandle, FileEntry};

/// One reversible mutation of the entry store. Each variant carries exactly
/// the payload needed to invert the action it records.
#[derive(Clone, Debug)]
pub enum UndoRecord {
    /// Entries were ingested; inverting removes these handles.
    Add(Vec<EntryHandle>),
    /// Entries were deleted; inverting reinserts the captured values.
    Remove(Vec<FileEntry>),
    /// Display names changed; inverting restores every captured old name.
    RenameAll(Vec<(EntryHandle, String)>),
    EditNote(EntryHandle, String),
    EditRepeat(EntryHandle, u32),
    SetAllRepeats(Vec<(EntryHandle, u32)>),
}

/// Stack of undo records. Pushed on every mutation, popped (not replayed
/// forward) by undo. Single level per pop; there is no redo.
#[derive(Debug, Default)]
pub struct UndoLog {
    records: Vec<UndoRecord>,
}

impl UndoLog {
    pub fn push(&mut self, record: UndoRecord) {
        self.records.push(record);
    }

    pub fn pop(&mut self) -> Option<UndoRecord> {
        self.records.pop()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}
