use std::path::PathBuf;

/// Stable opaque id for a tracked file, unique within one store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct EntryHandle(pub(crate) u64);

impl EntryHandle {
    /// Build a handle from a raw id, for callers assembling an entry list
    /// outside a store.
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Which kind of source files a collection tracks and which conversions
/// apply to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ConverterKind {
    /// Decodable raster images; converts to a JSON frame list or a GIF.
    Image,
    /// JSON frame-list documents; merges or converts back to a GIF.
    Json,
}

impl std::fmt::Display for ConverterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConverterKind::Image => f.write_str("image"),
            ConverterKind::Json => f.write_str("json"),
        }
    }
}

/// One tracked file plus its metadata. Position in the store is implicit;
/// the store keeps its entries in ascending natural order of display name.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct FileEntry {
    pub handle: EntryHandle,
    pub source_path: PathBuf,
    pub display_name: String,
    /// Inclusive duplicate count for image entries: 1 means a single frame.
    pub repeat_count: u32,
    pub note: String,
}

impl FileEntry {
    /// Filename stem used when synthesizing frame names.
    pub fn base_stem(&self) -> &str {
        let name = self.display_name.as_str();
        match name.rfind('.') {
            Some(idx) if idx > 0 => &name[..idx],
            _ => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str) -> FileEntry {
        FileEntry {
            handle: EntryHandle(1),
            source_path: PathBuf::from(name),
            display_name: name.to_string(),
            repeat_count: 1,
            note: String::new(),
        }
    }

    #[test]
    fn base_stem_strips_final_extension() {
        assert_eq!(entry("frame01.png").base_stem(), "frame01");
        assert_eq!(entry("a.b.png").base_stem(), "a.b");
        assert_eq!(entry("noext").base_stem(), "noext");
        assert_eq!(entry(".hidden").base_stem(), ".hidden");
    }
}
