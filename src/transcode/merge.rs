use std::path::Path;

use crate::{
    document::{AnimationDocument, Frame, MERGED_DOCUMENT_NAME},
    entry::FileEntry,
    error::{FramedeckError, FramedeckResult},
    fsutil,
    progress::{ProgressReporter, percent_of},
    transcode::{TranscodeReport, gif::read_document},
};

/// Merge frame-list documents in collection order.
///
/// Either document shape is accepted; each file's internal frame order is
/// preserved, and the concatenation follows the file-list order. A document
/// that fails to read or parse is skipped with a warning. The result is the
/// named wrapper shape.
pub fn merge_to_document(
    entries: &[FileEntry],
    progress: &dyn ProgressReporter,
) -> FramedeckResult<(AnimationDocument, Vec<String>)> {
    let mut merged: Vec<Frame> = Vec::new();
    let mut warnings = Vec::new();

    for (i, entry) in entries.iter().enumerate() {
        progress.report(
            percent_of(i, entries.len()),
            &format!("merging {}", entry.display_name),
        );
        match read_document(&entry.source_path) {
            Ok(doc) => merged.extend(doc.into_frames()),
            Err(e) => {
                tracing::warn!(file = %entry.display_name, error = %e, "skipping document");
                warnings.push(format!("{}: {e}", entry.display_name));
            }
        }
    }

    if merged.is_empty() {
        return Err(FramedeckError::NoValidInput);
    }

    Ok((
        AnimationDocument::Named {
            name: MERGED_DOCUMENT_NAME.to_string(),
            data: merged,
        },
        warnings,
    ))
}

/// Full merge conversion: concatenate every input document and place the
/// wrapper at `out` via temp-file-then-atomic-replace.
#[tracing::instrument(skip(entries, progress), fields(count = entries.len()))]
pub fn merge_json(
    entries: &[FileEntry],
    out: &Path,
    progress: &dyn ProgressReporter,
) -> FramedeckResult<TranscodeReport> {
    let (doc, warnings) = merge_to_document(entries, progress)?;
    let bytes = serde_json::to_vec_pretty(&doc)
        .map_err(|e| FramedeckError::encode(format!("serialize merged document: {e}")))?;
    fsutil::atomic_write(out, &bytes)?;
    let frames = doc.frame_count();
    progress.report(100, &format!("wrote {}", out.display()));
    Ok(TranscodeReport { frames, warnings })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryHandle;
    use crate::progress::NullProgress;

    fn entry(handle: u64, path: &Path) -> FileEntry {
        FileEntry {
            handle: EntryHandle(handle),
            source_path: path.to_path_buf(),
            display_name: path.file_name().unwrap().to_string_lossy().into_owned(),
            repeat_count: 1,
            note: String::new(),
        }
    }

    fn frame_json(name: &str) -> String {
        format!(r#"{{"name":"{name}","timestamp":1,"soft":false,"image_data":"data:image/png;base64,AA=="}}"#)
    }

    #[test]
    fn bare_plus_wrapper_merges_in_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let bare = dir.path().join("m1.json");
        std::fs::write(&bare, format!("[{},{}]", frame_json("a"), frame_json("b"))).unwrap();
        let wrapped = dir.path().join("m2.json");
        std::fs::write(
            &wrapped,
            format!(
                r#"{{"name":"old","data":[{},{},{}]}}"#,
                frame_json("c"),
                frame_json("d"),
                frame_json("e")
            ),
        )
        .unwrap();

        let entries = vec![entry(1, &bare), entry(2, &wrapped)];
        let (doc, warnings) = merge_to_document(&entries, &NullProgress).unwrap();
        assert!(warnings.is_empty());

        let AnimationDocument::Named { name, data } = doc else {
            panic!("merge must produce the wrapper shape");
        };
        assert_eq!(name, MERGED_DOCUMENT_NAME);
        let names: Vec<_> = data.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn unparsable_document_is_skipped_with_warning() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("n1.json");
        std::fs::write(&good, format!("[{}]", frame_json("x"))).unwrap();
        let bad = dir.path().join("n2.json");
        std::fs::write(&bad, b"{broken").unwrap();

        let entries = vec![entry(1, &good), entry(2, &bad)];
        let (doc, warnings) = merge_to_document(&entries, &NullProgress).unwrap();
        assert_eq!(doc.frame_count(), 1);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("n2.json"));
    }

    #[test]
    fn all_bad_inputs_fail_and_write_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("o1.json");
        std::fs::write(&bad, b"nope").unwrap();
        let out = dir.path().join("merged.json");

        assert!(matches!(
            merge_json(&[entry(1, &bad)], &out, &NullProgress),
            Err(FramedeckError::NoValidInput)
        ));
        assert!(!out.exists());
    }

    #[test]
    fn merge_json_round_trips_through_the_document_model() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("p1.json");
        std::fs::write(&src, format!("[{}]", frame_json("solo"))).unwrap();
        let out = dir.path().join("merged.json");

        let report = merge_json(&[entry(1, &src)], &out, &NullProgress).unwrap();
        assert_eq!(report.frames, 1);

        let reread: AnimationDocument =
            serde_json::from_slice(&std::fs::read(&out).unwrap()).unwrap();
        assert!(matches!(reread, AnimationDocument::Named { .. }));
        assert_eq!(reread.frame_count(), 1);
    }
}
