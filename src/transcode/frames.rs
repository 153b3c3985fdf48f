use std::{collections::HashMap, io::Cursor, path::Path};

use image::codecs::png::PngEncoder;

use crate::{
    document::{Frame, encode_png_data_uri},
    entry::FileEntry,
    error::{FramedeckError, FramedeckResult},
    fsutil,
    progress::{ProgressReporter, percent_of},
    transcode::{TranscodeReport, now_epoch_ms},
};

/// Convert image entries to frames, in store order.
///
/// Each image is decoded, normalized to opaque 3-channel color, re-encoded
/// as PNG, and embedded as a base64 data URI. Frame names are the entry's
/// filename stem plus a running per-stem counter; an entry's repeat count
/// duplicates its frame that many times contiguously. A file that fails to
/// decode is excluded with a warning; an empty result is `NoValidInput`.
pub fn images_to_frames(
    entries: &[FileEntry],
    progress: &dyn ProgressReporter,
) -> FramedeckResult<(Vec<Frame>, Vec<String>)> {
    let mut frames = Vec::new();
    let mut warnings = Vec::new();
    let mut stem_counters: HashMap<String, u32> = HashMap::new();

    for (i, entry) in entries.iter().enumerate() {
        progress.report(
            percent_of(i, entries.len()),
            &format!("encoding {}", entry.display_name),
        );

        let rgb = match decode_rgb(&entry.source_path) {
            Ok(img) => img,
            Err(e) => {
                tracing::warn!(file = %entry.display_name, error = %e, "skipping image");
                warnings.push(format!("{}: {e}", entry.display_name));
                continue;
            }
        };

        let png = encode_png_rgb(&rgb)?;

        let counter = stem_counters
            .entry(entry.base_stem().to_string())
            .or_insert(0);
        *counter += 1;

        let frame = Frame {
            name: format!("{}{}", entry.base_stem(), counter),
            timestamp: now_epoch_ms(),
            soft: false,
            image_data: encode_png_data_uri(&png),
        };
        for _ in 0..entry.repeat_count.max(1) {
            frames.push(frame.clone());
        }
    }

    if frames.is_empty() {
        return Err(FramedeckError::NoValidInput);
    }
    Ok((frames, warnings))
}

/// Write a bare frame array document via temp-file-then-atomic-replace.
pub fn write_frames_document(frames: &[Frame], out: &Path) -> FramedeckResult<()> {
    let bytes = serde_json::to_vec_pretty(frames)
        .map_err(|e| FramedeckError::encode(format!("serialize frame list: {e}")))?;
    fsutil::atomic_write(out, &bytes)
}

/// Full images → JSON conversion: build the frame list and place it at
/// `out`. The destination is only touched once the document is fully built.
#[tracing::instrument(skip(entries, progress), fields(count = entries.len()))]
pub fn images_to_json(
    entries: &[FileEntry],
    out: &Path,
    progress: &dyn ProgressReporter,
) -> FramedeckResult<TranscodeReport> {
    let (frames, warnings) = images_to_frames(entries, progress)?;
    write_frames_document(&frames, out)?;
    progress.report(100, &format!("wrote {}", out.display()));
    Ok(TranscodeReport {
        frames: frames.len(),
        warnings,
    })
}

pub(crate) fn decode_rgb(path: &Path) -> FramedeckResult<image::RgbImage> {
    if !path.is_file() {
        return Err(FramedeckError::not_found(path));
    }
    let img = image::open(path)
        .map_err(|e| FramedeckError::decode(format!("malformed image: {e}")))?;
    Ok(img.to_rgb8())
}

fn encode_png_rgb(rgb: &image::RgbImage) -> FramedeckResult<Vec<u8>> {
    let mut png = Vec::new();
    let encoder = PngEncoder::new(Cursor::new(&mut png));
    image::ImageEncoder::write_image(
        encoder,
        rgb.as_raw(),
        rgb.width(),
        rgb.height(),
        image::ExtendedColorType::Rgb8,
    )
    .map_err(|e| FramedeckError::encode(format!("re-encode frame as png: {e}")))?;
    Ok(png)
}
