use std::path::{Path, PathBuf};

use image::codecs::gif::{GifEncoder, Repeat};

use crate::{
    document::{AnimationDocument, decode_data_uri},
    entry::FileEntry,
    error::{FramedeckError, FramedeckResult},
    fsutil,
    progress::{ProgressReporter, percent_of},
    transcode::{MAX_FRAME_DURATION_MS, MIN_FRAME_DURATION_MS, frames::decode_rgb},
};

/// Animated GIF encoding parameters. Loops forever; every frame is stored
/// whole (no inter-frame optimization), so frames stay individually
/// extractable.
#[derive(Clone, Copy, Debug)]
pub struct GifSettings {
    /// Uniform per-frame duration in milliseconds, valid range [10, 1000].
    pub duration_ms: u32,
}

impl GifSettings {
    pub fn validate(&self) -> FramedeckResult<()> {
        if self.duration_ms < MIN_FRAME_DURATION_MS || self.duration_ms > MAX_FRAME_DURATION_MS {
            return Err(FramedeckError::validation(format!(
                "frame duration must be {MIN_FRAME_DURATION_MS}..={MAX_FRAME_DURATION_MS} ms, got {}",
                self.duration_ms
            )));
        }
        Ok(())
    }
}

/// A fully encoded GIF sitting in the system scratch area, awaiting the
/// preview/approval step. Approving promotes it atomically to its final
/// destination; discarding (or dropping) deletes it without touching any
/// existing file at the destination.
#[derive(Debug)]
pub struct PendingGif {
    temp: Option<PathBuf>,
    pub frames: usize,
    pub warnings: Vec<String>,
}

impl PendingGif {
    /// Path of the temporary artifact, for previewing.
    pub fn preview_path(&self) -> Option<&Path> {
        self.temp.as_deref()
    }

    /// Promote the temporary GIF to `dest`. On failure the temporary file is
    /// deleted (with bounded retries) and the destination is left untouched.
    pub fn approve(mut self, dest: &Path) -> FramedeckResult<()> {
        let Some(temp) = self.temp.take() else {
            return Err(FramedeckError::validation("gif artifact already finalized"));
        };
        match fsutil::promote(&temp, dest) {
            Ok(()) => Ok(()),
            Err(e) => {
                fsutil::remove_with_retries(&temp);
                Err(e)
            }
        }
    }

    /// Delete the temporary GIF. Returns whether the file is gone.
    pub fn discard(mut self) -> bool {
        match self.temp.take() {
            Some(temp) => fsutil::remove_with_retries(&temp),
            None => true,
        }
    }
}

impl Drop for PendingGif {
    fn drop(&mut self) {
        if let Some(temp) = self.temp.take() {
            fsutil::remove_with_retries(&temp);
        }
    }
}

/// Convert image entries to an animated GIF in the scratch area.
///
/// Color is normalized the same way as the JSON conversion: opaque
/// 3-channel, re-expanded to RGBA for the encoder. Repeat counts duplicate
/// frames contiguously. The duration is validated before any work begins.
#[tracing::instrument(skip(entries, progress), fields(count = entries.len()))]
pub fn images_to_gif(
    entries: &[FileEntry],
    settings: GifSettings,
    progress: &dyn ProgressReporter,
) -> FramedeckResult<PendingGif> {
    settings.validate()?;

    let mut frames: Vec<image::RgbaImage> = Vec::new();
    let mut warnings = Vec::new();

    for (i, entry) in entries.iter().enumerate() {
        progress.report(
            scale_percent(percent_of(i, entries.len())),
            &format!("decoding {}", entry.display_name),
        );

        let rgb = match decode_rgb(&entry.source_path) {
            Ok(img) => img,
            Err(e) => {
                tracing::warn!(file = %entry.display_name, error = %e, "skipping image");
                warnings.push(format!("{}: {e}", entry.display_name));
                continue;
            }
        };
        let rgba = image::DynamicImage::ImageRgb8(rgb).to_rgba8();
        for _ in 0..entry.repeat_count.max(1) {
            frames.push(rgba.clone());
        }
    }

    encode_pending_gif(frames, settings, warnings, progress)
}

/// Convert JSON frame-list entries to an animated GIF in the scratch area.
///
/// Both document shapes are accepted. Embedded images are decoded to
/// 4-channel RGBA — intentionally different from the image path, so
/// transparency brought in through JSON survives the trip back out. A
/// document that fails to parse, or a frame that fails to decode, is skipped
/// with a warning.
#[tracing::instrument(skip(entries, progress), fields(count = entries.len()))]
pub fn json_to_gif(
    entries: &[FileEntry],
    settings: GifSettings,
    progress: &dyn ProgressReporter,
) -> FramedeckResult<PendingGif> {
    settings.validate()?;

    let mut frames: Vec<image::RgbaImage> = Vec::new();
    let mut warnings = Vec::new();

    for (i, entry) in entries.iter().enumerate() {
        progress.report(
            scale_percent(percent_of(i, entries.len())),
            &format!("reading {}", entry.display_name),
        );

        let doc_frames = match read_document(&entry.source_path) {
            Ok(doc) => doc.into_frames(),
            Err(e) => {
                tracing::warn!(file = %entry.display_name, error = %e, "skipping document");
                warnings.push(format!("{}: {e}", entry.display_name));
                continue;
            }
        };

        for frame in doc_frames {
            match decode_frame_rgba(&frame.image_data) {
                Ok(rgba) => frames.push(rgba),
                Err(e) => {
                    tracing::warn!(
                        file = %entry.display_name,
                        frame = %frame.name,
                        error = %e,
                        "skipping frame"
                    );
                    warnings.push(format!("{} ({}): {e}", entry.display_name, frame.name));
                }
            }
        }
    }

    encode_pending_gif(frames, settings, warnings, progress)
}

pub(crate) fn read_document(path: &Path) -> FramedeckResult<AnimationDocument> {
    if !path.is_file() {
        return Err(FramedeckError::not_found(path));
    }
    let bytes = std::fs::read(path)
        .map_err(|e| FramedeckError::decode(format!("read '{}': {e}", path.display())))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| FramedeckError::decode(format!("invalid frame-list document: {e}")))
}

fn decode_frame_rgba(image_data: &str) -> FramedeckResult<image::RgbaImage> {
    let bytes = decode_data_uri(image_data)?;
    let img = image::load_from_memory(&bytes)
        .map_err(|e| FramedeckError::decode(format!("malformed embedded image: {e}")))?;
    Ok(img.to_rgba8())
}

fn encode_pending_gif(
    frames: Vec<image::RgbaImage>,
    settings: GifSettings,
    warnings: Vec<String>,
    progress: &dyn ProgressReporter,
) -> FramedeckResult<PendingGif> {
    if frames.is_empty() {
        return Err(FramedeckError::NoValidInput);
    }
    let frame_count = frames.len();
    progress.report(95, "encoding gif");

    // Exclusive creation in the system scratch area; promotion to the final
    // destination happens only after external approval.
    let mut tmp = tempfile::Builder::new()
        .prefix("framedeck-")
        .suffix(".gif")
        .tempfile()
        .map_err(|e| FramedeckError::encode(format!("create scratch gif file: {e}")))?;

    {
        let mut encoder = GifEncoder::new(tmp.as_file_mut());
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|e| FramedeckError::encode(format!("gif loop setup: {e}")))?;
        let delay = image::Delay::from_numer_denom_ms(settings.duration_ms, 1);
        for rgba in frames {
            let frame = image::Frame::from_parts(rgba, 0, 0, delay);
            encoder
                .encode_frame(frame)
                .map_err(|e| FramedeckError::encode(format!("gif frame encode: {e}")))?;
        }
    }

    let temp = tmp
        .into_temp_path()
        .keep()
        .map_err(|e| FramedeckError::encode(format!("detach scratch gif file: {e}")))?;

    progress.report(100, &format!("gif ready ({frame_count} frames)"));
    tracing::debug!(frames = frame_count, temp = %temp.display(), "gif encoded");

    Ok(PendingGif {
        temp: Some(temp),
        frames: frame_count,
        warnings,
    })
}

// Keep item progress below the encode milestone so percentages stay
// monotonic.
fn scale_percent(p: u8) -> u8 {
    (u16::from(p) * 95 / 100) as u8
}
