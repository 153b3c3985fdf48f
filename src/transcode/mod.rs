mod frames;
mod gif;
mod merge;

pub use frames::{images_to_frames, images_to_json, write_frames_document};
pub use gif::{GifSettings, PendingGif, images_to_gif, json_to_gif};
pub use merge::{merge_json, merge_to_document};

/// Inclusive per-frame GIF duration bounds, milliseconds.
pub const MIN_FRAME_DURATION_MS: u32 = 10;
pub const MAX_FRAME_DURATION_MS: u32 = 1000;

/// Outcome of a completed conversion: how many frames were produced and the
/// non-fatal per-item warnings accumulated along the way.
#[derive(Clone, Debug)]
pub struct TranscodeReport {
    pub frames: usize,
    pub warnings: Vec<String>,
}

pub(crate) fn now_epoch_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
