#![forbid(unsafe_code)]

pub mod document;
pub mod entry;
pub mod error;
pub mod fsutil;
pub mod natsort;
pub mod progress;
pub mod runner;
pub mod session;
pub mod store;
pub mod transcode;
pub mod undo;

pub use document::{AnimationDocument, Frame, MERGED_DOCUMENT_NAME};
pub use entry::{ConverterKind, EntryHandle, FileEntry};
pub use error::{FramedeckError, FramedeckResult};
pub use progress::{NullProgress, ProgressReporter};
pub use runner::{AutoApprove, GifApprover, TaskEvent, TaskHandle, TaskSummary, TranscodeJob};
pub use session::{load_session, save_session};
pub use store::EntryStore;
pub use transcode::{
    GifSettings, PendingGif, TranscodeReport, images_to_frames, images_to_gif, images_to_json,
    json_to_gif, merge_json, merge_to_document, write_frames_document,
};
pub use undo::UndoRecord;
