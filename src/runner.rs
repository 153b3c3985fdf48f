use std::path::{Path, PathBuf};

use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::{
    entry::FileEntry,
    error::FramedeckResult,
    progress::ProgressReporter,
    transcode::{GifSettings, images_to_gif, images_to_json, json_to_gif, merge_json},
};

/// One transcode to run off the interactive thread. Each job owns a value
/// snapshot of entry metadata taken at spawn time; a concurrent store
/// mutation cannot reach into a running job. Source paths are still read
/// live, so a file changed mid-run surfaces as a per-file warning.
#[derive(Clone, Debug)]
pub enum TranscodeJob {
    ImagesToJson {
        entries: Vec<FileEntry>,
        out: PathBuf,
    },
    ImagesToGif {
        entries: Vec<FileEntry>,
        settings: GifSettings,
        dest: PathBuf,
    },
    MergeJson {
        entries: Vec<FileEntry>,
        out: PathBuf,
    },
    JsonToGif {
        entries: Vec<FileEntry>,
        settings: GifSettings,
        dest: PathBuf,
    },
}

/// Events delivered on a job's channel. Progress percentages arrive in
/// non-decreasing order, `Finished` follows the final 100% report, and a
/// `(0, "")` reset closes the stream after either outcome.
#[derive(Debug)]
pub enum TaskEvent {
    Progress { percent: u8, message: String },
    Finished(FramedeckResult<TaskSummary>),
}

/// What a completed job produced.
#[derive(Clone, Debug)]
pub struct TaskSummary {
    pub frames: usize,
    pub warnings: Vec<String>,
    /// Final output path; `None` when a GIF preview was rejected.
    pub output: Option<PathBuf>,
}

/// Preview/approval gate for GIF outputs. Called on the worker thread with
/// the temporary artifact; returning `true` promotes it to the destination,
/// `false` discards it without touching any existing destination file.
pub trait GifApprover: Send {
    fn approve(&self, preview: &Path) -> bool;
}

/// Approves every preview. For non-interactive callers.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoApprove;

impl GifApprover for AutoApprove {
    fn approve(&self, _preview: &Path) -> bool {
        true
    }
}

/// Rejects every preview; the temporary GIF is always deleted.
#[derive(Debug, Default, Clone, Copy)]
pub struct RejectAll;

impl GifApprover for RejectAll {
    fn approve(&self, _preview: &Path) -> bool {
        false
    }
}

/// A spawned job: an event stream plus the worker's join handle. The
/// coordinating thread polls or selects on the receiver; joining is only
/// needed for orderly shutdown. There is no cooperative cancellation — a
/// worker runs to completion or failure.
pub struct TaskHandle {
    events: Receiver<TaskEvent>,
    thread: std::thread::JoinHandle<()>,
}

impl TaskHandle {
    pub fn events(&self) -> &Receiver<TaskEvent> {
        &self.events
    }

    /// Block until the worker exits and return the drained events. Test and
    /// shutdown convenience; interactive callers consume `events` instead.
    pub fn join(self) -> Vec<TaskEvent> {
        let _ = self.thread.join();
        self.events.try_iter().collect()
    }
}

/// Run `job` on a dedicated worker thread, delivering progress and the
/// completion result asynchronously.
pub fn spawn(job: TranscodeJob, approver: impl GifApprover + 'static) -> TaskHandle {
    let (tx, events) = unbounded();
    let thread = std::thread::spawn(move || {
        let reporter = ChannelProgress { tx: tx.clone() };
        let result = run_job(job, &approver, &reporter);
        if let Err(e) = &result {
            tracing::warn!(error = %e, "transcode job failed");
        }
        let _ = tx.send(TaskEvent::Finished(result));
        // Reset the progress surface after completion or failure.
        let _ = tx.send(TaskEvent::Progress {
            percent: 0,
            message: String::new(),
        });
    });
    TaskHandle { events, thread }
}

fn run_job(
    job: TranscodeJob,
    approver: &dyn GifApprover,
    progress: &dyn ProgressReporter,
) -> FramedeckResult<TaskSummary> {
    match job {
        TranscodeJob::ImagesToJson { entries, out } => {
            let report = images_to_json(&entries, &out, progress)?;
            Ok(TaskSummary {
                frames: report.frames,
                warnings: report.warnings,
                output: Some(out),
            })
        }
        TranscodeJob::MergeJson { entries, out } => {
            let report = merge_json(&entries, &out, progress)?;
            Ok(TaskSummary {
                frames: report.frames,
                warnings: report.warnings,
                output: Some(out),
            })
        }
        TranscodeJob::ImagesToGif {
            entries,
            settings,
            dest,
        } => {
            let pending = images_to_gif(&entries, settings, progress)?;
            finalize_gif(pending, &dest, approver)
        }
        TranscodeJob::JsonToGif {
            entries,
            settings,
            dest,
        } => {
            let pending = json_to_gif(&entries, settings, progress)?;
            finalize_gif(pending, &dest, approver)
        }
    }
}

fn finalize_gif(
    pending: crate::transcode::PendingGif,
    dest: &Path,
    approver: &dyn GifApprover,
) -> FramedeckResult<TaskSummary> {
    let frames = pending.frames;
    let warnings = pending.warnings.clone();
    let approved = match pending.preview_path() {
        Some(preview) => approver.approve(preview),
        None => false,
    };
    if approved {
        pending.approve(dest)?;
        Ok(TaskSummary {
            frames,
            warnings,
            output: Some(dest.to_path_buf()),
        })
    } else {
        pending.discard();
        tracing::debug!(dest = %dest.display(), "gif preview rejected, temp discarded");
        Ok(TaskSummary {
            frames,
            warnings,
            output: None,
        })
    }
}

struct ChannelProgress {
    tx: Sender<TaskEvent>,
}

impl ProgressReporter for ChannelProgress {
    fn report(&self, percent: u8, message: &str) {
        // A gone receiver just means nobody is watching anymore.
        let _ = self.tx.send(TaskEvent::Progress {
            percent,
            message: message.to_string(),
        });
    }
}
