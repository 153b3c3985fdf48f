use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use framedeck::{
    ConverterKind, EntryStore, GifSettings, TaskEvent, TaskHandle, TaskSummary, TranscodeJob,
    runner::{AutoApprove, RejectAll},
};

#[derive(Parser, Debug)]
#[command(name = "framedeck", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert images to a JSON frame-list document.
    Frames(FramesArgs),
    /// Convert images to an animated GIF.
    Gif(GifArgs),
    /// Merge JSON frame-list documents into one wrapper document.
    Merge(MergeArgs),
    /// Convert JSON frame-list documents to an animated GIF.
    FromJson(FromJsonArgs),
    /// Ingest files, rename them sequentially, and save the session.
    Rename(RenameArgs),
    /// Copy a file to a sibling `.bak` before overwriting it elsewhere.
    Backup(BackupArgs),
}

#[derive(Parser, Debug)]
struct FramesArgs {
    /// Output JSON path.
    #[arg(long)]
    out: PathBuf,

    /// Input image files, ordered naturally before conversion.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

#[derive(Parser, Debug)]
struct GifArgs {
    /// Output GIF path.
    #[arg(long)]
    out: PathBuf,

    /// Uniform per-frame duration in milliseconds (10..=1000).
    #[arg(long, default_value_t = 100)]
    duration_ms: u32,

    /// Encode and report, but discard the result instead of writing `out`.
    #[arg(long)]
    discard: bool,

    /// Input image files, ordered naturally before conversion.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

#[derive(Parser, Debug)]
struct MergeArgs {
    /// Output JSON path.
    #[arg(long)]
    out: PathBuf,

    /// Input frame-list documents, ordered naturally before merging.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

#[derive(Parser, Debug)]
struct FromJsonArgs {
    /// Output GIF path.
    #[arg(long)]
    out: PathBuf,

    /// Uniform per-frame duration in milliseconds (10..=1000).
    #[arg(long, default_value_t = 100)]
    duration_ms: u32,

    /// Encode and report, but discard the result instead of writing `out`.
    #[arg(long)]
    discard: bool,

    /// Input frame-list documents, ordered naturally before conversion.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

#[derive(Parser, Debug)]
struct RenameArgs {
    /// New name prefix; entries become `{prefix}1`, `{prefix}2`, …
    #[arg(long)]
    prefix: String,

    /// Session file to write.
    #[arg(long)]
    session: PathBuf,

    /// Files to ingest as a JSON collection.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

#[derive(Parser, Debug)]
struct BackupArgs {
    /// File to back up.
    file: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Frames(args) => cmd_frames(args),
        Command::Gif(args) => cmd_gif(args),
        Command::Merge(args) => cmd_merge(args),
        Command::FromJson(args) => cmd_from_json(args),
        Command::Rename(args) => cmd_rename(args),
        Command::Backup(args) => cmd_backup(args),
    }
}

fn ingest(kind: ConverterKind, inputs: Vec<PathBuf>) -> anyhow::Result<EntryStore> {
    let mut store = EntryStore::new(kind);
    let (handles, warnings) = store.add_many(inputs);
    for warning in &warnings {
        eprintln!("warning: {warning}");
    }
    if handles.is_empty() {
        anyhow::bail!("no usable input files");
    }
    Ok(store)
}

fn run_to_completion(handle: TaskHandle) -> anyhow::Result<TaskSummary> {
    let mut summary = None;
    for event in handle.events().iter() {
        match event {
            TaskEvent::Progress { percent, message } if !message.is_empty() => {
                eprintln!("[{percent:>3}%] {message}");
            }
            TaskEvent::Progress { .. } => {}
            TaskEvent::Finished(result) => summary = Some(result),
        }
    }
    let summary = summary
        .context("worker exited without reporting a result")?
        .context("conversion failed")?;
    for warning in &summary.warnings {
        eprintln!("warning: {warning}");
    }
    Ok(summary)
}

fn cmd_frames(args: FramesArgs) -> anyhow::Result<()> {
    let store = ingest(ConverterKind::Image, args.inputs)?;
    let summary = run_to_completion(framedeck::runner::spawn(
        TranscodeJob::ImagesToJson {
            entries: store.snapshot(),
            out: args.out.clone(),
        },
        AutoApprove,
    ))?;
    eprintln!("wrote {} ({} frames)", args.out.display(), summary.frames);
    Ok(())
}

fn cmd_gif(args: GifArgs) -> anyhow::Result<()> {
    let store = ingest(ConverterKind::Image, args.inputs)?;
    let job = TranscodeJob::ImagesToGif {
        entries: store.snapshot(),
        settings: GifSettings {
            duration_ms: args.duration_ms,
        },
        dest: args.out.clone(),
    };
    finish_gif(job, args.discard, &args.out)
}

fn cmd_from_json(args: FromJsonArgs) -> anyhow::Result<()> {
    let store = ingest(ConverterKind::Json, args.inputs)?;
    let job = TranscodeJob::JsonToGif {
        entries: store.snapshot(),
        settings: GifSettings {
            duration_ms: args.duration_ms,
        },
        dest: args.out.clone(),
    };
    finish_gif(job, args.discard, &args.out)
}

fn finish_gif(job: TranscodeJob, discard: bool, out: &std::path::Path) -> anyhow::Result<()> {
    let summary = if discard {
        run_to_completion(framedeck::runner::spawn(job, RejectAll))?
    } else {
        run_to_completion(framedeck::runner::spawn(job, AutoApprove))?
    };
    match summary.output {
        Some(path) => eprintln!("wrote {} ({} frames)", path.display(), summary.frames),
        None => eprintln!(
            "discarded {} frames without writing {}",
            summary.frames,
            out.display()
        ),
    }
    Ok(())
}

fn cmd_merge(args: MergeArgs) -> anyhow::Result<()> {
    let store = ingest(ConverterKind::Json, args.inputs)?;
    let summary = run_to_completion(framedeck::runner::spawn(
        TranscodeJob::MergeJson {
            entries: store.snapshot(),
            out: args.out.clone(),
        },
        AutoApprove,
    ))?;
    eprintln!("wrote {} ({} frames)", args.out.display(), summary.frames);
    Ok(())
}

fn cmd_rename(args: RenameArgs) -> anyhow::Result<()> {
    let mut store = ingest(ConverterKind::Json, args.inputs)?;
    let renamed = store.rename_all(&args.prefix)?;
    framedeck::save_session(&mut store, &args.session)?;
    eprintln!(
        "renamed {renamed} entries, session saved to {}",
        args.session.display()
    );
    Ok(())
}

fn cmd_backup(args: BackupArgs) -> anyhow::Result<()> {
    let backup = framedeck::fsutil::backup_file(&args.file)?;
    eprintln!("backup created: {}", backup.display());
    Ok(())
}
