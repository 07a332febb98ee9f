use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use glob::Pattern;
use svframe_tools::{dump_frame, format_dump_pretty, inspect_frame, InspectReport};

#[derive(Parser)]
#[command(
    name = "svframe-tools",
    version,
    about = "svframe frame inspection and decoding tools"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Summarize frame headers, record counts and sizes.
    Inspect {
        /// A captured frame, or a directory of them.
        frame_path: PathBuf,
        /// Optional glob filter when inspecting a directory.
        #[arg(long)]
        glob: Option<String>,
        /// Sort inspected frames.
        #[arg(long, value_enum)]
        sort: Option<InspectSort>,
        /// Limit the number of inspected frames (after sorting).
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Decode every record of a frame.
    Decode {
        frame_file: PathBuf,
        /// Output format.
        #[arg(long, value_enum, default_value_t = DecodeFormat::Json)]
        format: DecodeFormat,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum InspectSort {
    Size,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DecodeFormat {
    Json,
    Pretty,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let limits = wire::Limits::default();
    match cli.command {
        Command::Inspect {
            frame_path,
            glob,
            sort,
            limit,
        } => {
            if frame_path.is_dir() {
                let mut entries = collect_frame_entries(&frame_path, glob.as_deref())?;
                sort_entries(&mut entries, sort);
                // A sorted listing defaults to the ten largest frames.
                if let Some(limit) = limit.or(sort.map(|InspectSort::Size| 10)) {
                    entries.truncate(limit);
                }
                for entry in entries {
                    let bytes = fs::read(&entry.path)
                        .with_context(|| format!("read frame {}", entry.path.display()))?;
                    let report = inspect_frame(&bytes, &limits)
                        .with_context(|| format!("inspect {}", entry.path.display()))?;
                    println!("== {} ({} bytes) ==", entry.path.display(), entry.size);
                    print_inspect_report(&report);
                }
            } else {
                let bytes = fs::read(&frame_path)
                    .with_context(|| format!("read frame {}", frame_path.display()))?;
                let report = inspect_frame(&bytes, &limits).context("inspect frame")?;
                print_inspect_report(&report);
            }
        }
        Command::Decode { frame_file, format } => {
            let bytes = fs::read(&frame_file)
                .with_context(|| format!("read frame {}", frame_file.display()))?;
            let dump = dump_frame(&bytes, &limits).context("decode frame")?;
            match format {
                DecodeFormat::Json => {
                    let json = serde_json::to_string_pretty(&dump).context("serialize json")?;
                    println!("{json}");
                }
                DecodeFormat::Pretty => {
                    print!("{}", format_dump_pretty(&dump));
                }
            }
        }
    }
    Ok(())
}

struct FrameEntry {
    path: PathBuf,
    size: u64,
}

/// Files directly under `dir`, optionally filtered by a glob on the path or
/// the file name, in path order.
fn collect_frame_entries(dir: &Path, glob: Option<&str>) -> Result<Vec<FrameEntry>> {
    let pattern = glob
        .map(|value| Pattern::new(value).context("invalid glob pattern"))
        .transpose()?;
    let wanted = |path: &Path| {
        pattern.as_ref().map_or(true, |pattern| {
            pattern.matches_path(path)
                || path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| pattern.matches(name))
        })
    };

    let mut entries = Vec::new();
    for dir_entry in fs::read_dir(dir).with_context(|| format!("read dir {}", dir.display()))? {
        let dir_entry = dir_entry?;
        let path = dir_entry.path();
        if path.is_file() && wanted(&path) {
            let size = dir_entry.metadata()?.len();
            entries.push(FrameEntry { path, size });
        }
    }
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
}

/// Largest frames first; equal sizes keep path order.
fn sort_entries(entries: &mut [FrameEntry], sort: Option<InspectSort>) {
    if let Some(InspectSort::Size) = sort {
        entries.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.path.cmp(&b.path)));
    }
}

fn print_inspect_report(report: &InspectReport) {
    let header = report.header;
    println!(
        "kind: {:?} set: {} game_time: {:.3}s",
        header.kind, header.set, header.game_time
    );
    println!(
        "records: {} resent: {} total: {} bytes",
        report.records, report.resent, report.total_bytes
    );
    println!("by type:");
    for summary in &report.by_type {
        println!(
            "  {:?}: {} records ({} bytes)",
            summary.delta_type, summary.records, summary.bytes
        );
    }
}
