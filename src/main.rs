//! torrentmatch - Reconcile torrent metadata files against downloaded media.
//!
//! Report mode lists media files not referenced by any torrent and
//! torrent-referenced files missing from media. Collect mode matches each
//! torrent to media by size, then copies both into organized output folders.

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgGroup, CommandFactory, Parser};
use clap_complete::Shell;
use colored::Colorize;

use torrentmatch::collect::{self, CollectOptions};
use torrentmatch::config::Config;
use torrentmatch::report;

#[derive(Parser)]
#[command(
    author,
    version,
    name = env!("CARGO_BIN_NAME"),
    about = "Compare or collect torrent and media files",
    group = ArgGroup::new("mode").args(["report", "collect"])
)]
struct Args {
    /// Generate a comparison listing missing or unreferenced files
    #[arg(short = 'r', long, num_args = 2, value_names = ["TORRENT_DIR", "MEDIA_DIR"], value_hint = clap::ValueHint::DirPath)]
    report: Vec<PathBuf>,

    /// Copy matched torrents and media to organized output folders
    #[arg(short = 'c', long, num_args = 2, value_names = ["TORRENT_DIR", "MEDIA_DIR"], value_hint = clap::ValueHint::DirPath)]
    collect: Vec<PathBuf>,

    /// Output directory for matched torrent files (required by --collect)
    #[arg(long, value_name = "DIR", value_hint = clap::ValueHint::DirPath)]
    torrents_out: Option<PathBuf>,

    /// Output directory for matched media files (required by --collect)
    #[arg(long, value_name = "DIR", value_hint = clap::ValueHint::DirPath)]
    media_out: Option<PathBuf>,

    /// Maximum size difference in bytes for matching
    #[arg(short = 't', long, value_name = "BYTES")]
    tolerance: Option<u64>,

    /// Never overwrite existing media files, rename instead
    #[arg(short = 'n', long)]
    no_overwrite: bool,

    /// Generate shell completion
    #[arg(short = 'l', long, value_name = "SHELL")]
    completion: Option<Shell>,

    /// Print verbose output
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(shell) = args.completion {
        torrentmatch::generate_shell_completion(shell, Args::command(), env!("CARGO_BIN_NAME"));
        return Ok(());
    }

    let config = Config::new(args.tolerance, args.no_overwrite, args.verbose)?;

    if let [torrent_dir, media_dir] = args.report.as_slice() {
        let torrent_dir = torrentmatch::resolve_directory(torrent_dir)?;
        let media_dir = torrentmatch::resolve_directory(media_dir)?;
        report::run(&torrent_dir, &media_dir, &config.ignore)
    } else if let [torrent_dir, media_dir] = args.collect.as_slice() {
        let (Some(torrents_out), Some(media_out)) = (args.torrents_out, args.media_out) else {
            anyhow::bail!("--collect requires both --torrents-out and --media-out");
        };
        let torrent_dir = torrentmatch::resolve_directory(torrent_dir)?;
        let media_dir = torrentmatch::resolve_directory(media_dir)?;
        std::fs::create_dir_all(&torrents_out)?;
        std::fs::create_dir_all(&media_out)?;

        let options = CollectOptions {
            torrent_dir,
            media_dir,
            torrents_out: torrentmatch::resolve_directory(&torrents_out)?,
            media_out: torrentmatch::resolve_directory(&media_out)?,
            tolerance: config.tolerance,
            overwrite: config.overwrite,
            ignore: config.ignore.clone(),
            verbose: config.verbose,
        };

        println!(
            "{}\n  Torrents: {}\n  Media: {}\n  Output torrents: {}\n  Output media: {}\n",
            "Collecting torrents and matching media".bold(),
            options.torrent_dir.display(),
            options.media_dir.display(),
            options.torrents_out.display(),
            options.media_out.display()
        );
        collect::run(&options)?;

        // Verify the result by comparing the output directories
        println!();
        report::run(&options.torrents_out, &options.media_out, &options.ignore)
    } else {
        anyhow::bail!("Either --report or --collect is required");
    }
}
