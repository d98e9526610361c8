use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use line_sift::external_sort::{sort_and_deduplicate, ExternalSortConfig};
use line_sift::utils::{duplicate_ratio, format_bytes, format_duration, setup_logging};

#[derive(Parser)]
#[command(name = "line-sift")]
#[command(about = "Line Sift - exact deduplication of line-oriented files larger than memory")]
#[command(version)]
struct Args {
    #[arg(short, long, help = "Input file, one record per line")]
    input: PathBuf,

    #[arg(short, long, help = "Output file for the sorted, deduplicated records")]
    output: PathBuf,

    #[arg(short, long, help = "JSON configuration file")]
    config: Option<PathBuf>,

    #[arg(short, long, help = "Memory ceiling per chunk in MB")]
    memory_mb: Option<usize>,

    #[arg(short, long, help = "Directory to stage chunk files in")]
    temp_dir: Option<PathBuf>,

    #[arg(long, help = "Drop blank lines instead of treating them as records")]
    skip_blank_lines: bool,

    #[arg(long, help = "Save the effective configuration as JSON to this file")]
    save_config: Option<PathBuf>,

    #[arg(long, help = "Write run statistics as JSON to this file")]
    stats_json: Option<PathBuf>,

    #[arg(short, long, help = "Verbose output")]
    verbose: bool,

    #[arg(short, long, help = "Only report errors")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ExternalSortConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ExternalSortConfig::default(),
    };

    if let Some(memory_mb) = args.memory_mb {
        config.memory_ceiling_mb = memory_mb;
        config.memory_ceiling_bytes = None;
    }
    if let Some(temp_dir) = &args.temp_dir {
        config.temp_directory = temp_dir.clone();
    }
    if args.skip_blank_lines {
        config.skip_blank_lines = true;
    }
    if args.verbose {
        config.verbose = true;
    }

    let verbosity = if args.quiet {
        "silent"
    } else if config.verbose {
        "verbose"
    } else {
        "normal"
    };
    setup_logging(verbosity)?;

    if let Some(path) = &args.save_config {
        config
            .to_file(path)
            .with_context(|| format!("failed to save config to {}", path.display()))?;
        info!("Saved configuration to {}", path.display());
    }

    if !args.input.is_file() {
        anyhow::bail!("Input file does not exist: {}", args.input.display());
    }

    let input_size = std::fs::metadata(&args.input)
        .map(|m| m.len())
        .unwrap_or(0);
    info!("Input: {} ({})", args.input.display(), format_bytes(input_size));
    info!("Output: {}", args.output.display());
    info!(
        "Memory ceiling: {}",
        format_bytes(config.memory_ceiling_bytes() as u64)
    );

    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let shutdown_flag = Arc::new(AtomicBool::new(false));
    let shutdown_flag_clone = shutdown_flag.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Shutdown signal received, stopping and cleaning up...");
            shutdown_flag_clone.store(true, Ordering::Relaxed);
        }
    });

    let start_time = Instant::now();
    let stats = sort_and_deduplicate(
        args.input.clone(),
        args.output.clone(),
        config,
        Some(shutdown_flag),
    )
    .await?;
    let total_time = start_time.elapsed();

    if let Some(stats_path) = &args.stats_json {
        let content = serde_json::to_string_pretty(&stats)?;
        std::fs::write(stats_path, content)
            .with_context(|| format!("failed to write stats to {}", stats_path.display()))?;
    }

    if !args.quiet {
        println!("\n🎉 Deduplication completed successfully! 🎉");
        println!("=======================================");
        println!("📊 Total records: {}", stats.total_records);
        println!("✨ Unique records: {}", stats.unique_records);
        println!(
            "🗑️ Duplicates removed: {} ({:.2}%)",
            stats.duplicates_removed,
            duplicate_ratio(stats.duplicates_removed, stats.total_records)
        );
        println!("🔗 Cross-chunk duplicates: {}", stats.cross_chunk_duplicates);
        println!("📦 Chunks created: {}", stats.chunks_created);
        println!("⏱️ Total time: {}", format_duration(total_time.as_secs_f64()));

        let throughput = stats.total_records as f64 / total_time.as_secs_f64().max(f64::EPSILON);
        println!("🔄 Throughput: {:.0} records/sec", throughput);
    }

    Ok(())
}
