//! Batch command - process many files and summarize.

use std::path::PathBuf;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::task::JoinSet;
use tracing::warn;

use comprobante_core::PipelineResult;

use super::{load_config, process_file, save_crops};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob patterns
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Output directory
    #[arg(short, long, default_value = "outputs")]
    output: PathBuf,

    /// Minimum region area in px²
    #[arg(long)]
    min_area: Option<u32>,

    /// Dense-grid preset
    #[arg(long)]
    grid: bool,

    /// Files processed concurrently
    #[arg(short, long, default_value_t = 2)]
    jobs: usize,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = load_config(config_path, args.grid)?;
    if let Some(min_area) = args.min_area {
        config.detection.min_area = min_area;
    }

    let files = expand_inputs(&args.inputs)?;
    if files.is_empty() {
        anyhow::bail!("No input files matched");
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("##-"),
    );

    // One pipeline (and one OCR handle) per file; files run concurrently,
    // pages within a file stay sequential.
    let mut pending = files.into_iter();
    let mut tasks: JoinSet<(PathBuf, anyhow::Result<PipelineResult>)> = JoinSet::new();
    let mut outcomes = Vec::new();

    loop {
        while tasks.len() < args.jobs.max(1) {
            let Some(file) = pending.next() else { break };
            let config = config.clone();
            let output = args.output.clone();
            tasks.spawn_blocking(move || {
                let result = process_file(&file, &config).and_then(|result| {
                    let stem = file
                        .file_stem()
                        .and_then(|s| s.to_str())
                        .unwrap_or("archivo");
                    save_crops(&result, &output.join(stem))?;
                    Ok(result)
                });
                (file, result)
            });
        }
        let Some(joined) = tasks.join_next().await else { break };
        let (file, result) = joined?;
        pb.inc(1);
        pb.set_message(file.display().to_string());
        outcomes.push((file, result));
    }
    pb.finish_with_message("Done");

    let summary_path = args.output.join("summary.csv");
    write_summary(&outcomes, &summary_path)?;

    let processed = outcomes.iter().filter(|(_, r)| r.is_ok()).count();
    let total: usize = outcomes
        .iter()
        .filter_map(|(_, r)| r.as_ref().ok())
        .map(|r| r.total_comprobantes)
        .sum();
    for (file, result) in &outcomes {
        if let Err(e) = result {
            warn!(file = %file.display(), "processing failed: {e}");
            eprintln!("{} {}: {e}", style("✗").red(), file.display());
        }
    }
    println!(
        "{} {processed}/{} files · {total} comprobantes · summary at {}",
        style("✓").green(),
        outcomes.len(),
        summary_path.display()
    );

    Ok(())
}

fn expand_inputs(patterns: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let path = PathBuf::from(pattern);
        if path.exists() {
            files.push(path);
            continue;
        }
        for entry in glob::glob(pattern)? {
            files.push(entry?);
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

fn write_summary(
    outcomes: &[(PathBuf, anyhow::Result<PipelineResult>)],
    path: &std::path::Path,
) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["file", "page", "id", "documento_id", "valor", "status"])?;
    for (file, result) in outcomes {
        match result {
            Ok(result) => {
                for comp in result.comprobantes() {
                    writer.write_record([
                        file.display().to_string(),
                        comp.page.to_string(),
                        comp.id.to_string(),
                        comp.documento_id.clone(),
                        comp.valor.map(|v| v.to_string()).unwrap_or_default(),
                        "ok".to_string(),
                    ])?;
                }
                if result.total_comprobantes == 0 {
                    writer.write_record([
                        file.display().to_string(),
                        String::new(),
                        String::new(),
                        String::new(),
                        String::new(),
                        "empty".to_string(),
                    ])?;
                }
            }
            Err(e) => {
                writer.write_record([
                    file.display().to_string(),
                    String::new(),
                    String::new(),
                    String::new(),
                    String::new(),
                    format!("error: {e}"),
                ])?;
            }
        }
    }
    writer.flush()?;
    Ok(())
}
