//! Extract command - process a single image or PDF.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::debug;

use comprobante_core::PipelineResult;

use super::{load_config, process_file, save_artifacts, save_crops};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input file (PDF or image)
    #[arg(required = true)]
    input: PathBuf,

    /// Output directory for sessions
    #[arg(short, long, default_value = "outputs")]
    output: PathBuf,

    /// Minimum region area in px² (default 50000; grids want 3000-5000)
    #[arg(long)]
    min_area: Option<u32>,

    /// Dense-grid preset: small minimum area, individual results
    #[arg(long)]
    grid: bool,

    /// Emit each comprobante as its own result
    #[arg(long)]
    individual: bool,

    /// Write intermediate masks next to the crops
    #[arg(long)]
    debug_artifacts: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

/// One entry of an individual-mode response.
#[derive(Serialize)]
struct IndividualResult<'a> {
    session_id: String,
    #[serde(flatten)]
    result: &'a PipelineResult,
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let mut config = load_config(config_path, args.grid)?;
    if let Some(min_area) = args.min_area {
        config.detection.min_area = min_area;
    }
    config.debug = args.debug_artifacts;

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap(),
    );
    pb.set_message(format!("Processing {}", args.input.display()));

    let result = process_file(&args.input, &config)?;
    pb.finish_with_message("Done");

    let session_id = format!(
        "session_{}",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let session_dir = args.output.join(&session_id);
    let saved = save_crops(&result, &session_dir)?;
    save_artifacts(&result.artifacts, &session_dir)?;
    debug!(saved, dir = %session_dir.display(), "crops persisted");

    let output = format_result(&result, &session_id, args.individual, args.format)?;
    fs::write(session_dir.join("resultado.json"), serde_json::to_string_pretty(&result)?)?;
    println!("{output}");

    eprintln!(
        "{} {} comprobantes extracted to {}",
        style("✓").green(),
        result.total_comprobantes,
        session_dir.display()
    );

    Ok(())
}

fn format_result(
    result: &PipelineResult,
    session_id: &str,
    individual: bool,
    format: OutputFormat,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json if individual => {
            let partitioned = result.clone().into_individual();
            let wrapped: Vec<IndividualResult> = partitioned
                .iter()
                .enumerate()
                .map(|(i, result)| IndividualResult {
                    session_id: format!("{session_id}_comp_{}", i + 1),
                    result,
                })
                .collect();
            Ok(serde_json::to_string_pretty(&wrapped)?)
        }
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Csv => format_csv(result),
        OutputFormat::Text => Ok(format_text(result)),
    }
}

fn format_csv(result: &PipelineResult) -> anyhow::Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "page",
        "id",
        "documento_id",
        "valor",
        "x",
        "y",
        "width",
        "height",
        "area",
    ])?;
    for comp in result.comprobantes() {
        writer.write_record([
            comp.page.to_string(),
            comp.id.to_string(),
            comp.documento_id.clone(),
            comp.valor.map(|v| v.to_string()).unwrap_or_default(),
            comp.coordinates.x.to_string(),
            comp.coordinates.y.to_string(),
            comp.coordinates.width.to_string(),
            comp.coordinates.height.to_string(),
            comp.area.to_string(),
        ])?;
    }
    Ok(String::from_utf8(writer.into_inner()?)?)
}

fn format_text(result: &PipelineResult) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "Comprobantes: {} across {} page(s)\n",
        result.total_comprobantes,
        result.pages.len()
    ));
    for page in &result.pages {
        for comp in &page.comprobantes {
            output.push_str(&format!(
                "  pagina {} · comprobante {} → {}",
                comp.page, comp.id, comp.documento_id
            ));
            if let Some(valor) = comp.valor {
                output.push_str(&format!("  ({valor})"));
            }
            output.push('\n');
        }
        for warning in &page.warnings {
            output.push_str(&format!("  ! {warning}\n"));
        }
    }
    output
}
