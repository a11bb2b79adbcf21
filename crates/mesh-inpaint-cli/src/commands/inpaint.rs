//! inpaint command - fill the hole and write the result.

use anyhow::{Context, Result};
use colored::Colorize;
use mesh_inpaint::{InpaintParams, InpaintStats, inpaint_file};
use serde::Serialize;

use crate::{Cli, OutputFormat, output};

#[derive(Serialize)]
struct InpaintSummary {
    input: String,
    output: String,
    success: bool,
    upsample_level: usize,
    target_faces: Option<usize>,
    stats: InpaintStats,
}

/// Combine the config file (if any) with the flags given on the command line.
pub fn resolve_params(cli: &Cli) -> Result<InpaintParams> {
    let mut params = match &cli.config {
        Some(path) => InpaintParams::from_file(path)
            .with_context(|| format!("Failed to read parameters from {:?}", path))?,
        None => InpaintParams::default(),
    };

    if let Some(level) = cli.upsample {
        params.upsample_level = level;
    }
    if let Some(faces) = cli.outfaces {
        params.target_faces = Some(faces);
    }
    if let Some(order) = cli.fairing_order {
        params.fairing.order = order;
    }
    if let Some(cost) = cli.cost {
        params.decimate.cost = cost.into();
    }
    if let Some(epsilon) = cli.weld_epsilon {
        params.weld.epsilon = epsilon;
    }
    if cli.preserve_boundary {
        params.decimate.preserve_boundary = true;
    }

    params.validate().context("Invalid pipeline parameters")?;
    Ok(params)
}

pub fn run(cli: &Cli) -> Result<()> {
    let params = resolve_params(cli)?;
    let target_faces = params.decimation_target();

    let result = inpaint_file(&cli.input, &cli.output, &params).with_context(|| {
        format!(
            "Failed to fill the hole in {:?} and write {:?}",
            cli.input, cli.output
        )
    })?;

    let summary = InpaintSummary {
        input: cli.input.display().to_string(),
        output: cli.output.display().to_string(),
        success: true,
        upsample_level: params.upsample_level,
        target_faces,
        stats: result.stats,
    };

    match cli.format {
        OutputFormat::Json => {
            output::print(&summary, cli.format, cli.quiet);
        }
        OutputFormat::Text => {
            if !cli.quiet {
                let stats = &summary.stats;
                output::success(
                    &format!("Filled mesh saved to {}", cli.output.display()),
                    cli.format,
                    cli.quiet,
                );
                println!(
                    "  {}: {} vertices (of {} boundary loops)",
                    "Hole".cyan(),
                    stats.loop_len,
                    stats.loops_found
                );
                println!(
                    "  {}: level {} → {} faces, patch {} faces",
                    "Upsample".cyan(),
                    summary.upsample_level,
                    stats.upsampled_faces,
                    stats.patch_faces
                );
                println!(
                    "  {}: {} free, {} fixed (residual {:.2e})",
                    "Fairing".cyan(),
                    stats.free_vertices,
                    stats.fixed_vertices,
                    stats.fairing_residual
                );
                println!(
                    "  {}: {} → {} faces ({} collapses)",
                    "Decimation".cyan(),
                    stats.faces_before_decimation,
                    stats.final_faces,
                    stats.collapses_performed
                );
                println!(
                    "  {}: {} → {} vertices, {} → {} faces",
                    "Mesh".green(),
                    stats.input_vertices,
                    stats.final_vertices,
                    stats.input_faces,
                    stats.final_faces
                );
            }
        }
    }

    if let Some(target) = target_faces.filter(|&t| summary.stats.final_faces > t) {
        output::warning(
            &format!(
                "Could not reach {} faces without breaking the surface; kept {}",
                target, summary.stats.final_faces
            ),
            cli.format,
            cli.quiet,
        );
    }

    Ok(())
}
