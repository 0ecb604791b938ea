//! Chart artifacts: micro-score distribution and cluster comparison.
//!
//! Rendered with the pure-Rust bitmap backend and no font stack, so the
//! charts are text-free bars; the surrounding report carries the numeric
//! tables. Rendering is deterministic for deterministic inputs.

use crate::core::scores::{ClusterScore, MAX_SCORE};
use crate::error::{RenderError, Result};
use crate::report::assembler::MicroRow;
use plotters::prelude::*;
use std::path::Path;

const WIDTH: u32 = 900;
const HEIGHT: u32 = 540;
const MARGIN: u32 = 20;
const BUCKETS: usize = 20;

fn chart_error(e: impl std::fmt::Display) -> crate::error::Error {
    RenderError::Chart(e.to_string()).into()
}

/// Renders the histogram of normalized micro scores.
///
/// # Errors
///
/// Returns a [`RenderError::Chart`] when drawing fails.
pub fn render_score_distribution(micro: &[MicroRow], path: &Path) -> Result<()> {
    let mut counts = [0usize; BUCKETS];
    for row in micro {
        let fraction = (row.normalized_score / MAX_SCORE).clamp(0.0, 1.0);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let bucket = ((fraction * BUCKETS as f64) as usize).min(BUCKETS - 1);
        counts[bucket] += 1;
    }
    let max_count = counts.iter().copied().max().unwrap_or(0).max(1);

    let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE).map_err(chart_error)?;
    let plot = root.margin(MARGIN, MARGIN, MARGIN, MARGIN);

    let mut chart = ChartBuilder::on(&plot)
        .build_cartesian_2d(0.0..MAX_SCORE, 0usize..(max_count + max_count / 5 + 1))
        .map_err(chart_error)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .draw()
        .map_err(chart_error)?;

    #[allow(clippy::cast_precision_loss)]
    let bucket_width = MAX_SCORE / BUCKETS as f64;
    chart
        .draw_series(counts.iter().enumerate().map(|(i, count)| {
            #[allow(clippy::cast_precision_loss)]
            let x0 = i as f64 * bucket_width;
            let x1 = x0 + bucket_width * 0.92;
            Rectangle::new([(x0, 0), (x1, *count)], BLUE.mix(0.6).filled())
        }))
        .map_err(chart_error)?;

    root.present().map_err(chart_error)?;
    Ok(())
}

/// Renders the cluster comparison bar chart.
///
/// # Errors
///
/// Returns a [`RenderError::Chart`] when drawing fails.
pub fn render_cluster_comparison(clusters: &[ClusterScore], path: &Path) -> Result<()> {
    let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE).map_err(chart_error)?;
    let plot = root.margin(MARGIN, MARGIN, MARGIN, MARGIN);

    let n = clusters.len().max(1);
    let mut chart = ChartBuilder::on(&plot)
        .build_cartesian_2d(0usize..n, 0.0..MAX_SCORE)
        .map_err(chart_error)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .draw()
        .map_err(chart_error)?;

    chart
        .draw_series(clusters.iter().enumerate().map(|(i, c)| {
            Rectangle::new([(i, 0.0), (i + 1, c.score)], GREEN.mix(0.6).filled())
        }))
        .map_err(chart_error)?;

    root.present().map_err(chart_error)?;
    Ok(())
}
