use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use plotters::prelude::*;
use serde::Serialize;

use crate::config::{PlotRange, SimConfig};
use crate::spectrum::Spectrum;
use crate::verdict::Verdict;
use crate::Outcome;

const PLOT_FILE: &str = "bmv_noise_spectrum.png";
const SUMMARY_FILE: &str = "summary.json";

#[derive(Debug, Clone, Serialize)]
pub struct OutputFiles {
    pub output_dir: PathBuf,
    pub plot_path: PathBuf,
    pub summary_path: PathBuf,
}

impl OutputFiles {
    pub fn in_dir(output_dir: &Path) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
            plot_path: output_dir.join(PLOT_FILE),
            summary_path: output_dir.join(SUMMARY_FILE),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub config: SimConfig,
    pub samples: usize,
    pub segments: usize,
    pub resolution_hz: f64,
    pub verdict: Verdict,
    pub outputs: OutputFiles,
}

impl Summary {
    pub fn new(config: &SimConfig, outcome: &Outcome, outputs: OutputFiles) -> Self {
        Self {
            config: config.clone(),
            samples: config.samples(),
            segments: outcome.spectrum.segments,
            resolution_hz: outcome.spectrum.resolution_hz,
            verdict: outcome.verdict,
            outputs,
        }
    }
}

pub fn write_summary(path: &Path, summary: &Summary) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let data = serde_json::to_string_pretty(summary)?;
    fs::write(path, data).with_context(|| format!("failed to write summary {}", path.display()))?;
    Ok(())
}

/// Log-log ASD with the threshold line and the shaded detection region.
pub fn plot_spectrum(
    spectrum: &Spectrum,
    threshold: f64,
    range: &PlotRange,
    path: &Path,
) -> anyhow::Result<()> {
    range.validate()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let root = BitMapBackend::new(path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let x_range = range.freq_min_hz..range.freq_max_hz;
    let y_range = range.asd_min..range.asd_max;

    let mut chart = ChartBuilder::on(&root)
        .caption("Acceleration Noise Spectrum", ("sans-serif", 30).into_font())
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(90)
        .build_cartesian_2d(x_range.clone().log_scale(), y_range.clone().log_scale())?;

    chart
        .configure_mesh()
        .x_desc("Frequency [Hz]")
        .y_desc("Acceleration noise [m/s^2/sqrt(Hz)]")
        .y_label_formatter(&|v| format!("{v:.0e}"))
        .draw()?;

    let shade = RED.mix(0.1);
    chart.draw_series(std::iter::once(Rectangle::new(
        [(x_range.start, y_range.start), (x_range.end, threshold.min(y_range.end))],
        shade.filled(),
    )))?;

    chart
        .draw_series(LineSeries::new(
            spectrum
                .points()
                .filter(|&(f, _)| f >= x_range.start && f <= x_range.end)
                .map(|(f, a)| (f, a.clamp(y_range.start, y_range.end))),
            GREEN.stroke_width(2),
        ))?
        .label("Total noise")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 25, y)], GREEN.stroke_width(3)));

    chart
        .draw_series(LineSeries::new(
            vec![(x_range.start, threshold), (x_range.end, threshold)],
            RED.stroke_width(2),
        ))?
        .label(format!("Threshold ({threshold:.0e})"))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 25, y)], RED.stroke_width(3)));

    let label_at = (
        (x_range.start * x_range.end).sqrt() / 4.0,
        threshold / 2.0,
    );
    chart.draw_series(std::iter::once(Text::new(
        "DETECTION POSSIBLE",
        label_at,
        ("sans-serif", 20).into_font().color(&RED),
    )))?;

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .border_style(BLACK)
        .background_style(WHITE.mix(0.7))
        .draw()?;

    root.present()?;
    Ok(())
}

/// Persist the plot and the JSON summary for one run.
pub fn write_outputs(config: &SimConfig, outcome: &Outcome, output_dir: &Path) -> anyhow::Result<OutputFiles> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output directory {}", output_dir.display()))?;
    let files = OutputFiles::in_dir(output_dir);

    plot_spectrum(&outcome.spectrum, config.threshold, &config.plot, &files.plot_path)
        .with_context(|| format!("failed to render {}", files.plot_path.display()))?;
    write_summary(&files.summary_path, &Summary::new(config, outcome, files.clone()))?;

    Ok(files)
}
