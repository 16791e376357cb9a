use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use ekg_lib::{
    config::AnalysisConfig,
    detectors::ecg::{detect_peaks_with_profile, DetectionProfile},
    io::WaveformSource,
    pipeline::{Analysis, Recording},
    plot::{project_for_display, Figure, PlotBackend, Series, WindowRequest},
    signal::{WaveFormat, Waveform},
};
use log::{info, warn};
use plotters::prelude::*;
use serde_json::json;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "ekg",
    version,
    about = "EKG: single-lead R-peak detection and heart rate"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum FormatArg {
    /// Tab-delimited voltage matrix sampled at 500 Hz
    Raw,
    /// Headered CSV with time (s) and voltage (mV)
    Csv,
}

impl FormatArg {
    fn hint(self) -> &'static str {
        match self {
            FormatArg::Raw => "raw",
            FormatArg::Csv => "csv",
        }
    }
}

#[derive(Args, Debug)]
struct DetectArgs {
    /// Override format detection from the file extension
    #[arg(long, value_enum)]
    format: Option<FormatArg>,
    /// Voltage threshold in the recording's own units
    #[arg(long)]
    threshold: Option<f64>,
    #[arg(long)]
    min_distance_ms: Option<f64>,
    /// TOML file with per-format detection and display settings
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct WindowArgs {
    /// First sample of a scroll window
    #[arg(long)]
    offset: Option<usize>,
    /// Window length in samples
    #[arg(long)]
    window: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect R-peaks and estimate heart rate, printed as JSON
    Analyze {
        input: PathBuf,
        #[command(flatten)]
        detect: DetectArgs,
    },
    /// Print the decimated display projection as JSON
    Project {
        input: PathBuf,
        #[command(flatten)]
        detect: DetectArgs,
        #[command(flatten)]
        window: WindowArgs,
    },
    /// Render the waveform with highlighted peaks to a PNG via plotters
    Plot {
        input: PathBuf,
        #[arg(long)]
        out: PathBuf,
        #[command(flatten)]
        detect: DetectArgs,
        #[command(flatten)]
        window: WindowArgs,
    },
    /// Analyze several recordings, one JSON line each; failures do not stop the run
    Summary {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze { input, detect } => cmd_analyze(&input, &detect)?,
        Commands::Project {
            input,
            detect,
            window,
        } => cmd_project(&input, &detect, &window)?,
        Commands::Plot {
            input,
            out,
            detect,
            window,
        } => cmd_plot(&input, &out, &detect, &window)?,
        Commands::Summary { inputs, config } => cmd_summary(&inputs, config.as_deref())?,
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    match path {
        Some(path) => AnalysisConfig::load(path),
        None => Ok(AnalysisConfig::default()),
    }
}

struct Prepared {
    waveform: Waveform,
    profile: DetectionProfile,
    config: AnalysisConfig,
}

fn prepare(input: &Path, detect: &DetectArgs) -> Result<Prepared> {
    let config = load_config(detect.config.as_deref())?;
    let source = WaveformSource::new(input, detect.format.map(FormatArg::hint))?;
    let waveform = source.load()?;
    let mut profile = config.profile_for(source.format());
    if let Some(threshold) = detect.threshold {
        profile.threshold = threshold;
    }
    if let Some(min_distance_ms) = detect.min_distance_ms {
        profile.min_distance_ms = min_distance_ms;
    }
    Ok(Prepared {
        waveform,
        profile,
        config,
    })
}

fn window_request(format: WaveFormat, window: &WindowArgs, config: &AnalysisConfig) -> WindowRequest {
    let len = window.window.unwrap_or(config.display.window_len);
    match window.offset {
        Some(offset) => WindowRequest::Scroll { offset, len },
        None => WindowRequest::default_for(format, len),
    }
}

fn cmd_analyze(input: &Path, detect: &DetectArgs) -> Result<()> {
    let prepared = prepare(input, detect)?;
    let peaks = detect_peaks_with_profile(&prepared.waveform, &prepared.profile);
    let analysis = Analysis::from_peaks(&prepared.waveform, &prepared.profile, peaks);
    println!("{}", serde_json::to_string(&analysis)?);
    Ok(())
}

fn cmd_project(input: &Path, detect: &DetectArgs, window: &WindowArgs) -> Result<()> {
    let prepared = prepare(input, detect)?;
    let peaks = detect_peaks_with_profile(&prepared.waveform, &prepared.profile);
    let request = window_request(prepared.waveform.format(), window, &prepared.config);
    let projection = project_for_display(&prepared.waveform, &peaks, Some(request));
    println!("{}", serde_json::to_string(&projection)?);
    Ok(())
}

fn cmd_plot(input: &Path, out: &Path, detect: &DetectArgs, window: &WindowArgs) -> Result<()> {
    let prepared = prepare(input, detect)?;
    let peaks = detect_peaks_with_profile(&prepared.waveform, &prepared.profile);
    let request = window_request(prepared.waveform.format(), window, &prepared.config);
    let projection = project_for_display(&prepared.waveform, &peaks, Some(request));
    let fig = projection.to_figure("EKG Signal");
    PngPlot::new(out).draw(&fig)?;
    let analysis = Analysis::from_peaks(&prepared.waveform, &prepared.profile, peaks);
    info!(
        "wrote {} ({} peaks, {:.1} bpm)",
        out.display(),
        analysis.peak_count,
        analysis.heart_rate_bpm
    );
    println!("{}", serde_json::to_string(&analysis)?);
    Ok(())
}

fn cmd_summary(inputs: &[PathBuf], config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    for input in inputs {
        let id = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| input.display().to_string());
        let result = WaveformSource::new(input, None).and_then(|source| {
            let profile = config.profile_for(source.format());
            Recording::new(id.clone(), None, source).analyze(&profile)
        });
        let line = match result {
            Ok(analysis) => json!({
                "path": input.display().to_string(),
                "id": id,
                "duration_min": analysis.duration_min(),
                "analysis": analysis,
            }),
            Err(err) => {
                warn!("skipping {}: {}", input.display(), err);
                json!({
                    "path": input.display().to_string(),
                    "id": id,
                    "duration_min": null,
                    "error": err.to_string(),
                    "kind": err.kind(),
                })
            }
        };
        println!("{}", line);
    }
    Ok(())
}

/// Renders a [`Figure`] to a PNG bitmap.
struct PngPlot {
    path: PathBuf,
    size: (u32, u32),
}

impl PngPlot {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            size: (1000, 480),
        }
    }
}

impl PlotBackend for PngPlot {
    fn draw(&mut self, fig: &Figure) -> Result<()> {
        let root = BitMapBackend::new(&self.path, self.size).into_drawing_area();
        root.fill(&WHITE)?;

        let all_x = fig.series.iter().flat_map(|s| s.points().iter().map(|p| p[0]));
        let (x_min, x_max) = match fig.x_range {
            Some([lo, hi]) if hi > lo => (lo, hi),
            _ => bounds(all_x),
        };
        let visible_y = fig.series.iter().flat_map(|s| {
            s.points()
                .iter()
                .filter(move |p| p[0] >= x_min && p[0] <= x_max)
                .map(|p| p[1])
        });
        let (y_min, y_max) = bounds(visible_y);

        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption(
                fig.title.clone().unwrap_or_else(|| "Plot".into()),
                ("sans-serif", 24),
            )
            .x_label_area_size(30)
            .y_label_area_size(50)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)?;
        chart
            .configure_mesh()
            .x_desc(fig.x.label.clone().unwrap_or_default())
            .y_desc(fig.y.label.clone().unwrap_or_default())
            .draw()?;

        let in_view = |p: &&[f64; 2]| p[0] >= x_min && p[0] <= x_max;
        for series in &fig.series {
            match series {
                Series::Line(line) => {
                    let (r, g, b) = line.style.color.rgb();
                    chart.draw_series(LineSeries::new(
                        line.points.iter().filter(in_view).map(|p| (p[0], p[1])),
                        RGBColor(r, g, b).stroke_width(line.style.width.round().max(1.0) as u32),
                    ))?;
                }
                Series::Scatter(scatter) => {
                    let (r, g, b) = scatter.color.rgb();
                    let radius = scatter.radius.round() as i32;
                    chart.draw_series(
                        scatter
                            .points
                            .iter()
                            .filter(in_view)
                            .map(|p| Circle::new((p[0], p[1]), radius, RGBColor(r, g, b).filled())),
                    )?;
                }
            }
        }
        root.present()
            .with_context(|| format!("writing {}", self.path.display()))?;
        Ok(())
    }
}

/// Min/max of the values, widened so the range is never empty.
fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !lo.is_finite() || !hi.is_finite() {
        (0.0, 1.0)
    } else if lo == hi {
        (lo - 1.0, hi + 1.0)
    } else {
        (lo, hi)
    }
}
