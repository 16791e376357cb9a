use crate::signal::{PeakSet, WaveFormat, Waveform};
use serde::{Deserialize, Serialize};

/// Every n-th sample is kept for the line trace.
pub const DECIMATION_STRIDE: usize = 4;
/// Samples of context either side of the highlighted beats.
pub const BEAT_MARGIN_SAMPLES: usize = 200;
/// How many leading beats the default raw view frames.
pub const FRAMED_BEATS: usize = 5;
pub const DEFAULT_WINDOW_LEN: usize = 5000;

/// One renderable point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplaySample {
    pub time_ms: f64,
    pub voltage: f64,
    pub is_peak: bool,
}

/// Which part of a recording to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WindowRequest {
    /// Frame the first few beats; with no beats show the first `fallback_len` samples.
    FirstBeats { fallback_len: usize },
    /// A window of `len` samples starting at `offset`, clamped to the recording.
    Scroll { offset: usize, len: usize },
}

impl WindowRequest {
    /// The view each format opens with.
    pub fn default_for(format: WaveFormat, window_len: usize) -> Self {
        match format {
            WaveFormat::RawTabDelimited => WindowRequest::FirstBeats {
                fallback_len: window_len,
            },
            WaveFormat::Csv => WindowRequest::Scroll {
                offset: 0,
                len: window_len,
            },
        }
    }
}

/// Renderer-neutral data for a waveform plot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    /// Decimated line trace.
    pub samples: Vec<DisplaySample>,
    /// Peaks taken from the undecimated signal.
    pub peak_samples: Vec<DisplaySample>,
    /// Visible x-axis range in milliseconds.
    pub x_range: Option<[f64; 2]>,
}

impl Projection {
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty() && self.peak_samples.is_empty()
    }

    pub fn to_figure(&self, title: &str) -> Figure {
        let mut fig = Figure::new(Some(title.to_string()));
        fig.x.label = Some("Time in ms".into());
        fig.y.label = Some("Voltage".into());
        fig.x_range = self.x_range;
        fig.add_series(Series::Line(LineSeries {
            name: "EKG".into(),
            points: self
                .samples
                .iter()
                .map(|s| [s.time_ms, s.voltage])
                .collect(),
            style: Style {
                width: 1.4,
                color: Color(0x1F77B4),
            },
        }));
        fig.add_series(Series::Scatter(ScatterSeries {
            name: "Peaks".into(),
            points: self
                .peak_samples
                .iter()
                .map(|s| [s.time_ms, s.voltage])
                .collect(),
            radius: 4.0,
            color: Color(0xFF0000),
        }));
        fig
    }
}

/// Shape a waveform and its peaks for display. `None` picks the format's default view.
pub fn project_for_display(
    waveform: &Waveform,
    peaks: &PeakSet,
    request: Option<WindowRequest>,
) -> Projection {
    let request =
        request.unwrap_or_else(|| WindowRequest::default_for(waveform.format(), DEFAULT_WINDOW_LEN));
    let n = waveform.sample_count();
    if n == 0 {
        return Projection::default();
    }
    // ignore indices that do not belong to this waveform
    let peaks: Vec<usize> = peaks.indices().iter().copied().filter(|&i| i < n).collect();

    match request {
        WindowRequest::FirstBeats { fallback_len } => {
            let (start, end) = match (peaks.first(), peaks.len()) {
                (Some(&first), count) => {
                    let framed = peaks[count.min(FRAMED_BEATS) - 1];
                    (
                        first.saturating_sub(BEAT_MARGIN_SAMPLES),
                        (framed + BEAT_MARGIN_SAMPLES).min(n),
                    )
                }
                (None, _) => (0, fallback_len.min(n)),
            };
            Projection {
                samples: decimated(waveform, &peaks, 0, n),
                peak_samples: peak_samples(waveform, &peaks, 0, n),
                x_range: x_range(waveform, start, end),
            }
        }
        WindowRequest::Scroll { offset, len } => {
            let len = len.min(n);
            let start = offset.min(n - len);
            let end = start + len;
            Projection {
                samples: decimated(waveform, &peaks, start, end),
                peak_samples: peak_samples(waveform, &peaks, start, end),
                x_range: x_range(waveform, start, end),
            }
        }
    }
}

fn sample_at(waveform: &Waveform, idx: usize, is_peak: bool) -> DisplaySample {
    DisplaySample {
        time_ms: waveform.time()[idx],
        voltage: waveform.voltage()[idx],
        is_peak,
    }
}

fn decimated(waveform: &Waveform, peaks: &[usize], start: usize, end: usize) -> Vec<DisplaySample> {
    (start..end)
        .step_by(DECIMATION_STRIDE)
        .map(|idx| sample_at(waveform, idx, peaks.binary_search(&idx).is_ok()))
        .collect()
}

fn peak_samples(waveform: &Waveform, peaks: &[usize], start: usize, end: usize) -> Vec<DisplaySample> {
    peaks
        .iter()
        .filter(|&&idx| idx >= start && idx < end)
        .map(|&idx| sample_at(waveform, idx, true))
        .collect()
}

fn x_range(waveform: &Waveform, start: usize, end: usize) -> Option<[f64; 2]> {
    if end <= start {
        return None;
    }
    let time = waveform.time();
    Some([time[start], time[end - 1]])
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Axis {
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Style {
    pub width: f32,
    pub color: Color,
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    pub fn rgb(self) -> (u8, u8, u8) {
        (
            ((self.0 >> 16) & 0xFF) as u8,
            ((self.0 >> 8) & 0xFF) as u8,
            (self.0 & 0xFF) as u8,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub style: Style,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScatterSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub radius: f32,
    pub color: Color,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Series {
    Line(LineSeries),
    Scatter(ScatterSeries),
}

impl Series {
    pub fn points(&self) -> &[[f64; 2]] {
        match self {
            Series::Line(line) => &line.points,
            Series::Scatter(scatter) => &scatter.points,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Figure {
    pub title: Option<String>,
    pub x: Axis,
    pub y: Axis,
    pub x_range: Option<[f64; 2]>,
    pub series: Vec<Series>,
}

impl Figure {
    pub fn new(title: impl Into<Option<String>>) -> Self {
        Self {
            title: title.into(),
            x: Axis { label: None },
            y: Axis { label: None },
            x_range: None,
            series: Vec::new(),
        }
    }

    pub fn add_series(&mut self, series: Series) {
        self.series.push(series);
    }
}

pub trait PlotBackend {
    fn draw(&mut self, fig: &Figure) -> anyhow::Result<()>;
}
