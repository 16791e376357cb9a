use assert_cmd::cargo::cargo_bin_cmd;
use ekg_lib::{Analysis, Projection};
use std::{error::Error, path::PathBuf};
use tempfile::tempdir;

fn sample_path(relative: &str) -> String {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .join(relative);
    root.to_string_lossy().to_string()
}

#[test]
fn raw_projection_frames_first_beats() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("ekg");
    cmd.args(["project", &sample_path("test_data/ekg_raw_sample.txt")]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let projection: Projection = serde_json::from_slice(&out)?;

    assert_eq!(projection.samples.len(), 1250);
    assert_eq!(projection.peak_samples.len(), 13);
    assert!(projection.peak_samples.iter().all(|s| s.is_peak));
    // peak 0 at sample 150, peak 4 at sample 1750
    assert_eq!(projection.x_range, Some([0.0, 3898.0]));
    Ok(())
}

#[test]
fn csv_projection_scrolls() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("ekg");
    cmd.args([
        "project",
        &sample_path("test_data/ekg_csv_sample.csv"),
        "--offset",
        "100",
        "--window",
        "500",
    ]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let projection: Projection = serde_json::from_slice(&out)?;

    assert_eq!(projection.samples.len(), 125);
    assert_eq!(projection.x_range, Some([400.0, 2396.0]));
    let peak_times: Vec<f64> = projection.peak_samples.iter().map(|s| s.time_ms).collect();
    assert_eq!(peak_times, vec![500.0, 1500.0]);
    Ok(())
}

#[test]
fn projection_window_clamps_to_end() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("ekg");
    cmd.args([
        "project",
        &sample_path("test_data/ekg_csv_sample.csv"),
        "--config",
        &sample_path("test_data/analysis.toml"),
        "--offset",
        "100000",
    ]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let projection: Projection = serde_json::from_slice(&out)?;

    // window_len = 2500 exceeds the 2000-sample recording
    assert_eq!(projection.x_range, Some([0.0, 7996.0]));
    assert_eq!(projection.peak_samples.len(), 8);
    Ok(())
}

#[test]
fn plot_writes_png() -> Result<(), Box<dyn Error>> {
    let temp = tempdir()?;
    let png = temp.path().join("ekg.png");

    let mut cmd = cargo_bin_cmd!("ekg");
    cmd.args([
        "plot",
        &sample_path("test_data/ekg_raw_sample.txt"),
        "--out",
        png.to_str().expect("utf8 path"),
    ]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let analysis: Analysis = serde_json::from_slice(&out)?;

    assert_eq!(analysis.peak_count, 13);
    assert!(png.exists());
    assert!(std::fs::metadata(&png)?.len() > 0);
    Ok(())
}
