//! Smoke tests for the vigia CLI
//!
//! These tests run the built binary end to end on small generated images.

#![allow(deprecated)] // Allow deprecated Command::cargo_bin until assert_cmd is updated
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use image::{Rgba, RgbaImage};
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

/// Get a command for the vigia binary
fn vigia() -> Command {
    Command::cargo_bin("vigia").expect("vigia binary should exist")
}

fn save(dir: &TempDir, name: &str, img: &RgbaImage) -> PathBuf {
    let path = dir.path().join(name);
    img.save(&path).unwrap();
    path
}

fn white(size: u32) -> RgbaImage {
    RgbaImage::from_pixel(size, size, Rgba([255, 255, 255, 255]))
}

/// White image with the top `rows` rows painted black
fn banded(size: u32, rows: u32) -> RgbaImage {
    RgbaImage::from_fn(size, size, |_, y| {
        if y < rows {
            Rgba([0, 0, 0, 255])
        } else {
            Rgba([255, 255, 255, 255])
        }
    })
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_version_flag() {
    vigia()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.4.0"));
}

#[test]
fn test_help_flag() {
    vigia()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("compare"))
        .stdout(predicate::str::contains("probe"));
}

#[test]
fn test_no_args_fails() {
    vigia().assert().failure();
}

// ============================================================================
// Compare
// ============================================================================

#[test]
fn test_identical_images_exit_zero() {
    let dir = TempDir::new().unwrap();
    let a = save(&dir, "a.png", &white(64));
    vigia()
        .arg("compare")
        .arg(&a)
        .arg(&a)
        .assert()
        .code(0)
        .stdout(predicate::str::starts_with("MATCH"))
        .stdout(predicate::str::contains("strategy=PIXEL_PASS"));
}

#[test]
fn test_clear_mismatch_exit_one() {
    let dir = TempDir::new().unwrap();
    let a = save(&dir, "a.png", &white(64));
    let b = save(&dir, "b.png", &banded(64, 64));
    vigia()
        .arg("compare")
        .arg(&a)
        .arg(&b)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("MISMATCH"))
        .stdout(predicate::str::contains("strategy=PIXEL_FAIL"));
}

#[test]
fn test_gray_zone_without_ai_uses_tolerance() {
    let dir = TempDir::new().unwrap();
    let a = save(&dir, "a.png", &white(100));
    let b = save(&dir, "b.png", &banded(100, 10));
    vigia()
        .args(["compare", "--no-ai", "--tolerance", "0.01"])
        .arg(&a)
        .arg(&b)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("strategy=PIXEL_ONLY"));
}

#[test]
fn test_ignore_region_masks_difference() {
    let dir = TempDir::new().unwrap();
    let a = save(&dir, "a.png", &white(100));
    let b = save(&dir, "b.png", &banded(100, 30));
    vigia()
        .args(["compare", "--ignore", "0,0,100,30"])
        .arg(&a)
        .arg(&b)
        .assert()
        .code(0)
        .stdout(predicate::str::contains("diff=0.00%"));
}

#[test]
fn test_scaled_actual_reported() {
    let dir = TempDir::new().unwrap();
    let a = save(&dir, "a.png", &white(200));
    let b = save(&dir, "b.png", &white(150));
    vigia()
        .arg("compare")
        .arg(&a)
        .arg(&b)
        .assert()
        .code(0)
        .stdout(predicate::str::contains("scaled=1.333"));
}

#[test]
fn test_json_and_diff_out() {
    let dir = TempDir::new().unwrap();
    let a = save(&dir, "a.png", &white(60));
    let b = save(&dir, "b.png", &banded(60, 60));
    let diff = dir.path().join("diff.png");
    let output = vigia()
        .args(["compare", "--json", "--diff-out"])
        .arg(&diff)
        .arg(&a)
        .arg(&b)
        .assert()
        .code(1)
        .get_output()
        .stdout
        .clone();

    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(value["matched"], false);
    assert_eq!(value["strategy"], "PIXEL_FAIL");
    assert!(value["comparison"]["regions"].as_array().unwrap().len() >= 1);
    assert!(diff.exists());
}

#[test]
fn test_missing_file_exit_two() {
    vigia()
        .args(["compare", "/nonexistent/a.png", "/nonexistent/b.png"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("/nonexistent/a.png"));
}

#[test]
fn test_corrupt_image_exit_two() {
    let dir = TempDir::new().unwrap();
    let a = save(&dir, "a.png", &white(8));
    let bad = dir.path().join("bad.png");
    std::fs::write(&bad, b"not an image").unwrap();
    vigia()
        .arg("compare")
        .arg(&a)
        .arg(&bad)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("actual"));
}

#[test]
fn test_bad_ignore_rejected() {
    vigia()
        .args(["compare", "a.png", "b.png", "--ignore", "1,2,3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("X,Y,W,H"));
}

// ============================================================================
// Probe
// ============================================================================

#[test]
fn test_probe_reports_embedded_model() {
    vigia()
        .arg("probe")
        .assert()
        .success()
        .stdout(predicate::str::contains("pixel backend:"))
        .stdout(predicate::str::contains("embedded"));
}

#[test]
fn test_probe_missing_model_path_is_unavailable() {
    vigia()
        .args(["probe", "--json", "--model-path", "/nonexistent/model.bin"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"unavailable\""))
        .stdout(predicate::str::contains("local-path"));
}
