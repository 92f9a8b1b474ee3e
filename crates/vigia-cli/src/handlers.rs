//! Command handlers.
//!
//! Handlers write their report to the given writer and return the outcome;
//! `main` maps that to the exit status.

use crate::commands::{CompareArgs, ModelArgs, ProbeArgs};
use crate::error::{CliError, CliResult};
use serde_json::json;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use vigia::perceptual::RepositoryRef;
use vigia::{
    HybridComparator, HybridConfig, HybridResult, ImageEngine, PerceptualConfig,
    PerceptualEngine, PixelBackend, PixelConfig,
};

/// Verdict of a compare run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Images match
    Match,
    /// Images differ
    Mismatch,
}

impl Outcome {
    /// Process exit status: 0 match, 1 mismatch
    #[must_use]
    pub const fn exit_code(self) -> u8 {
        match self {
            Self::Match => 0,
            Self::Mismatch => 1,
        }
    }
}

/// Exit status for errors
pub const ERROR_EXIT_CODE: u8 = 2;

/// Zone thresholds from the compare flags
#[must_use]
pub const fn hybrid_config(args: &CompareArgs) -> HybridConfig {
    HybridConfig {
        low_pass: args.low_pass,
        tolerance: args.tolerance,
        high_fail: args.high_fail,
        ai_similarity: args.ai_threshold,
    }
}

/// Loader tiers from the model flags; `None` when the fallback is disabled
#[must_use]
pub fn perceptual_config(model: &ModelArgs) -> Option<PerceptualConfig> {
    if model.no_ai {
        return None;
    }
    let mut config = PerceptualConfig::default()
        .with_embedded(!model.has_custom_source())
        .with_download_timeout(Duration::from_secs(model.download_timeout));
    if let Some(path) = &model.model_path {
        config = config.with_local_path(path.clone());
    }
    if let Some(url) = &model.model_url {
        config = config.with_model_url(url.clone());
    }
    if let Some(repo) = &model.model_repo {
        config = config.with_repository(
            RepositoryRef::new(repo.clone(), model.model_file.clone())
                .with_revision(model.model_revision.clone()),
        );
    }
    Some(config)
}

fn perceptual_engine(model: &ModelArgs) -> PerceptualEngine {
    perceptual_config(model).map_or_else(
        || PerceptualEngine::unavailable("disabled by --no-ai"),
        |config| PerceptualEngine::new(&config),
    )
}

fn read_image(path: &Path) -> CliResult<Vec<u8>> {
    std::fs::read(path).map_err(|e| CliError::file(path, e))
}

/// Run `vigia compare`
pub fn run_compare(args: &CompareArgs, out: &mut impl Write) -> CliResult<Outcome> {
    let pixel = ImageEngine::new(PixelConfig::default().with_color_threshold(args.color_threshold));
    let mut comparator = HybridComparator::new(hybrid_config(args))?.with_image_engine(pixel);
    comparator = if args.model.no_ai {
        comparator.without_perceptual()
    } else {
        comparator.with_perceptual(Arc::new(perceptual_engine(&args.model)))
    };

    let baseline = read_image(&args.baseline)?;
    let actual = read_image(&args.actual)?;
    let result = comparator.compare_encoded(&baseline, &actual, &args.ignore)?;

    if let Some(path) = &args.diff_out {
        write_diff(&result, path)?;
        tracing::info!(path = %path.display(), "diff image written");
    }

    if args.json {
        serde_json::to_writer_pretty(&mut *out, &result)?;
        writeln!(out)?;
    } else {
        write_summary(&result, out)?;
    }

    Ok(if result.matched {
        Outcome::Match
    } else {
        Outcome::Mismatch
    })
}

fn write_diff(result: &HybridResult, path: &Path) -> CliResult<()> {
    let artifact = result
        .comparison
        .diff_artifact
        .as_ref()
        .ok_or_else(|| CliError::invalid_argument("comparison produced no diff image"))?;
    let png = vigia::raster::encode_png(artifact)?;
    std::fs::write(path, png).map_err(|e| CliError::file(path, e))
}

fn write_summary(result: &HybridResult, out: &mut impl Write) -> CliResult<()> {
    writeln!(out, "{}", result.summary())?;
    for region in &result.comparison.regions {
        writeln!(
            out,
            "  region {}: {}x{} at ({}, {}), {} px",
            region.label,
            region.width(),
            region.height(),
            region.min_x,
            region.min_y,
            region.pixel_count
        )?;
    }
    Ok(())
}

/// Run `vigia probe`
pub fn run_probe(args: &ProbeArgs, out: &mut impl Write) -> CliResult<()> {
    let backend = PixelBackend::shared();
    let engine = perceptual_engine(&args.model);
    engine.initialize();
    let status = engine.status();

    if args.json {
        let report = json!({
            "pixel_backend": backend.name(),
            "perceptual": status,
        });
        serde_json::to_writer_pretty(&mut *out, &report)?;
        writeln!(out)?;
    } else {
        writeln!(out, "pixel backend: {}", backend.name())?;
        writeln!(out, "perceptual:    {status}")?;
    }
    Ok(())
}
