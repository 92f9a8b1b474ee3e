//! Diff-mask backends.
//!
//! One [`DiffBackend`] interface, two implementations:
//!
//! - [`ScalarBackend`]: the reference per-pixel loop, always available.
//! - `GpuBackend` (feature `gpu`): thresholds on trueno's GPU device
//!   (wgpu/Vulkan/Metal/DX12).
//!
//! The choice is made once by [`PixelBackend::probe`]; comparisons never
//! branch on errors to pick a backend. Both produce identical masks: the GPU
//! path evaluates `sigmoid((delta - threshold - 0.5) * k) > 0.5`. Integer
//! deltas never land on the half step, so every input sits at least `k / 2`
//! from zero and the GPU's `exp` rounding cannot flip a bit.

use super::mask::DiffMask;
use image::{Rgba, RgbaImage};
use std::fmt::Debug;
use std::sync::{Arc, OnceLock};

#[cfg(feature = "gpu")]
use std::sync::Mutex;
#[cfg(feature = "gpu")]
use trueno::backends::gpu::GpuDevice;

/// Computes the binary diff mask of two equally-sized images
pub trait DiffBackend: Send + Sync + Debug {
    /// Short backend name for logs and results
    fn name(&self) -> &'static str;

    /// Mark every pixel whose largest RGBA channel delta exceeds `threshold`
    ///
    /// Callers guarantee both images have the same dimensions.
    fn diff_mask(&self, baseline: &RgbaImage, actual: &RgbaImage, threshold: u8) -> DiffMask;

    /// Release any process-wide resources held by the backend
    fn dispose(&self) {}
}

/// Largest absolute channel difference between two pixels
#[inline]
#[must_use]
pub fn channel_delta(a: Rgba<u8>, b: Rgba<u8>) -> u8 {
    a.0.iter()
        .zip(b.0.iter())
        .map(|(&x, &y)| x.abs_diff(y))
        .max()
        .unwrap_or(0)
}

fn deltas(baseline: &RgbaImage, actual: &RgbaImage) -> Vec<u8> {
    baseline
        .pixels()
        .zip(actual.pixels())
        .map(|(a, b)| channel_delta(*a, *b))
        .collect()
}

fn threshold_deltas(width: u32, height: u32, deltas: &[u8], threshold: u8) -> DiffMask {
    let bits = deltas.iter().map(|&d| d > threshold).collect();
    DiffMask::from_bits(width, height, bits).unwrap_or_else(|| DiffMask::new(width, height))
}

/// Reference in-process implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalarBackend;

impl DiffBackend for ScalarBackend {
    fn name(&self) -> &'static str {
        "scalar"
    }

    fn diff_mask(&self, baseline: &RgbaImage, actual: &RgbaImage, threshold: u8) -> DiffMask {
        let (width, height) = baseline.dimensions();
        threshold_deltas(width, height, &deltas(baseline, actual), threshold)
    }
}

/// Below this many pixels the transfer overhead outweighs GPU dispatch
#[cfg(feature = "gpu")]
const GPU_MIN_PIXELS: usize = 100_000;

/// Sigmoid steepness; a delta one step above threshold maps to ~1.0
const SIGMOID_SCALE: f32 = 100.0;

/// Sigmoid input for one delta, centered half a step above `threshold`
#[cfg_attr(not(feature = "gpu"), allow(dead_code))]
fn sigmoid_input(delta: u8, threshold: u8) -> f32 {
    (f32::from(delta) - f32::from(threshold) - 0.5) * SIGMOID_SCALE
}

/// Accelerated backend on trueno's GPU device
#[cfg(feature = "gpu")]
pub struct GpuBackend {
    device: Mutex<Option<GpuDevice>>,
}

#[cfg(feature = "gpu")]
impl Debug for GpuBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let live = self
            .device
            .lock()
            .map(|d| d.is_some())
            .unwrap_or(false);
        f.debug_struct("GpuBackend").field("live", &live).finish()
    }
}

#[cfg(feature = "gpu")]
impl GpuBackend {
    /// Acquire the GPU device
    ///
    /// # Errors
    ///
    /// Returns the device error message if no adapter can be opened
    pub fn new() -> Result<Self, String> {
        let device = GpuDevice::new()?;
        Ok(Self {
            device: Mutex::new(Some(device)),
        })
    }

    /// Check if a GPU adapter is present
    pub fn is_available() -> bool {
        GpuDevice::is_available()
    }
}

#[cfg(feature = "gpu")]
impl DiffBackend for GpuBackend {
    fn name(&self) -> &'static str {
        "gpu"
    }

    fn diff_mask(&self, baseline: &RgbaImage, actual: &RgbaImage, threshold: u8) -> DiffMask {
        let (width, height) = baseline.dimensions();
        let deltas = deltas(baseline, actual);
        if deltas.len() < GPU_MIN_PIXELS {
            return threshold_deltas(width, height, &deltas, threshold);
        }

        let guard = self
            .device
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let Some(device) = guard.as_ref() else {
            tracing::debug!("GPU backend disposed, thresholding on CPU");
            return threshold_deltas(width, height, &deltas, threshold);
        };

        let scaled: Vec<f32> = deltas
            .iter()
            .map(|&d| sigmoid_input(d, threshold))
            .collect();
        let mut activations = vec![0.0f32; scaled.len()];
        match device.sigmoid(&scaled, &mut activations) {
            Ok(()) => {
                let bits = activations.iter().map(|&v| v > 0.5).collect();
                DiffMask::from_bits(width, height, bits)
                    .unwrap_or_else(|| threshold_deltas(width, height, &deltas, threshold))
            }
            Err(e) => {
                tracing::warn!(error = %e, "GPU dispatch failed, falling back to scalar diff");
                threshold_deltas(width, height, &deltas, threshold)
            }
        }
    }

    fn dispose(&self) {
        let mut guard = self
            .device
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if guard.take().is_some() {
            tracing::info!("GPU diff backend released");
        }
    }
}

/// Handle to the diff backend selected for this process
#[derive(Debug, Clone)]
pub struct PixelBackend {
    inner: Arc<dyn DiffBackend>,
}

impl Default for PixelBackend {
    fn default() -> Self {
        Self::shared()
    }
}

impl PixelBackend {
    /// Probe capabilities and pick the best available backend
    #[must_use]
    pub fn probe() -> Self {
        #[cfg(feature = "gpu")]
        {
            if GpuBackend::is_available() {
                match GpuBackend::new() {
                    Ok(backend) => {
                        tracing::info!("pixel diff backend: gpu");
                        return Self::with_backend(Arc::new(backend));
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "GPU adapter present but unusable, using scalar backend");
                    }
                }
            }
        }
        tracing::debug!("pixel diff backend: scalar");
        Self::scalar()
    }

    /// The reference scalar backend
    #[must_use]
    pub fn scalar() -> Self {
        Self::with_backend(Arc::new(ScalarBackend))
    }

    /// Wrap a custom backend
    #[must_use]
    pub fn with_backend(inner: Arc<dyn DiffBackend>) -> Self {
        Self { inner }
    }

    /// Process-wide backend, probed on first use
    #[must_use]
    pub fn shared() -> Self {
        static SHARED: OnceLock<PixelBackend> = OnceLock::new();
        SHARED.get_or_init(Self::probe).clone()
    }

    /// Backend name
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.inner.name()
    }

    /// Compute the diff mask
    #[must_use]
    pub fn diff_mask(&self, baseline: &RgbaImage, actual: &RgbaImage, threshold: u8) -> DiffMask {
        self.inner.diff_mask(baseline, actual, threshold)
    }

    /// Release backend resources; call once at process shutdown
    ///
    /// Later comparisons still work through the reference path.
    pub fn dispose(&self) {
        self.inner.dispose();
    }
}
