//! Frozen feature-extraction network and its serialized artifact format.
//!
//! An artifact is a plain list of layers run in order over a CHW tensor.
//! Artifacts are stored as bincode (`.bin`) or JSON and checked with
//! [`ModelArtifact::validate`] before the engine accepts them.

use crate::result::{VigiaError, VigiaResult};
use serde::{Deserialize, Serialize};

/// ImageNet channel means, used by the built-in extractor
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// ImageNet channel standard deviations
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Largest accepted `input_size`
pub const MAX_INPUT_SIZE: u32 = 1024;

/// Largest tensor, in elements, any layer may produce
pub const MAX_TENSOR_ELEMENTS: usize = 1 << 24;

/// Dense CHW tensor
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    /// Number of channels
    pub channels: usize,
    /// Height in elements
    pub height: usize,
    /// Width in elements
    pub width: usize,
    /// Row-major data, channel-major
    pub data: Vec<f32>,
}

impl Tensor {
    /// Zero-filled tensor
    #[must_use]
    pub fn zeros(channels: usize, height: usize, width: usize) -> Self {
        Self {
            channels,
            height,
            width,
            data: vec![0.0; channels * height * width],
        }
    }

    /// Shape as (channels, height, width)
    #[must_use]
    pub const fn shape(&self) -> (usize, usize, usize) {
        (self.channels, self.height, self.width)
    }

    #[inline]
    fn at(&self, c: usize, y: usize, x: usize) -> f32 {
        self.data[(c * self.height + y) * self.width + x]
    }

    #[inline]
    fn at_mut(&mut self, c: usize, y: usize, x: usize) -> &mut f32 {
        let (h, w) = (self.height, self.width);
        &mut self.data[(c * h + y) * w + x]
    }
}

/// One step of the frozen pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Layer {
    /// 2D convolution with zero "same" padding (`kernel / 2`)
    Conv2d {
        /// Input channels
        in_channels: usize,
        /// Output channels
        out_channels: usize,
        /// Square kernel size (odd)
        kernel: usize,
        /// Stride in both directions
        stride: usize,
        /// Weights laid out `[out][in][ky][kx]`
        weights: Vec<f32>,
        /// One bias per output channel
        bias: Vec<f32>,
    },
    /// max(0, x)
    Relu,
    /// Non-overlapping max pooling
    MaxPool {
        /// Window size and stride
        size: usize,
    },
    /// Average pooling to a fixed `cells` x `cells` grid
    AdaptiveAvgPool {
        /// Output grid size
        cells: usize,
    },
    /// Fully connected layer over the flattened tensor
    Linear {
        /// Flattened input length
        in_features: usize,
        /// Output length
        out_features: usize,
        /// Weights laid out `[out][in]`
        weights: Vec<f32>,
        /// One bias per output
        bias: Vec<f32>,
    },
    /// Scale the flattened tensor to unit L2 norm (zero vectors pass through)
    L2Normalize,
}

/// A frozen feature extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Model name for logs
    pub name: String,
    /// Images are resized to `input_size` x `input_size`
    pub input_size: u32,
    /// Per-channel mean subtracted after scaling to [0, 1]
    pub mean: [f32; 3],
    /// Per-channel standard deviation divided out after the mean
    pub std: [f32; 3],
    /// Layers applied in order
    pub layers: Vec<Layer>,
}

impl ModelArtifact {
    /// The extractor embedded in the crate
    ///
    /// A strided bank of color and edge filters, max pooling, a seeded random
    /// projection with ReLU, and 4x4 average pooling, giving a 256-float
    /// embedding that keeps coarse layout.
    #[must_use]
    pub fn builtin() -> Self {
        const STEM: usize = 8;
        const PROJ: usize = 16;
        Self {
            name: String::from("vigia-builtin-v1"),
            input_size: 224,
            mean: IMAGENET_MEAN,
            std: IMAGENET_STD,
            layers: vec![
                Layer::Conv2d {
                    in_channels: 3,
                    out_channels: STEM,
                    kernel: 3,
                    stride: 2,
                    weights: stem_filters(),
                    bias: vec![0.0; STEM],
                },
                Layer::MaxPool { size: 2 },
                Layer::Conv2d {
                    in_channels: STEM,
                    out_channels: PROJ,
                    kernel: 3,
                    stride: 2,
                    weights: seeded_weights(0x5EED_0001, PROJ * STEM * 9, (STEM * 9) as f32),
                    bias: vec![0.0; PROJ],
                },
                Layer::Relu,
                Layer::AdaptiveAvgPool { cells: 4 },
                Layer::L2Normalize,
            ],
        }
    }

    /// Decode an artifact from bincode or JSON bytes and validate it
    ///
    /// # Errors
    ///
    /// Returns error if neither format decodes or the layers are inconsistent
    pub fn from_bytes(bytes: &[u8]) -> VigiaResult<Self> {
        let looks_like_json = bytes
            .iter()
            .find(|b| !b.is_ascii_whitespace())
            .is_some_and(|&b| b == b'{');
        let artifact: Self = if looks_like_json {
            serde_json::from_slice(bytes)?
        } else {
            bincode::deserialize(bytes).map_err(|e| {
                VigiaError::inference(format!("invalid model artifact: {e}"))
            })?
        };
        artifact.validate()?;
        Ok(artifact)
    }

    /// Serialize as bincode
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails
    pub fn to_bincode(&self) -> VigiaResult<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| VigiaError::inference(format!("failed to serialize model: {e}")))
    }

    /// Serialize as JSON
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails
    pub fn to_json(&self) -> VigiaResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Check layer shapes; returns the embedding length
    ///
    /// Sizes come from untrusted files, so every product is checked and each
    /// intermediate tensor must stay within [`MAX_TENSOR_ELEMENTS`].
    ///
    /// # Errors
    ///
    /// Returns [`VigiaError::Inference`] describing the first inconsistency
    pub fn validate(&self) -> VigiaResult<usize> {
        if self.input_size == 0 || self.input_size > MAX_INPUT_SIZE {
            return Err(VigiaError::inference(format!(
                "input_size {} outside 1..={MAX_INPUT_SIZE}",
                self.input_size
            )));
        }
        if self.std.iter().any(|s| *s == 0.0 || !s.is_finite()) {
            return Err(VigiaError::inference("std must be finite and non-zero"));
        }
        let n = self.input_size as usize;
        let mut shape = (3usize, n, n);
        for (i, layer) in self.layers.iter().enumerate() {
            shape = layer_output_shape(layer, shape)
                .map_err(|msg| VigiaError::inference(format!("layer {i}: {msg}")))?;
        }
        let dim = element_count(shape)
            .map_err(|msg| VigiaError::inference(format!("output: {msg}")))?;
        if dim == 0 {
            return Err(VigiaError::inference("model produces an empty embedding"));
        }
        Ok(dim)
    }

    /// Run the layers over a preprocessed tensor, returning the flattened output
    ///
    /// # Errors
    ///
    /// Returns error if the input shape does not match `input_size`
    pub fn forward(&self, input: Tensor) -> VigiaResult<Vec<f32>> {
        let n = self.input_size as usize;
        if input.shape() != (3, n, n) {
            return Err(VigiaError::inference(format!(
                "expected input 3x{n}x{n}, got {:?}",
                input.shape()
            )));
        }
        let mut x = input;
        for (i, layer) in self.layers.iter().enumerate() {
            x = apply_layer(layer, x)
                .map_err(|msg| VigiaError::inference(format!("layer {i}: {msg}")))?;
        }
        Ok(x.data)
    }
}

fn element_count((c, h, w): (usize, usize, usize)) -> Result<usize, String> {
    c.checked_mul(h)
        .and_then(|n| n.checked_mul(w))
        .filter(|n| *n <= MAX_TENSOR_ELEMENTS)
        .ok_or_else(|| format!("tensor {c}x{h}x{w} exceeds {MAX_TENSOR_ELEMENTS} elements"))
}

fn checked_product(factors: &[usize]) -> Result<usize, String> {
    factors
        .iter()
        .try_fold(1usize, |acc, f| acc.checked_mul(*f))
        .ok_or_else(|| format!("size product {factors:?} overflows"))
}

fn layer_output_shape(
    layer: &Layer,
    input: (usize, usize, usize),
) -> Result<(usize, usize, usize), String> {
    let (c, h, w) = input;
    let out = match layer {
        Layer::Conv2d {
            in_channels,
            out_channels,
            kernel,
            stride,
            weights,
            bias,
        } => {
            if *in_channels != c {
                return Err(format!("expects {in_channels} channels, got {c}"));
            }
            if *kernel == 0 || kernel % 2 == 0 || *stride == 0 {
                return Err(format!("bad kernel {kernel} / stride {stride}"));
            }
            let expected = checked_product(&[*out_channels, *in_channels, *kernel, *kernel])?;
            if weights.len() != expected || bias.len() != *out_channels {
                return Err(String::from("weight or bias length mismatch"));
            }
            (*out_channels, conv_extent(h, *stride), conv_extent(w, *stride))
        }
        Layer::Relu | Layer::L2Normalize => input,
        Layer::MaxPool { size } => {
            if *size == 0 || h < *size || w < *size {
                return Err(format!("pool {size} does not fit {h}x{w}"));
            }
            (c, h / size, w / size)
        }
        Layer::AdaptiveAvgPool { cells } => {
            if *cells == 0 || h == 0 || w == 0 {
                return Err(String::from("adaptive pool needs a non-empty input"));
            }
            (c, *cells, *cells)
        }
        Layer::Linear {
            in_features,
            out_features,
            weights,
            bias,
        } => {
            let features = element_count(input)?;
            if *in_features != features {
                return Err(format!("expects {in_features} features, got {features}"));
            }
            if weights.len() != checked_product(&[*in_features, *out_features])?
                || bias.len() != *out_features
            {
                return Err(String::from("weight or bias length mismatch"));
            }
            (*out_features, 1, 1)
        }
    };
    element_count(out)?;
    Ok(out)
}

/// Output length of an odd-kernel "same"-padded convolution
const fn conv_extent(len: usize, stride: usize) -> usize {
    len.saturating_sub(1) / stride + 1
}

fn apply_layer(layer: &Layer, x: Tensor) -> Result<Tensor, String> {
    let out_shape = layer_output_shape(layer, x.shape())?;
    Ok(match layer {
        Layer::Conv2d {
            in_channels,
            out_channels,
            kernel,
            stride,
            weights,
            bias,
        } => conv2d(&x, *in_channels, *out_channels, *kernel, *stride, weights, bias, out_shape),
        Layer::Relu => {
            let mut x = x;
            x.data.iter_mut().for_each(|v| *v = v.max(0.0));
            x
        }
        Layer::MaxPool { size } => max_pool(&x, *size, out_shape),
        Layer::AdaptiveAvgPool { cells } => adaptive_avg_pool(&x, *cells),
        Layer::Linear {
            in_features,
            out_features,
            weights,
            bias,
        } => {
            let mut out = Tensor::zeros(*out_features, 1, 1);
            for (j, o) in out.data.iter_mut().enumerate() {
                let row = &weights[j * in_features..(j + 1) * in_features];
                *o = bias[j] + row.iter().zip(&x.data).map(|(w, v)| w * v).sum::<f32>();
            }
            out
        }
        Layer::L2Normalize => {
            let mut x = x;
            let norm = x.data.iter().map(|v| v * v).sum::<f32>().sqrt();
            if norm > 0.0 {
                x.data.iter_mut().for_each(|v| *v /= norm);
            }
            x
        }
    })
}

#[allow(clippy::too_many_arguments)]
fn conv2d(
    x: &Tensor,
    in_c: usize,
    out_c: usize,
    k: usize,
    stride: usize,
    weights: &[f32],
    bias: &[f32],
    (_, oh, ow): (usize, usize, usize),
) -> Tensor {
    let pad = (k / 2) as isize;
    let mut out = Tensor::zeros(out_c, oh, ow);
    for o in 0..out_c {
        for oy in 0..oh {
            for ox in 0..ow {
                let mut acc = bias[o];
                for i in 0..in_c {
                    let wbase = (o * in_c + i) * k * k;
                    for ky in 0..k {
                        let iy = (oy * stride + ky) as isize - pad;
                        if iy < 0 || iy >= x.height as isize {
                            continue;
                        }
                        for kx in 0..k {
                            let ix = (ox * stride + kx) as isize - pad;
                            if ix < 0 || ix >= x.width as isize {
                                continue;
                            }
                            acc += weights[wbase + ky * k + kx] * x.at(i, iy as usize, ix as usize);
                        }
                    }
                }
                *out.at_mut(o, oy, ox) = acc;
            }
        }
    }
    out
}

fn max_pool(x: &Tensor, size: usize, (c, oh, ow): (usize, usize, usize)) -> Tensor {
    let mut out = Tensor::zeros(c, oh, ow);
    for ch in 0..c {
        for oy in 0..oh {
            for ox in 0..ow {
                let mut best = f32::NEG_INFINITY;
                for dy in 0..size {
                    for dx in 0..size {
                        best = best.max(x.at(ch, oy * size + dy, ox * size + dx));
                    }
                }
                *out.at_mut(ch, oy, ox) = best;
            }
        }
    }
    out
}

fn adaptive_avg_pool(x: &Tensor, cells: usize) -> Tensor {
    let mut out = Tensor::zeros(x.channels, cells, cells);
    let span = |cell: usize, len: usize| {
        let start = (cell * len / cells).min(len - 1);
        let end = ((cell + 1) * len / cells).clamp(start + 1, len);
        (start, end)
    };
    for ch in 0..x.channels {
        for cy in 0..cells {
            let (y0, y1) = span(cy, x.height);
            for cx in 0..cells {
                let (x0, x1) = span(cx, x.width);
                let mut sum = 0.0;
                for y in y0..y1 {
                    for xx in x0..x1 {
                        sum += x.at(ch, y, xx);
                    }
                }
                *out.at_mut(ch, cy, cx) = sum / ((y1 - y0) * (x1 - x0)) as f32;
            }
        }
    }
    out
}

/// Hand-set 3x3 stem: channel means, luminance edges, color opponents
fn stem_filters() -> Vec<f32> {
    const BOX: [f32; 9] = [1.0 / 9.0; 9];
    const SOBEL_X: [f32; 9] = [-1.0, 0.0, 1.0, -2.0, 0.0, 2.0, -1.0, 0.0, 1.0];
    const SOBEL_Y: [f32; 9] = [-1.0, -2.0, -1.0, 0.0, 0.0, 0.0, 1.0, 2.0, 1.0];
    const LAPLACE: [f32; 9] = [0.0, 1.0, 0.0, 1.0, -4.0, 1.0, 0.0, 1.0, 0.0];
    const LUMA: [f32; 3] = [0.299, 0.587, 0.114];

    // Per output filter: per-input-channel gain applied to a base kernel
    let bank: [([f32; 3], [f32; 9]); 8] = [
        ([1.0, 0.0, 0.0], BOX),
        ([0.0, 1.0, 0.0], BOX),
        ([0.0, 0.0, 1.0], BOX),
        (LUMA, SOBEL_X),
        (LUMA, SOBEL_Y),
        (LUMA, LAPLACE),
        ([1.0, -1.0, 0.0], BOX),
        ([0.5, 0.5, -1.0], BOX),
    ];
    bank.iter()
        .flat_map(|(gains, kernel)| {
            gains
                .iter()
                .flat_map(move |g| kernel.iter().map(move |k| g * k))
        })
        .collect()
}

/// Deterministic uniform weights scaled by 1/sqrt(fan_in)
fn seeded_weights(seed: u32, len: usize, fan_in: f32) -> Vec<f32> {
    const PCG_MULTIPLIER: u32 = 747796405;
    const PCG_INCREMENT: u32 = 2891336453;
    let scale = fan_in.sqrt().recip() * 3.0f32.sqrt();
    let mut state = seed;
    (0..len)
        .map(|_| {
            state = state
                .wrapping_mul(PCG_MULTIPLIER)
                .wrapping_add(PCG_INCREMENT);
            let word = ((state >> ((state >> 28) + 4)) ^ state).wrapping_mul(277803737);
            let word = (word >> 22) ^ word;
            let unit = (word >> 8) as f32 / (1u32 << 24) as f32;
            (unit * 2.0 - 1.0) * scale
        })
        .collect()
}
