//! Image preprocessing for the feature extractor.

use super::model::{ModelArtifact, Tensor};
use image::imageops::FilterType;
use image::RgbaImage;

/// Resize to the model's input size and normalize into a CHW tensor
///
/// Alpha is ignored; channels are scaled to [0, 1], then `(v - mean) / std`.
#[must_use]
pub fn preprocess(img: &RgbaImage, model: &ModelArtifact) -> Tensor {
    let n = model.input_size;
    let resized;
    let src = if img.dimensions() == (n, n) {
        img
    } else {
        resized = image::imageops::resize(img, n, n, FilterType::Triangle);
        &resized
    };

    let side = n as usize;
    let plane = side * side;
    let mut tensor = Tensor::zeros(3, side, side);
    for (i, pixel) in src.pixels().enumerate() {
        for c in 0..3 {
            let v = f32::from(pixel[c]) / 255.0;
            tensor.data[c * plane + i] = (v - model.mean[c]) / model.std[c];
        }
    }
    tensor
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use image::Rgba;

    fn unit_model(size: u32) -> ModelArtifact {
        ModelArtifact {
            name: String::from("unit"),
            input_size: size,
            mean: [0.0; 3],
            std: [1.0; 3],
            layers: Vec::new(),
        }
    }

    #[test]
    fn test_output_shape_matches_input_size() {
        let img = RgbaImage::from_pixel(37, 12, Rgba([10, 20, 30, 255]));
        let tensor = preprocess(&img, &unit_model(8));
        assert_eq!(tensor.shape(), (3, 8, 8));
    }

    #[test]
    fn test_channels_are_planar() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 51, 255]));
        let tensor = preprocess(&img, &unit_model(2));
        assert_eq!(&tensor.data[0..4], &[1.0; 4]);
        assert_eq!(&tensor.data[4..8], &[0.0; 4]);
        assert!((tensor.data[8] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_mean_std_normalization() {
        let mut model = unit_model(1);
        model.mean = [0.5, 0.5, 0.5];
        model.std = [0.25, 0.5, 1.0];
        let img = RgbaImage::from_pixel(1, 1, Rgba([255, 255, 255, 0]));
        let tensor = preprocess(&img, &model);
        assert_eq!(tensor.data, vec![2.0, 1.0, 0.5]);
    }
}
