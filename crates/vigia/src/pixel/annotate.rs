//! Diff artifact rendering.
//!
//! Draws on a copy of the actual image: differing pixels are tinted, each
//! region gets a padded ellipse and its numeric label, and a header band
//! reports the region count and total differing pixels.

use super::config::AnnotationStyle;
use super::mask::DiffMask;
use super::regions::DiffRegion;
use image::{Rgba, RgbaImage};

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;
const HEADER_MARGIN: u32 = 4;
const HEADER_BACKGROUND: [u8; 4] = [0, 0, 0, 200];

/// 5x7 bitmap glyphs, one byte per row, bit 4 = leftmost column
fn glyph(c: char) -> [u8; 7] {
    match c.to_ascii_uppercase() {
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        'D' => [0x1C, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1C],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
        _ => [0; 7],
    }
}

/// Rendered width of `text` at `scale` (one blank column between glyphs)
#[must_use]
pub fn text_width(text: &str, scale: u32) -> u32 {
    let n = text.chars().count() as u32;
    if n == 0 {
        return 0;
    }
    (n * (GLYPH_WIDTH + 1) - 1) * scale
}

/// Height of the header band for a glyph scale
#[must_use]
pub const fn header_height(scale: u32) -> u32 {
    GLYPH_HEIGHT * scale + 2 * HEADER_MARGIN
}

/// Header line summarising the diff
#[must_use]
pub fn header_text(region_count: usize, diff_pixels: usize) -> String {
    format!("REGIONS: {region_count}  DIFF PIXELS: {diff_pixels}")
}

/// Render the annotated diff artifact from the (resampled) actual image
#[must_use]
pub fn render_artifact(
    actual: &RgbaImage,
    mask: &DiffMask,
    regions: &[DiffRegion],
    style: &AnnotationStyle,
) -> RgbaImage {
    let mut img = actual.clone();
    let scale = style.glyph_scale.max(1);

    for (x, y) in mask.set_pixels() {
        blend_pixel(&mut img, i64::from(x), i64::from(y), style.tint_color);
    }

    for region in regions {
        let (cx, cy) = region.center();
        let rx = region.width() as f32 / 2.0 + style.ellipse_padding as f32;
        let ry = region.height() as f32 / 2.0 + style.ellipse_padding as f32;
        draw_ellipse(&mut img, cx, cy, rx, ry, style.stroke, style.outline_color);

        let label = region.label.to_string();
        let label_w = i64::from(text_width(&label, scale));
        let label_h = i64::from(GLYPH_HEIGHT * scale);
        let lx = ((cx - rx) as i64).max(0);
        let ly = ((cy - ry) as i64 - label_h - 3).max(0);
        fill_rect(
            &mut img,
            lx - 1,
            ly - 1,
            lx + label_w + 1,
            ly + label_h + 1,
            style.label_background,
        );
        draw_text(&mut img, lx, ly, &label, scale, style.label_color);
    }

    if style.header {
        let text = header_text(regions.len(), mask.count());
        let band = i64::from(header_height(scale));
        let band_w = i64::from(text_width(&text, scale) + 2 * HEADER_MARGIN);
        fill_rect(&mut img, 0, 0, band_w, band, HEADER_BACKGROUND);
        let m = i64::from(HEADER_MARGIN);
        draw_text(&mut img, m, m, &text, scale, style.label_color);
    }

    img
}

/// Blend a color over one pixel using the color's alpha; clipped
fn blend_pixel(img: &mut RgbaImage, x: i64, y: i64, color: [u8; 4]) {
    if x < 0 || y < 0 || x >= i64::from(img.width()) || y >= i64::from(img.height()) {
        return;
    }
    let (x, y) = (x as u32, y as u32);
    let alpha = f32::from(color[3]) / 255.0;
    let base = img.get_pixel(x, y);
    let blended = Rgba([
        blend_channel(base[0], color[0], alpha),
        blend_channel(base[1], color[1], alpha),
        blend_channel(base[2], color[2], alpha),
        255,
    ]);
    img.put_pixel(x, y, blended);
}

/// Blend two color channels with alpha
fn blend_channel(base: u8, overlay: u8, alpha: f32) -> u8 {
    let result = f32::from(base).mul_add(1.0 - alpha, f32::from(overlay) * alpha);
    result.round().clamp(0.0, 255.0) as u8
}

/// Fill the half-open rectangle [x0, x1) x [y0, y1); clipped
fn fill_rect(img: &mut RgbaImage, x0: i64, y0: i64, x1: i64, y1: i64, color: [u8; 4]) {
    for y in y0.max(0)..y1.min(i64::from(img.height())) {
        for x in x0.max(0)..x1.min(i64::from(img.width())) {
            blend_pixel(img, x, y, color);
        }
    }
}

fn draw_text(img: &mut RgbaImage, x: i64, y: i64, text: &str, scale: u32, color: [u8; 4]) {
    let s = i64::from(scale);
    let advance = i64::from(GLYPH_WIDTH + 1) * s;
    for (i, c) in text.chars().enumerate() {
        let gx = x + i as i64 * advance;
        for (row, bits) in glyph(c).iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (0x10 >> col) == 0 {
                    continue;
                }
                let px = gx + i64::from(col) * s;
                let py = y + row as i64 * s;
                fill_rect(img, px, py, px + s, py + s, color);
            }
        }
    }
}

fn draw_ellipse(img: &mut RgbaImage, cx: f32, cy: f32, rx: f32, ry: f32, stroke: u32, color: [u8; 4]) {
    for t in 0..stroke.max(1) {
        let (rx, ry) = (rx + t as f32, ry + t as f32);
        // Enough samples that consecutive points are at most ~0.5px apart
        let steps = (std::f32::consts::TAU * rx.max(ry) * 2.0).ceil().max(8.0) as u32;
        for i in 0..steps {
            let theta = std::f32::consts::TAU * i as f32 / steps as f32;
            let x = (cx + rx * theta.cos()).round() as i64;
            let y = (cy + ry * theta.sin()).round() as i64;
            blend_pixel(img, x, y, color);
        }
    }
}
