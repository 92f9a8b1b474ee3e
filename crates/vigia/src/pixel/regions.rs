//! Connected-component detection over a [`DiffMask`].
//!
//! Flood fill joins differing pixels within `gap_radius` (Chebyshev) of each
//! other, components under the noise floor are dropped, and bounding boxes
//! whose padded extents overlap are merged until a fixpoint. Survivors are
//! sorted top-to-bottom, left-to-right and numbered from 1, so labels do not
//! depend on scan order.

use super::config::RegionConfig;
use super::mask::DiffMask;
use serde::{Deserialize, Serialize};

/// A cluster of differing pixels reported as one unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffRegion {
    /// 1-based label, assigned after position sorting
    pub label: u32,
    /// Left edge (inclusive)
    pub min_x: u32,
    /// Top edge (inclusive)
    pub min_y: u32,
    /// Right edge (inclusive)
    pub max_x: u32,
    /// Bottom edge (inclusive)
    pub max_y: u32,
    /// Number of differing pixels in the region
    pub pixel_count: usize,
}

impl DiffRegion {
    fn seed(x: u32, y: u32) -> Self {
        Self {
            label: 0,
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
            pixel_count: 0,
        }
    }

    fn include(&mut self, x: u32, y: u32) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
        self.pixel_count += 1;
    }

    /// Bounding box width in pixels
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    /// Bounding box height in pixels
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    /// Center of the bounding box
    #[must_use]
    pub fn center(&self) -> (f32, f32) {
        (
            (self.min_x as f32 + self.max_x as f32) / 2.0,
            (self.min_y as f32 + self.max_y as f32) / 2.0,
        )
    }

    /// Whether the two boxes overlap once each is grown by `padding` per side
    #[must_use]
    pub fn padded_overlaps(&self, other: &Self, padding: u32) -> bool {
        let pad = i64::from(padding);
        let overlaps = |a_min: u32, a_max: u32, b_min: u32, b_max: u32| {
            i64::from(a_min) - pad <= i64::from(b_max) + pad
                && i64::from(b_min) - pad <= i64::from(a_max) + pad
        };
        overlaps(self.min_x, self.max_x, other.min_x, other.max_x)
            && overlaps(self.min_y, self.max_y, other.min_y, other.max_y)
    }

    /// Smallest region covering both, with pixel counts summed
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            label: 0,
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
            pixel_count: self.pixel_count + other.pixel_count,
        }
    }
}

/// Detect, merge and label diff regions
#[must_use]
pub fn detect_regions(mask: &DiffMask, config: &RegionConfig) -> Vec<DiffRegion> {
    let components = flood_fill(mask, config.gap_radius.max(1));
    let mut regions: Vec<DiffRegion> = components
        .into_iter()
        .filter(|c| c.pixel_count >= config.min_pixels)
        .collect();

    merge_to_fixpoint(&mut regions, config.merge_padding);

    regions.sort_by_key(|r| (r.min_y, r.min_x, r.max_y, r.max_x));
    for (i, region) in regions.iter_mut().enumerate() {
        region.label = i as u32 + 1;
    }
    regions
}

fn flood_fill(mask: &DiffMask, radius: u32) -> Vec<DiffRegion> {
    let (width, height) = (mask.width(), mask.height());
    let mut visited = vec![false; mask.len()];
    let mut components = Vec::new();
    let mut stack = Vec::new();
    let r = i64::from(radius);

    for (sx, sy) in mask.set_pixels() {
        let seed_idx = sy as usize * width as usize + sx as usize;
        if visited[seed_idx] {
            continue;
        }
        visited[seed_idx] = true;
        stack.push((sx, sy));
        let mut component = DiffRegion::seed(sx, sy);

        while let Some((x, y)) = stack.pop() {
            component.include(x, y);
            let (x, y) = (i64::from(x), i64::from(y));
            for ny in (y - r).max(0)..=(y + r).min(i64::from(height) - 1) {
                for nx in (x - r).max(0)..=(x + r).min(i64::from(width) - 1) {
                    let (nx, ny) = (nx as u32, ny as u32);
                    let idx = ny as usize * width as usize + nx as usize;
                    if !visited[idx] && mask.get(nx, ny) {
                        visited[idx] = true;
                        stack.push((nx, ny));
                    }
                }
            }
        }
        components.push(component);
    }
    components
}

fn merge_to_fixpoint(regions: &mut Vec<DiffRegion>, padding: u32) {
    let mut changed = true;
    while changed {
        changed = false;
        'scan: for i in 0..regions.len() {
            for j in (i + 1)..regions.len() {
                if regions[i].padded_overlaps(&regions[j], padding) {
                    let other = regions.swap_remove(j);
                    regions[i] = regions[i].union(&other);
                    changed = true;
                    break 'scan;
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn mask_with_blocks(width: u32, height: u32, blocks: &[(u32, u32, u32, u32)]) -> DiffMask {
        let mut mask = DiffMask::new(width, height);
        for &(bx, by, bw, bh) in blocks {
            for y in by..by + bh {
                for x in bx..bx + bw {
                    mask.set(x, y, true);
                }
            }
        }
        mask
    }

    mod detection_tests {
        use super::*;

        #[test]
        fn test_empty_mask_has_no_regions() {
            let mask = DiffMask::new(50, 50);
            assert!(detect_regions(&mask, &RegionConfig::default()).is_empty());
        }

        #[test]
        fn test_single_block() {
            let mask = mask_with_blocks(50, 50, &[(5, 6, 10, 4)]);
            let regions = detect_regions(&mask, &RegionConfig::default());
            assert_eq!(regions.len(), 1);
            let r = regions[0];
            assert_eq!((r.min_x, r.min_y, r.max_x, r.max_y), (5, 6, 14, 9));
            assert_eq!(r.pixel_count, 40);
            assert_eq!(r.label, 1);
        }

        #[test]
        fn test_noise_floor_drops_specks() {
            let mask = mask_with_blocks(60, 60, &[(0, 0, 2, 2), (30, 30, 5, 5)]);
            let regions = detect_regions(&mask, &RegionConfig::default());
            assert_eq!(regions.len(), 1);
            assert_eq!(regions[0].pixel_count, 25);
        }

        #[test]
        fn test_gap_radius_bridges_small_gaps() {
            // Two columns two pixels apart: joined at radius 2, split at radius 1
            let mask = mask_with_blocks(20, 20, &[(2, 2, 1, 12), (4, 2, 1, 12)]);
            let config = RegionConfig::default()
                .with_min_pixels(13)
                .with_merge_padding(0);

            assert_eq!(detect_regions(&mask, &config.with_gap_radius(2)).len(), 1);
            assert!(detect_regions(&mask, &config.with_gap_radius(1)).is_empty());
        }

        #[test]
        fn test_diagonal_pixels_are_eight_connected() {
            let mut mask = DiffMask::new(10, 10);
            for i in 0..10 {
                mask.set(i, i, true);
            }
            let config = RegionConfig::default()
                .with_gap_radius(1)
                .with_merge_padding(0);
            let regions = detect_regions(&mask, &config);
            assert_eq!(regions.len(), 1);
            assert_eq!(regions[0].pixel_count, 10);
        }

        #[test]
        fn test_far_blocks_stay_separate() {
            let mask = mask_with_blocks(120, 60, &[(10, 10, 20, 20), (70, 10, 20, 20)]);
            assert_eq!(detect_regions(&mask, &RegionConfig::default()).len(), 2);
        }

        #[test]
        fn test_near_blocks_merge() {
            // 15px gap: padded boxes (10px each side) overlap
            let mask = mask_with_blocks(120, 60, &[(10, 10, 20, 20), (45, 10, 20, 20)]);
            let regions = detect_regions(&mask, &RegionConfig::default());
            assert_eq!(regions.len(), 1);
            assert_eq!(regions[0].pixel_count, 800);
            assert_eq!((regions[0].min_x, regions[0].max_x), (10, 64));
        }

        #[test]
        fn test_merge_cascades_to_fixpoint() {
            // A-B and B-C are within padding, A-C is not
            let mask = mask_with_blocks(
                200,
                40,
                &[(0, 5, 10, 10), (25, 5, 10, 10), (50, 5, 10, 10)],
            );
            let regions = detect_regions(&mask, &RegionConfig::default());
            assert_eq!(regions.len(), 1);
            assert_eq!(regions[0].pixel_count, 300);
        }

        #[test]
        fn test_labels_sorted_by_position() {
            let mask = mask_with_blocks(
                200,
                200,
                &[(150, 150, 5, 5), (150, 10, 5, 5), (10, 10, 5, 5), (10, 150, 5, 5)],
            );
            let regions = detect_regions(&mask, &RegionConfig::default());
            let order: Vec<_> = regions.iter().map(|r| (r.label, r.min_x, r.min_y)).collect();
            assert_eq!(
                order,
                vec![(1, 10, 10), (2, 150, 10), (3, 10, 150), (4, 150, 150)]
            );
        }
    }

    mod region_geometry_tests {
        use super::*;

        fn region(min_x: u32, min_y: u32, max_x: u32, max_y: u32, pixel_count: usize) -> DiffRegion {
            DiffRegion {
                label: 0,
                min_x,
                min_y,
                max_x,
                max_y,
                pixel_count,
            }
        }

        #[test]
        fn test_padded_overlap() {
            let a = region(0, 0, 9, 9, 100);
            let b = region(30, 0, 39, 9, 100);
            assert!(!a.padded_overlaps(&b, 10));
            assert!(a.padded_overlaps(&b, 11));
        }

        #[test]
        fn test_union_and_dimensions() {
            let a = region(0, 0, 1, 1, 4);
            let b = region(5, 5, 6, 7, 6);
            let u = a.union(&b);
            assert_eq!((u.width(), u.height()), (7, 8));
            assert_eq!(u.pixel_count, 10);
            assert_eq!(u.center(), (3.0, 3.5));
        }
    }

    proptest! {
        #[test]
        fn prop_regions_never_overlap(
            blocks in proptest::collection::vec((0u32..90, 0u32..90, 1u32..10, 1u32..10), 0..8)
        ) {
            let mask = mask_with_blocks(100, 100, &blocks);
            let regions = detect_regions(&mask, &RegionConfig::default());
            for (i, a) in regions.iter().enumerate() {
                for b in regions.iter().skip(i + 1) {
                    prop_assert!(!a.padded_overlaps(b, 0));
                }
            }
        }

        #[test]
        fn prop_region_pixels_bounded_by_mask(
            blocks in proptest::collection::vec((0u32..90, 0u32..90, 1u32..10, 1u32..10), 0..8)
        ) {
            let mask = mask_with_blocks(100, 100, &blocks);
            let regions = detect_regions(&mask, &RegionConfig::default());
            let total: usize = regions.iter().map(|r| r.pixel_count).sum();
            prop_assert!(total <= mask.count());
        }
    }
}
