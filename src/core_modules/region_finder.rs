// THEORY:
// The `RegionDetector` is the spatial grouping engine. Given one frame and one target
// color it finds every connected patch of "close enough" pixels, throws away the
// specks, and hands back the rest in the order the raster scan found them.
//
// Algorithm:
// 1.  **Raster Scan (Seeding)**: walk the frame row by row (y outer, x inner). Any
//     pixel that matches the target and has not been claimed yet becomes a seed.
// 2.  **Region Growing**: from the seed, a breadth-first fill over the 8-connected
//     neighborhood (diagonals included, clipped at the frame edge) claims every
//     matching pixel it can reach. A pixel is marked visited the moment it is
//     queued, so it is queued at most once and never revisited.
// 3.  **Size Filtering**: a finished region smaller than `min_region_size` is dropped.
//     Its pixels stay marked so the scan never retries them.
// 4.  **Stateless Utility**: the visited grid lives on the stack of a single
//     `find_regions` call. Nothing survives into the next frame.

pub mod region_finder {
    use crate::core_modules::pixel::pixel::{ChannelDelta, Color, MAX_COLOR_DIFF, Point};
    use crate::core_modules::region::Region;
    use crate::error::{PaintError, Result};
    use image::RgbaImage;
    use log::debug;
    use std::collections::VecDeque;

    /// Default smallest region worth reporting, in pixels.
    pub const MIN_REGION_SIZE: usize = 50;

    /// Tunable thresholds for a `RegionDetector`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DetectorParams {
        /// Every channel must differ from the target by strictly less than this.
        pub max_color_diff: ChannelDelta,
        /// Regions with fewer pixels than this are discarded.
        pub min_region_size: usize,
    }

    impl Default for DetectorParams {
        fn default() -> Self {
            Self {
                max_color_diff: MAX_COLOR_DIFF,
                min_region_size: MIN_REGION_SIZE,
            }
        }
    }

    /// Finds connected regions of a target color in a single frame.
    #[derive(Debug, Clone, Default)]
    pub struct RegionDetector {
        params: DetectorParams,
    }

    impl RegionDetector {
        pub fn new(params: DetectorParams) -> Self {
            Self { params }
        }

        pub fn params(&self) -> &DetectorParams {
            &self.params
        }

        /// Returns every region of `target`-like pixels with at least
        /// `min_region_size` members, in discovery order.
        pub fn find_regions(&self, image: &RgbaImage, target: Color) -> Result<Vec<Region>> {
            let (width, height) = image.dimensions();
            if width == 0 || height == 0 {
                return Err(PaintError::EmptyImage);
            }

            let mut visited = vec![false; width as usize * height as usize];
            let mut queue: VecDeque<Point> = VecDeque::new();
            let mut regions: Vec<Region> = Vec::new();
            let mut discarded = 0usize;

            for y in 0..height {
                for x in 0..width {
                    if visited[index(x, y, width)] || !self.matches(image, x, y, target) {
                        continue;
                    }

                    let region =
                        self.grow_region(image, Point::new(x, y), target, &mut visited, &mut queue);
                    if region.size() >= self.params.min_region_size {
                        regions.push(region);
                    } else {
                        discarded += 1;
                    }
                }
            }

            debug!(
                "found {} region(s) of {} in {}x{} frame ({} too small)",
                regions.len(),
                target,
                width,
                height,
                discarded
            );
            debug_check_disjoint(&regions, width, height);
            Ok(regions)
        }

        #[inline]
        fn matches(&self, image: &RgbaImage, x: u32, y: u32, target: Color) -> bool {
            Color::from(image.get_pixel(x, y)).matches(&target, self.params.max_color_diff)
        }

        /// Breadth-first fill from `seed`. `queue` is scratch space reused across seeds
        /// and is always empty on return.
        fn grow_region(
            &self,
            image: &RgbaImage,
            seed: Point,
            target: Color,
            visited: &mut [bool],
            queue: &mut VecDeque<Point>,
        ) -> Region {
            let (width, height) = image.dimensions();
            let mut region = Region::new();

            visited[index(seed.x, seed.y, width)] = true;
            queue.push_back(seed);

            while let Some(current) = queue.pop_front() {
                region.push(current);

                let x_range = current.x.saturating_sub(1)..=(current.x + 1).min(width - 1);
                let y_range = current.y.saturating_sub(1)..=(current.y + 1).min(height - 1);
                for nx in x_range {
                    for ny in y_range.clone() {
                        let i = index(nx, ny, width);
                        if !visited[i] && self.matches(image, nx, ny, target) {
                            visited[i] = true;
                            queue.push_back(Point::new(nx, ny));
                        }
                    }
                }
            }

            region
        }
    }

    #[inline]
    fn index(x: u32, y: u32, width: u32) -> usize {
        y as usize * width as usize + x as usize
    }

    #[cfg(debug_assertions)]
    fn debug_check_disjoint(regions: &[Region], width: u32, height: u32) {
        let mut seen = vec![false; width as usize * height as usize];
        for point in regions.iter().flat_map(Region::iter) {
            let i = index(point.x, point.y, width);
            debug_assert!(!seen[i], "pixel {:?} claimed by two regions", point);
            seen[i] = true;
        }
    }

    #[cfg(not(debug_assertions))]
    fn debug_check_disjoint(_regions: &[Region], _width: u32, _height: u32) {}

    /// The region with the most pixels. Ties go to the region discovered first.
    /// An empty slice yields an empty region.
    pub fn largest_region(regions: &[Region]) -> Region {
        largest_region_ref(regions).cloned().unwrap_or_default()
    }

    /// Borrowing form of [`largest_region`]; `None` when there are no regions.
    pub fn largest_region_ref(regions: &[Region]) -> Option<&Region> {
        let mut largest: Option<&Region> = None;
        for region in regions {
            // strict `>` keeps the earliest of equal-sized regions
            if largest.is_none_or(|best| region.size() > best.size()) {
                largest = Some(region);
            }
        }
        largest
    }
}

#[cfg(test)]
mod tests {
    use super::region_finder::*;
    use crate::core_modules::pixel::pixel::{Color, Point};
    use crate::core_modules::region::Region;
    use crate::error::PaintError;
    use image::{Rgba, RgbaImage};
    use std::collections::HashSet;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const RED: Rgba<u8> = Rgba([220, 20, 20, 255]);

    fn fill_rect(image: &mut RgbaImage, x0: u32, y0: u32, w: u32, h: u32, color: Rgba<u8>) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                image.put_pixel(x, y, color);
            }
        }
    }

    fn detector_with_min(min_region_size: usize) -> RegionDetector {
        RegionDetector::new(DetectorParams {
            min_region_size,
            ..DetectorParams::default()
        })
    }

    #[test]
    fn two_separated_blocks_make_two_regions() {
        let mut image = RgbaImage::from_pixel(40, 20, WHITE);
        fill_rect(&mut image, 2, 3, 10, 10, RED);
        fill_rect(&mut image, 25, 5, 10, 10, RED);

        let regions = RegionDetector::default()
            .find_regions(&image, Color::from(RED))
            .unwrap();

        assert_eq!(regions.len(), 2);
        assert!(regions.iter().all(|r| r.size() == 100));
        assert_eq!(regions[0].seed(), Some(Point::new(2, 3)));
        assert_eq!(regions[1].seed(), Some(Point::new(25, 5)));
    }

    #[test]
    fn diagonal_neighbors_are_connected() {
        let mut image = RgbaImage::from_pixel(8, 8, WHITE);
        for i in 0..8 {
            image.put_pixel(i, i, RED);
        }

        let regions = detector_with_min(1).find_regions(&image, Color::from(RED)).unwrap();

        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].size(), 8);
    }

    #[test]
    fn channel_difference_of_27_is_excluded_and_26_included() {
        let target = Color::new(100, 100, 100);
        let mut image = RgbaImage::from_pixel(10, 10, Rgba([100, 127, 100, 255]));
        fill_rect(&mut image, 0, 0, 10, 5, Rgba([126, 74, 126, 255]));

        let regions = detector_with_min(1).find_regions(&image, target).unwrap();

        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].size(), 50);
        assert!(regions[0].iter().all(|p| p.y < 5));
    }

    #[test]
    fn small_fixture_respects_minimum_region_size() {
        let image = RgbaImage::from_pixel(3, 3, Rgba([0, 0, 0, 255]));

        let relaxed = detector_with_min(9).find_regions(&image, Color::BLACK).unwrap();
        assert_eq!(relaxed.len(), 1);
        assert_eq!(relaxed[0].size(), 9);

        let strict = RegionDetector::default().find_regions(&image, Color::BLACK).unwrap();
        assert!(strict.is_empty());
    }

    #[test]
    fn discarded_specks_do_not_block_later_regions() {
        let mut image = RgbaImage::from_pixel(30, 30, WHITE);
        image.put_pixel(0, 0, RED);
        fill_rect(&mut image, 10, 10, 8, 8, RED);

        let regions = RegionDetector::default()
            .find_regions(&image, Color::from(RED))
            .unwrap();

        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].size(), 64);
    }

    #[test]
    fn regions_are_large_enough_and_disjoint() {
        // Stripes of near-target colors with gaps, plus noise that only sometimes matches.
        let mut image = RgbaImage::from_pixel(64, 48, WHITE);
        for y in 0..48u32 {
            for x in 0..64u32 {
                if (x / 7 + y / 5) % 3 != 0 {
                    let jitter = ((x * 31 + y * 17) % 40) as u8;
                    image.put_pixel(x, y, Rgba([200 + jitter / 2, 20 + jitter, 20, 255]));
                }
            }
        }

        let regions = RegionDetector::default()
            .find_regions(&image, Color::new(210, 30, 20))
            .unwrap();

        let mut seen = HashSet::new();
        for region in &regions {
            assert!(region.size() >= MIN_REGION_SIZE);
            for point in region {
                assert!(seen.insert(*point), "duplicate pixel {point:?}");
            }
        }
    }

    #[test]
    fn no_matching_pixels_yields_no_regions() {
        let image = RgbaImage::from_pixel(16, 16, WHITE);
        let regions = detector_with_min(1).find_regions(&image, Color::BLACK).unwrap();
        assert!(regions.is_empty());
    }

    #[test]
    fn repeated_calls_do_not_share_visited_state() {
        let mut image = RgbaImage::from_pixel(20, 20, WHITE);
        fill_rect(&mut image, 5, 5, 10, 10, RED);
        let detector = RegionDetector::default();

        let first = detector.find_regions(&image, Color::from(RED)).unwrap();
        let second = detector.find_regions(&image, Color::from(RED)).unwrap();

        assert_eq!(first, second);
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn region_touching_every_edge_is_clipped_correctly() {
        let image = RgbaImage::from_pixel(9, 7, RED);
        let regions = detector_with_min(1).find_regions(&image, Color::from(RED)).unwrap();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].size(), 63);
    }

    #[test]
    fn empty_image_is_rejected() {
        let image = RgbaImage::new(0, 10);
        let result = RegionDetector::default().find_regions(&image, Color::BLACK);
        assert!(matches!(result, Err(PaintError::EmptyImage)));
    }

    #[test]
    fn largest_region_prefers_first_on_ties() {
        let a: Region = (0..5).map(|x| Point::new(x, 0)).collect();
        let b: Region = (0..5).map(|x| Point::new(x, 2)).collect();
        let small: Region = (0..3).map(|x| Point::new(x, 4)).collect();

        let regions = vec![small, a.clone(), b];
        assert_eq!(largest_region(&regions), a);
    }

    #[test]
    fn largest_region_tie_break_follows_scan_order() {
        let mut image = RgbaImage::from_pixel(30, 30, WHITE);
        fill_rect(&mut image, 18, 2, 8, 8, RED);
        fill_rect(&mut image, 2, 15, 8, 8, RED);

        let regions = RegionDetector::default()
            .find_regions(&image, Color::from(RED))
            .unwrap();
        let largest = largest_region(&regions);

        assert_eq!(largest.size(), 64);
        assert_eq!(largest.seed(), Some(Point::new(18, 2)));
    }

    #[test]
    fn largest_region_of_nothing_is_empty() {
        assert!(largest_region(&[]).is_empty());
        assert!(largest_region_ref(&[]).is_none());
    }
}
