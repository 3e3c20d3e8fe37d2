// THEORY:
// A `Region` is the output of one flood fill: every pixel that was reached from a
// single seed while matching the target color, in the order the fill reached it.
//
// Key architectural principles:
// 1.  **Dumb Data Container**: a region holds its points and can summarize them
//     (size, bounding box, centroid). It does not know which image or target color
//     produced it and carries no state between frames.
// 2.  **Order Matters Only for Reporting**: the first point is always the seed the
//     raster scan hit. Membership is what the rest of the crate relies on.
// 3.  **Empty Is Valid**: an empty region means "nothing of interest this frame"
//     and flows through painting as a no-op.

use crate::core_modules::pixel::pixel::Point;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Region {
    points: Vec<Point>,
}

impl Region {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, point: Point) {
        self.points.push(point);
    }

    /// Number of pixels in the region.
    pub fn size(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Point> {
        self.points.iter()
    }

    /// The pixel the raster scan discovered this region from.
    pub fn seed(&self) -> Option<Point> {
        self.points.first().copied()
    }

    /// Top-left and bottom-right corners (inclusive) of the region, if it has any pixels.
    pub fn bounding_box(&self) -> Option<(Point, Point)> {
        let first = self.points.first()?;
        let mut min = *first;
        let mut max = *first;
        for point in &self.points[1..] {
            min.x = min.x.min(point.x);
            min.y = min.y.min(point.y);
            max.x = max.x.max(point.x);
            max.y = max.y.max(point.y);
        }
        Some((min, max))
    }

    /// Unweighted mean position of the region's pixels.
    pub fn centroid(&self) -> Option<(f64, f64)> {
        if self.points.is_empty() {
            return None;
        }
        let (sum_x, sum_y) = self
            .points
            .iter()
            .fold((0u64, 0u64), |(sx, sy), p| (sx + p.x as u64, sy + p.y as u64));
        let n = self.points.len() as f64;
        Some((sum_x as f64 / n, sum_y as f64 / n))
    }

    /// First point that does not fit a `width` x `height` frame.
    pub fn first_out_of_bounds(&self, width: u32, height: u32) -> Option<Point> {
        self.points.iter().copied().find(|p| !p.in_bounds(width, height))
    }
}

impl From<Vec<Point>> for Region {
    fn from(points: Vec<Point>) -> Self {
        Self { points }
    }
}

impl FromIterator<Point> for Region {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Region {
    type Item = &'a Point;
    type IntoIter = std::slice::Iter<'a, Point>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
