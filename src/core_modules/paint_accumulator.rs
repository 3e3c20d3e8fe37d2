// THEORY:
// The `PaintAccumulator` turns one frame's largest region into an output frame. It is
// the only stateful piece of the core: it owns the history of regions painted since
// the last reset.
//
// Display modes:
// - `Webcam`: the frame passes through untouched and history is left alone.
// - `Recolor` (highlight): only this frame's region is painted, then history is
//   cleared so nothing from a highlight session leaks into a later painting.
// - `Painting` (accumulate): this frame's region joins the history and every region
//   in the history is painted, oldest first. Pixels painted twice are fine.
//
// Every point is checked against the frame before history changes, so a rejected
// call leaves the accumulator exactly as it was.

use crate::core_modules::pixel::pixel::{Color, Point};
use crate::core_modules::region::Region;
use crate::error::{PaintError, Result};
use image::RgbaImage;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// How a frame is turned into output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Show the frame as captured.
    #[default]
    Webcam,
    /// Show only the current frame's largest region.
    Recolor,
    /// Show every region painted since the last reset.
    Painting,
}

impl DisplayMode {
    /// `w`, `r` and `p`, as used by the interactive controller.
    pub fn from_key(key: char) -> Option<Self> {
        match key {
            'w' => Some(DisplayMode::Webcam),
            'r' => Some(DisplayMode::Recolor),
            'p' => Some(DisplayMode::Painting),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct PaintAccumulator {
    history: Vec<Region>,
}

impl PaintAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets every painted region.
    pub fn reset(&mut self) {
        if !self.history.is_empty() {
            debug!("clearing {} painted region(s)", self.history.len());
        }
        self.history.clear();
    }

    pub fn history(&self) -> &[Region] {
        &self.history
    }

    /// Total painted pixels across the history, counting repaints.
    pub fn painted_pixels(&self) -> usize {
        self.history.iter().map(Region::size).sum()
    }

    /// Returns a copy of `image` painted according to `mode`.
    ///
    /// `None` and an empty region are equivalent. Empty regions are never added to
    /// the history.
    pub fn recolor(
        &mut self,
        image: &RgbaImage,
        largest: Option<&Region>,
        mode: DisplayMode,
        paint_color: Color,
    ) -> Result<RgbaImage> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(PaintError::EmptyImage);
        }

        let mut output = image.clone();
        let largest = largest.filter(|region| !region.is_empty());

        match mode {
            DisplayMode::Webcam => {}
            DisplayMode::Recolor => {
                if let Some(region) = largest {
                    check_fits(region, width, height)?;
                    paint_points(&mut output, region.points(), paint_color);
                }
                self.reset();
            }
            DisplayMode::Painting => {
                if let Some(region) = largest {
                    check_fits(region, width, height)?;
                }
                for region in &self.history {
                    check_fits(region, width, height)?;
                }

                if let Some(region) = largest {
                    self.history.push(region.clone());
                }
                for region in &self.history {
                    paint_points(&mut output, region.points(), paint_color);
                }
                debug!(
                    "painting {} region(s), {} pixel(s)",
                    self.history.len(),
                    self.painted_pixels()
                );
            }
        }

        Ok(output)
    }
}

fn check_fits(region: &Region, width: u32, height: u32) -> Result<()> {
    match region.first_out_of_bounds(width, height) {
        None => Ok(()),
        Some(Point { x, y }) => {
            warn!("region point ({x}, {y}) does not fit a {width}x{height} frame");
            Err(PaintError::OutOfBounds { x, y, width, height })
        }
    }
}

/// Overwrites each point of `image` with `color`. Points outside the image are skipped.
pub fn paint_points(image: &mut RgbaImage, points: &[Point], color: Color) {
    let rgba = color.to_rgba();
    for point in points {
        if let Some(pixel) = image.get_pixel_mut_checked(point.x, point.y) {
            *pixel = rgba;
        }
    }
}
