// THEORY:
// The `session` module is the top-level API of the crate: a `PaintSession` plays the
// role of the interactive webcam painter, minus any window. It owns one detector,
// one accumulator and one brush, and turns user intent (keys, a click on a pixel)
// plus a stream of raw frames into the image that should be on screen.
//
// Per frame:
// 1.  **Preparation**: downsample and mirror the raw frame (config `scale`, `mirror`).
// 2.  **No target yet**: the prepared frame is shown as-is.
// 3.  **Target set**: the brush picks this frame's paint color, the detector finds
//     regions of the target color, and the accumulator paints the largest one
//     according to the display mode.
//
// Controller policy:
// - Clearing (`c`) forgets the painting *and* the target color, so tracking stops
//   until the user picks a new color.
// - Picking a different target color starts a fresh painting, and so does a change
//   in the prepared frame size.
// - Saving (`o`, `s`) is reported back to the caller, who owns file output.

use crate::config::PaintConfig;
use crate::core_modules::brush::{BrushMode, BrushStrategy};
use crate::core_modules::paint_accumulator::{DisplayMode, PaintAccumulator};
use crate::core_modules::pixel::pixel::Color;
use crate::core_modules::region_finder::region_finder::{RegionDetector, largest_region_ref};
use crate::core_modules::utils::image_helper::image_helper::prepare_frame;
use crate::error::{PaintError, Result};
use image::RgbaImage;
use log::{debug, info, warn};

/// Which image the user asked to save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveKind {
    /// The last recolored frame (`o`).
    Recolored,
    /// Whatever is currently on screen (`s`).
    Painting,
}

/// What a key press did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Display(DisplayMode),
    Brush(BrushMode),
    Cleared,
    Save(SaveKind),
    Ignored,
}

pub struct PaintSession {
    config: PaintConfig,
    detector: RegionDetector,
    accumulator: PaintAccumulator,
    brush: Box<dyn BrushStrategy>,
    display: DisplayMode,
    target: Option<Color>,
    /// The most recent prepared frame; clicks are sampled from it.
    last_frame: Option<RgbaImage>,
    /// The most recent accumulator output. Dropped on clear.
    recolored: Option<RgbaImage>,
    frames_processed: u64,
}

impl PaintSession {
    pub fn new(config: PaintConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            detector: RegionDetector::new(config.detector_params()),
            accumulator: PaintAccumulator::new(),
            brush: config.brush.into_strategy(config.paint_color),
            display: config.display,
            target: None,
            last_frame: None,
            recolored: None,
            frames_processed: 0,
            config,
        })
    }

    /// Replaces the brush with a caller-supplied strategy.
    pub fn with_brush(mut self, brush: impl BrushStrategy + 'static) -> Self {
        self.brush = Box::new(brush);
        self
    }

    pub fn config(&self) -> &PaintConfig {
        &self.config
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.display
    }

    pub fn target(&self) -> Option<Color> {
        self.target
    }

    pub fn accumulator(&self) -> &PaintAccumulator {
        &self.accumulator
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    pub fn last_frame(&self) -> Option<&RgbaImage> {
        self.last_frame.as_ref()
    }

    pub fn recolored(&self) -> Option<&RgbaImage> {
        self.recolored.as_ref()
    }

    /// The image that should be on screen: the painting while a color is tracked,
    /// otherwise the plain prepared frame.
    pub fn current_view(&self) -> Option<&RgbaImage> {
        match self.target {
            Some(_) => self.recolored.as_ref().or(self.last_frame.as_ref()),
            None => self.last_frame.as_ref(),
        }
    }

    /// Image for a save request, if there is one to save.
    pub fn image_for(&self, kind: SaveKind) -> Option<&RgbaImage> {
        match kind {
            SaveKind::Recolored => self.recolored(),
            SaveKind::Painting => self.current_view(),
        }
    }

    pub fn set_display_mode(&mut self, mode: DisplayMode) {
        if mode != self.display {
            info!("display mode {:?} -> {:?}", self.display, mode);
        }
        self.display = mode;
    }

    pub fn set_brush_mode(&mut self, mode: BrushMode) {
        info!("brush set to {:?}", mode);
        self.brush = mode.into_strategy(self.config.paint_color);
    }

    /// Starts tracking `color`. A change of color starts a new painting.
    pub fn set_target(&mut self, color: Color) {
        if self.target != Some(color) {
            info!("tracking color {color}");
            self.accumulator.reset();
        }
        self.target = Some(color);
    }

    /// Tracks the color under `(x, y)` in the last prepared frame.
    pub fn select_target(&mut self, x: u32, y: u32) -> Result<Color> {
        let frame = self
            .last_frame
            .as_ref()
            .ok_or_else(|| PaintError::invalid("no frame to pick a color from yet"))?;
        let (width, height) = frame.dimensions();
        let pixel = frame
            .get_pixel_checked(x, y)
            .ok_or(PaintError::OutOfBounds { x, y, width, height })?;

        let color = Color::from(pixel);
        self.set_target(color);
        Ok(color)
    }

    /// Forgets the painting and the target color.
    pub fn clear(&mut self) {
        info!("clearing painting");
        self.accumulator.reset();
        self.recolored = None;
        self.target = None;
    }

    pub fn handle_key(&mut self, key: char) -> KeyOutcome {
        if let Some(mode) = DisplayMode::from_key(key) {
            self.set_display_mode(mode);
            return KeyOutcome::Display(mode);
        }
        if let Some(mode) = BrushMode::from_key(key) {
            self.set_brush_mode(mode);
            return KeyOutcome::Brush(mode);
        }
        match key {
            'c' => {
                self.clear();
                KeyOutcome::Cleared
            }
            'o' => KeyOutcome::Save(SaveKind::Recolored),
            's' => KeyOutcome::Save(SaveKind::Painting),
            _ => {
                warn!("unexpected key {key:?}");
                KeyOutcome::Ignored
            }
        }
    }

    /// Runs one raw frame through preparation, detection and painting and returns
    /// the image to show. On error the painting history is unchanged.
    ///
    /// A frame whose prepared size differs from the previous one starts a fresh
    /// painting, since the old strokes no longer line up with the picture.
    pub fn process_frame(&mut self, frame: &RgbaImage) -> Result<&RgbaImage> {
        let prepared = prepare_frame(frame, self.config.scale, self.config.mirror)?;
        let resized = self
            .last_frame
            .as_ref()
            .is_some_and(|last| last.dimensions() != prepared.dimensions());
        if resized && !self.accumulator.history().is_empty() {
            let (width, height) = prepared.dimensions();
            info!("frame size changed to {width}x{height}, starting a new painting");
            self.accumulator.reset();
        }
        let prepared = &*self.last_frame.insert(prepared);

        let Some(target) = self.target else {
            self.frames_processed += 1;
            return Ok(prepared);
        };

        let paint_color = self.brush.next_color(target);
        let regions = self.detector.find_regions(prepared, target)?;
        let largest = largest_region_ref(&regions);
        debug!(
            "frame {}: {} region(s), largest {} px at {:?}",
            self.frames_processed + 1,
            regions.len(),
            largest.map_or(0, |r| r.size()),
            largest.and_then(|r| r.bounding_box())
        );

        let output = self
            .accumulator
            .recolor(prepared, largest, self.display, paint_color)?;
        self.frames_processed += 1;
        Ok(&*self.recolored.insert(output))
    }
}
