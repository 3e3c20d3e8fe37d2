//! Session configuration, loaded from TOML.
//!
//! Every field has a default, so a config file only needs the values it changes:
//!
//! ```toml
//! min_region_size = 80
//! mirror = false
//! brush = "random"
//! display = "painting"
//! ```

use crate::core_modules::brush::BrushMode;
use crate::core_modules::paint_accumulator::DisplayMode;
use crate::core_modules::pixel::pixel::{ChannelDelta, Color, MAX_COLOR_DIFF};
use crate::core_modules::region_finder::region_finder::{DetectorParams, MIN_REGION_SIZE};
use crate::error::{PaintError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaintConfig {
    /// Per-channel tolerance; channels must differ by less than this to match.
    pub max_color_diff: ChannelDelta,
    /// Smallest region worth keeping, in pixels.
    pub min_region_size: usize,
    /// Downsampling factor applied to every frame, in `(0, 1]`.
    pub scale: f32,
    /// Flip frames left-to-right before detection.
    pub mirror: bool,
    /// Delay between frames when pumping a sequence (100 ms is about 10 fps).
    pub frame_interval_ms: u64,
    /// Frames allowed to wait for the paint worker before new ones are dropped.
    pub frame_queue_capacity: usize,
    /// Color used by the fixed brush, as `[r, g, b]`.
    pub paint_color: Color,
    pub brush: BrushMode,
    pub display: DisplayMode,
}

impl Default for PaintConfig {
    fn default() -> Self {
        Self {
            max_color_diff: MAX_COLOR_DIFF,
            min_region_size: MIN_REGION_SIZE,
            scale: 0.5,
            mirror: true,
            frame_interval_ms: 100,
            frame_queue_capacity: 1,
            paint_color: Color::BLUE,
            brush: BrushMode::default(),
            display: DisplayMode::default(),
        }
    }
}

impl PaintConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&text)?;
        log::info!("loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: PaintConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_color_diff == 0 {
            return Err(PaintError::invalid("max_color_diff must be at least 1"));
        }
        if !(self.scale > 0.0 && self.scale <= 1.0) {
            return Err(PaintError::invalid(format!(
                "scale {} is not in (0, 1]",
                self.scale
            )));
        }
        if self.frame_queue_capacity == 0 {
            return Err(PaintError::invalid("frame_queue_capacity must be at least 1"));
        }
        Ok(())
    }

    pub fn detector_params(&self) -> DetectorParams {
        DetectorParams {
            max_color_diff: self.max_color_diff,
            min_region_size: self.min_region_size,
        }
    }
}
