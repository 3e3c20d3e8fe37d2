// THEORY:
// This file is the main entry point for the `cam_paint` library crate.
//
// The core is two pieces: the `RegionDetector`, which finds connected patches of a
// target color in one frame, and the `PaintAccumulator`, which turns each frame's
// largest patch into a highlight or a growing painting. Around them sit the
// controller (`session`), the hand-off from a frame producer (`frame_feed`), and
// configuration. Capturing frames and showing them on screen are left to the caller.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod frame_feed;
pub mod session;

pub use config::PaintConfig;
pub use core_modules::brush::{BrushMode, BrushStrategy, FixedBrush, RandomBrush, TargetBrush};
pub use core_modules::paint_accumulator::{DisplayMode, PaintAccumulator};
pub use core_modules::pixel::pixel::{Color, Point};
pub use core_modules::region::Region;
pub use core_modules::region_finder::region_finder::{
    DetectorParams, RegionDetector, largest_region, largest_region_ref,
};
pub use error::{PaintError, Result};
pub use frame_feed::{Control, FeedStats, PaintWorker, WorkerEvent};
pub use session::{KeyOutcome, PaintSession, SaveKind};
