// THEORY:
// The brush decides which color the next frame is painted with. It is a controller
// policy, not part of detection, so it sits behind a small trait and is handed to
// the session from outside. The random brush takes its RNG as a parameter; nothing
// in the crate owns a hidden global generator.

use crate::core_modules::pixel::pixel::Color;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Picks the paint color for each processed frame.
pub trait BrushStrategy: Send {
    /// `target` is the color currently being tracked.
    fn next_color(&mut self, target: Color) -> Color;
}

/// Always the same color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedBrush(pub Color);

impl BrushStrategy for FixedBrush {
    fn next_color(&mut self, _target: Color) -> Color {
        self.0
    }
}

/// Paints with the tracked color itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct TargetBrush;

impl BrushStrategy for TargetBrush {
    fn next_color(&mut self, target: Color) -> Color {
        target
    }
}

/// A fresh uniformly random color every frame.
#[derive(Debug, Clone)]
pub struct RandomBrush<R> {
    rng: R,
}

impl<R: Rng + Send> RandomBrush<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng + Send> BrushStrategy for RandomBrush<R> {
    fn next_color(&mut self, _target: Color) -> Color {
        Color::from_packed(self.rng.random_range(0..=0x00ff_ffff))
    }
}

impl<F> BrushStrategy for F
where
    F: FnMut(Color) -> Color + Send,
{
    fn next_color(&mut self, target: Color) -> Color {
        self(target)
    }
}

/// The three built-in brushes, selectable by key (`x`, `y`, `z`) or config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrushMode {
    #[default]
    Fixed,
    Target,
    Random,
}

impl BrushMode {
    pub fn from_key(key: char) -> Option<Self> {
        match key {
            'x' => Some(BrushMode::Fixed),
            'y' => Some(BrushMode::Target),
            'z' => Some(BrushMode::Random),
            _ => None,
        }
    }

    /// Builds the brush. `fixed` is only used by `BrushMode::Fixed`; `Random` draws
    /// from a seeded copy of the thread RNG.
    pub fn into_strategy(self, fixed: Color) -> Box<dyn BrushStrategy> {
        match self {
            BrushMode::Fixed => Box::new(FixedBrush(fixed)),
            BrushMode::Target => Box::new(TargetBrush),
            BrushMode::Random => {
                use rand::SeedableRng;
                Box::new(RandomBrush::new(rand::rngs::StdRng::from_rng(&mut rand::rng())))
            }
        }
    }
}
