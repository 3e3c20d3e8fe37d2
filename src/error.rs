// THEORY:
// One error type for the whole crate. The detector and the accumulator are pure
// computations over well-formed frames, so almost every variant here is a
// precondition violation (empty frame, a point outside the frame) or an I/O
// failure from the thin layers around the core (config files, image files, the
// frame feed). Callers decide whether to skip the frame or stop; nothing in the
// crate retries.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PaintError>;

#[derive(Debug, Error)]
pub enum PaintError {
    /// The frame has zero width or zero height.
    #[error("image has no pixels")]
    EmptyImage,

    /// A coordinate does not lie inside the frame it was used with.
    #[error("point ({x}, {y}) is outside a {width}x{height} image")]
    OutOfBounds { x: u32, y: u32, width: u32, height: u32 },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    /// The paint worker task is gone and can no longer take input.
    #[error("paint worker is no longer running")]
    WorkerClosed,
}

impl PaintError {
    pub fn invalid(message: impl Into<String>) -> Self {
        PaintError::InvalidArgument(message.into())
    }
}
