// Frame I/O and the preparation every frame gets before detection: shrink it for
// speed and mirror it so the user's left hand shows up on the left.

pub mod image_helper {
    use crate::error::{PaintError, Result};
    use image::imageops::{self, FilterType};
    use image::{ImageEncoder, RgbaImage};
    use std::path::Path;

    pub fn load(path: impl AsRef<Path>) -> Result<RgbaImage> {
        Ok(image::open(path.as_ref())?.to_rgba8())
    }

    pub fn save_png(path: impl AsRef<Path>, image: &RgbaImage) -> Result<()> {
        let output = std::io::BufWriter::new(std::fs::File::create(path.as_ref())?);
        let encoder = image::codecs::png::PngEncoder::new(output);

        encoder.write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgba8,
        )?;

        Ok(())
    }

    /// Scales `frame` by `scale` (nearest neighbour) and optionally flips it
    /// left-to-right. `scale` must be in `(0, 1]`; a scale of 1 skips resizing.
    pub fn prepare_frame(frame: &RgbaImage, scale: f32, mirror: bool) -> Result<RgbaImage> {
        if !(scale > 0.0 && scale <= 1.0) {
            return Err(PaintError::invalid(format!("scale {scale} is not in (0, 1]")));
        }
        if frame.width() == 0 || frame.height() == 0 {
            return Err(PaintError::EmptyImage);
        }

        let mut prepared = if scale < 1.0 {
            let width = ((frame.width() as f32 * scale) as u32).max(1);
            let height = ((frame.height() as f32 * scale) as u32).max(1);
            imageops::resize(frame, width, height, FilterType::Nearest)
        } else {
            frame.clone()
        };

        if mirror {
            imageops::flip_horizontal_in_place(&mut prepared);
        }
        Ok(prepared)
    }
}
