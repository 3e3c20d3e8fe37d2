// THEORY:
// The `pixel` module holds the two smallest values in the system: a `Color` (what a
// pixel looks like) and a `Point` (where a pixel is). Neither knows anything about
// neighbors or frames.
//
// Key principles:
// 1.  **Raw channel difference only**: two colors are "the same" when every RGB
//     channel differs by strictly less than a threshold. No luminance, hue or
//     colorimetric transform is involved, and alpha never takes part.
// 2.  **Symmetric test**: the comparison uses absolute differences, so
//     `a.matches(b)` and `b.matches(a)` always agree.
// 3.  **Bridging to `image`**: frames are `image::RgbaImage`; `Color` converts to and
//     from `Rgba<u8>` so the rest of the crate can talk in colors and points.

pub mod pixel {
    use image::Rgba;
    use serde::{Deserialize, Serialize};
    use std::fmt;
    use std::str::FromStr;

    pub type Channel = u8;
    pub type ChannelDelta = u16;

    /// Default per-channel tolerance: a channel must differ by less than this to match.
    pub const MAX_COLOR_DIFF: ChannelDelta = 27;

    /// An opaque RGB color. Alpha is dropped when reading from a frame and written
    /// back as fully opaque.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(from = "[Channel; 3]", into = "[Channel; 3]")]
    pub struct Color {
        pub red: Channel,
        pub green: Channel,
        pub blue: Channel,
    }

    impl Color {
        pub const BLACK: Color = Color::new(0, 0, 0);
        pub const BLUE: Color = Color::new(0, 0, 255);

        pub const fn new(red: Channel, green: Channel, blue: Channel) -> Self {
            Self { red, green, blue }
        }

        /// Builds a color from the low 24 bits of a packed `0xRRGGBB` value.
        pub const fn from_packed(rgb: u32) -> Self {
            Self {
                red: ((rgb >> 16) & 0xff) as Channel,
                green: ((rgb >> 8) & 0xff) as Channel,
                blue: (rgb & 0xff) as Channel,
            }
        }

        /// Largest absolute difference between any pair of matching channels.
        pub fn max_channel_delta(&self, other: &Color) -> ChannelDelta {
            let dr = self.red.abs_diff(other.red);
            let dg = self.green.abs_diff(other.green);
            let db = self.blue.abs_diff(other.blue);
            dr.max(dg).max(db) as ChannelDelta
        }

        /// True iff every channel differs by strictly less than `max_diff`.
        #[inline]
        pub fn matches(&self, other: &Color, max_diff: ChannelDelta) -> bool {
            (self.red.abs_diff(other.red) as ChannelDelta) < max_diff
                && (self.green.abs_diff(other.green) as ChannelDelta) < max_diff
                && (self.blue.abs_diff(other.blue) as ChannelDelta) < max_diff
        }

        pub fn to_rgba(self) -> Rgba<Channel> {
            Rgba([self.red, self.green, self.blue, Channel::MAX])
        }
    }

    impl From<Rgba<Channel>> for Color {
        fn from(pixel: Rgba<Channel>) -> Self {
            Color::new(pixel[0], pixel[1], pixel[2])
        }
    }

    impl From<&Rgba<Channel>> for Color {
        fn from(pixel: &Rgba<Channel>) -> Self {
            Color::new(pixel[0], pixel[1], pixel[2])
        }
    }

    impl From<Color> for Rgba<Channel> {
        fn from(color: Color) -> Self {
            color.to_rgba()
        }
    }

    impl From<[Channel; 3]> for Color {
        fn from(channels: [Channel; 3]) -> Self {
            Color::new(channels[0], channels[1], channels[2])
        }
    }

    impl From<Color> for [Channel; 3] {
        fn from(color: Color) -> Self {
            [color.red, color.green, color.blue]
        }
    }

    impl fmt::Display for Color {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{},{},{}", self.red, self.green, self.blue)
        }
    }

    /// Parses `"r,g,b"` (decimal) or `"#rrggbb"`.
    impl FromStr for Color {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            let s = s.trim();
            if let Some(hex) = s.strip_prefix('#') {
                if hex.len() != 6 {
                    return Err(format!("expected #rrggbb, got `{s}`"));
                }
                let packed = u32::from_str_radix(hex, 16)
                    .map_err(|e| format!("bad hex color `{s}`: {e}"))?;
                return Ok(Color::from_packed(packed));
            }

            let parts: Vec<&str> = s.split(',').map(str::trim).collect();
            if parts.len() != 3 {
                return Err(format!("expected r,g,b, got `{s}`"));
            }
            let mut channels = [0 as Channel; 3];
            for (slot, part) in channels.iter_mut().zip(&parts) {
                *slot = part
                    .parse::<Channel>()
                    .map_err(|e| format!("bad channel `{part}` in `{s}`: {e}"))?;
            }
            Ok(Color::from(channels))
        }
    }

    /// A pixel coordinate inside a frame.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct Point {
        pub x: u32,
        pub y: u32,
    }

    impl Point {
        pub const fn new(x: u32, y: u32) -> Self {
            Self { x, y }
        }

        pub fn in_bounds(&self, width: u32, height: u32) -> bool {
            self.x < width && self.y < height
        }
    }

    impl From<(u32, u32)> for Point {
        fn from((x, y): (u32, u32)) -> Self {
            Point { x, y }
        }
    }
}
