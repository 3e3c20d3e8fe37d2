pub mod brush;
pub mod paint_accumulator;
pub mod pixel;
pub mod region;
pub mod region_finder;
pub mod utils;
