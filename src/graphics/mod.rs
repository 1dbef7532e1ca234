//! Raster rendering of card faces and backs.

mod paint;

pub use paint::{CARD_HEIGHT_PX, CARD_WIDTH_PX, CardPainter, CardStyle};
