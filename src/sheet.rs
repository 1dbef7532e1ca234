use image::{RgbaImage, imageops};
use thiserror::Error;

/// Grid placement failures.
#[derive(Debug, Error)]
pub enum PackError {
    #[error("no card images to pack")]
    EmptyInput,
    #[error("grid holds {capacity} cards, got {count}")]
    OverCapacity { capacity: usize, count: usize },
}

/// Sheet grid geometry. Cards per row/column and inter-cell padding in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSpec {
    pub num_width: u32,
    pub num_height: u32,
    pub xpad: u32,
    pub ypad: u32,
}

impl GridSpec {
    pub fn capacity(&self) -> usize {
        (self.num_width * self.num_height) as usize
    }
}

impl Default for GridSpec {
    /// The Tabletop Simulator custom-deck maximum, 10 columns by 7 rows.
    fn default() -> Self {
        Self {
            num_width: 10,
            num_height: 7,
            xpad: 0,
            ypad: 0,
        }
    }
}

/// A composited card sheet and the grid it was packed on.
#[derive(Debug, Clone)]
pub struct Sheet {
    pub image: RgbaImage,
    pub num_width: u32,
    pub num_height: u32,
}

/// Composite card images onto one sheet, row-major from the top left.
///
/// Cell size comes from the first image; callers render all cards of a batch
/// at the template's fixed size. The canvas always spans the full grid, so
/// trailing cells of a short batch stay transparent.
pub fn pack_sheet(images: &[RgbaImage], grid: &GridSpec) -> Result<Sheet, PackError> {
    let first = images.first().ok_or(PackError::EmptyInput)?;
    if images.len() > grid.capacity() {
        return Err(PackError::OverCapacity {
            capacity: grid.capacity(),
            count: images.len(),
        });
    }

    let (cell_w, cell_h) = (first.width(), first.height());
    let canvas_w = (cell_w + grid.xpad) * grid.num_width;
    let canvas_h = (cell_h + grid.ypad) * grid.num_height;
    let mut canvas = RgbaImage::new(canvas_w, canvas_h);

    for (idx, card) in images.iter().enumerate() {
        let col = (idx as u32) % grid.num_width;
        let row = (idx as u32) / grid.num_width;
        let x = col * (cell_w + grid.xpad);
        let y = row * (cell_h + grid.ypad);
        imageops::overlay(&mut canvas, card, i64::from(x), i64::from(y));
    }

    Ok(Sheet {
        image: canvas,
        num_width: grid.num_width,
        num_height: grid.num_height,
    })
}
