use crate::encoder::cell_bit;
use crate::error::{MosaicError, Result};
use crate::grid::{Mode, MosaicGrid};
use image::{DynamicImage, GrayImage, ImageBuffer, Pixel, RgbImage};

/// Size of the pixel block each cell is drawn as.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RenderConfig {
    pub cell_width: u32,
    pub cell_height: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            cell_width: 8,
            cell_height: 8,
        }
    }
}

/// Display intensity of a cell: a `0` bit is drawn white, a `1` bit black.
pub fn intensity(cell: bool) -> u8 {
    match cell_bit(cell).data {
        0 => 255,
        _ => 0,
    }
}

/// Paint plane `k` of `grid` into channel `k` of `image`, one block per cell.
///
/// `image` must be `cell_width * width` by `cell_height * height` pixels.
fn draw<P>(image: &mut ImageBuffer<P, Vec<u8>>, grid: &MosaicGrid, config: &RenderConfig)
where
    P: Pixel<Subpixel = u8>,
{
    let (cw, ch) = (config.cell_width, config.cell_height);
    for (k, (channel, _)) in grid.planes().enumerate() {
        for (y, row) in (0..).zip(grid.rows(channel)) {
            for (x, &cell) in (0..).zip(row) {
                let value = intensity(cell);
                for py in y * ch..(y + 1) * ch {
                    for px in x * cw..(x + 1) * cw {
                        image.get_pixel_mut(px, py).channels_mut()[k] = value;
                    }
                }
            }
        }
    }
}

/// Draw `grid` with every cell expanded to a `cell_width x cell_height` block.
///
/// Monochrome grids become 8-bit gray images, tri-channel grids RGB images.
pub fn render(grid: &MosaicGrid, config: &RenderConfig) -> Result<DynamicImage> {
    let too_large = MosaicError::InvalidDimensions {
        threads: grid.width() as i64 * config.cell_width as i64,
        crosses: grid.height() as i64 * config.cell_height as i64,
    };
    if config.cell_width == 0 || config.cell_height == 0 {
        return Err(too_large);
    }
    let width = grid.width().checked_mul(config.cell_width).ok_or(too_large.clone())?;
    let height = grid.height().checked_mul(config.cell_height).ok_or(too_large)?;

    let image = match grid.mode() {
        Mode::Monochrome => {
            let mut image = GrayImage::new(width, height);
            draw(&mut image, grid, config);
            DynamicImage::ImageLuma8(image)
        }
        Mode::TriChannel => {
            let mut image = RgbImage::new(width, height);
            draw(&mut image, grid, config);
            DynamicImage::ImageRgb8(image)
        }
    };
    Ok(image)
}
