use crate::{RenderError, Result};
use image::{DynamicImage, ImageBuffer, Luma, Primitive};
use std::path::Path;
use thromb_analysis::core_modules::grid::{Grid, IntensityGrid};

/// Decodes any raster the `image` crate understands into an intensity grid.
///
/// Color inputs are reduced to luma. Integer samples are read at 16 bits so
/// that both 8-bit and 16-bit scans keep their full range; float samples stay
/// `f32`.
pub fn load_grid(path: &Path) -> Result<IntensityGrid> {
    let image = image::open(path).map_err(|e| RenderError::image(path, e))?;
    grid_from_image(image)
}

pub fn grid_from_image(image: DynamicImage) -> Result<IntensityGrid> {
    match image {
        DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => {
            grid_from_luma(image.to_luma32f())
        }
        _ => grid_from_luma(image.into_luma16()),
    }
}

pub fn grid_from_luma<S>(image: ImageBuffer<Luma<S>, Vec<S>>) -> Result<IntensityGrid>
where
    S: Primitive + Into<f64>,
{
    let (width, height) = image.dimensions();
    let cells = image.into_raw().into_iter().map(Into::into).collect();
    Ok(Grid::from_vec(width as usize, height as usize, cells)?)
}
