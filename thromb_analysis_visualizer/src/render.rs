use crate::color_table::ColorTable;
use crate::{Result, extent};
use image::{GrayImage, Luma, Rgb, RgbImage};
use thromb_analysis::core_modules::component::{Component, Label, LabelMap};
use thromb_analysis::core_modules::grid::Mask;

/// Paints every pixel with the color of its label.
pub fn render_labels(label_map: &LabelMap, colors: &ColorTable) -> Result<RgbImage> {
    let (width, height) = (extent(label_map.width())?, extent(label_map.height())?);
    Ok(RgbImage::from_fn(width, height, |x, y| {
        Rgb(colors.color(label_map[(x as usize, y as usize)]))
    }))
}

/// Marks the top and bottom edge rows of every component's bounding box in
/// that component's color.
pub fn overlay_bounding_boxes(image: &mut RgbImage, components: &[Component], colors: &ColorTable) {
    for component in components {
        let bbox = &component.bounding_box;
        let (Some((start_x, top)), Some((stop_x, bottom))) = (bbox.start(), bbox.stop()) else {
            continue;
        };
        let color = Rgb(colors.color(Label::Component(component.id)));
        for x in start_x..=stop_x {
            for y in [top, bottom] {
                if let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) {
                    if x < image.width() && y < image.height() {
                        image.put_pixel(x, y, color);
                    }
                }
            }
        }
    }
}

/// Label coloring with the bounding-box overlay on top.
pub fn render_labels_with_boxes(
    label_map: &LabelMap,
    components: &[Component],
    colors: &ColorTable,
) -> Result<RgbImage> {
    let mut image = render_labels(label_map, colors)?;
    overlay_bounding_boxes(&mut image, components, colors);
    Ok(image)
}

/// Binary raster: 255 where the mask is set, 0 elsewhere.
pub fn render_mask(mask: &Mask) -> Result<GrayImage> {
    let (width, height) = (extent(mask.width())?, extent(mask.height())?);
    Ok(GrayImage::from_fn(width, height, |x, y| {
        Luma([if mask[(x as usize, y as usize)] { 255 } else { 0 }])
    }))
}
