// Writers for every raster a run produces. Each function creates (or
// truncates) exactly the files it names and reports failures with the path.

use crate::render::render_mask;
use crate::{RenderError, Result, extent};
use image::codecs::png::PngEncoder;
use image::codecs::pnm::{PnmEncoder, PnmSubtype, SampleEncoding};
use image::{ExtendedColorType, GrayImage, ImageEncoder, RgbImage};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thromb_analysis::core_modules::component::LabelMap;
use thromb_analysis::core_modules::grid::Mask;
use tiff::encoder::{TiffEncoder, colortype};

fn create(path: &Path) -> Result<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| RenderError::io(path, e))
}

pub fn save_png(path: &Path, image: &RgbImage) -> Result<()> {
    let output = create(path)?;
    let encoder = PngEncoder::new(output);
    encoder
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| RenderError::image(path, e))
}

/// Binary (P5) graymap.
pub fn save_pgm(path: &Path, image: &GrayImage) -> Result<()> {
    let output = create(path)?;
    let encoder =
        PnmEncoder::new(output).with_subtype(PnmSubtype::Graymap(SampleEncoding::Binary));
    encoder
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::L8,
        )
        .map_err(|e| RenderError::image(path, e))
}

pub fn save_mask(path: &Path, mask: &Mask) -> Result<()> {
    save_pgm(path, &render_mask(mask)?)
}

/// Integer form of a label map, row-major; fails if a label exceeds `u32`.
pub fn raw_labels(label_map: &LabelMap) -> Result<Vec<u32>> {
    label_map
        .cells()
        .iter()
        .map(|label| {
            let raw = label.to_raw();
            u32::try_from(raw).map_err(|_| RenderError::LabelOverflow { label: raw })
        })
        .collect()
}

/// 32-bit unsigned grayscale TIFF of the raw label values.
pub fn save_label_tiff(path: &Path, label_map: &LabelMap) -> Result<()> {
    let (width, height) = (extent(label_map.width())?, extent(label_map.height())?);
    let data = raw_labels(label_map)?;

    let output = create(path)?;
    let mut tiff = TiffEncoder::new(output).map_err(|e| RenderError::tiff(path, e))?;
    tiff.write_image::<colortype::Gray32>(width, height, &data)
        .map_err(|e| RenderError::tiff(path, e))
}

/// MetaImage pair: `<stem>.mhd` header plus `<stem>.raw` little-endian `u32` data.
///
/// The data file is written first, so a header only exists next to complete data.
pub fn save_label_meta_image(directory: &Path, stem: &str, label_map: &LabelMap) -> Result<()> {
    let data = raw_labels(label_map)?;
    let raw_name = format!("{stem}.raw");
    let header_path = directory.join(format!("{stem}.mhd"));
    let raw_path = directory.join(&raw_name);

    let mut raw = create(&raw_path)?;
    for value in data {
        raw.write_all(&value.to_le_bytes())
            .map_err(|e| RenderError::io(&raw_path, e))?;
    }
    raw.flush().map_err(|e| RenderError::io(&raw_path, e))?;

    let mut header = create(&header_path)?;
    write!(
        header,
        "ObjectType = Image\n\
         NDims = 2\n\
         BinaryData = True\n\
         BinaryDataByteOrderMSB = False\n\
         CompressedData = False\n\
         DimSize = {} {}\n\
         ElementSpacing = 1 1\n\
         ElementType = MET_UINT\n\
         ElementDataFile = {}\n",
        label_map.width(),
        label_map.height(),
        raw_name
    )
    .and_then(|_| header.flush())
    .map_err(|e| RenderError::io(&header_path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use thromb_analysis::core_modules::component::Label;
    use thromb_analysis::core_modules::grid::Grid;

    fn label_map() -> LabelMap {
        Grid::from_fn(3, 2, |x, y| Label::from_raw(if y == 0 { x } else { 7 }))
    }

    #[test]
    fn save_white_mask() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("white_file.pgm");
        save_mask(&path, &Mask::filled(50, 40, true)).expect("Error Saving File.");

        let decoded = image::open(&path).unwrap().into_luma8();
        assert_eq!(decoded.dimensions(), (50, 40));
        assert!(decoded.pixels().all(|p| p.0 == [255]));
    }

    #[test]
    fn save_gradient_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gradient_file.png");
        let image = RgbImage::from_fn(64, 32, |x, y| image::Rgb([x as u8 * 4, y as u8 * 8, 0]));
        save_png(&path, &image).expect("Error Saving File.");

        let decoded = image::open(&path).unwrap().into_rgb8();
        assert_eq!(decoded, image);
    }

    #[test]
    fn label_tiff_keeps_raw_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("components.tif");
        save_label_tiff(&path, &label_map()).unwrap();

        let mut decoder = tiff::decoder::Decoder::new(File::open(&path).unwrap()).unwrap();
        assert_eq!(decoder.dimensions().unwrap(), (3, 2));
        match decoder.read_image().unwrap() {
            tiff::decoder::DecodingResult::U32(values) => {
                assert_eq!(values, vec![0, 1, 2, 7, 7, 7]);
            }
            _ => panic!("expected 32-bit samples"),
        }
    }

    #[test]
    fn meta_image_header_points_at_raw_file() {
        let dir = tempfile::tempdir().unwrap();
        save_label_meta_image(dir.path(), "components", &label_map()).unwrap();

        let header = std::fs::read_to_string(dir.path().join("components.mhd")).unwrap();
        assert!(header.contains("DimSize = 3 2\n"));
        assert!(header.contains("ElementDataFile = components.raw\n"));

        let raw = std::fs::read(dir.path().join("components.raw")).unwrap();
        assert_eq!(raw.len(), 6 * 4);
        assert_eq!(&raw[4..8], &1u32.to_le_bytes());
    }

    #[test]
    fn failed_raw_write_leaves_no_header() {
        let dir = tempfile::tempdir().unwrap();
        // A directory in place of the data file makes its creation fail.
        std::fs::create_dir(dir.path().join("components.raw")).unwrap();

        let err = save_label_meta_image(dir.path(), "components", &label_map()).unwrap_err();
        assert!(matches!(err, RenderError::Io { .. }));
        assert!(!dir.path().join("components.mhd").exists());
    }

    #[test]
    fn missing_directory_reports_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nowhere").join("boundary.pgm");
        let err = save_mask(&path, &Mask::filled(1, 1, false)).unwrap_err();
        match err {
            RenderError::Io { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
