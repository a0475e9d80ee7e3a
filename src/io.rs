//! File helpers around the codec.
//!
//! - `load_pixels`: decode an image file into a `PixelArray` for the given mode.
//! - `write_atomic`: write bytes through a temp file so no partial output is left.
//! - `read_mosaic` / `write_mosaic`: whole-file decode and encode.
use crate::decoder::decode;
use crate::encoder::encode;
use crate::error::FileError;
use crate::grid::{Mode, MosaicGrid};
use crate::reduce::PixelArray;
use log::{debug, info};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Result type for file operations
pub type FileResult<T> = Result<T, FileError>;

/// Load an image as luma (monochrome) or RGB (tri-channel) samples.
pub fn load_pixels(path: &Path, mode: Mode) -> FileResult<PixelArray> {
    let img = image::open(path)?;
    debug!("loaded {:?}: {}x{} {:?}", path, img.width(), img.height(), img.color());
    let pixels = match mode {
        Mode::Monochrome => PixelArray::from(&img.into_luma8()),
        Mode::TriChannel => PixelArray::from(&img.into_rgb8()),
    };
    Ok(pixels)
}

/// Write `data` to `path`, creating missing parent directories.
///
/// The bytes go to a temporary file next to `path` that only replaces it once
/// everything is written.
pub fn write_atomic(path: &Path, data: &[u8]) -> FileResult<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    if !dir.exists() {
        info!("creating directory {:?}", dir);
        fs::create_dir_all(dir)?;
    }
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(data)?;
    file.as_file().sync_all()?;
    file.persist(path)?;
    debug!("wrote {} bytes to {:?}", data.len(), path);
    Ok(())
}

pub fn read_mosaic(path: &Path) -> FileResult<MosaicGrid> {
    let data = fs::read(path)?;
    let grid = decode(&data)?;
    info!(
        "read {:?} mosaic {}x{} from {:?}",
        grid.mode(),
        grid.width(),
        grid.height(),
        path
    );
    Ok(grid)
}

pub fn write_mosaic(path: &Path, grid: &MosaicGrid) -> FileResult<()> {
    write_atomic(path, &encode(grid))?;
    info!(
        "wrote {:?} mosaic {}x{} to {:?}",
        grid.mode(),
        grid.width(),
        grid.height(),
        path
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MosaicError;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    #[test]
    fn mosaic_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.msc");
        let grid = MosaicGrid::from_rows(vec![vec![vec![true, false, true]]]).unwrap();
        write_mosaic(&path, &grid).unwrap();
        assert_eq!(read_mosaic(&path).unwrap(), grid);
    }

    #[test]
    fn failed_decode_reports_mosaic_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.msc");
        fs::write(&path, [0u8; 32]).unwrap();
        assert!(matches!(
            read_mosaic(&path),
            Err(FileError::Mosaic(MosaicError::MalformedHeader(_)))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_mosaic(&dir.path().join("missing.msc")),
            Err(FileError::Io(_))
        ));
    }

    #[test]
    fn loads_pixels_per_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("red.png");
        RgbImage::from_pixel(4, 2, Rgb([255, 0, 0])).save(&path).unwrap();

        let rgb = load_pixels(&path, Mode::TriChannel).unwrap();
        assert_eq!((rgb.rows(), rgb.cols(), rgb.channels()), (2, 4, 3));

        let luma = load_pixels(&path, Mode::Monochrome).unwrap();
        assert_eq!(luma.channels(), 1);

        let gray = dir.path().join("gray.png");
        GrayImage::from_pixel(3, 3, Luma([7])).save(&gray).unwrap();
        assert_eq!(
            load_pixels(&gray, Mode::Monochrome).unwrap(),
            PixelArray::from_luma(3, 3, &[7; 9]).unwrap()
        );
    }
}
