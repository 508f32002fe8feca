// THEORY:
// The `sampling` module is the entry stage of the census pipeline. It turns a
// raster image file into the flat sequence of color samples every later stage
// operates on, and it enumerates which files are offered for selection in the
// first place.
//
// Key principles:
// 1.  **Normalization**: every decoded image is converted to 8-bit RGB. Alpha
//     is dropped and grayscale is expanded, so downstream stages always see
//     exactly three channels per sample.
// 2.  **Row-major order**: flattening walks pixels left-to-right within a row,
//     rows top-to-bottom. Sample i corresponds to pixel (i % width, i / width).
// 3.  **Conservative listing**: only filenames whose extension the decoder
//     understands are offered, so picking an entry from the list cannot fail
//     on format grounds alone.

use crate::error::CensusError;
use image::RgbImage;
use palette::Srgb;
use std::path::Path;

/// File extensions offered by [`list_images`], lowercase.
pub const RASTER_EXTENSIONS: [&str; 8] = ["bmp", "gif", "jpeg", "jpg", "png", "tif", "tiff", "webp"];

/// Decodes the image at `path` into 8-bit RGB.
pub fn load_rgb(path: &Path) -> Result<RgbImage, CensusError> {
    let image = image::open(path).map_err(|source| CensusError::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(image.to_rgb8())
}

/// Flattens an image into one sample per pixel, in row-major order.
pub fn flatten_pixels(image: &RgbImage) -> Vec<Srgb<u8>> {
    image
        .pixels()
        .map(|pixel| Srgb::new(pixel[0], pixel[1], pixel[2]))
        .collect()
}

/// Lists the selectable image filenames inside `dir`, sorted by name.
pub fn list_images(dir: &Path) -> Result<Vec<String>, CensusError> {
    let entries = std::fs::read_dir(dir).map_err(|source| CensusError::ImageDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| CensusError::ImageDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(extension) = path.extension().and_then(|ext| ext.to_str()) else {
            continue;
        };
        if !RASTER_EXTENSIONS.contains(&extension.to_ascii_lowercase().as_str()) {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_preserves_row_major_order() {
        let image = RgbImage::from_fn(2, 2, |x, y| match (x, y) {
            (0, 0) => image::Rgb([1, 2, 3]),
            (1, 0) => image::Rgb([4, 5, 6]),
            (0, 1) => image::Rgb([7, 8, 9]),
            _ => image::Rgb([10, 11, 12]),
        });

        let samples = flatten_pixels(&image);
        assert_eq!(samples.len(), 4);
        assert_eq!(samples[0], Srgb::new(1, 2, 3));
        assert_eq!(samples[1], Srgb::new(4, 5, 6));
        assert_eq!(samples[2], Srgb::new(7, 8, 9));
        assert_eq!(samples[3], Srgb::new(10, 11, 12));
    }

    #[test]
    fn load_rgb_reports_missing_file() {
        let result = load_rgb(Path::new("/definitely/not/here.png"));
        assert!(matches!(result, Err(CensusError::ImageLoad { .. })));
    }

    #[test]
    fn list_images_reports_missing_directory() {
        let result = list_images(Path::new("/definitely/not/a/directory"));
        assert!(matches!(result, Err(CensusError::ImageDir { .. })));
    }

    #[test]
    fn list_images_filters_and_sorts() {
        let dir = std::env::temp_dir().join(format!("census_listing_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("b.png"), b"stub").unwrap();
        std::fs::write(dir.join("a.JPG"), b"stub").unwrap();
        std::fs::write(dir.join("notes.txt"), b"stub").unwrap();

        let names = list_images(&dir).unwrap();
        std::fs::remove_dir_all(&dir).unwrap();

        assert_eq!(names, vec!["a.JPG".to_string(), "b.png".to_string()]);
    }
}
