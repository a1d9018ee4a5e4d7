//! Result copier
//!
//! Resolves the three precomputed result images for an input image and
//! re-encodes each into the output directory. A missing result falls back to
//! the input image; a result that exists but cannot be decoded stops the
//! request. Outputs already written for earlier kinds are left in place.
//!
//! All work here is blocking filesystem and codec I/O; the HTTP handler runs
//! it on the blocking thread pool.

use super::error::ProcessError;
use super::kind::ResultKind;
use super::layout::GalleryLayout;
use super::name::ImageName;
use crate::logger;
use image::{DynamicImage, ImageReader};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Successful response body of `/process`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessedImages {
    /// Output URLs relative to the static root, in kind order
    pub processed_images: Vec<String>,
}

/// What was found at a result image path
#[derive(Debug)]
pub enum ResultSource {
    /// Nothing there: the input image stands in
    Missing,
    /// Present and decoded
    Decoded(DynamicImage),
    /// Present but unreadable or not an image
    Corrupt(String),
}

/// Classify the result image at `path`
pub fn inspect_result(path: &Path) -> ResultSource {
    match path.try_exists() {
        Ok(false) => ResultSource::Missing,
        Ok(true) => match decode_image(path) {
            Ok(img) => ResultSource::Decoded(img),
            Err(e) => ResultSource::Corrupt(e.to_string()),
        },
        Err(e) => ResultSource::Corrupt(e.to_string()),
    }
}

/// Decode by content rather than extension, normalized to 8-bit RGB
fn decode_image(path: &Path) -> image::ImageResult<DynamicImage> {
    let img = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    Ok(DynamicImage::ImageRgb8(img.to_rgb8()))
}

pub struct ResultCopier {
    layout: GalleryLayout,
}

impl ResultCopier {
    pub const fn new(layout: GalleryLayout) -> Self {
        Self { layout }
    }

    pub const fn layout(&self) -> &GalleryLayout {
        &self.layout
    }

    /// Copy the results for `raw_name` into the output directory
    pub fn process(&self, raw_name: Option<&str>) -> Result<ProcessedImages, ProcessError> {
        let name = ImageName::parse(raw_name)?;

        logger::log_debug(&format!(
            "Input path: {}",
            self.layout.input_path(&name).display()
        ));
        for kind in ResultKind::ALL {
            logger::log_debug(&format!(
                "Result {kind} path: {} -> {}",
                self.layout.result_path(kind, &name).display(),
                self.layout.output_path(kind, &name).display()
            ));
        }

        let input = self.load_input(&name)?;

        let mut processed_images = Vec::with_capacity(ResultKind::ALL.len());
        for kind in ResultKind::ALL {
            let result_path = self.layout.result_path(kind, &name);
            let url = match inspect_result(&result_path) {
                ResultSource::Missing => {
                    logger::log_warning(&format!(
                        "Result image not found: {}, using input image as fallback",
                        result_path.display()
                    ));
                    self.write_output(kind, &name, &input)?
                }
                ResultSource::Decoded(img) => self.write_output(kind, &name, &img)?,
                ResultSource::Corrupt(reason) => {
                    return Err(ProcessError::LoadResult {
                        index: kind.index(),
                        path: result_path,
                        reason,
                    });
                }
            };
            processed_images.push(url);
        }

        logger::log_debug(&format!("Returning processed URLs: {processed_images:?}"));
        Ok(ProcessedImages { processed_images })
    }

    fn load_input(&self, name: &ImageName) -> Result<DynamicImage, ProcessError> {
        let path = self.layout.input_path(name);
        let load_error = |reason: String| ProcessError::LoadInput {
            path: path.clone(),
            reason,
        };

        confine(&path, self.layout.images_dir()).map_err(load_error)?;
        decode_image(&path).map_err(|e| load_error(e.to_string()))
    }

    fn write_output(
        &self,
        kind: ResultKind,
        name: &ImageName,
        image: &DynamicImage,
    ) -> Result<String, ProcessError> {
        let dir = self.layout.output_dir();
        fs::create_dir_all(dir).map_err(|e| {
            ProcessError::Processing(format!(
                "cannot create output directory {}: {e}",
                dir.display()
            ))
        })?;

        let path = self.layout.output_path(kind, name);
        image.save(&path).map_err(|e| {
            ProcessError::Processing(format!("cannot write {}: {e}", path.display()))
        })?;

        logger::log_debug(&format!(
            "Image {} processed and saved to: {}",
            kind.index(),
            path.display()
        ));
        Ok(self.layout.output_url(kind, name))
    }
}

/// Ensure `path` resolves inside `dir` once symlinks are followed
fn confine(path: &Path, dir: &Path) -> Result<(), String> {
    let dir_canonical = dir
        .canonicalize()
        .map_err(|e| format!("directory {} unavailable: {e}", dir.display()))?;
    let path_canonical = path.canonicalize().map_err(|e| e.to_string())?;

    if path_canonical.starts_with(&dir_canonical) {
        Ok(())
    } else {
        Err(format!(
            "path escapes {}: {}",
            dir_canonical.display(),
            path_canonical.display()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GalleryConfig;
    use hyper::StatusCode;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};
    use std::path::PathBuf;
    use tempfile::TempDir;

    const RED: [u8; 3] = [200, 10, 10];
    const GREEN: [u8; 3] = [10, 200, 10];
    const BLUE: [u8; 3] = [10, 10, 200];
    const WHITE: [u8; 3] = [250, 250, 250];

    fn fixture() -> (TempDir, ResultCopier) {
        let dir = TempDir::new().unwrap();
        let config = GalleryConfig {
            static_root: dir.path().to_string_lossy().into_owned(),
            ..GalleryConfig::default()
        };
        let copier = ResultCopier::new(GalleryLayout::from_config(&config));
        fs::create_dir_all(copier.layout().images_dir()).unwrap();
        (dir, copier)
    }

    fn write_png(path: &Path, color: [u8; 3]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        RgbImage::from_pixel(4, 3, Rgb(color)).save(path).unwrap();
    }

    fn write_result(copier: &ResultCopier, kind: ResultKind, name: &str, color: [u8; 3]) {
        write_png(&kind.source_dir(copier.layout()).join(name), color);
    }

    fn pixels(path: &Path) -> RgbImage {
        image::open(path).unwrap().to_rgb8()
    }

    fn output(copier: &ResultCopier, index: usize, name: &str) -> PathBuf {
        copier.layout().output_dir().join(format!("demo_{index}_{name}"))
    }

    #[test]
    fn test_all_results_present() {
        let (_dir, copier) = fixture();
        write_png(&copier.layout().images_dir().join("cat.png"), WHITE);
        write_result(&copier, ResultKind::Detection, "cat.png", RED);
        write_result(&copier, ResultKind::Mask, "cat.png", GREEN);
        write_result(&copier, ResultKind::Result, "cat.png", BLUE);

        let processed = copier.process(Some("cat.png")).unwrap();

        assert_eq!(
            processed.processed_images,
            vec![
                "processed/demo_1_cat.png",
                "processed/demo_2_cat.png",
                "processed/demo_3_cat.png",
            ]
        );
        for (index, kind) in [(1, ResultKind::Detection), (2, ResultKind::Mask), (3, ResultKind::Result)] {
            let source = kind.source_dir(copier.layout()).join("cat.png");
            assert_eq!(pixels(&output(&copier, index, "cat.png")), pixels(&source));
        }
    }

    #[test]
    fn test_missing_results_fall_back_to_input() {
        let (_dir, copier) = fixture();
        let input = copier.layout().images_dir().join("dog.png");
        write_png(&input, WHITE);
        write_result(&copier, ResultKind::Mask, "dog.png", GREEN);

        let processed = copier.process(Some("dog.png")).unwrap();
        assert_eq!(processed.processed_images.len(), 3);

        assert_eq!(pixels(&output(&copier, 1, "dog.png")), pixels(&input));
        assert_eq!(
            pixels(&output(&copier, 2, "dog.png")),
            RgbImage::from_pixel(4, 3, Rgb(GREEN))
        );
        assert_eq!(pixels(&output(&copier, 3, "dog.png")), pixels(&input));
    }

    #[test]
    fn test_missing_input_writes_nothing() {
        let (_dir, copier) = fixture();
        write_result(&copier, ResultKind::Detection, "ghost.png", RED);

        let err = copier.process(Some("ghost.png")).unwrap_err();

        assert!(matches!(err, ProcessError::LoadInput { .. }));
        assert_eq!(err.client_message(), "Failed to Load Image");
        assert!(!copier.layout().output_dir().exists());
    }

    #[test]
    fn test_undecodable_input() {
        let (_dir, copier) = fixture();
        fs::write(copier.layout().images_dir().join("notes.png"), b"plain text").unwrap();

        let err = copier.process(Some("notes.png")).unwrap_err();
        assert!(matches!(err, ProcessError::LoadInput { .. }));
        assert!(!copier.layout().output_dir().exists());
    }

    #[test]
    fn test_corrupt_result_short_circuits() {
        let (_dir, copier) = fixture();
        write_png(&copier.layout().images_dir().join("bird.png"), WHITE);
        write_result(&copier, ResultKind::Detection, "bird.png", RED);
        fs::create_dir_all(copier.layout().mask_dir()).unwrap();
        fs::write(copier.layout().mask_dir().join("bird.png"), b"\x89PNG broken").unwrap();
        write_result(&copier, ResultKind::Result, "bird.png", BLUE);

        let err = copier.process(Some("bird.png")).unwrap_err();

        assert!(matches!(err, ProcessError::LoadResult { index: 2, .. }));
        assert_eq!(err.client_message(), "Failed to load result image 2");
        // No rollback for kinds that already succeeded
        assert!(output(&copier, 1, "bird.png").exists());
        assert!(!output(&copier, 2, "bird.png").exists());
        assert!(!output(&copier, 3, "bird.png").exists());
    }

    #[test]
    fn test_unwritable_output_is_processing_error() {
        let (_dir, copier) = fixture();
        // Decodes by content, but no encoder matches a name without extension
        let input = copier.layout().images_dir().join("scan");
        RgbImage::from_pixel(4, 3, Rgb(WHITE))
            .save_with_format(&input, image::ImageFormat::Png)
            .unwrap();

        let err = copier.process(Some("scan")).unwrap_err();

        assert!(matches!(err, ProcessError::Processing(_)));
        assert_eq!(err.category(), "ProcessingError");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            err.client_message(),
            "An error occurred while processing the image. Please try again."
        );
        assert!(err.to_string().contains("demo_1_scan"));
        assert!(!output(&copier, 1, "scan").exists());
    }

    #[test]
    fn test_invalid_names_write_nothing() {
        let (_dir, copier) = fixture();

        assert!(matches!(copier.process(None), Err(ProcessError::MissingName)));
        assert!(matches!(copier.process(Some("")), Err(ProcessError::MissingName)));
        assert!(matches!(
            copier.process(Some("../../etc/passwd")),
            Err(ProcessError::InvalidName { .. })
        ));
        assert!(!copier.layout().output_dir().exists());
    }

    #[test]
    fn test_repeated_calls_are_idempotent() {
        let (_dir, copier) = fixture();
        write_png(&copier.layout().images_dir().join("fox.png"), WHITE);
        write_result(&copier, ResultKind::Result, "fox.png", BLUE);

        let first = copier.process(Some("fox.png")).unwrap();
        let first_bytes: Vec<Vec<u8>> = (1..=3)
            .map(|i| fs::read(output(&copier, i, "fox.png")).unwrap())
            .collect();

        let second = copier.process(Some("fox.png")).unwrap();
        let second_bytes: Vec<Vec<u8>> = (1..=3)
            .map(|i| fs::read(output(&copier, i, "fox.png")).unwrap())
            .collect();

        assert_eq!(first, second);
        assert_eq!(first_bytes, second_bytes);
    }

    #[test]
    fn test_alpha_input_written_as_jpeg() {
        let (_dir, copier) = fixture();
        // PNG content under a .jpg name: decoding goes by content
        let input = copier.layout().images_dir().join("photo.jpg");
        RgbaImage::from_pixel(8, 8, Rgba([30, 60, 90, 128]))
            .save_with_format(&input, image::ImageFormat::Png)
            .unwrap();

        let processed = copier.process(Some("photo.jpg")).unwrap();

        assert_eq!(processed.processed_images[0], "processed/demo_1_photo.jpg");
        let written = image::open(output(&copier, 1, "photo.jpg")).unwrap();
        assert_eq!((written.width(), written.height()), (8, 8));
    }

    #[test]
    fn test_inspect_result_three_ways() {
        let dir = TempDir::new().unwrap();
        let present = dir.path().join("present.png");
        let corrupt = dir.path().join("corrupt.png");
        write_png(&present, RED);
        fs::write(&corrupt, b"garbage").unwrap();

        assert!(matches!(
            inspect_result(&dir.path().join("absent.png")),
            ResultSource::Missing
        ));
        assert!(matches!(inspect_result(&present), ResultSource::Decoded(_)));
        assert!(matches!(inspect_result(&corrupt), ResultSource::Corrupt(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_escape_rejected() {
        let (dir, copier) = fixture();
        let outside = dir.path().join("secret.png");
        write_png(&outside, RED);
        std::os::unix::fs::symlink(&outside, copier.layout().images_dir().join("link.png"))
            .unwrap();

        let err = copier.process(Some("link.png")).unwrap_err();
        assert!(matches!(err, ProcessError::LoadInput { .. }));
        assert!(!copier.layout().output_dir().exists());
    }
}
