//! Gallery filesystem layout
//!
//! Resolves every directory the gallery touches from the `[gallery]`
//! configuration section, so handlers never build paths from globals.

use super::kind::ResultKind;
use super::name::ImageName;
use crate::config::GalleryConfig;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct GalleryLayout {
    static_root: PathBuf,
    images_dir: PathBuf,
    detection_dir: PathBuf,
    mask_dir: PathBuf,
    result_dir: PathBuf,
    output_dir: PathBuf,
    /// Output directory as it appears in returned URLs, relative to the static root
    output_url_prefix: String,
    extensions: Vec<String>,
}

impl GalleryLayout {
    pub fn from_config(config: &GalleryConfig) -> Self {
        let root = PathBuf::from(&config.static_root);
        // Subdirectories always stay under the static root
        let under_root = |dir: &str| root.join(dir.trim_start_matches('/'));
        Self {
            images_dir: under_root(&config.images_dir),
            detection_dir: under_root(&config.detection_dir),
            mask_dir: under_root(&config.mask_dir),
            result_dir: under_root(&config.result_dir),
            output_dir: under_root(&config.output_dir),
            output_url_prefix: config.output_dir.trim_matches('/').to_string(),
            extensions: config.extensions.clone(),
            static_root: root,
        }
    }

    pub fn static_root(&self) -> &Path {
        &self.static_root
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    pub fn detection_dir(&self) -> &Path {
        &self.detection_dir
    }

    pub fn mask_dir(&self) -> &Path {
        &self.mask_dir
    }

    pub fn result_dir(&self) -> &Path {
        &self.result_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn input_path(&self, name: &ImageName) -> PathBuf {
        self.images_dir.join(name.as_str())
    }

    /// Result images share the input's file name inside their kind's directory
    pub fn result_path(&self, kind: ResultKind, name: &ImageName) -> PathBuf {
        kind.source_dir(self).join(name.as_str())
    }

    pub fn output_path(&self, kind: ResultKind, name: &ImageName) -> PathBuf {
        self.output_dir.join(kind.output_file_name(name))
    }

    /// Public URL of an output, relative to the static root
    pub fn output_url(&self, kind: ResultKind, name: &ImageName) -> String {
        let file_name = kind.output_file_name(name);
        if self.output_url_prefix.is_empty() {
            file_name
        } else {
            format!("{}/{file_name}", self.output_url_prefix)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_from_default_config() {
        let layout = GalleryLayout::from_config(&GalleryConfig::default());
        let name = ImageName::parse(Some("dog.jpg")).unwrap();

        assert_eq!(layout.input_path(&name), Path::new("static/images/dog.jpg"));
        assert_eq!(
            layout.result_path(ResultKind::Detection, &name),
            Path::new("static/det/dog.jpg")
        );
        assert_eq!(
            layout.result_path(ResultKind::Mask, &name),
            Path::new("static/mask/dog.jpg")
        );
        assert_eq!(
            layout.result_path(ResultKind::Result, &name),
            Path::new("static/results/dog.jpg")
        );
        assert_eq!(
            layout.output_path(ResultKind::Mask, &name),
            Path::new("static/processed/demo_2_dog.jpg")
        );
    }

    #[test]
    fn test_output_urls() {
        let mut config = GalleryConfig::default();
        let name = ImageName::parse(Some("dog.jpg")).unwrap();

        let layout = GalleryLayout::from_config(&config);
        assert_eq!(
            layout.output_url(ResultKind::Result, &name),
            "processed/demo_3_dog.jpg"
        );

        config.output_dir = "/out/".to_string();
        let layout = GalleryLayout::from_config(&config);
        assert_eq!(layout.output_url(ResultKind::Detection, &name), "out/demo_1_dog.jpg");
        assert_eq!(
            layout.output_path(ResultKind::Detection, &name),
            Path::new("static/out/demo_1_dog.jpg")
        );
    }
}
