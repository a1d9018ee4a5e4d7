//! Gallery listing
//!
//! Enumerates the images shown on the gallery page.

use crate::logger;
use std::io;
use std::path::Path;
use tokio::fs;

/// List regular files in `dir` whose names end with one of `extensions`
///
/// Matching is a case-sensitive suffix match on the file name. A missing
/// directory yields an empty gallery. Names are returned sorted.
pub async fn list_images(dir: &Path, extensions: &[String]) -> io::Result<Vec<String>> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            logger::log_warning(&format!(
                "Gallery directory not found: {}, listing no images",
                dir.display()
            ));
            return Ok(Vec::new());
        }
        Err(e) => return Err(e),
    };

    let mut images = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if !extensions.iter().any(|ext| name.ends_with(ext.as_str())) {
            continue;
        }
        // Follows symlinks, unlike DirEntry::file_type
        let is_file = fs::metadata(entry.path())
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if is_file {
            images.push(name);
        }
    }

    images.sort();
    logger::log_debug(&format!("Loaded images: {images:?}"));
    Ok(images)
}
