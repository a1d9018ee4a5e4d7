// Application state module
// Everything a request handler needs, built once at startup

use super::types::Config;
use crate::gallery::{GalleryLayout, ResultCopier};

/// Application state shared by all connections
pub struct AppState {
    pub config: Config,
    pub layout: GalleryLayout,
    pub copier: ResultCopier,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let layout = GalleryLayout::from_config(&config.gallery);

        Self {
            config: config.clone(),
            copier: ResultCopier::new(layout.clone()),
            layout,
        }
    }
}
