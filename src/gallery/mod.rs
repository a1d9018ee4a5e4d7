//! Gallery module
//!
//! The domain side of the server:
//! - Listing image files in the gallery directory
//! - Copying precomputed result images into the output directory
//! - Rendering the gallery page

mod copier;
mod error;
mod kind;
mod layout;
mod listing;
mod name;
mod page;

pub use copier::ResultCopier;
pub use error::ProcessError;
pub use layout::GalleryLayout;
pub use listing::list_images;
pub use page::render_gallery_page;
