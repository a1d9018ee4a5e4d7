//! Result image kinds
//!
//! Each input image has up to three precomputed results produced upstream.
//! Their order is fixed and determines the numbering of output files.

use super::layout::GalleryLayout;
use super::name::ImageName;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Detection,
    Mask,
    Result,
}

impl ResultKind {
    /// All kinds in output order
    pub const ALL: [Self; 3] = [Self::Detection, Self::Mask, Self::Result];

    /// Position of this kind in the response, starting at 1
    pub const fn index(self) -> usize {
        match self {
            Self::Detection => 1,
            Self::Mask => 2,
            Self::Result => 3,
        }
    }

    /// Directory holding this kind's precomputed images
    pub fn source_dir(self, layout: &GalleryLayout) -> &Path {
        match self {
            Self::Detection => layout.detection_dir(),
            Self::Mask => layout.mask_dir(),
            Self::Result => layout.result_dir(),
        }
    }

    pub fn output_file_name(self, name: &ImageName) -> String {
        format!("demo_{}_{}", self.index(), name.as_str())
    }
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Detection => write!(f, "detection"),
            Self::Mask => write!(f, "mask"),
            Self::Result => write!(f, "result"),
        }
    }
}
