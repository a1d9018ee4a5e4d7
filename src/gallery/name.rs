//! Untrusted image names
//!
//! `image_name` comes straight from the request form and ends up in six
//! filesystem paths. It is accepted only when it is a single plain file name.

use super::error::ProcessError;
use std::ffi::OsStr;
use std::path::Path;

/// A validated image file name: one normal path component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageName(String);

impl ImageName {
    pub fn parse(raw: Option<&str>) -> Result<Self, ProcessError> {
        let name = match raw {
            None | Some("") => return Err(ProcessError::MissingName),
            Some(n) => n,
        };

        let reject = |reason| {
            Err(ProcessError::InvalidName {
                name: name.to_string(),
                reason,
            })
        };

        if name.contains('\0') {
            return reject("contains a NUL byte");
        }
        if name.contains(['/', '\\']) {
            return reject("contains a path separator");
        }
        if name == "." || name == ".." {
            return reject("is a relative path component");
        }
        // Catches anything the platform would still not treat as a plain file name
        if Path::new(name).file_name() != Some(OsStr::new(name)) {
            return reject("is not a plain file name");
        }

        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
