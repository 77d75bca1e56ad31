//! Raw image descriptor produced by an acquisition source.

use std::path::PathBuf;

/// Describes one acquired image before validation and compression.
///
/// The descriptor (and the scratch file behind `locator`) is owned by the
/// pipeline run that acquired it and is discarded after compression; the
/// scratch file is removed on every exit path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDescriptor {
    /// Filesystem location of the acquired bytes, valid for one run.
    pub locator: PathBuf,
    /// Original file name as reported by the picker. May carry a query or
    /// fragment suffix on some platforms; validation strips those.
    pub file_name: String,
    pub byte_size: u64,
    pub width: u32,
    pub height: u32,
    pub mime_type: String,
}

impl ImageDescriptor {
    /// Extension of `file_name`, lowercased, with any `?query` or
    /// `#fragment` suffix stripped first.
    pub fn extension(&self) -> Option<String> {
        let name = self
            .file_name
            .split(['?', '#'])
            .next()
            .unwrap_or(&self.file_name);
        let (_, ext) = name.rsplit_once('.')?;
        if ext.is_empty() {
            None
        } else {
            Some(ext.to_ascii_lowercase())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(file_name: &str) -> ImageDescriptor {
        ImageDescriptor {
            locator: PathBuf::from("/tmp/scratch"),
            file_name: file_name.to_string(),
            byte_size: 1024,
            width: 640,
            height: 480,
            mime_type: "image/jpeg".to_string(),
        }
    }

    #[test]
    fn test_extension_lowercased() {
        assert_eq!(descriptor("IMG_0042.JPG").extension().as_deref(), Some("jpg"));
    }

    #[test]
    fn test_extension_strips_query_and_fragment() {
        assert_eq!(
            descriptor("photo.heic?cache=1").extension().as_deref(),
            Some("heic")
        );
        assert_eq!(
            descriptor("photo.png#preview").extension().as_deref(),
            Some("png")
        );
    }

    #[test]
    fn test_extension_missing() {
        assert_eq!(descriptor("noextension").extension(), None);
        assert_eq!(descriptor("trailingdot.").extension(), None);
    }
}
