use vestia_core::constants::{ALLOWED_IMAGE_EXTENSIONS, MAX_IMAGE_BYTES};
use vestia_core::ImageDescriptor;

/// Outcome of validating one acquired image.
///
/// `Cancelled` is silent (no user-visible error). `FileTooLarge` and
/// `InvalidFormat` are recoverable: the caller surfaces the message and
/// re-invokes acquisition. `PickerError` is terminal for the attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Accepted,
    Cancelled,
    FileTooLarge { message: String },
    InvalidFormat { message: String },
    PickerError { message: String },
}

impl ValidationOutcome {
    /// Whether the pipeline should automatically re-invoke acquisition.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ValidationOutcome::FileTooLarge { .. } | ValidationOutcome::InvalidFormat { .. }
        )
    }

    /// User-facing message for failure variants.
    pub fn message(&self) -> Option<&str> {
        match self {
            ValidationOutcome::Accepted | ValidationOutcome::Cancelled => None,
            ValidationOutcome::FileTooLarge { message }
            | ValidationOutcome::InvalidFormat { message }
            | ValidationOutcome::PickerError { message } => Some(message),
        }
    }
}

/// Acquisition-side validator: extension allow-list plus byte-size ceiling.
#[derive(Debug, Clone)]
pub struct AcquisitionValidator {
    max_bytes: u64,
}

impl Default for AcquisitionValidator {
    fn default() -> Self {
        Self {
            max_bytes: MAX_IMAGE_BYTES,
        }
    }
}

impl AcquisitionValidator {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    /// True iff the extension is on the image allow-list (case-insensitive).
    pub fn validate_format(&self, extension: &str) -> bool {
        let extension = extension.to_ascii_lowercase();
        ALLOWED_IMAGE_EXTENSIONS.contains(&extension.as_str())
    }

    /// True iff the byte count is within the ceiling.
    pub fn validate_size(&self, bytes: u64) -> bool {
        bytes <= self.max_bytes
    }

    /// Full descriptor check. Size is checked first so an oversized file with
    /// a bad extension reports the size problem the user can actually fix.
    pub fn validate(&self, descriptor: &ImageDescriptor) -> ValidationOutcome {
        if descriptor.byte_size == 0 {
            return ValidationOutcome::InvalidFormat {
                message: "The selected image file is empty".to_string(),
            };
        }

        if !self.validate_size(descriptor.byte_size) {
            return ValidationOutcome::FileTooLarge {
                message: format!(
                    "Image is {:.1}MB; the limit is {}MB",
                    descriptor.byte_size as f64 / (1024.0 * 1024.0),
                    self.max_bytes / (1024 * 1024),
                ),
            };
        }

        match descriptor.extension() {
            Some(ext) if self.validate_format(&ext) => ValidationOutcome::Accepted,
            Some(ext) => ValidationOutcome::InvalidFormat {
                message: format!(
                    "Unsupported image format '{}'. Supported formats: {}",
                    ext,
                    ALLOWED_IMAGE_EXTENSIONS.join(", "),
                ),
            },
            None => ValidationOutcome::InvalidFormat {
                message: "The selected file has no recognizable image extension".to_string(),
            },
        }
    }
}
