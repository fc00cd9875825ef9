//! Error types for archive reading and sample validation.

use std::path::PathBuf;
use thiserror::Error;

/// Every failure the library can surface.
///
/// Container and attachment errors describe the archive itself; the
/// remaining variants describe the content of a sample and carry the file
/// and field they refer to, so they can be shown to an operator as-is.
#[derive(Error, Debug)]
pub enum Error {
    /// The archive could not be opened or is not a ZIP container
    #[error("Failed to open archive {name}: {reason}")]
    ArchiveOpen { name: String, reason: String },

    /// The archive a sample was read from has been closed
    #[error("Archive has been closed")]
    ArchiveClosed,

    /// Malformed ZIP structure
    #[error("Invalid ZIP archive: {0}")]
    InvalidArchive(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File was never attached to the sample
    #[error("Cannot find file \"{0}\"")]
    MissingFile(String),

    /// File exists but its contents could not be read
    #[error("Failed to read file \"{path}\": {reason}")]
    Read { path: String, reason: String },

    /// File contents exceed the size ceiling
    #[error("File \"{path}\" is too large (limit is {limit} bytes)")]
    TooLarge { path: String, limit: usize },

    /// File is not a `##key=value` parameter file
    #[error("Failed to parse metadata file \"{path}\": {reason}")]
    MetadataParse { path: String, reason: String },

    /// Parameter file lacks a required field
    #[error("Missing field {field} from \"{path}\"")]
    MetadataFieldMissing { path: String, field: String },

    /// Field is present but does not pass validation
    #[error("{reason} ({field} in \"{path}\")")]
    InvalidField {
        path: String,
        field: String,
        reason: String,
    },

    #[error("Too many files in sample ({count}, limit is {limit})")]
    TooManyFiles { count: usize, limit: usize },

    #[error("Spectrum type must be time-of-flight (ToF), found \"{0}\"")]
    UnsupportedSpectrumType(String),

    #[error("Spectrum file (\"fid\") is empty")]
    EmptySpectrum,

    #[error("Spectrum file (\"fid\") has an invalid size of {0} bytes")]
    InvalidSpectrumSize(u64),

    /// Parameter file has an unexpected `TITLE`
    #[error("{kind} metadata is not an XMASS Parameter file (\"{path}\" has title \"{title}\")")]
    UnexpectedMetadataFormat {
        kind: &'static str,
        path: String,
        title: String,
    },

    /// Writing an exported archive failed
    #[error("Failed to export sample to {}: {source}", path.display())]
    Export {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create an invalid archive error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArchive(msg.into())
    }

    /// Create an invalid field error.
    pub fn invalid_field(path: &str, field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            path: path.to_string(),
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether the error describes sample content rather than the container
    /// or the environment.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::MissingFile(_)
                | Error::TooLarge { .. }
                | Error::MetadataParse { .. }
                | Error::MetadataFieldMissing { .. }
                | Error::InvalidField { .. }
                | Error::TooManyFiles { .. }
                | Error::UnsupportedSpectrumType(_)
                | Error::EmptySpectrum
                | Error::InvalidSpectrumSize(_)
                | Error::UnexpectedMetadataFormat { .. }
        )
    }
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::invalid_field("acqu", "$InstrID", "Invalid instrument serial number");
        assert_eq!(
            e.to_string(),
            "Invalid instrument serial number ($InstrID in \"acqu\")"
        );

        let e = Error::TooManyFiles {
            count: 21,
            limit: 20,
        };
        assert!(e.to_string().contains("21"));
        assert!(e.to_string().contains("20"));
    }

    #[test]
    fn test_validation_classification() {
        assert!(Error::EmptySpectrum.is_validation());
        assert!(Error::MissingFile("fid".into()).is_validation());
        assert!(!Error::ArchiveClosed.is_validation());

        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(!err.is_validation());
    }
}
