//! Bruker flexControl sample archives.
//!
//! [`ArchiveReader`] finds the samples packed in an archive; each
//! [`Sample`] exposes its acquisition and calibration metadata, validates
//! itself, computes its content digest and can be exported on its own.

mod archive;
mod fields;
mod metadata;
mod record;
mod sample;
mod tree;

pub use archive::{ArchiveHandle, ArchiveReader, Samples};
pub use metadata::Metadata;
pub use record::SampleRecord;
pub use sample::{ACQU_PATH, FID_PATH, FileSource, PROC_PATH, SPTYPE_PATH, Sample};
pub use tree::Node;
