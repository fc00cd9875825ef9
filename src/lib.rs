//! # flexzip
//!
//! Reads the ZIP archives exported by Bruker Daltonics flexControl, finds
//! the MALDI-TOF samples packed inside, and validates, fingerprints and
//! re-packages each one.
//!
//! ## Features
//!
//! - Discover samples by their `acqu` marker file, at any depth
//! - Lazy, size-bounded reads of sample files straight from the archive
//! - Typed accessors for acquisition and calibration metadata
//! - Validation of spectrum type, spectrum size, IDs, versions and dates
//! - SHA-256 content digest, independent of archive layout
//! - Reproducible single-sample export
//!
//! ## Example
//!
//! ```no_run
//! use flexzip::ArchiveReader;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let archive = ArchiveReader::open("samples.zip").await?;
//!
//!     for mut sample in archive.samples() {
//!         sample.validate().await?;
//!         let digest = sample.digest_hex().await?;
//!         println!("{} {}", digest, sample.root_path());
//!         sample.export(format!("out/{digest}.zip").as_ref()).await?;
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod flex;
pub mod io;
pub mod zip;

pub use cli::Cli;
pub use config::SampleConfig;
pub use error::{Error, Result};
pub use flex::{ArchiveReader, Sample, SampleRecord};
pub use io::{LocalFileReader, MemoryReader, ReadAt};
