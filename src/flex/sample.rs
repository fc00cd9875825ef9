//! A single sample found inside a flexControl archive.

use chrono::{DateTime, FixedOffset, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, trace};

use crate::config::SampleConfig;
use crate::error::{Error, Result};
use crate::zip::ZipWriter;

use super::archive::ArchiveHandle;
use super::fields;
use super::metadata::Metadata;
use super::record::SampleRecord;

/// Acquisition parameters, at the sample root
pub const ACQU_PATH: &str = "acqu";

/// Calibration and processing parameters
pub const PROC_PATH: &str = "pdata/1/proc";

/// Raw spectrum
pub const FID_PATH: &str = "fid";

/// Spectrum type marker
pub const SPTYPE_PATH: &str = "sptype";

/// Expected `TITLE` of both parameter files (compared case-insensitively)
const XMASS_TITLE: &str = "xmass parameter file";

/// Contents of one file of a sample
#[derive(Clone)]
pub enum FileSource {
    /// Bytes already in memory
    Materialized(Vec<u8>),
    /// Entry of the archive the sample was found in, not read yet
    Entry {
        archive: Arc<ArchiveHandle>,
        index: usize,
    },
}

impl From<Vec<u8>> for FileSource {
    fn from(data: Vec<u8>) -> Self {
        FileSource::Materialized(data)
    }
}

impl From<&[u8]> for FileSource {
    fn from(data: &[u8]) -> Self {
        FileSource::Materialized(data.to_vec())
    }
}

/// One sample: the files under a directory holding an `acqu` file.
///
/// Accessors parse lazily and cache what they read, so they take
/// `&mut self`. Call [`validate`](Sample::validate) before trusting any of
/// them.
pub struct Sample {
    root_path: String,
    files: HashMap<String, FileSource>,
    metadata: HashMap<String, Metadata>,
    config: SampleConfig,
}

impl Sample {
    /// Create an empty sample anchored at `root_path` (relative to the
    /// archive it comes from; empty for the archive root).
    pub fn new(root_path: impl Into<String>) -> Self {
        Self {
            root_path: root_path.into(),
            files: HashMap::new(),
            metadata: HashMap::new(),
            config: SampleConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SampleConfig) -> Self {
        self.config = config;
        self
    }

    pub fn root_path(&self) -> &str {
        &self.root_path
    }

    pub fn config(&self) -> &SampleConfig {
        &self.config
    }

    /// Attach a file, replacing any file already at that path.
    pub fn add_file(&mut self, path: impl Into<String>, source: impl Into<FileSource>) -> &mut Self {
        let path = path.into();
        self.metadata.remove(&path);
        self.files.insert(path, source.into());
        self
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Attached paths in sorted order
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<_> = self.files.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }

    /// Get the contents of a file, reading it from the archive on first use.
    ///
    /// At most `max_file_size + 1` bytes are pulled from the archive; getting
    /// the extra byte means the file is over the limit.
    pub async fn file_contents(&mut self, path: &str) -> Result<&[u8]> {
        let limit = self.config.max_file_size;

        let pending = match self.files.get(path) {
            None => return Err(Error::MissingFile(path.to_string())),
            Some(FileSource::Materialized(_)) => None,
            Some(FileSource::Entry { archive, index }) => Some((Arc::clone(archive), *index)),
        };

        if let Some((archive, index)) = pending {
            trace!(root = %self.root_path, path, "reading file from archive");
            let data = archive
                .read_entry(index, limit + 1)
                .await
                .map_err(|e| match e {
                    Error::ArchiveClosed => e,
                    e => Error::Read {
                        path: path.to_string(),
                        reason: e.to_string(),
                    },
                })?;
            if data.len() > limit {
                return Err(Error::TooLarge {
                    path: path.to_string(),
                    limit,
                });
            }
            self.files
                .insert(path.to_string(), FileSource::Materialized(data));
        }

        match self.files.get(path) {
            Some(FileSource::Materialized(data)) if data.len() > limit => Err(Error::TooLarge {
                path: path.to_string(),
                limit,
            }),
            Some(FileSource::Materialized(data)) => Ok(data.as_slice()),
            _ => Err(Error::MissingFile(path.to_string())),
        }
    }

    /// Get a raw field of a parameter file.
    pub async fn metadata_field(&mut self, path: &str, field: &str) -> Result<String> {
        if !self.metadata.contains_key(path) {
            let metadata = Metadata::parse(self.file_contents(path).await?);
            if metadata.is_empty() {
                return Err(Error::MetadataParse {
                    path: path.to_string(),
                    reason: "no ##key=value blocks found".to_string(),
                });
            }
            self.metadata.insert(path.to_string(), metadata);
        }

        self.metadata
            .get(path)
            .and_then(|metadata| metadata.get(field))
            .map(str::to_string)
            .ok_or_else(|| Error::MetadataFieldMissing {
                path: path.to_string(),
                field: field.to_string(),
            })
    }

    /// Read a field and run it through a format check.
    async fn checked_field<T>(
        &mut self,
        path: &str,
        field: &str,
        check: impl FnOnce(&str) -> std::result::Result<T, &'static str>,
    ) -> Result<T> {
        let value = self.metadata_field(path, field).await?;
        check(&value).map_err(|reason| Error::invalid_field(path, field, reason))
    }

    async fn checked_date(&mut self, path: &str, field: &str) -> Result<DateTime<FixedOffset>> {
        let earliest = self.config.earliest_date;
        let latest = self.config.latest_date();
        self.checked_field(path, field, |value| fields::date(value, earliest, latest))
            .await
    }

    /// Sample ID as 32 lowercase hex digits (`$ID_raw`)
    pub async fn sample_id(&mut self) -> Result<String> {
        self.checked_field(ACQU_PATH, "$ID_raw", fields::sample_id).await
    }

    /// Target plate ID as 32 lowercase hex digits (`$TgIDS`)
    pub async fn target_id(&mut self) -> Result<String> {
        self.checked_field(ACQU_PATH, "$TgIDS", fields::target_id).await
    }

    /// `$AQ_DATE`
    pub async fn acquisition_date(&mut self) -> Result<DateTime<FixedOffset>> {
        self.checked_date(ACQU_PATH, "$AQ_DATE").await
    }

    /// `$InstrID`
    pub async fn instrument_serial_number(&mut self) -> Result<String> {
        self.checked_field(ACQU_PATH, "$InstrID", fields::instrument_serial_number)
            .await
    }

    /// `$InstTyp`
    pub async fn instrument_type(&mut self) -> Result<u8> {
        self.checked_field(ACQU_PATH, "$InstTyp", fields::instrument_type)
            .await
    }

    /// `$DIGTYP`
    pub async fn digitizer_type(&mut self) -> Result<u8> {
        self.checked_field(ACQU_PATH, "$DIGTYP", fields::digitizer_type)
            .await
    }

    /// Well on the target plate (`$PATCHNO`)
    pub async fn position(&mut self) -> Result<String> {
        self.checked_field(ACQU_PATH, "$PATCHNO", fields::position).await
    }

    /// Where the sample was saved on the acquisition computer (`$PATH`)
    pub async fn original_path(&mut self) -> Result<String> {
        self.checked_field(ACQU_PATH, "$PATH", fields::original_path).await
    }

    /// flexControl version (`$FCVer`)
    pub async fn flex_control_version(&mut self) -> Result<String> {
        self.checked_field(ACQU_PATH, "$FCVer", fields::flex_control_version)
            .await
    }

    /// AIDA version (`$Acquver` of the calibration file)
    pub async fn aida_version(&mut self) -> Result<String> {
        self.checked_field(PROC_PATH, "$Acquver", fields::aida_version)
            .await
    }

    /// `$CLDATE` of the calibration file
    pub async fn calibration_date(&mut self) -> Result<DateTime<FixedOffset>> {
        self.checked_date(PROC_PATH, "$CLDATE").await
    }

    /// Number of data points in the raw spectrum
    pub async fn spectrum_size(&mut self) -> Result<u64> {
        let bytes = self.file_contents(FID_PATH).await?.len() as u64;
        match fields::spectrum_size(bytes) {
            Some(size) => Ok(size),
            None if bytes == 0 => Err(Error::EmptySpectrum),
            None => Err(Error::InvalidSpectrumSize(bytes)),
        }
    }

    async fn check_title(&mut self, path: &str, kind: &'static str) -> Result<()> {
        let title = self.metadata_field(path, "TITLE").await?;
        if title.to_lowercase() != XMASS_TITLE {
            return Err(Error::UnexpectedMetadataFormat {
                kind,
                path: path.to_string(),
                title,
            });
        }
        Ok(())
    }

    /// Validate the sample. The first failing check is returned.
    pub async fn validate(&mut self) -> Result<()> {
        if self.files.len() > self.config.max_files {
            return Err(Error::TooManyFiles {
                count: self.files.len(),
                limit: self.config.max_files,
            });
        }

        // Surface size and read errors before any content check
        let paths: Vec<String> = self.paths().into_iter().map(str::to_string).collect();
        for path in &paths {
            self.file_contents(path).await?;
        }

        let sptype = String::from_utf8_lossy(self.file_contents(SPTYPE_PATH).await?)
            .trim()
            .to_string();
        if sptype != "tof" {
            return Err(Error::UnsupportedSpectrumType(sptype));
        }

        self.spectrum_size().await?;

        self.check_title(ACQU_PATH, "Acquisition").await?;
        self.sample_id().await?;
        self.target_id().await?;
        self.acquisition_date().await?;
        self.instrument_serial_number().await?;
        self.instrument_type().await?;
        self.digitizer_type().await?;
        self.position().await?;
        self.original_path().await?;
        self.flex_control_version().await?;

        self.check_title(PROC_PATH, "Calibration").await?;
        self.aida_version().await?;
        self.calibration_date().await?;

        debug!(root = %self.root_path, "sample is valid");
        Ok(())
    }

    /// SHA-256 over the contents of every file, taken in sorted path order
    /// and concatenated without separators.
    pub async fn digest(&mut self) -> Result<[u8; 32]> {
        let paths: Vec<String> = self.paths().into_iter().map(str::to_string).collect();
        let mut hasher = Sha256::new();
        for path in &paths {
            hasher.update(self.file_contents(path).await?);
        }
        Ok(hasher.finalize().into())
    }

    /// Lowercase hex form of [`digest`](Sample::digest)
    pub async fn digest_hex(&mut self) -> Result<String> {
        Ok(hex::encode(self.digest().await?))
    }

    /// Gather every field the upload workflow persists. Validate first.
    pub async fn record(&mut self) -> Result<SampleRecord> {
        Ok(SampleRecord {
            root_path: self.root_path.clone(),
            digest: self.digest_hex().await?,
            sample_id: self.sample_id().await?,
            target_id: self.target_id().await?,
            acquisition_date: self.acquisition_date().await?,
            instrument_serial_number: self.instrument_serial_number().await?,
            instrument_type: self.instrument_type().await?,
            digitizer_type: self.digitizer_type().await?,
            position: self.position().await?,
            original_path: self.original_path().await?,
            flex_control_version: self.flex_control_version().await?,
            aida_version: self.aida_version().await?,
            calibration_date: self.calibration_date().await?,
            spectrum_size: self.spectrum_size().await?,
        })
    }

    /// Write the sample as a standalone ZIP archive.
    ///
    /// Every entry is stamped with the acquisition date, so equal samples
    /// export to identical bytes.
    pub async fn export(&mut self, destination: &Path) -> Result<()> {
        self.write_archive(destination)
            .await
            .map_err(|e| Error::Export {
                path: destination.to_path_buf(),
                source: Box::new(e),
            })
    }

    async fn write_archive(&mut self, destination: &Path) -> Result<()> {
        let modified = self.acquisition_date().await?.with_timezone(&Utc);

        let paths: Vec<String> = self.paths().into_iter().map(str::to_string).collect();
        let mut writer = ZipWriter::new();
        for path in &paths {
            let contents = self.file_contents(path).await?;
            writer.add_file(path, contents, &modified)?;
        }
        let bytes = writer.finish()?;

        if let Some(parent) = destination.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let mut file = fs::File::create(destination).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;

        debug!(
            root = %self.root_path,
            destination = %destination.display(),
            files = paths.len(),
            "exported sample"
        );
        Ok(())
    }
}

impl std::fmt::Debug for Sample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sample")
            .field("root_path", &self.root_path)
            .field("files", &self.paths())
            .finish()
    }
}
