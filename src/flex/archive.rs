//! Discovery of samples inside a flexControl export archive.
//!
//! Samples are not delimited in the archive. Every directory holding an
//! `acqu` file is taken as the root of one sample, and every file below
//! that directory belongs to it.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

use crate::config::SampleConfig;
use crate::error::{Error, Result};
use crate::io::{LocalFileReader, ReadAt};
use crate::zip::{ZipExtractor, ZipFileEntry};

use super::sample::{ACQU_PATH, FileSource, Sample};
use super::tree::Node;

/// Open archive shared by the reader and the samples it produced.
///
/// The extractor, and with it the underlying file, is dropped on close. A
/// read already in flight keeps its own reference until it completes.
pub struct ArchiveHandle {
    extractor: Mutex<Option<Arc<ZipExtractor<dyn ReadAt>>>>,
    entries: Vec<ZipFileEntry>,
}

impl ArchiveHandle {
    fn extractor(&self) -> MutexGuard<'_, Option<Arc<ZipExtractor<dyn ReadAt>>>> {
        self.extractor.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Read up to `limit` bytes of the entry at `index`.
    pub(crate) async fn read_entry(&self, index: usize, limit: usize) -> Result<Vec<u8>> {
        let extractor = self.extractor().clone().ok_or(Error::ArchiveClosed)?;
        let entry = self
            .entries
            .get(index)
            .ok_or_else(|| Error::invalid(format!("no entry at index {index}")))?;
        extractor.read_bounded(entry, limit).await
    }

    /// Drop the extractor. Returns false if it was already gone.
    fn close(&self) -> bool {
        self.extractor().take().is_some()
    }

    fn is_closed(&self) -> bool {
        self.extractor().is_none()
    }
}

/// Reader over a ZIP archive holding one or several samples.
///
/// Samples keep pulling file contents from the archive until they are
/// read through. Closing the reader (or dropping it) makes any such read
/// fail with [`Error::ArchiveClosed`].
pub struct ArchiveReader {
    name: String,
    handle: Arc<ArchiveHandle>,
    tree: Node,
    entrypoints: Vec<String>,
    config: SampleConfig,
}

impl ArchiveReader {
    /// Open an archive on disk.
    ///
    /// The central directory is read here, so a missing file or a file that
    /// is not a ZIP archive fails immediately with [`Error::ArchiveOpen`].
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path.display().to_string();
        let reader = LocalFileReader::new(path).map_err(|e| open_error(&name, e))?;
        Self::from_reader(name, Arc::new(reader)).await
    }

    /// Open an archive from any random-access source. `name` is only used
    /// in messages.
    pub async fn from_reader(name: impl Into<String>, reader: Arc<dyn ReadAt>) -> Result<Self> {
        let name = name.into();
        let extractor = ZipExtractor::new(reader);
        let entries = extractor
            .list_files()
            .await
            .map_err(|e| open_error(&name, e))?;

        let mut tree = Node::new_root();
        let mut entrypoints: Vec<String> = Vec::new();
        for (index, entry) in entries.iter().enumerate() {
            if entry.is_directory {
                continue;
            }
            tree.insert(&entry.file_name, index);

            if let Some(root) = marker_root(&entry.file_name) {
                if entrypoints.iter().any(|r| r == root) {
                    warn!(archive = %name, root, "duplicate sample root, ignoring");
                } else {
                    entrypoints.push(root.to_string());
                }
            }
        }

        debug!(
            archive = %name,
            entries = entries.len(),
            samples = entrypoints.len(),
            "opened archive"
        );

        Ok(Self {
            name,
            handle: Arc::new(ArchiveHandle {
                extractor: Mutex::new(Some(Arc::new(extractor))),
                entries,
            }),
            tree,
            entrypoints,
            config: SampleConfig::default(),
        })
    }

    /// Limits and clock handed to every sample this reader produces.
    pub fn with_config(mut self, config: SampleConfig) -> Self {
        self.config = config;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// File entries as (path, index), directories excluded
    pub fn entries(&self) -> impl Iterator<Item = (&str, usize)> {
        self.handle
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| !entry.is_directory)
            .map(|(index, entry)| (entry.file_name.as_str(), index))
    }

    /// Sample root paths, in the order their `acqu` files appear
    pub fn root_paths(&self) -> &[String] {
        &self.entrypoints
    }

    /// Iterate over the samples of the archive. Files are attached but not
    /// read.
    pub fn samples(&self) -> Samples<'_> {
        Samples {
            reader: self,
            roots: self.entrypoints.iter(),
        }
    }

    /// Release the archive and its file handle, even while samples
    /// produced by this reader are alive. Their pending reads fail from now
    /// on.
    pub fn close(&self) {
        if self.handle.close() {
            debug!(archive = %self.name, "closed archive");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.handle.is_closed()
    }

    fn build_sample(&self, root: &str, node: &Node) -> Sample {
        let mut sample = Sample::new(root).with_config(self.config.clone());
        for (path, index) in node.files() {
            sample.add_file(
                path,
                FileSource::Entry {
                    archive: Arc::clone(&self.handle),
                    index,
                },
            );
        }
        sample
    }
}

impl Drop for ArchiveReader {
    fn drop(&mut self) {
        self.close();
    }
}

/// Lazy sequence of the samples of an [`ArchiveReader`]
pub struct Samples<'a> {
    reader: &'a ArchiveReader,
    roots: std::slice::Iter<'a, String>,
}

impl Iterator for Samples<'_> {
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        for root in self.roots.by_ref() {
            match self.reader.tree.get(root) {
                Some(node) if matches!(node, Node::Directory(_)) => {
                    let sample = self.reader.build_sample(root, node);
                    debug!(root = %root, files = sample.file_count(), "found sample");
                    return Some(sample);
                }
                _ => warn!(root = %root, "sample root is not a directory, skipping"),
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.roots.len()))
    }
}

/// Root path of the sample whose marker file is at `path`, if it is one
fn marker_root(path: &str) -> Option<&str> {
    if path == ACQU_PATH {
        return Some("");
    }
    path.strip_suffix(ACQU_PATH)
        .and_then(|prefix| prefix.strip_suffix('/'))
}

fn open_error(name: &str, err: Error) -> Error {
    let reason = match err {
        Error::Io(e) => e.to_string(),
        Error::InvalidArchive(reason) => reason,
        other => other.to_string(),
    };
    Error::ArchiveOpen {
        name: name.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryReader;
    use crate::zip::ZipWriter;
    use chrono::{TimeZone, Utc};

    async fn reader_for(paths: &[&str]) -> ArchiveReader {
        let mtime = Utc.with_ymd_and_hms(2023, 2, 22, 11, 47, 40).unwrap();
        let mut writer = ZipWriter::new();
        for path in paths {
            writer.add_file(path, path.as_bytes(), &mtime).unwrap();
        }
        ArchiveReader::from_reader("test.zip", Arc::new(MemoryReader::new(writer.finish().unwrap())))
            .await
            .unwrap()
    }

    #[test]
    fn test_marker_root() {
        assert_eq!(marker_root("acqu"), Some(""));
        assert_eq!(marker_root("a/b/acqu"), Some("a/b"));
        assert_eq!(marker_root("a/b/acqus"), None);
        assert_eq!(marker_root("a/bacqu"), None);
        assert_eq!(marker_root("a/b/acqu/fid"), None);
    }

    #[tokio::test]
    async fn test_groups_files_by_marker_directory() {
        let reader = reader_for(&[
            "run/0_E1/1/1SLin/acqu",
            "run/0_E1/1/1SLin/fid",
            "run/0_E1/1/1SLin/pdata/1/proc",
            "run/0_E2/1/1SLin/acqu",
            "run/0_E2/1/1SLin/sptype",
            "run/readme.txt",
        ])
        .await;

        assert_eq!(reader.entries().count(), 6);
        let samples: Vec<_> = reader.samples().collect();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].root_path(), "run/0_E1/1/1SLin");
        assert_eq!(samples[0].paths(), ["acqu", "fid", "pdata/1/proc"]);
        assert_eq!(samples[1].root_path(), "run/0_E2/1/1SLin");
        assert_eq!(samples[1].paths(), ["acqu", "sptype"]);
    }

    #[tokio::test]
    async fn test_files_are_read_lazily() {
        let reader = reader_for(&["s/acqu", "s/fid"]).await;
        let mut sample = reader.samples().next().unwrap();
        assert_eq!(sample.file_contents("fid").await.unwrap(), b"s/fid");
    }

    #[tokio::test]
    async fn test_reads_fail_after_close() {
        let reader = reader_for(&["s/acqu", "s/fid"]).await;
        let mut sample = reader.samples().next().unwrap();
        sample.file_contents("acqu").await.unwrap();

        reader.close();
        assert!(reader.is_closed());

        // Already materialized files stay readable
        assert_eq!(sample.file_contents("acqu").await.unwrap(), b"s/acqu");
        assert!(matches!(
            sample.file_contents("fid").await,
            Err(Error::ArchiveClosed)
        ));
    }

    #[tokio::test]
    async fn test_close_releases_source() {
        let mut writer = ZipWriter::new();
        let mtime = Utc.with_ymd_and_hms(2023, 2, 22, 11, 47, 40).unwrap();
        writer.add_file("s/acqu", b"s/acqu", &mtime).unwrap();
        let source = Arc::new(MemoryReader::new(writer.finish().unwrap()));

        let reader = ArchiveReader::from_reader("test.zip", source.clone())
            .await
            .unwrap();
        let sample = reader.samples().next().unwrap();
        assert_eq!(Arc::strong_count(&source), 2);

        reader.close();
        assert_eq!(Arc::strong_count(&source), 1);
        assert_eq!(sample.file_count(), 1);
    }

    #[tokio::test]
    async fn test_reads_fail_after_drop() {
        let reader = reader_for(&["s/acqu"]).await;
        let mut sample = reader.samples().next().unwrap();
        drop(reader);
        assert!(matches!(
            sample.digest().await,
            Err(Error::ArchiveClosed)
        ));
    }

    #[tokio::test]
    async fn test_not_a_zip() {
        let reader = Arc::new(MemoryReader::new(b"definitely not a zip archive".to_vec()));
        assert!(matches!(
            ArchiveReader::from_reader("junk.bin", reader).await,
            Err(Error::ArchiveOpen { name, .. }) if name == "junk.bin"
        ));
    }
}
