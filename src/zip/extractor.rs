use flate2::{Decompress, FlushDecompress, Status};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::io::ReadAt;

use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};

/// Compressed bytes fetched from the source per inflate round
const CHUNK_SIZE: usize = 32 * 1024;

/// ZIP file extractor
pub struct ZipExtractor<R: ReadAt + ?Sized> {
    parser: ZipParser<R>,
}

impl<R: ReadAt + ?Sized> ZipExtractor<R> {
    pub fn new(reader: Arc<R>) -> Self {
        Self {
            parser: ZipParser::new(reader),
        }
    }

    /// List all entries in the archive
    pub async fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        self.parser.list_files().await
    }

    /// Extract at most `limit` bytes of an entry's contents.
    ///
    /// Entries read through to the end have their CRC-32 checked. A result
    /// of exactly `limit` bytes may be truncated.
    pub async fn read_bounded(&self, entry: &ZipFileEntry, limit: usize) -> Result<Vec<u8>> {
        if entry.is_directory {
            return Err(Error::invalid(format!("\"{}\" is a directory", entry.file_name)));
        }
        if entry.is_encrypted() {
            return Err(Error::invalid(format!(
                "\"{}\" is encrypted, which is not supported",
                entry.file_name
            )));
        }

        let data_offset = self.parser.get_data_offset(entry).await?;

        let (data, complete) = match entry.compression_method {
            CompressionMethod::Stored => {
                let len = entry.compressed_size.min(limit as u64) as usize;
                let mut buf = vec![0u8; len];
                self.parser
                    .reader()
                    .read_exact_at(data_offset, &mut buf)
                    .await?;
                (buf, entry.compressed_size <= limit as u64)
            }
            CompressionMethod::Deflate => self.inflate_bounded(entry, data_offset, limit).await?,
            CompressionMethod::Unknown(method) => {
                return Err(Error::invalid(format!(
                    "unsupported compression method {method} for \"{}\"",
                    entry.file_name
                )));
            }
        };

        if complete && crc32fast::hash(&data) != entry.crc32 {
            return Err(Error::invalid(format!(
                "CRC-32 mismatch for \"{}\"",
                entry.file_name
            )));
        }

        Ok(data)
    }

    /// Inflate a DEFLATE entry chunk by chunk, stopping once `limit` bytes
    /// of output exist. Returns the output and whether the stream ended.
    async fn inflate_bounded(
        &self,
        entry: &ZipFileEntry,
        data_offset: u64,
        limit: usize,
    ) -> Result<(Vec<u8>, bool)> {
        let mut inflater = Decompress::new(false);
        let mut output = Vec::with_capacity(limit.min(entry.uncompressed_size as usize));
        let mut input = vec![0u8; CHUNK_SIZE];
        let mut out_buf = vec![0u8; CHUNK_SIZE];
        let mut fetched = 0u64;
        let mut pending = 0..0;

        loop {
            if pending.is_empty() && fetched < entry.compressed_size {
                let n = (entry.compressed_size - fetched).min(CHUNK_SIZE as u64) as usize;
                self.parser
                    .reader()
                    .read_exact_at(data_offset + fetched, &mut input[..n])
                    .await?;
                fetched += n as u64;
                pending = 0..n;
            }

            // Inflate incrementally, the stream end is reported as StreamEnd
            let in_before = inflater.total_in();
            let out_before = inflater.total_out();
            let status = inflater
                .decompress(&input[pending.clone()], &mut out_buf, FlushDecompress::None)
                .map_err(|e| {
                    Error::invalid(format!("corrupt DEFLATE data in \"{}\": {e}", entry.file_name))
                })?;
            let used = (inflater.total_in() - in_before) as usize;
            let produced = (inflater.total_out() - out_before) as usize;
            pending.start += used;

            let room = limit - output.len();
            output.extend_from_slice(&out_buf[..produced.min(room)]);

            if status == Status::StreamEnd {
                return Ok((output, produced <= room));
            }
            if produced >= room {
                return Ok((output, false));
            }
            if used == 0 && produced == 0 {
                return Err(Error::invalid(format!(
                    "truncated DEFLATE data in \"{}\"",
                    entry.file_name
                )));
            }
        }
    }
}
