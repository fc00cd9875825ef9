//! In-memory ZIP archive builder.
//!
//! Produces plain (non-ZIP64) archives that any standard unzip tool can
//! open. Every entry carries a caller-provided modification time, stored
//! both as DOS date/time and as an extended timestamp extra field, so the
//! output depends only on the names, bytes and timestamp given to it.

use byteorder::{LittleEndian, WriteBytesExt};
use chrono::{DateTime, Utc};
use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::io::Write;

use crate::error::{Error, Result};

use super::structures::*;

/// Version 2.0: DEFLATE
const VERSION_NEEDED: u16 = 20;

/// Made by a Unix host, APPNOTE version 2.0
const VERSION_MADE_BY: u16 = (3 << 8) | 20;

/// Regular file, rw-r--r--
const EXTERNAL_ATTRS: u32 = 0o100644 << 16;

/// ZIP archive writer
pub struct ZipWriter {
    data: Vec<u8>,
    central_directory: Vec<u8>,
    entries: u16,
}

impl ZipWriter {
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            central_directory: Vec::new(),
            entries: 0,
        }
    }

    /// Append a file. DEFLATE is used when it makes the entry smaller.
    pub fn add_file(&mut self, name: &str, contents: &[u8], modified: &DateTime<Utc>) -> Result<()> {
        if self.entries == u16::MAX {
            return Err(Error::invalid("too many entries for a non-ZIP64 archive"));
        }

        let deflated = {
            let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(contents)?;
            encoder.finish()?
        };
        let (method, payload) = if deflated.len() < contents.len() {
            (CompressionMethod::Deflate, deflated.as_slice())
        } else {
            (CompressionMethod::Stored, contents)
        };

        let lfh_offset = self.data.len() as u64;
        if lfh_offset + payload.len() as u64 >= u32::MAX as u64 {
            return Err(Error::invalid("archive too large for a non-ZIP64 archive"));
        }

        let crc = crc32fast::hash(contents);
        let (dos_time, dos_date) = to_dos_datetime(&modified.naive_utc());
        let extra = extended_timestamp(modified);
        let name = name.as_bytes();
        let name_len = u16::try_from(name.len())
            .map_err(|_| Error::invalid("file name too long"))?;

        // Local File Header
        let w = &mut self.data;
        w.write_all(LFH_SIGNATURE)?;
        w.write_u16::<LittleEndian>(VERSION_NEEDED)?;
        w.write_u16::<LittleEndian>(FLAG_UTF8)?;
        w.write_u16::<LittleEndian>(method.as_u16())?;
        w.write_u16::<LittleEndian>(dos_time)?;
        w.write_u16::<LittleEndian>(dos_date)?;
        w.write_u32::<LittleEndian>(crc)?;
        w.write_u32::<LittleEndian>(payload.len() as u32)?;
        w.write_u32::<LittleEndian>(contents.len() as u32)?;
        w.write_u16::<LittleEndian>(name_len)?;
        w.write_u16::<LittleEndian>(extra.len() as u16)?;
        w.write_all(name)?;
        w.write_all(&extra)?;
        w.write_all(payload)?;

        // Central Directory File Header
        let c = &mut self.central_directory;
        c.write_all(CDFH_SIGNATURE)?;
        c.write_u16::<LittleEndian>(VERSION_MADE_BY)?;
        c.write_u16::<LittleEndian>(VERSION_NEEDED)?;
        c.write_u16::<LittleEndian>(FLAG_UTF8)?;
        c.write_u16::<LittleEndian>(method.as_u16())?;
        c.write_u16::<LittleEndian>(dos_time)?;
        c.write_u16::<LittleEndian>(dos_date)?;
        c.write_u32::<LittleEndian>(crc)?;
        c.write_u32::<LittleEndian>(payload.len() as u32)?;
        c.write_u32::<LittleEndian>(contents.len() as u32)?;
        c.write_u16::<LittleEndian>(name_len)?;
        c.write_u16::<LittleEndian>(extra.len() as u16)?;
        c.write_u16::<LittleEndian>(0)?; // comment
        c.write_u16::<LittleEndian>(0)?; // disk number start
        c.write_u16::<LittleEndian>(0)?; // internal attributes
        c.write_u32::<LittleEndian>(EXTERNAL_ATTRS)?;
        c.write_u32::<LittleEndian>(lfh_offset as u32)?;
        c.write_all(name)?;
        c.write_all(&extra)?;

        self.entries += 1;
        Ok(())
    }

    /// Append the central directory and return the finished archive bytes.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        let cd_offset = self.data.len() as u64;
        let cd_size = self.central_directory.len() as u64;
        if cd_offset + cd_size >= u32::MAX as u64 {
            return Err(Error::invalid("archive too large for a non-ZIP64 archive"));
        }

        self.data.extend_from_slice(&self.central_directory);

        let w = &mut self.data;
        w.write_all(EndOfCentralDirectory::SIGNATURE)?;
        w.write_u16::<LittleEndian>(0)?; // disk number
        w.write_u16::<LittleEndian>(0)?; // disk with central directory
        w.write_u16::<LittleEndian>(self.entries)?;
        w.write_u16::<LittleEndian>(self.entries)?;
        w.write_u32::<LittleEndian>(cd_size as u32)?;
        w.write_u32::<LittleEndian>(cd_offset as u32)?;
        w.write_u16::<LittleEndian>(0)?; // comment

        Ok(self.data)
    }
}

impl Default for ZipWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// "UT" extra field holding the modification time as Unix seconds
fn extended_timestamp(modified: &DateTime<Utc>) -> Vec<u8> {
    let mtime = modified.timestamp().clamp(0, u32::MAX as i64) as u32;
    let mut extra = Vec::with_capacity(9);
    extra.extend_from_slice(&EXTENDED_TIMESTAMP_ID.to_le_bytes());
    extra.extend_from_slice(&5u16.to_le_bytes());
    extra.push(0x01); // mtime present
    extra.extend_from_slice(&mtime.to_le_bytes());
    extra
}
