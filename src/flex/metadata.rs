//! Parser for XMASS parameter files (`acqu`, `pdata/1/proc`).
//!
//! These are JCAMP-DX style text files made of `##key= value` blocks:
//!
//! ```text
//! ##TITLE= xmass parameter file
//! ##JCAMPDX= 5.0
//! ##$InstrID= <8604832.05252>
//! ```

use std::collections::HashMap;

/// Parsed key/value pairs of one parameter file
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    fields: HashMap<String, String>,
}

impl Metadata {
    /// Parse raw file contents.
    ///
    /// Blocks without `=` are ignored. Values are trimmed and a single
    /// pair of surrounding angle brackets is removed. Keys are kept as-is,
    /// and a repeated key keeps its last value.
    pub fn parse(data: &[u8]) -> Self {
        let text = String::from_utf8_lossy(data).replace("\r\n", "\n");

        let fields = text
            .split("##")
            .filter_map(|block| block.split_once('='))
            .map(|(key, value)| {
                let value = value.trim();
                let value = value
                    .strip_prefix('<')
                    .and_then(|v| v.strip_suffix('>'))
                    .unwrap_or(value);
                (key.to_string(), value.to_string())
            })
            .collect();

        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
