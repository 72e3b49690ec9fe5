//! Text encodings for `read_text` / `write_text`.
//!
//! Decoding honours a byte-order mark when present; encoding never writes
//! one.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{StorageError, StorageResult};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];

/// Supported text encodings.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
pub enum TextEncoding {
    #[default]
    Utf8,
    Utf16Le,
    Utf16Be,
}

impl TextEncoding {
    /// Sniff a byte-order mark. Returns the encoding and the BOM length.
    pub fn detect(bytes: &[u8]) -> Option<(Self, usize)> {
        if bytes.starts_with(UTF8_BOM) {
            Some((Self::Utf8, UTF8_BOM.len()))
        } else if bytes.starts_with(UTF16_LE_BOM) {
            Some((Self::Utf16Le, UTF16_LE_BOM.len()))
        } else if bytes.starts_with(UTF16_BE_BOM) {
            Some((Self::Utf16Be, UTF16_BE_BOM.len()))
        } else {
            None
        }
    }

    fn bom(&self) -> &'static [u8] {
        match self {
            Self::Utf8 => UTF8_BOM,
            Self::Utf16Le => UTF16_LE_BOM,
            Self::Utf16Be => UTF16_BE_BOM,
        }
    }

    /// Encode `text` without a BOM.
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            Self::Utf8 => text.as_bytes().to_vec(),
            Self::Utf16Le => text.encode_utf16().flat_map(|u| u.to_le_bytes()).collect(),
            Self::Utf16Be => text.encode_utf16().flat_map(|u| u.to_be_bytes()).collect(),
        }
    }

    /// Decode `bytes`, skipping this encoding's BOM if present.
    pub fn decode(&self, bytes: &[u8]) -> StorageResult<String> {
        let bytes = bytes.strip_prefix(self.bom()).unwrap_or(bytes);
        match self {
            Self::Utf8 => String::from_utf8(bytes.to_vec())
                .map_err(|e| StorageError::invalid_data(format!("not valid UTF-8: {}", e))),
            Self::Utf16Le | Self::Utf16Be => {
                if bytes.len() % 2 != 0 {
                    return Err(StorageError::invalid_data(format!(
                        "odd byte count {} for {}",
                        bytes.len(),
                        self
                    )));
                }
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|pair| match self {
                        Self::Utf16Le => u16::from_le_bytes([pair[0], pair[1]]),
                        _ => u16::from_be_bytes([pair[0], pair[1]]),
                    })
                    .collect();
                String::from_utf16(&units)
                    .map_err(|e| StorageError::invalid_data(format!("not valid {}: {}", self, e)))
            }
        }
    }

    /// Decode with `encoding` if given, else by BOM, else as UTF-8.
    pub fn decode_with(encoding: Option<Self>, bytes: &[u8]) -> StorageResult<String> {
        let encoding = encoding
            .or_else(|| Self::detect(bytes).map(|(e, _)| e))
            .unwrap_or_default();
        encoding.decode(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageErrorKind;

    #[test]
    fn test_utf16_encodings() {
        assert_eq!(TextEncoding::Utf16Le.encode("hi"), vec![b'h', 0, b'i', 0]);
        assert_eq!(TextEncoding::Utf16Be.encode("hi"), vec![0, b'h', 0, b'i']);
        assert_eq!(TextEncoding::Utf16Be.decode(&[0, b'h', 0, b'i']).unwrap(), "hi");
    }

    #[test]
    fn test_bom_detection() {
        let mut bytes = vec![0xFF, 0xFE];
        bytes.extend(TextEncoding::Utf16Le.encode("häj"));
        assert_eq!(TextEncoding::decode_with(None, &bytes).unwrap(), "häj");

        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend(b"plain");
        assert_eq!(TextEncoding::decode_with(None, &bytes).unwrap(), "plain");
    }

    #[test]
    fn test_default_is_utf8() {
        assert_eq!(TextEncoding::decode_with(None, "ünï".as_bytes()).unwrap(), "ünï");
    }

    #[test]
    fn test_invalid_data() {
        let err = TextEncoding::Utf8.decode(&[0xC3, 0x28]).unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::InvalidData);

        let err = TextEncoding::Utf16Le.decode(&[0x00]).unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::InvalidData);
    }
}
