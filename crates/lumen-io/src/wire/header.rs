// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::WireError;

/// Magic bytes opening every record ("LMREC").
pub const RECORD_MAGIC: [u8; 5] = *b"LMREC";

/// Current version of the record layout.
pub const WIRE_FORMAT_VERSION: u8 = 1;

/// What a record's payload holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RecordKind {
    /// Scene-wide settings.
    SceneSettings = 1,
    /// An importance volume.
    ImportanceVolume = 2,
    /// A character indirect detail volume.
    CharacterIndirectDetailVolume = 3,
    /// A mesh.
    Mesh = 4,
    /// A mapping.
    Mapping = 5,
    /// A light.
    Light = 6,
    /// Results of one mapping.
    MappingResult = 7,
}

impl RecordKind {
    fn from_byte(byte: u8) -> Result<Self, WireError> {
        Ok(match byte {
            1 => RecordKind::SceneSettings,
            2 => RecordKind::ImportanceVolume,
            3 => RecordKind::CharacterIndirectDetailVolume,
            4 => RecordKind::Mesh,
            5 => RecordKind::Mapping,
            6 => RecordKind::Light,
            7 => RecordKind::MappingResult,
            other => return Err(WireError::UnknownKind(other)),
        })
    }
}

/// The fixed-size header in front of every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    /// Layout version.
    pub format_version: u8,
    /// Payload kind.
    pub kind: RecordKind,
    /// Length of the payload that follows, in bytes.
    pub payload_length: u64,
}

// Fixed layout: magic, version, kind, little-endian payload length.
impl RecordHeader {
    /// Total size of the header in bytes.
    pub const SIZE: usize = RECORD_MAGIC.len() + 1 + 1 + 8;

    /// Creates a header for the current format version.
    pub fn new(kind: RecordKind, payload_length: u64) -> Self {
        Self {
            format_version: WIRE_FORMAT_VERSION,
            kind,
            payload_length,
        }
    }

    /// Serializes the header.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[..5].copy_from_slice(&RECORD_MAGIC);
        bytes[5] = self.format_version;
        bytes[6] = self.kind as u8;
        bytes[7..].copy_from_slice(&self.payload_length.to_le_bytes());
        bytes
    }

    /// Parses a header from the beginning of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        if bytes.len() < Self::SIZE {
            return Err(WireError::Truncated {
                expected: Self::SIZE,
                actual: bytes.len(),
            });
        }
        if bytes[..5] != RECORD_MAGIC {
            return Err(WireError::BadMagic);
        }
        let format_version = bytes[5];
        if format_version != WIRE_FORMAT_VERSION {
            return Err(WireError::UnsupportedVersion(format_version));
        }
        let kind = RecordKind::from_byte(bytes[6])?;
        let mut length = [0u8; 8];
        length.copy_from_slice(&bytes[7..Self::SIZE]);

        Ok(Self {
            format_version,
            kind,
            payload_length: u64::from_le_bytes(length),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let header = RecordHeader::new(RecordKind::Mesh, 0x0102);
        let bytes = header.to_bytes();
        assert_eq!(bytes.len(), 15);
        assert_eq!(&bytes[..5], b"LMREC");
        assert_eq!(bytes[6], 4);
        assert_eq!(bytes[7], 0x02);
        assert_eq!(RecordHeader::from_bytes(&bytes).expect("parses"), header);
    }

    #[test]
    fn test_header_rejects_bad_input() {
        assert!(matches!(
            RecordHeader::from_bytes(b"LMR"),
            Err(WireError::Truncated { .. })
        ));

        let mut bytes = RecordHeader::new(RecordKind::Light, 0).to_bytes();
        bytes[0] = b'X';
        assert!(matches!(RecordHeader::from_bytes(&bytes), Err(WireError::BadMagic)));

        let mut bytes = RecordHeader::new(RecordKind::Light, 0).to_bytes();
        bytes[5] = 9;
        assert!(matches!(
            RecordHeader::from_bytes(&bytes),
            Err(WireError::UnsupportedVersion(9))
        ));

        let mut bytes = RecordHeader::new(RecordKind::Light, 0).to_bytes();
        bytes[6] = 42;
        assert!(matches!(
            RecordHeader::from_bytes(&bytes),
            Err(WireError::UnknownKind(42))
        ));
    }
}
