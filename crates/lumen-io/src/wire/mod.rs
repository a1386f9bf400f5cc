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

//! The wire format exchanged with the worker pool.
//!
//! Every record is a fixed-size [`RecordHeader`] followed by a bincode payload.
//! The header is parsed by hand so a reader can reject foreign or truncated
//! data before decoding anything.

mod header;
mod records;

pub use self::header::{RecordHeader, RecordKind, RECORD_MAGIC, WIRE_FORMAT_VERSION};
pub use self::records::{
    JobRecord, LightRecord, MappingRecord, MeshRecord, MeshRecordSource, SceneSettingsRecord,
};

use lumen_core::lighting::MappingResult;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Errors raised while encoding or decoding wire records.
#[derive(Debug, Error)]
pub enum WireError {
    /// The payload could not be encoded.
    #[error("encode failed: {0}")]
    Encode(#[from] bincode::error::EncodeError),
    /// The payload could not be decoded.
    #[error("decode failed: {0}")]
    Decode(#[from] bincode::error::DecodeError),
    /// Fewer bytes than the header or its payload length require.
    #[error("truncated record: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Bytes required.
        expected: usize,
        /// Bytes available.
        actual: usize,
    },
    /// The magic bytes do not match.
    #[error("invalid magic bytes; not a lighting job record")]
    BadMagic,
    /// The header was written by an incompatible format version.
    #[error("unsupported wire format version {0}")]
    UnsupportedVersion(u8),
    /// Unknown record kind byte.
    #[error("unknown record kind {0}")]
    UnknownKind(u8),
    /// The header kind does not describe the payload.
    #[error("record kind mismatch: header says {header:?}, payload is {payload:?}")]
    KindMismatch {
        /// Kind in the header.
        header: RecordKind,
        /// Kind of the decoded payload.
        payload: RecordKind,
    },
    /// Bytes left after the payload.
    #[error("{0} trailing bytes after payload")]
    TrailingBytes(usize),
}

fn encode_framed<T: Serialize>(kind: RecordKind, value: &T) -> Result<Vec<u8>, WireError> {
    let payload = bincode::serde::encode_to_vec(value, bincode::config::standard())?;
    let header = RecordHeader::new(kind, payload.len() as u64);
    let mut bytes = Vec::with_capacity(RecordHeader::SIZE + payload.len());
    bytes.extend_from_slice(&header.to_bytes());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

fn decode_framed<T: DeserializeOwned>(
    bytes: &[u8],
    expected_kind: Option<RecordKind>,
) -> Result<(RecordKind, T), WireError> {
    let header = RecordHeader::from_bytes(bytes)?;
    if let Some(expected) = expected_kind {
        if header.kind != expected {
            return Err(WireError::KindMismatch {
                header: header.kind,
                payload: expected,
            });
        }
    }
    let end = usize::try_from(header.payload_length)
        .ok()
        .and_then(|length| RecordHeader::SIZE.checked_add(length))
        .ok_or(WireError::Truncated {
            expected: usize::MAX,
            actual: bytes.len(),
        })?;
    if bytes.len() < end {
        return Err(WireError::Truncated {
            expected: end,
            actual: bytes.len(),
        });
    }
    if bytes.len() > end {
        return Err(WireError::TrailingBytes(bytes.len() - end));
    }
    let (value, read) = bincode::serde::decode_from_slice(
        &bytes[RecordHeader::SIZE..end],
        bincode::config::standard(),
    )?;
    if read != end - RecordHeader::SIZE {
        return Err(WireError::TrailingBytes(end - RecordHeader::SIZE - read));
    }
    Ok((header.kind, value))
}

/// Encodes one job input record.
pub fn encode_record(record: &JobRecord) -> Result<Vec<u8>, WireError> {
    encode_framed(record.kind(), record)
}

/// Decodes one job input record, checking the header against the payload.
pub fn decode_record(bytes: &[u8]) -> Result<JobRecord, WireError> {
    let (kind, record): (_, JobRecord) = decode_framed(bytes, None)?;
    if record.kind() != kind {
        return Err(WireError::KindMismatch {
            header: kind,
            payload: record.kind(),
        });
    }
    Ok(record)
}

/// Encodes a mapping result.
pub fn encode_result(result: &MappingResult) -> Result<Vec<u8>, WireError> {
    encode_framed(RecordKind::MappingResult, result)
}

/// Decodes a mapping result.
pub fn decode_result(bytes: &[u8]) -> Result<MappingResult, WireError> {
    let (_, result) = decode_framed(bytes, Some(RecordKind::MappingResult))?;
    Ok(result)
}
