//! Directory Record structure
//!
//! Directory records describe files and subdirectories. Each record is
//! variable-length: a fixed 33-byte header, the file identifier, an
//! alignment pad byte when the identifier length is even, and an
//! optional system-use trailer (where SUSP data lives).

use super::flags::FileFlags;
use crate::error::{IsoError, Result};
use crate::types::{MAX_RECORD_LENGTH, RECORD_HEADER_LENGTH};
use crate::utils::datetime::RecordDateTime;
use crate::utils::endian::{both_u16, both_u32, read_both_u16, read_both_u32};
use crate::utils::strings::TextEncoding;
use alloc::string::String;
use alloc::vec::Vec;

/// Decoded form of a record's file identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordIdentifier {
    /// The `.` entry (a single 0x00 byte)
    Current,
    /// The `..` entry (a single 0x01 byte)
    Parent,
    /// A named directory
    Directory(String),
    /// A named file
    File(String),
}

/// Directory Record (ECMA-119 9.1), owned representation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryRecord {
    /// Extended attribute record length, in blocks
    pub extended_attr_length: u8,

    /// Extent location (LBA)
    pub extent_location: u32,

    /// Data length in bytes
    pub data_length: u32,

    /// Recording date and time
    pub recording_time: Option<RecordDateTime>,

    /// File flags
    pub flags: FileFlags,

    /// File unit size (interleaved files, unsupported on write)
    pub file_unit_size: u8,

    /// Interleave gap size
    pub interleave_gap: u8,

    /// Volume sequence number
    pub volume_sequence_number: u16,

    identifier: Vec<u8>,
    system_use: Vec<u8>,
}

impl DirectoryRecord {
    /// Minimum record length: header plus a one-byte identifier
    pub const MIN_LENGTH: usize = RECORD_HEADER_LENGTH + 1;

    /// Create a record with the given identifier bytes
    pub fn new(identifier: &[u8]) -> Result<Self> {
        let mut record = Self {
            extended_attr_length: 0,
            extent_location: 0,
            data_length: 0,
            recording_time: None,
            flags: FileFlags::empty(),
            file_unit_size: 0,
            interleave_gap: 0,
            volume_sequence_number: 1,
            identifier: Vec::new(),
            system_use: Vec::new(),
        };
        record.set_identifier(identifier)?;
        Ok(record)
    }

    /// Create a `.` record for a directory extent
    pub fn current(extent_location: u32, data_length: u32) -> Self {
        let mut record = Self::new(&[0x00]).unwrap_or_else(|_| unreachable!());
        record.extent_location = extent_location;
        record.data_length = data_length;
        record.flags.set_directory();
        record
    }

    /// Create a `..` record pointing at the parent's extent
    pub fn parent(extent_location: u32, data_length: u32) -> Self {
        let mut record = Self::new(&[0x01]).unwrap_or_else(|_| unreachable!());
        record.extent_location = extent_location;
        record.data_length = data_length;
        record.flags.set_directory();
        record
    }

    /// Total on-disc length of this record
    pub fn length(&self) -> usize {
        RECORD_HEADER_LENGTH + self.identifier.len() + self.pad_length() + self.system_use.len()
    }

    fn pad_length(&self) -> usize {
        if self.identifier.len().is_multiple_of(2) {
            1
        } else {
            0
        }
    }

    /// Raw identifier bytes
    pub fn identifier(&self) -> &[u8] {
        &self.identifier
    }

    /// Replace the identifier, preserving the system-use trailer
    pub fn set_identifier(&mut self, identifier: &[u8]) -> Result<()> {
        if identifier.is_empty() {
            return Err(IsoError::InvalidArgument {
                name: "identifier",
                message: "must not be empty",
            });
        }
        let pad = if identifier.len().is_multiple_of(2) { 1 } else { 0 };
        let length = RECORD_HEADER_LENGTH + identifier.len() + pad + self.system_use.len();
        if length > MAX_RECORD_LENGTH {
            return Err(IsoError::RecordTooLong(length));
        }
        self.identifier = identifier.to_vec();
        Ok(())
    }

    /// System-use trailer bytes
    pub fn system_use(&self) -> &[u8] {
        &self.system_use
    }

    /// Replace the system-use trailer; `None` truncates the record
    ///
    /// Odd-length trailers gain a single zero byte so the record length
    /// stays even.
    pub fn set_system_use(&mut self, system_use: Option<&[u8]>) -> Result<()> {
        let Some(bytes) = system_use else {
            self.system_use.clear();
            return Ok(());
        };
        let padded_len = bytes.len() + (bytes.len() & 1);
        let length =
            RECORD_HEADER_LENGTH + self.identifier.len() + self.pad_length() + padded_len;
        if length > MAX_RECORD_LENGTH {
            return Err(IsoError::RecordTooLong(length));
        }
        self.system_use.clear();
        self.system_use.extend_from_slice(bytes);
        if !bytes.len().is_multiple_of(2) {
            self.system_use.push(0);
        }
        Ok(())
    }

    /// Whether this is the `.` entry
    pub fn is_current(&self) -> bool {
        self.identifier == [0x00]
    }

    /// Whether this is the `..` entry
    pub fn is_parent(&self) -> bool {
        self.identifier == [0x01]
    }

    /// Decode the identifier with the descriptor's encoding
    pub fn decoded_identifier(&self, encoding: TextEncoding) -> RecordIdentifier {
        if self.is_current() {
            RecordIdentifier::Current
        } else if self.is_parent() {
            RecordIdentifier::Parent
        } else {
            let name = encoding.decode(&self.identifier);
            if self.flags.is_directory() {
                RecordIdentifier::Directory(name)
            } else {
                RecordIdentifier::File(name)
            }
        }
    }

    /// Parse one record from the start of `bytes`
    ///
    /// A leading zero byte means "no more records in this sector" and is
    /// the caller's job to detect; here it parses as an error.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(IsoError::InvalidImage);
        }
        let length = bytes[0] as usize;
        if length < Self::MIN_LENGTH || length > bytes.len() {
            return Err(IsoError::InvalidImage);
        }
        let id_len = bytes[32] as usize;
        if id_len == 0 {
            return Err(IsoError::InvalidImage);
        }
        let pad = if id_len.is_multiple_of(2) { 1 } else { 0 };
        if RECORD_HEADER_LENGTH + id_len + pad > length {
            return Err(IsoError::InvalidImage);
        }
        let identifier = bytes[RECORD_HEADER_LENGTH..RECORD_HEADER_LENGTH + id_len].to_vec();
        let su_start = RECORD_HEADER_LENGTH + id_len + pad;
        let system_use = bytes[su_start..length].to_vec();

        let mut time_bytes = [0u8; 7];
        time_bytes.copy_from_slice(&bytes[18..25]);

        Ok(Self {
            extended_attr_length: bytes[1],
            extent_location: read_both_u32(&bytes[2..10]),
            data_length: read_both_u32(&bytes[10..18]),
            recording_time: RecordDateTime::decode(&time_bytes),
            flags: FileFlags::from_byte(bytes[25]),
            file_unit_size: bytes[26],
            interleave_gap: bytes[27],
            volume_sequence_number: read_both_u16(&bytes[28..32]),
            identifier,
            system_use,
        })
    }

    /// Append the serialized record to `out`
    pub fn serialize(&self, out: &mut Vec<u8>) {
        let length = self.length();
        debug_assert!(length <= MAX_RECORD_LENGTH);
        out.push(length as u8);
        out.push(self.extended_attr_length);
        out.extend_from_slice(&both_u32(self.extent_location));
        out.extend_from_slice(&both_u32(self.data_length));
        out.extend_from_slice(&RecordDateTime::encode(self.recording_time.as_ref()));
        out.push(self.flags.to_byte());
        out.push(self.file_unit_size);
        out.push(self.interleave_gap);
        out.extend_from_slice(&both_u16(self.volume_sequence_number));
        out.push(self.identifier.len() as u8);
        out.extend_from_slice(&self.identifier);
        if self.pad_length() == 1 {
            out.push(0);
        }
        out.extend_from_slice(&self.system_use);
    }

    /// Serialized form as a fresh vector
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.length());
        self.serialize(&mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> DirectoryRecord {
        let mut record = DirectoryRecord::new(b"HELLO.TXT;1").unwrap();
        record.extent_location = 23;
        record.data_length = 5;
        record.recording_time = Some(RecordDateTime {
            year: 126,
            month: 8,
            day: 2,
            hour: 0,
            minute: 0,
            second: 0,
            gmt_offset: 0,
        });
        record
    }

    #[test]
    fn test_round_trip() {
        let record = sample_record();
        let bytes = record.to_bytes();
        assert_eq!(bytes.len(), record.length());
        assert_eq!(DirectoryRecord::parse(&bytes).unwrap(), record);
    }

    #[test]
    fn test_round_trip_with_system_use() {
        let mut record = sample_record();
        record.set_system_use(Some(&[0xAA, 0xBB, 0xCC, 0xDD])).unwrap();
        let bytes = record.to_bytes();
        let parsed = DirectoryRecord::parse(&bytes).unwrap();
        assert_eq!(parsed, record);
        assert_eq!(parsed.system_use(), &[0xAA, 0xBB, 0xCC, 0xDD]);
    }

    #[test]
    fn test_length_stays_even() {
        // Odd identifier: no pad. 33 + 11 = 44.
        let record = sample_record();
        assert_eq!(record.length(), 44);

        // Even identifier: one pad byte. 33 + 4 + 1 = 38.
        let record = DirectoryRecord::new(b"DATA").unwrap();
        assert_eq!(record.length(), 38);

        // Odd system use gets padded to even.
        let mut record = DirectoryRecord::new(b"DATA").unwrap();
        record.set_system_use(Some(&[1, 2, 3])).unwrap();
        assert!(record.length().is_multiple_of(2));
    }

    #[test]
    fn test_identifier_preserves_system_use() {
        let mut record = sample_record();
        record.set_system_use(Some(&[1, 2, 3, 4])).unwrap();
        record.set_identifier(b"OTHER.BIN;1").unwrap();
        assert_eq!(record.system_use(), &[1, 2, 3, 4]);
        record.set_system_use(None).unwrap();
        assert_eq!(record.length(), 33 + 11);
    }

    #[test]
    fn test_rejects_oversized_record() {
        let mut record = sample_record();
        let huge = [0u8; 230];
        assert!(matches!(
            record.set_system_use(Some(&huge)),
            Err(IsoError::RecordTooLong(_))
        ));
    }

    #[test]
    fn test_zero_identifier_length_is_invalid() {
        let mut bytes = sample_record().to_bytes();
        bytes[32] = 0;
        assert_eq!(DirectoryRecord::parse(&bytes), Err(IsoError::InvalidImage));
    }

    #[test]
    fn test_dot_records() {
        let dot = DirectoryRecord::current(20, 2048);
        assert!(dot.is_current());
        assert!(dot.flags.is_directory());
        assert_eq!(
            dot.decoded_identifier(TextEncoding::Ascii),
            RecordIdentifier::Current
        );

        let dotdot = DirectoryRecord::parent(18, 2048);
        assert!(dotdot.is_parent());
        assert_eq!(dotdot.length(), 34);
    }
}
