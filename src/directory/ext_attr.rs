//! Extended Attribute Record
//!
//! Optional per-file metadata (ownership, permissions, record format)
//! stored in the blocks immediately before a file's extent when a
//! directory record carries a non-zero extended attribute length.
//! Reference: ECMA-119 9.5.

use crate::error::{IsoError, Result};
use crate::utils::datetime::VolumeDateTime;
use crate::utils::endian::{both_u16, read_both_u16};
use crate::utils::strings::TextEncoding;
use alloc::string::String;
use alloc::vec::Vec;
use bitflags::bitflags;

/// Fixed part of the record before application use and escape sequences
pub const FIXED_LENGTH: usize = 250;

bitflags! {
    /// Permission bits of an extended attribute record (ECMA-119 9.5.3)
    ///
    /// Only the even bit positions carry meaning; the odd positions are
    /// reserved and recorded as ones.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct XarPermissions: u16 {
        /// System class may read
        const SYSTEM_READ = 0x0001;
        /// System class may execute
        const SYSTEM_EXECUTE = 0x0004;
        /// Owner may read
        const OWNER_READ = 0x0010;
        /// Owner may execute
        const OWNER_EXECUTE = 0x0040;
        /// Group may read
        const GROUP_READ = 0x0100;
        /// Group may execute
        const GROUP_EXECUTE = 0x0400;
        /// World may read
        const WORLD_READ = 0x1000;
        /// World may execute
        const WORLD_EXECUTE = 0x4000;
    }
}

/// Reserved permission bits, always recorded as ones
const RESERVED_PERMISSION_BITS: u16 = 0xAAAA;

/// Extended Attribute Record, owned representation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedAttributeRecord {
    /// Owner identification (0 = unspecified)
    pub owner_identification: u16,

    /// Group identification (0 = unspecified)
    pub group_identification: u16,

    /// Permission bits
    pub permissions: XarPermissions,

    /// File creation date and time
    pub created: Option<VolumeDateTime>,

    /// Most recent modification
    pub modified: Option<VolumeDateTime>,

    /// Expiration date and time
    pub expiration: Option<VolumeDateTime>,

    /// Effective date and time
    pub effective: Option<VolumeDateTime>,

    /// Record format (0 = not a record-format file)
    pub record_format: u8,

    /// Record attributes
    pub record_attributes: u8,

    /// Record length
    pub record_length: u16,

    /// System identifier (a-characters)
    pub system_identifier: String,

    /// System use area
    pub system_use: [u8; 64],

    /// Application use bytes
    pub application_use: Vec<u8>,

    /// Escape sequences
    pub escape_sequences: Vec<u8>,
}

impl Default for ExtendedAttributeRecord {
    fn default() -> Self {
        Self {
            owner_identification: 0,
            group_identification: 0,
            permissions: XarPermissions::default(),
            created: None,
            modified: None,
            expiration: None,
            effective: None,
            record_format: 0,
            record_attributes: 0,
            record_length: 0,
            system_identifier: String::new(),
            system_use: [0u8; 64],
            application_use: Vec::new(),
            escape_sequences: Vec::new(),
        }
    }
}

impl ExtendedAttributeRecord {
    /// Total serialized length
    pub fn length(&self) -> usize {
        FIXED_LENGTH + self.application_use.len() + self.escape_sequences.len()
    }

    /// Parse a record from the start of `bytes`
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < FIXED_LENGTH {
            return Err(IsoError::InvalidImage);
        }
        if bytes[180] != 1 {
            log::warn!(
                "extended attribute record version {} (expected 1)",
                bytes[180]
            );
        }
        let timestamp = |offset: usize| {
            let mut field = [0u8; 17];
            field.copy_from_slice(&bytes[offset..offset + 17]);
            VolumeDateTime::decode(&field)
        };
        let escape_len = bytes[181] as usize;
        let au_len = read_both_u16(&bytes[246..250]) as usize;
        if bytes.len() < FIXED_LENGTH + au_len + escape_len {
            return Err(IsoError::InvalidImage);
        }
        let mut system_use = [0u8; 64];
        system_use.copy_from_slice(&bytes[116..180]);
        Ok(Self {
            owner_identification: read_both_u16(&bytes[0..4]),
            group_identification: read_both_u16(&bytes[4..8]),
            permissions: XarPermissions::from_bits_truncate(u16::from_be_bytes([
                bytes[8], bytes[9],
            ])),
            created: timestamp(10),
            modified: timestamp(27),
            expiration: timestamp(44),
            effective: timestamp(61),
            record_format: bytes[78],
            record_attributes: bytes[79],
            record_length: read_both_u16(&bytes[80..84]),
            system_identifier: TextEncoding::Ascii.decode_padded(&bytes[84..116]),
            system_use,
            application_use: bytes[FIXED_LENGTH..FIXED_LENGTH + au_len].to_vec(),
            escape_sequences: bytes[FIXED_LENGTH + au_len..FIXED_LENGTH + au_len + escape_len]
                .to_vec(),
        })
    }

    /// Serialize the record
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.length());
        out.extend_from_slice(&both_u16(self.owner_identification));
        out.extend_from_slice(&both_u16(self.group_identification));
        let permissions = self.permissions.bits() | RESERVED_PERMISSION_BITS;
        out.extend_from_slice(&permissions.to_be_bytes());
        out.extend_from_slice(&VolumeDateTime::encode(self.created.as_ref()));
        out.extend_from_slice(&VolumeDateTime::encode(self.modified.as_ref()));
        out.extend_from_slice(&VolumeDateTime::encode(self.expiration.as_ref()));
        out.extend_from_slice(&VolumeDateTime::encode(self.effective.as_ref()));
        out.push(self.record_format);
        out.push(self.record_attributes);
        out.extend_from_slice(&both_u16(self.record_length));
        out.extend_from_slice(&TextEncoding::Ascii.encode_padded(&self.system_identifier, 32));
        out.extend_from_slice(&self.system_use);
        out.push(1); // record version
        out.push(self.escape_sequences.len() as u8);
        out.extend_from_slice(&[0u8; 64]);
        out.extend_from_slice(&both_u16(self.application_use.len() as u16));
        out.extend_from_slice(&self.application_use);
        out.extend_from_slice(&self.escape_sequences);
        out
    }
}
