//! Boot Record volume descriptor
//!
//! A type-0 descriptor announcing a boot system (El Torito uses one to
//! point at its catalog). The body is retained verbatim so images
//! carrying one re-serialize byte-faithfully; catalog synthesis is out
//! of scope.

use crate::error::{IsoError, Result};
use crate::types::LOGICAL_SECTOR_SIZE;
use crate::utils::strings::TextEncoding;
use alloc::string::String;
use alloc::vec::Vec;

/// Boot Record (ECMA-119 8.2)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootRecord {
    /// Boot system identifier (a-characters)
    pub boot_system_identifier: String,

    /// Boot identifier
    pub boot_identifier: String,

    /// Boot system use area (1977 bytes)
    pub boot_system_use: Vec<u8>,
}

impl BootRecord {
    /// Parse the body of a descriptor sector already classified as a
    /// boot record
    pub fn parse(sector: &[u8]) -> Result<Self> {
        if sector.len() < LOGICAL_SECTOR_SIZE {
            return Err(IsoError::InvalidVolumeDescriptor);
        }
        Ok(Self {
            boot_system_identifier: TextEncoding::Ascii.decode_padded(&sector[7..39]),
            boot_identifier: TextEncoding::Ascii.decode_padded(&sector[39..71]),
            boot_system_use: sector[71..LOGICAL_SECTOR_SIZE].to_vec(),
        })
    }

    /// Serialize into one descriptor sector
    pub fn serialize(&self) -> [u8; LOGICAL_SECTOR_SIZE] {
        let mut sector = [0u8; LOGICAL_SECTOR_SIZE];
        sector[0] = 0;
        sector[1..6].copy_from_slice(crate::types::STANDARD_IDENTIFIER);
        sector[6] = 1;
        sector[7..39]
            .copy_from_slice(&TextEncoding::Ascii.encode_padded(&self.boot_system_identifier, 32));
        sector[39..71]
            .copy_from_slice(&TextEncoding::Ascii.encode_padded(&self.boot_identifier, 32));
        let len = self.boot_system_use.len().min(1977);
        sector[71..71 + len].copy_from_slice(&self.boot_system_use[..len]);
        sector
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_round_trip() {
        let record = BootRecord {
            boot_system_identifier: "EL TORITO SPECIFICATION".to_string(),
            boot_identifier: String::new(),
            boot_system_use: {
                let mut body = alloc::vec![0u8; 1977];
                body[0..4].copy_from_slice(&20u32.to_le_bytes());
                body
            },
        };
        let sector = record.serialize();
        assert_eq!(sector[0], 0);
        assert_eq!(&sector[1..6], b"CD001");
        assert_eq!(BootRecord::parse(&sector).unwrap(), record);
    }
}
