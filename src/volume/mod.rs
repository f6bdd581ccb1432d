//! Volume descriptor parsing
//!
//! Volume descriptors start at sector 16 and describe the filesystem
//! layout. The set holds at least a Primary descriptor and ends with a
//! Set Terminator; Supplementary/Enhanced (Joliet), Boot Record and
//! Partition descriptors may appear in between.

pub mod boot_record;
pub mod directory;

pub use boot_record::BootRecord;
pub use directory::{DescriptorKind, VolumeDirectoryDescriptor};

use crate::error::{IsoError, Result};
use crate::medium::{read_bytes, SectorMedium};
use crate::types::{LOGICAL_SECTOR_SIZE, STANDARD_IDENTIFIER, VOLUME_DESCRIPTOR_START};
use crate::utils::endian::{both_u32, read_both_u32};
use crate::utils::strings::TextEncoding;
use alloc::string::String;
use alloc::vec::Vec;

/// Upper bound on descriptor-set length before the image is declared
/// malformed
const MAX_DESCRIPTORS: usize = 256;

/// Volume Partition Descriptor (ECMA-119 8.6)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionDescriptor {
    /// System identifier (a-characters)
    pub system_identifier: String,

    /// Partition identifier (d-characters)
    pub partition_identifier: String,

    /// Location of the partition (LBA)
    pub partition_location: u32,

    /// Size of the partition in blocks
    pub partition_size: u32,

    /// System use area (1960 bytes)
    pub system_use: Vec<u8>,
}

/// A descriptor of a type this crate does not interpret, kept verbatim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericDescriptor {
    /// Type code
    pub type_code: u8,

    /// Descriptor version
    pub version: u8,

    /// Body bytes (offsets 7..2048 of the sector)
    pub body: Vec<u8>,
}

/// Any volume descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VolumeDescriptor {
    /// Boot Record (type 0)
    Boot(BootRecord),
    /// Primary (type 1)
    Primary(VolumeDirectoryDescriptor),
    /// Supplementary (type 2, version 1)
    Supplementary(VolumeDirectoryDescriptor),
    /// Enhanced (type 2, version 2)
    Enhanced(VolumeDirectoryDescriptor),
    /// Partition (type 3)
    Partition(PartitionDescriptor),
    /// Set Terminator (type 255)
    Terminator,
    /// Anything else
    Generic(GenericDescriptor),
}

impl VolumeDescriptor {
    /// Classify and parse one descriptor sector
    pub fn parse(sector: &[u8]) -> Result<Self> {
        if sector.len() < LOGICAL_SECTOR_SIZE {
            return Err(IsoError::InvalidVolumeDescriptor);
        }
        if &sector[1..6] != STANDARD_IDENTIFIER {
            return Err(IsoError::InvalidVolumeDescriptor);
        }
        let type_code = sector[0];
        let version = sector[6];
        Ok(match type_code {
            0 => Self::Boot(BootRecord::parse(sector)?),
            1 => Self::Primary(VolumeDirectoryDescriptor::parse(
                DescriptorKind::Primary,
                sector,
            )?),
            2 if version == 1 => Self::Supplementary(VolumeDirectoryDescriptor::parse(
                DescriptorKind::Supplementary,
                sector,
            )?),
            2 => Self::Enhanced(VolumeDirectoryDescriptor::parse(
                DescriptorKind::Enhanced,
                sector,
            )?),
            3 => Self::Partition(parse_partition(sector)?),
            255 => Self::Terminator,
            _ => Self::Generic(GenericDescriptor {
                type_code,
                version,
                body: sector[7..LOGICAL_SECTOR_SIZE].to_vec(),
            }),
        })
    }

    /// Serialize into one descriptor sector
    pub fn serialize(&self) -> [u8; LOGICAL_SECTOR_SIZE] {
        match self {
            Self::Boot(record) => record.serialize(),
            Self::Primary(descriptor)
            | Self::Supplementary(descriptor)
            | Self::Enhanced(descriptor) => descriptor.serialize(),
            Self::Partition(partition) => serialize_partition(partition),
            Self::Terminator => {
                let mut sector = [0u8; LOGICAL_SECTOR_SIZE];
                sector[0] = 255;
                sector[1..6].copy_from_slice(STANDARD_IDENTIFIER);
                sector[6] = 1;
                sector
            }
            Self::Generic(generic) => {
                let mut sector = [0u8; LOGICAL_SECTOR_SIZE];
                sector[0] = generic.type_code;
                sector[1..6].copy_from_slice(STANDARD_IDENTIFIER);
                sector[6] = generic.version;
                let len = generic.body.len().min(LOGICAL_SECTOR_SIZE - 7);
                sector[7..7 + len].copy_from_slice(&generic.body[..len]);
                sector
            }
        }
    }

    /// The directory-bearing descriptor inside, if any
    pub fn as_directory_descriptor(&self) -> Option<&VolumeDirectoryDescriptor> {
        match self {
            Self::Primary(descriptor)
            | Self::Supplementary(descriptor)
            | Self::Enhanced(descriptor) => Some(descriptor),
            _ => None,
        }
    }
}

fn parse_partition(sector: &[u8]) -> Result<PartitionDescriptor> {
    Ok(PartitionDescriptor {
        system_identifier: TextEncoding::Ascii.decode_padded(&sector[8..40]),
        partition_identifier: TextEncoding::Ascii.decode_padded(&sector[40..72]),
        partition_location: read_both_u32(&sector[72..80]),
        partition_size: read_both_u32(&sector[80..88]),
        system_use: sector[88..LOGICAL_SECTOR_SIZE].to_vec(),
    })
}

fn serialize_partition(partition: &PartitionDescriptor) -> [u8; LOGICAL_SECTOR_SIZE] {
    let mut sector = [0u8; LOGICAL_SECTOR_SIZE];
    sector[0] = 3;
    sector[1..6].copy_from_slice(STANDARD_IDENTIFIER);
    sector[6] = 1;
    sector[8..40]
        .copy_from_slice(&TextEncoding::Ascii.encode_padded(&partition.system_identifier, 32));
    sector[40..72]
        .copy_from_slice(&TextEncoding::Ascii.encode_padded(&partition.partition_identifier, 32));
    sector[72..80].copy_from_slice(&both_u32(partition.partition_location));
    sector[80..88].copy_from_slice(&both_u32(partition.partition_size));
    let len = partition.system_use.len().min(LOGICAL_SECTOR_SIZE - 88);
    sector[88..88 + len].copy_from_slice(&partition.system_use[..len]);
    sector
}

/// Read the volume descriptor set from sector 16 onward
///
/// Stops at the Set Terminator. A sector without the `CD001` magic, or
/// a set with no Primary descriptor or no Terminator, fails the whole
/// image.
pub fn discover<M: SectorMedium + ?Sized>(medium: &mut M) -> Result<Vec<VolumeDescriptor>> {
    let sector_size = medium.sector_size() as u64;
    let mut descriptors = Vec::new();
    let mut sector = [0u8; LOGICAL_SECTOR_SIZE];
    for index in 0..MAX_DESCRIPTORS as u64 {
        let offset = (VOLUME_DESCRIPTOR_START + index) * sector_size;
        read_bytes(medium, offset, &mut sector)?;
        let descriptor = VolumeDescriptor::parse(&sector)?;
        log::debug!(
            "descriptor {} at sector {}: type {}",
            index,
            VOLUME_DESCRIPTOR_START + index,
            sector[0]
        );
        let terminated = matches!(descriptor, VolumeDescriptor::Terminator);
        descriptors.push(descriptor);
        if terminated {
            if !descriptors
                .iter()
                .any(|d| matches!(d, VolumeDescriptor::Primary(_)))
            {
                return Err(IsoError::InvalidImage);
            }
            return Ok(descriptors);
        }
    }
    Err(IsoError::InvalidImage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_terminator_round_trip() {
        let sector = VolumeDescriptor::Terminator.serialize();
        assert_eq!(sector[0], 255);
        assert_eq!(
            VolumeDescriptor::parse(&sector).unwrap(),
            VolumeDescriptor::Terminator
        );
    }

    #[test]
    fn test_generic_round_trip_preserves_bytes() {
        let generic = GenericDescriptor {
            type_code: 4,
            version: 7,
            body: (0..2041).map(|i| (i % 251) as u8).collect(),
        };
        let descriptor = VolumeDescriptor::Generic(generic);
        let sector = descriptor.serialize();
        assert_eq!(VolumeDescriptor::parse(&sector).unwrap(), descriptor);
    }

    #[test]
    fn test_partition_round_trip() {
        let descriptor = VolumeDescriptor::Partition(PartitionDescriptor {
            system_identifier: "SYS".to_string(),
            partition_identifier: "PART1".to_string(),
            partition_location: 100,
            partition_size: 500,
            system_use: alloc::vec![0u8; 1960],
        });
        let sector = descriptor.serialize();
        assert_eq!(VolumeDescriptor::parse(&sector).unwrap(), descriptor);
    }

    #[test]
    fn test_bad_magic_is_rejected() {
        let mut sector = [0u8; LOGICAL_SECTOR_SIZE];
        sector[0] = 1;
        sector[1..6].copy_from_slice(b"CD002");
        assert_eq!(
            VolumeDescriptor::parse(&sector),
            Err(IsoError::InvalidVolumeDescriptor)
        );
    }

    #[test]
    fn test_supplementary_vs_enhanced_classification() {
        let mut descriptor =
            VolumeDirectoryDescriptor::new(DescriptorKind::Supplementary);
        descriptor.root_directory_record =
            crate::directory::DirectoryRecord::current(20, 2048);
        let sector = VolumeDescriptor::Supplementary(descriptor.clone()).serialize();
        assert!(matches!(
            VolumeDescriptor::parse(&sector).unwrap(),
            VolumeDescriptor::Supplementary(_)
        ));

        descriptor.kind = DescriptorKind::Enhanced;
        let sector = VolumeDescriptor::Enhanced(descriptor).serialize();
        assert!(matches!(
            VolumeDescriptor::parse(&sector).unwrap(),
            VolumeDescriptor::Enhanced(_)
        ));
    }
}
