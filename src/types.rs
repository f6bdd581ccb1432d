//! Common constants for ISO 9660

/// Size of a logical sector and of every volume descriptor (always 2048 bytes)
pub const LOGICAL_SECTOR_SIZE: usize = 2048;

/// Number of reserved system-area sectors at the start of a volume
pub const SYSTEM_AREA_SECTORS: u64 = 16;

/// Volume descriptor set starts at sector 16
pub const VOLUME_DESCRIPTOR_START: u64 = SYSTEM_AREA_SECTORS;

/// Standard identifier carried by every volume descriptor
pub const STANDARD_IDENTIFIER: &[u8; 5] = b"CD001";

/// Maximum length of a directory record
pub const MAX_RECORD_LENGTH: usize = 255;

/// Fixed directory record header length (up to and including the
/// file identifier length byte)
pub const RECORD_HEADER_LENGTH: usize = 33;

/// Serialized length of a SUSP `CE` entry
pub const CE_ENTRY_LENGTH: usize = 28;

/// Maximum encoded identifier length in Supplementary/Enhanced descriptors
pub const MAX_EXTENDED_IDENTIFIER_BYTES: usize = 207;
