//! Directory-bearing volume descriptors
//!
//! Primary, Supplementary and Enhanced descriptors share one 2048-byte
//! layout (ECMA-119 8.4 and 8.5); they differ in type/version bytes,
//! in the escape-sequences field that selects the name encoding, and in
//! the character sets their identifiers must satisfy.

use crate::directory::record::DirectoryRecord;
use crate::error::{IsoError, Result};
use crate::types::LOGICAL_SECTOR_SIZE;
use crate::utils::datetime::VolumeDateTime;
use crate::utils::endian::{both_u16, both_u32, read_both_u16, read_both_u32};
use crate::utils::strings::{
    is_a_string, is_d_or_separator_string, is_d_string, IdentifierOrFile, TextEncoding,
};
use alloc::string::String;
use alloc::vec::Vec;

/// Which directory-bearing descriptor a [`VolumeDirectoryDescriptor`]
/// was read from or will be written as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorKind {
    /// Primary Volume Descriptor (type 1, version 1)
    Primary,
    /// Supplementary Volume Descriptor (type 2, version 1)
    Supplementary,
    /// Enhanced Volume Descriptor (type 2, version 2)
    Enhanced,
}

impl DescriptorKind {
    /// On-disc type code
    pub fn type_code(self) -> u8 {
        match self {
            Self::Primary => 1,
            Self::Supplementary | Self::Enhanced => 2,
        }
    }

    /// On-disc descriptor version
    pub fn version(self) -> u8 {
        match self {
            Self::Primary | Self::Supplementary => 1,
            Self::Enhanced => 2,
        }
    }

    /// On-disc file structure version
    pub fn file_structure_version(self) -> u8 {
        match self {
            Self::Primary | Self::Supplementary => 1,
            Self::Enhanced => 2,
        }
    }
}

/// A Primary, Supplementary or Enhanced volume descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeDirectoryDescriptor {
    /// Which of the three directory-bearing descriptors this is
    pub kind: DescriptorKind,

    /// Volume flags (Supplementary/Enhanced only)
    pub volume_flags: u8,

    /// System identifier (a-characters)
    pub system_identifier: String,

    /// Volume identifier
    pub volume_identifier: String,

    /// Volume space size in logical blocks
    pub volume_space_size: u32,

    /// Escape sequences field; selects the name encoding on type-2
    /// descriptors
    pub escape_sequences: [u8; 32],

    /// Number of volumes in the set
    pub volume_set_size: u16,

    /// Ordinal of this volume in the set
    pub volume_sequence_number: u16,

    /// Logical block size in bytes
    pub logical_block_size: u16,

    /// Path table size in bytes
    pub path_table_size: u32,

    /// Location of the Type L path table
    pub type_l_path_table: u32,

    /// Location of the optional Type L path table (0 = absent)
    pub optional_type_l_path_table: u32,

    /// Location of the Type M path table
    pub type_m_path_table: u32,

    /// Location of the optional Type M path table (0 = absent)
    pub optional_type_m_path_table: u32,

    /// Root directory record
    pub root_directory_record: DirectoryRecord,

    /// Volume set identifier
    pub volume_set_identifier: String,

    /// Publisher
    pub publisher_identifier: IdentifierOrFile,

    /// Data preparer
    pub data_preparer_identifier: IdentifierOrFile,

    /// Application
    pub application_identifier: IdentifierOrFile,

    /// Copyright file identifier
    pub copyright_file_identifier: String,

    /// Abstract file identifier
    pub abstract_file_identifier: String,

    /// Bibliographic file identifier
    pub bibliographic_file_identifier: String,

    /// Volume creation date
    pub creation_time: Option<VolumeDateTime>,

    /// Most recent modification date
    pub modification_time: Option<VolumeDateTime>,

    /// Expiration date
    pub expiration_time: Option<VolumeDateTime>,

    /// Effective date
    pub effective_time: Option<VolumeDateTime>,

    /// Application use area (at most 512 bytes)
    pub application_use: Vec<u8>,
}

impl VolumeDirectoryDescriptor {
    /// Create an empty descriptor of the given kind
    pub fn new(kind: DescriptorKind) -> Self {
        Self {
            kind,
            volume_flags: 0,
            system_identifier: String::new(),
            volume_identifier: String::new(),
            volume_space_size: 0,
            escape_sequences: [0u8; 32],
            volume_set_size: 1,
            volume_sequence_number: 1,
            logical_block_size: LOGICAL_SECTOR_SIZE as u16,
            path_table_size: 0,
            type_l_path_table: 0,
            optional_type_l_path_table: 0,
            type_m_path_table: 0,
            optional_type_m_path_table: 0,
            root_directory_record: DirectoryRecord::current(0, 0),
            volume_set_identifier: String::new(),
            publisher_identifier: IdentifierOrFile::Empty,
            data_preparer_identifier: IdentifierOrFile::Empty,
            application_identifier: IdentifierOrFile::Empty,
            copyright_file_identifier: String::new(),
            abstract_file_identifier: String::new(),
            bibliographic_file_identifier: String::new(),
            creation_time: None,
            modification_time: None,
            expiration_time: None,
            effective_time: None,
            application_use: Vec::new(),
        }
    }

    /// Name encoding selected by this descriptor
    ///
    /// Primary descriptors always use ASCII. Type-2 descriptors default
    /// to UCS-2 big-endian; the recognized Joliet escape sequences keep
    /// that default and `%/G`, `%/H`, `%/I` switch to UTF-8. Anything
    /// else is retained but does not change the encoding.
    pub fn encoding(&self) -> TextEncoding {
        if self.kind == DescriptorKind::Primary {
            return TextEncoding::Ascii;
        }
        decode_escape_sequences(&self.escape_sequences)
    }

    /// Validate invariants ahead of serialization
    pub fn validate(&self) -> Result<()> {
        let block = self.logical_block_size;
        if block == 0 || !block.is_power_of_two() {
            return Err(IsoError::InvalidLogicalBlockSize(block as u32));
        }
        if self.application_use.len() > 512 {
            return Err(IsoError::InvalidApplicationUseSize(self.application_use.len()));
        }
        if self.kind == DescriptorKind::Primary {
            self.validate_primary_identifiers()?;
        }
        Ok(())
    }

    fn validate_primary_identifiers(&self) -> Result<()> {
        check(is_a_string(&self.system_identifier), "system_identifier",
            &self.system_identifier)?;
        check(is_d_string(&self.volume_identifier), "volume_identifier",
            &self.volume_identifier)?;
        check(is_d_string(&self.volume_set_identifier), "volume_set_identifier",
            &self.volume_set_identifier)?;
        check_ident_or_file(&self.publisher_identifier, "publisher_identifier")?;
        check_ident_or_file(&self.data_preparer_identifier, "data_preparer_identifier")?;
        check_ident_or_file(&self.application_identifier, "application_identifier")?;
        check(
            is_d_or_separator_string(&self.copyright_file_identifier),
            "copyright_file_identifier",
            &self.copyright_file_identifier,
        )?;
        check(
            is_d_or_separator_string(&self.abstract_file_identifier),
            "abstract_file_identifier",
            &self.abstract_file_identifier,
        )?;
        check(
            is_d_or_separator_string(&self.bibliographic_file_identifier),
            "bibliographic_file_identifier",
            &self.bibliographic_file_identifier,
        )?;
        Ok(())
    }

    /// Parse the body of a descriptor sector already classified as
    /// directory-bearing
    pub fn parse(kind: DescriptorKind, sector: &[u8]) -> Result<Self> {
        if sector.len() < LOGICAL_SECTOR_SIZE {
            return Err(IsoError::InvalidVolumeDescriptor);
        }
        let mut escape_sequences = [0u8; 32];
        escape_sequences.copy_from_slice(&sector[88..120]);
        let encoding = if kind == DescriptorKind::Primary {
            TextEncoding::Ascii
        } else {
            decode_escape_sequences(&escape_sequences)
        };

        let timestamp = |offset: usize| {
            let mut field = [0u8; 17];
            field.copy_from_slice(&sector[offset..offset + 17]);
            VolumeDateTime::decode(&field)
        };

        let root_directory_record = DirectoryRecord::parse(&sector[156..190])
            .map_err(|_| IsoError::InvalidVolumeDescriptor)?;

        Ok(Self {
            kind,
            volume_flags: if kind == DescriptorKind::Primary {
                0
            } else {
                sector[7]
            },
            system_identifier: TextEncoding::Ascii.decode_padded(&sector[8..40]),
            volume_identifier: encoding.decode_padded(&sector[40..72]),
            volume_space_size: read_both_u32(&sector[80..88]),
            escape_sequences,
            volume_set_size: read_both_u16(&sector[120..124]),
            volume_sequence_number: read_both_u16(&sector[124..128]),
            logical_block_size: read_both_u16(&sector[128..132]),
            path_table_size: read_both_u32(&sector[132..140]),
            type_l_path_table: u32::from_le_bytes([
                sector[140], sector[141], sector[142], sector[143],
            ]),
            optional_type_l_path_table: u32::from_le_bytes([
                sector[144], sector[145], sector[146], sector[147],
            ]),
            type_m_path_table: u32::from_be_bytes([
                sector[148], sector[149], sector[150], sector[151],
            ]),
            optional_type_m_path_table: u32::from_be_bytes([
                sector[152], sector[153], sector[154], sector[155],
            ]),
            root_directory_record,
            volume_set_identifier: encoding.decode_padded(&sector[190..318]),
            publisher_identifier: IdentifierOrFile::deserialize(encoding, &sector[318..446]),
            data_preparer_identifier: IdentifierOrFile::deserialize(encoding, &sector[446..574]),
            application_identifier: IdentifierOrFile::deserialize(encoding, &sector[574..702]),
            copyright_file_identifier: encoding.decode_padded(&sector[702..739]),
            abstract_file_identifier: encoding.decode_padded(&sector[739..776]),
            bibliographic_file_identifier: encoding.decode_padded(&sector[776..813]),
            creation_time: timestamp(813),
            modification_time: timestamp(830),
            expiration_time: timestamp(847),
            effective_time: timestamp(864),
            application_use: trim_application_use(&sector[883..1395]),
        })
    }

    /// Serialize into one descriptor sector
    pub fn serialize(&self) -> [u8; LOGICAL_SECTOR_SIZE] {
        let encoding = self.encoding();
        let mut sector = [0u8; LOGICAL_SECTOR_SIZE];
        sector[0] = self.kind.type_code();
        sector[1..6].copy_from_slice(crate::types::STANDARD_IDENTIFIER);
        sector[6] = self.kind.version();
        if self.kind != DescriptorKind::Primary {
            sector[7] = self.volume_flags;
        }
        sector[8..40]
            .copy_from_slice(&TextEncoding::Ascii.encode_padded(&self.system_identifier, 32));
        sector[40..72].copy_from_slice(&encoding.encode_padded(&self.volume_identifier, 32));
        sector[80..88].copy_from_slice(&both_u32(self.volume_space_size));
        if self.kind != DescriptorKind::Primary {
            sector[88..120].copy_from_slice(&self.escape_sequences);
        }
        sector[120..124].copy_from_slice(&both_u16(self.volume_set_size));
        sector[124..128].copy_from_slice(&both_u16(self.volume_sequence_number));
        sector[128..132].copy_from_slice(&both_u16(self.logical_block_size));
        sector[132..140].copy_from_slice(&both_u32(self.path_table_size));
        sector[140..144].copy_from_slice(&self.type_l_path_table.to_le_bytes());
        sector[144..148].copy_from_slice(&self.optional_type_l_path_table.to_le_bytes());
        sector[148..152].copy_from_slice(&self.type_m_path_table.to_be_bytes());
        sector[152..156].copy_from_slice(&self.optional_type_m_path_table.to_be_bytes());
        let root = self.root_directory_record.to_bytes();
        sector[156..156 + root.len().min(34)].copy_from_slice(&root[..root.len().min(34)]);
        sector[190..318].copy_from_slice(&encoding.encode_padded(&self.volume_set_identifier, 128));
        sector[318..446].copy_from_slice(&self.publisher_identifier.serialize(encoding, 128));
        sector[446..574].copy_from_slice(&self.data_preparer_identifier.serialize(encoding, 128));
        sector[574..702].copy_from_slice(&self.application_identifier.serialize(encoding, 128));
        sector[702..739]
            .copy_from_slice(&encoding.encode_padded(&self.copyright_file_identifier, 37));
        sector[739..776]
            .copy_from_slice(&encoding.encode_padded(&self.abstract_file_identifier, 37));
        sector[776..813]
            .copy_from_slice(&encoding.encode_padded(&self.bibliographic_file_identifier, 37));
        sector[813..830].copy_from_slice(&VolumeDateTime::encode(self.creation_time.as_ref()));
        sector[830..847].copy_from_slice(&VolumeDateTime::encode(self.modification_time.as_ref()));
        sector[847..864].copy_from_slice(&VolumeDateTime::encode(self.expiration_time.as_ref()));
        sector[864..881].copy_from_slice(&VolumeDateTime::encode(self.effective_time.as_ref()));
        sector[881] = self.kind.file_structure_version();
        let au_len = self.application_use.len().min(512);
        sector[883..883 + au_len].copy_from_slice(&self.application_use[..au_len]);
        sector
    }
}

fn check(ok: bool, field: &'static str, value: &str) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(IsoError::InvalidIdentifier {
            field,
            value: String::from(value),
        })
    }
}

fn check_ident_or_file(value: &IdentifierOrFile, field: &'static str) -> Result<()> {
    match value {
        IdentifierOrFile::Empty => Ok(()),
        IdentifierOrFile::Identifier(s) => check(is_a_string(s), field, s),
        IdentifierOrFile::File(s) => check(is_d_or_separator_string(s), field, s),
    }
}

/// Map the 32-byte escape-sequences field to a name encoding
///
/// The Joliet UCS-2 sequences are `%/@`, `%/C`, `%/E`, `%/J`, `%/K`,
/// `%/L`; the UTF-8 sequences are `%/G`, `%/H`, `%/I`. Unrecognized
/// sequences keep the UCS-2 default.
pub fn decode_escape_sequences(escape_sequences: &[u8; 32]) -> TextEncoding {
    let mut offset = 0;
    while offset + 3 <= escape_sequences.len() {
        let seq = &escape_sequences[offset..offset + 3];
        if seq[0] != 0x25 || seq[1] != 0x2F {
            break;
        }
        match seq[2] {
            b'@' | b'C' | b'E' | b'J' | b'K' | b'L' => return TextEncoding::Ucs2Be,
            b'G' | b'H' | b'I' => return TextEncoding::Utf8,
            other => {
                log::warn!("unrecognized escape sequence %/{:02X}", other);
                offset += 3;
            }
        }
    }
    TextEncoding::Ucs2Be
}

fn trim_application_use(bytes: &[u8]) -> Vec<u8> {
    let mut end = bytes.len();
    while end > 0 && bytes[end - 1] == 0 {
        end -= 1;
    }
    bytes[..end].to_vec()
}
