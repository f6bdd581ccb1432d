//! Directory record flag byte

use bitflags::bitflags;

bitflags! {
    /// File flags of a directory record (ECMA-119 9.1.6)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FileFlags: u8 {
        /// Existence bit: entry is hidden from casual listings
        const HIDDEN = 0x01;
        /// Entry is a directory
        const DIRECTORY = 0x02;
        /// Entry is an associated file
        const ASSOCIATED = 0x04;
        /// Extended attribute record describes the record format
        const RECORD = 0x08;
        /// Permissions are specified in the extended attribute record
        const PROTECTION = 0x10;
        /// Not the final extent of this file
        const MULTI_EXTENT = 0x80;
    }
}

impl FileFlags {
    /// Parse from the raw byte, keeping reserved bits
    pub fn from_byte(byte: u8) -> Self {
        Self::from_bits_retain(byte)
    }

    /// Raw byte form
    pub fn to_byte(self) -> u8 {
        self.bits()
    }

    /// Mark the entry as a directory
    ///
    /// Directories cannot be associated, record-format or multi-extent,
    /// so those bits are cleared.
    pub fn set_directory(&mut self) {
        self.insert(Self::DIRECTORY);
        self.remove(Self::ASSOCIATED | Self::RECORD | Self::MULTI_EXTENT);
    }

    /// Whether the directory bit is set
    pub fn is_directory(self) -> bool {
        self.contains(Self::DIRECTORY)
    }
}
