//! Byte-level codecs shared by every on-disc structure

pub mod datetime;
pub mod endian;
pub mod strings;

/// Number of whole blocks needed to hold `bytes`
pub fn blocks_for(bytes: u64, block_size: u32) -> u64 {
    bytes.div_ceil(block_size as u64)
}
