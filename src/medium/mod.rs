//! Sector-addressed storage abstraction
//!
//! The filesystem layers above never touch bytes directly; they go
//! through [`SectorMedium`], which models a block device or an image
//! file as an array of fixed-size sectors. Logical blocks (the ISO 9660
//! addressing unit) are mapped onto sectors here as well.

pub mod block_io;
pub mod memory;

pub use block_io::BlockIoMedium;
pub use memory::MemoryMedium;

use crate::error::{IsoError, Result};
use alloc::vec;

/// A sector-addressable storage medium
///
/// The sector size is fixed for the lifetime of the medium and must be
/// a power of two of at least 2048 bytes. Media are single-threaded;
/// higher layers never share one.
pub trait SectorMedium {
    /// Sector size in bytes
    fn sector_size(&self) -> usize;

    /// Whether the medium holds no data yet
    fn is_blank(&self) -> bool;

    /// Number of sectors currently backed by storage
    fn max_sectors(&self) -> u64;

    /// Read one sector into `buf` (`buf.len() == sector_size()`).
    /// Reads past the current end yield a zero-filled sector.
    fn read_sector(&mut self, index: u64, buf: &mut [u8]) -> Result<()>;

    /// Write one sector (`data.len() == sector_size()`), extending the
    /// medium as needed
    fn write_sector(&mut self, index: u64, data: &[u8]) -> Result<()>;

    /// Durably persist any buffered writes
    fn sync(&mut self) -> Result<()>;
}

/// Check a sector or logical block size: power of two, at least 2048
pub(crate) fn is_valid_unit(size: usize) -> bool {
    size >= 2048 && size.is_power_of_two()
}

/// Read `buf.len()` bytes starting at an arbitrary byte offset
pub(crate) fn read_bytes<M: SectorMedium + ?Sized>(
    medium: &mut M,
    byte_offset: u64,
    buf: &mut [u8],
) -> Result<()> {
    let sector_size = medium.sector_size() as u64;
    let mut sector_buf = vec![0u8; sector_size as usize];
    let mut position = byte_offset;
    let mut filled = 0usize;
    while filled < buf.len() {
        let sector = position / sector_size;
        let in_sector = (position % sector_size) as usize;
        medium.read_sector(sector, &mut sector_buf)?;
        let take = (sector_size as usize - in_sector).min(buf.len() - filled);
        buf[filled..filled + take].copy_from_slice(&sector_buf[in_sector..in_sector + take]);
        filled += take;
        position += take as u64;
    }
    Ok(())
}

/// Write `data` starting at an arbitrary byte offset, read-modify-writing
/// partially covered sectors
pub(crate) fn write_bytes<M: SectorMedium + ?Sized>(
    medium: &mut M,
    byte_offset: u64,
    data: &[u8],
) -> Result<()> {
    let sector_size = medium.sector_size() as u64;
    let mut sector_buf = vec![0u8; sector_size as usize];
    let mut position = byte_offset;
    let mut written = 0usize;
    while written < data.len() {
        let sector = position / sector_size;
        let in_sector = (position % sector_size) as usize;
        let take = (sector_size as usize - in_sector).min(data.len() - written);
        if take == sector_size as usize {
            medium.write_sector(sector, &data[written..written + take])?;
        } else {
            medium.read_sector(sector, &mut sector_buf)?;
            sector_buf[in_sector..in_sector + take]
                .copy_from_slice(&data[written..written + take]);
            medium.write_sector(sector, &sector_buf)?;
        }
        written += take;
        position += take as u64;
    }
    Ok(())
}

/// Read one logical block (`buf.len() == block_size`)
pub(crate) fn read_block<M: SectorMedium + ?Sized>(
    medium: &mut M,
    block_size: u32,
    lba: u64,
    buf: &mut [u8],
) -> Result<()> {
    read_bytes(medium, lba * block_size as u64, buf)
}

/// Validate a logical block size against the medium's sector size
pub(crate) fn check_block_size<M: SectorMedium + ?Sized>(
    medium: &M,
    block_size: u32,
) -> Result<()> {
    if !is_valid_unit(block_size as usize) || block_size as usize > medium.sector_size() {
        return Err(IsoError::InvalidLogicalBlockSize(block_size));
    }
    Ok(())
}
