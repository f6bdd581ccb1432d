//! Adapter presenting a `gpt_disk_io` block device as a sector medium
//!
//! Lets the filesystem mount images that sit on the same block devices
//! the rest of the stack reads through.

use super::{is_valid_unit, SectorMedium};
use crate::error::{IsoError, Result};
use gpt_disk_io::BlockIo;
use gpt_disk_types::Lba;

/// A [`SectorMedium`] over any [`BlockIo`] device
pub struct BlockIoMedium<B: BlockIo> {
    device: B,
    sector_size: usize,
    num_blocks: u64,
}

impl<B: BlockIo> BlockIoMedium<B> {
    /// Wrap a block device, taking its block size as the sector size
    pub fn new(mut device: B) -> Result<Self> {
        let sector_size = device.block_size().to_u64() as usize;
        if !is_valid_unit(sector_size) {
            return Err(IsoError::InvalidSectorSize(sector_size));
        }
        let num_blocks = device.num_blocks().map_err(|_| IsoError::Io)?;
        Ok(Self {
            device,
            sector_size,
            num_blocks,
        })
    }

    /// Unwrap the underlying device
    pub fn into_inner(self) -> B {
        self.device
    }
}

impl<B: BlockIo> SectorMedium for BlockIoMedium<B> {
    fn sector_size(&self) -> usize {
        self.sector_size
    }

    fn is_blank(&self) -> bool {
        self.num_blocks == 0
    }

    fn max_sectors(&self) -> u64 {
        self.num_blocks
    }

    fn read_sector(&mut self, index: u64, buf: &mut [u8]) -> Result<()> {
        debug_assert_eq!(buf.len(), self.sector_size);
        if index >= self.num_blocks {
            buf.fill(0);
            return Ok(());
        }
        self.device
            .read_blocks(Lba(index), buf)
            .map_err(|_| IsoError::Io)
    }

    fn write_sector(&mut self, index: u64, data: &[u8]) -> Result<()> {
        debug_assert_eq!(data.len(), self.sector_size);
        self.device
            .write_blocks(Lba(index), data)
            .map_err(|_| IsoError::Io)?;
        if index >= self.num_blocks {
            self.num_blocks = index + 1;
        }
        Ok(())
    }

    fn sync(&mut self) -> Result<()> {
        self.device.flush().map_err(|_| IsoError::Io)
    }
}
