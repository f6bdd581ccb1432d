//! Common test utilities and mock block devices

// Each integration test binary compiles this module separately and
// uses a different subset of it.
#![allow(dead_code)]

pub mod builder;
#[allow(unused_imports)]
pub use builder::ImageBuilder;

use gpt_disk_io::BlockIo;
use gpt_disk_types::{BlockSize, Lba};
use isofs::utils::datetime::RecordDateTime;
use std::io;

/// A fixed timestamp for deterministic images
#[allow(dead_code)]
pub fn test_timestamp() -> RecordDateTime {
    RecordDateTime {
        year: 126,
        month: 8,
        day: 2,
        hour: 12,
        minute: 0,
        second: 0,
        gmt_offset: 0,
    }
}

/// In-memory block device for testing the `gpt_disk_io` adapter
#[derive(Debug, Clone)]
pub struct MemoryBlockDevice {
    pub data: Vec<u8>,
    pub block_size: usize,
}

impl MemoryBlockDevice {
    /// Create a new memory block device from raw data
    #[allow(dead_code)]
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            block_size: 2048,
        }
    }
}

impl BlockIo for MemoryBlockDevice {
    type Error = io::Error;

    fn block_size(&self) -> BlockSize {
        BlockSize::new(self.block_size as u32).expect("valid block size")
    }

    fn num_blocks(&mut self) -> Result<u64, Self::Error> {
        Ok((self.data.len() / self.block_size) as u64)
    }

    fn read_blocks(&mut self, start_lba: Lba, dst: &mut [u8]) -> Result<(), Self::Error> {
        let offset = start_lba.0 as usize * self.block_size;
        if offset + dst.len() > self.data.len() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "read beyond end of device",
            ));
        }
        dst.copy_from_slice(&self.data[offset..offset + dst.len()]);
        Ok(())
    }

    fn write_blocks(&mut self, start_lba: Lba, src: &[u8]) -> Result<(), Self::Error> {
        let offset = start_lba.0 as usize * self.block_size;
        if offset + src.len() > self.data.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                "write beyond end of device",
            ));
        }
        self.data[offset..offset + src.len()].copy_from_slice(src);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
