//! File content streaming
//!
//! A restartable reader over one file extent, owning a single reusable
//! block buffer. Reads are block-aligned internally and never overrun
//! the recorded data length.

use crate::error::Result;
use crate::medium::{read_block, SectorMedium};
use alloc::vec;
use alloc::vec::Vec;

/// Buffered reader for streaming a file extent
pub struct FileReader<'a, M: SectorMedium + ?Sized> {
    medium: &'a mut M,
    block_size: u32,
    extent_location: u32,
    data_length: u64,
    position: u64,
    block_buf: Vec<u8>,
    cached_block: Option<u64>,
}

impl<'a, M: SectorMedium + ?Sized> FileReader<'a, M> {
    /// Create a reader over `[extent_location, extent_location +
    /// ceil(data_length / block_size))`, truncated to `data_length`
    pub fn new(
        medium: &'a mut M,
        block_size: u32,
        extent_location: u32,
        data_length: u64,
    ) -> Self {
        Self {
            medium,
            block_size,
            extent_location,
            data_length,
            position: 0,
            block_buf: vec![0u8; block_size as usize],
            cached_block: None,
        }
    }

    /// Read bytes from the current position
    ///
    /// Returns the number of bytes read; less than the buffer size only
    /// at end of file.
    pub fn read(&mut self, buffer: &mut [u8]) -> Result<usize> {
        if self.position >= self.data_length {
            return Ok(0);
        }
        let remaining = (self.data_length - self.position) as usize;
        let to_read = buffer.len().min(remaining);
        let block_size = self.block_size as u64;

        let mut bytes_read = 0;
        while bytes_read < to_read {
            let block_index = self.position / block_size;
            let offset_in_block = (self.position % block_size) as usize;
            if self.cached_block != Some(block_index) {
                read_block(
                    self.medium,
                    self.block_size,
                    self.extent_location as u64 + block_index,
                    &mut self.block_buf,
                )?;
                self.cached_block = Some(block_index);
            }
            let available = self.block_size as usize - offset_in_block;
            let chunk = available.min(to_read - bytes_read);
            buffer[bytes_read..bytes_read + chunk]
                .copy_from_slice(&self.block_buf[offset_in_block..offset_in_block + chunk]);
            bytes_read += chunk;
            self.position += chunk as u64;
        }
        Ok(bytes_read)
    }

    /// Read the remainder of the file into a vector
    pub fn read_to_end(&mut self) -> Result<Vec<u8>> {
        let mut out = vec![0u8; self.remaining() as usize];
        let mut filled = 0;
        while filled < out.len() {
            let count = self.read(&mut out[filled..])?;
            if count == 0 {
                break;
            }
            filled += count;
        }
        out.truncate(filled);
        Ok(out)
    }

    /// Seek to an absolute position (clamped to the file size)
    pub fn seek(&mut self, position: u64) {
        self.position = position.min(self.data_length);
    }

    /// Seek relative to the current position
    pub fn seek_relative(&mut self, offset: i64) {
        let position = if offset < 0 {
            self.position.saturating_sub(offset.unsigned_abs())
        } else {
            self.position.saturating_add(offset as u64)
        };
        self.position = position.min(self.data_length);
    }

    /// Current position
    pub fn position(&self) -> u64 {
        self.position
    }

    /// File size
    pub fn size(&self) -> u64 {
        self.data_length
    }

    /// Bytes left to read
    pub fn remaining(&self) -> u64 {
        self.data_length.saturating_sub(self.position)
    }

    /// Whether the reader is at end of file
    pub fn is_eof(&self) -> bool {
        self.position >= self.data_length
    }
}
