//! Hand-assembled image fixtures for the read path
//!
//! Builds small primary-only images block by block, so reader tests do
//! not depend on the writer under test.

use isofs::directory::record::DirectoryRecord;
use isofs::medium::MemoryMedium;
use isofs::volume::{DescriptorKind, VolumeDescriptor, VolumeDirectoryDescriptor};

pub const SECTOR: usize = 2048;

/// Byte-level builder for a primary-only test image
pub struct ImageBuilder {
    data: Vec<u8>,
}

impl ImageBuilder {
    /// A zeroed image of `total_sectors` sectors
    pub fn new(total_sectors: usize) -> Self {
        Self {
            data: vec![0u8; total_sectors * SECTOR],
        }
    }

    /// Copy bytes to an absolute offset
    pub fn put(&mut self, offset: usize, bytes: &[u8]) -> &mut Self {
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
        self
    }

    /// Copy bytes to the start of a sector
    pub fn put_sector(&mut self, sector: usize, bytes: &[u8]) -> &mut Self {
        self.put(sector * SECTOR, bytes)
    }

    /// Write a Primary descriptor at sector 16 and a terminator at 17
    pub fn descriptors(&mut self, volume_id: &str, root_lba: u32, root_len: u32) -> &mut Self {
        let mut pvd = VolumeDirectoryDescriptor::new(DescriptorKind::Primary);
        pvd.volume_identifier = volume_id.to_string();
        pvd.volume_space_size = (self.data.len() / SECTOR) as u32;
        pvd.root_directory_record = DirectoryRecord::current(root_lba, root_len);
        self.put_sector(16, &pvd.serialize());
        self.put_sector(17, &VolumeDescriptor::Terminator.serialize());
        self
    }

    /// Write a sequence of directory records as one extent
    pub fn directory(&mut self, lba: u32, records: &[DirectoryRecord]) -> &mut Self {
        let mut offset = lba as usize * SECTOR;
        for record in records {
            let bytes = record.to_bytes();
            self.put(offset, &bytes);
            offset += bytes.len();
        }
        self
    }

    /// Finish into a medium
    pub fn build(&self) -> MemoryMedium {
        MemoryMedium::from_bytes(self.data.clone(), SECTOR).expect("valid sector size")
    }
}

/// A 34-byte record for a named file
#[allow(dead_code)]
pub fn file_record(name: &[u8], extent: u32, size: u32) -> DirectoryRecord {
    let mut record = DirectoryRecord::new(name).expect("valid identifier");
    record.extent_location = extent;
    record.data_length = size;
    record
}

/// A record for a named subdirectory
#[allow(dead_code)]
pub fn dir_record(name: &[u8], extent: u32, size: u32) -> DirectoryRecord {
    let mut record = DirectoryRecord::new(name).expect("valid identifier");
    record.extent_location = extent;
    record.data_length = size;
    record.flags.set_directory();
    record
}
