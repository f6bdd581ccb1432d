//! Filesystem write path
//!
//! Collects a tree of directories, files and symlinks, then lays the
//! whole image out and emits it in one pass. File bytes are pulled
//! through a caller-supplied stream per file, so nothing larger than a
//! block is buffered.
//!
//! # Usage
//!
//! ```ignore
//! use isofs::write::{IsoWriter, SliceSource, WriterOptions};
//!
//! let mut writer = IsoWriter::new(WriterOptions {
//!     volume_identifier: "DATA".into(),
//!     ..WriterOptions::default()
//! });
//! writer.add_directory("/A", None)?;
//! writer.add_file("/A/HELLO.TXT", 5, None)?;
//! writer.write_and_close(&mut medium, |_path| Ok(SliceSource::new(b"hello")))?;
//! ```

pub mod layout;
pub mod names;
pub mod tree;

pub use tree::NodeMetadata;

use crate::error::{IsoError, Result};
use crate::medium::SectorMedium;
use crate::utils::datetime::RecordDateTime;
use alloc::string::String;
use tree::WriteTree;

/// A pull stream producing one file's content during emission
pub trait FileSource {
    /// Read up to `buf.len()` bytes; 0 means end of stream
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;
}

/// A [`FileSource`] over an in-memory byte slice
pub struct SliceSource<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> SliceSource<'a> {
    /// Wrap a byte slice
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }
}

impl FileSource for SliceSource<'_> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let remaining = &self.data[self.position..];
        let count = buf.len().min(remaining.len());
        buf[..count].copy_from_slice(&remaining[..count]);
        self.position += count;
        Ok(count)
    }
}

/// Options controlling image synthesis
#[derive(Debug, Clone)]
pub struct WriterOptions {
    /// Volume identifier (d-characters, required)
    pub volume_identifier: String,

    /// Logical block size (power of two, 2048..=32768, at most the
    /// medium's sector size)
    pub block_size: u32,

    /// Emit a Joliet Supplementary descriptor
    pub include_supplementary: bool,

    /// Emit an Enhanced (UTF-8) descriptor
    pub include_enhanced: bool,

    /// Attach Rock Ridge trailers to the Primary descriptor's records
    pub enable_susp: bool,

    /// Also emit the optional path table copies
    pub create_optional_path_tables: bool,

    /// uid recorded when a node carries none
    pub default_uid: u32,

    /// gid recorded when a node carries none
    pub default_gid: u32,

    /// Record and descriptor timestamp; `None` records unspecified
    /// dates
    pub timestamp: Option<RecordDateTime>,

    /// Write over a non-blank medium
    pub overwrite: bool,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            volume_identifier: String::new(),
            block_size: 2048,
            include_supplementary: true,
            include_enhanced: false,
            enable_susp: true,
            create_optional_path_tables: false,
            default_uid: 0,
            default_gid: 0,
            timestamp: None,
            overwrite: false,
        }
    }
}

/// Builder for a new ISO 9660 image
pub struct IsoWriter {
    tree: WriteTree,
    options: WriterOptions,
    closed: bool,
}

impl IsoWriter {
    /// Create a writer with the given options
    pub fn new(options: WriterOptions) -> Self {
        Self {
            tree: WriteTree::new(),
            options,
            closed: false,
        }
    }

    /// Add a directory; missing parents are created implicitly
    pub fn add_directory(&mut self, path: &str, metadata: Option<NodeMetadata>) -> Result<()> {
        self.check_open()?;
        self.tree
            .add_directory(path, metadata.unwrap_or_default())?;
        Ok(())
    }

    /// Add a file whose content will be pulled at emission time
    pub fn add_file(
        &mut self,
        path: &str,
        size: u64,
        metadata: Option<NodeMetadata>,
    ) -> Result<()> {
        self.check_open()?;
        self.tree.add_file(path, size, metadata.unwrap_or_default())?;
        Ok(())
    }

    /// Add a symbolic link (recorded via Rock Ridge on the Primary
    /// descriptor)
    pub fn add_symlink(
        &mut self,
        path: &str,
        target: &str,
        metadata: Option<NodeMetadata>,
    ) -> Result<()> {
        self.check_open()?;
        self.tree
            .add_symlink(path, target, metadata.unwrap_or_default())?;
        Ok(())
    }

    /// Lay out and emit the image, then sync the medium
    ///
    /// `source` is invoked exactly once per added file with its volume
    /// path and must yield exactly the declared byte count. The writer
    /// is closed whether or not emission succeeds; on error the medium
    /// content is undefined.
    pub fn write_and_close<M, S, F>(&mut self, medium: &mut M, source: F) -> Result<()>
    where
        M: SectorMedium,
        S: FileSource,
        F: FnMut(&str) -> Result<S>,
    {
        self.check_open()?;
        self.closed = true;
        layout::write_image(&self.tree, &self.options, medium, source)
    }

    fn check_open(&self) -> Result<()> {
        if self.closed {
            Err(IsoError::WriterClosed)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::medium::{MemoryMedium, SectorMedium};

    #[test]
    fn test_writer_closes() {
        let mut medium = MemoryMedium::new(2048).unwrap();
        let mut writer = IsoWriter::new(WriterOptions {
            volume_identifier: String::from("TEST"),
            ..WriterOptions::default()
        });
        writer.add_file("/A.TXT", 2, None).unwrap();
        writer
            .write_and_close(&mut medium, |_| Ok(SliceSource::new(b"hi")))
            .unwrap();
        assert_eq!(
            writer.add_file("/B.TXT", 1, None),
            Err(IsoError::WriterClosed)
        );
        assert_eq!(
            writer.write_and_close(&mut medium, |_| Ok(SliceSource::new(b""))),
            Err(IsoError::WriterClosed)
        );
    }

    #[test]
    fn test_missing_volume_identifier_is_rejected() {
        let mut medium = MemoryMedium::new(2048).unwrap();
        let mut writer = IsoWriter::new(WriterOptions::default());
        let result = writer.write_and_close(&mut medium, |_| Ok(SliceSource::new(b"")));
        assert!(matches!(
            result,
            Err(IsoError::InvalidIdentifier {
                field: "volume_identifier",
                ..
            })
        ));
    }

    #[test]
    fn test_non_blank_medium_is_refused() {
        let mut medium = MemoryMedium::new(2048).unwrap();
        let sector = alloc::vec![0xAAu8; 2048];
        medium.write_sector(0, &sector).unwrap();
        let mut writer = IsoWriter::new(WriterOptions {
            volume_identifier: String::from("TEST"),
            ..WriterOptions::default()
        });
        let result = writer.write_and_close(&mut medium, |_| Ok(SliceSource::new(b"")));
        assert!(matches!(result, Err(IsoError::PreconditionFailed(_))));
    }
}
