//! ISO 9660 Filesystem Library
//!
//! A `no_std` user-space implementation of the ISO 9660 (ECMA-119)
//! optical-disc filesystem, reading and writing disc images without a
//! host-OS mount.
//!
//! # Overview
//!
//! ISO 9660 is the standard filesystem for CD-ROMs and DVDs. This crate
//! provides:
//! - Volume descriptor parsing and synthesis (Primary, Supplementary,
//!   Enhanced, Boot Record, Partition, Terminator)
//! - Directory tree navigation via records or path tables
//! - File reading from extent-based storage
//! - Image synthesis with deterministic block layout
//! - Joliet (Unicode names) and Rock Ridge (POSIX metadata, symlinks,
//!   long names) extensions, including SUSP continuation areas
//!
//! # Architecture
//!
//! The implementation is layered:
//! 1. **Codec layer** - dual-endian integers, dates, identifier
//!    character sets
//! 2. **Medium layer** - sector-addressed storage behind one trait
//! 3. **Structure layer** - directory records, path tables, volume
//!    descriptors, SUSP entries
//! 4. **Filesystem layer** - path resolution, enumeration, extent
//!    streaming, and the write-side layout planner
//!
//! # Reading
//!
//! ```ignore
//! use isofs::{IsoFilesystem, MemoryMedium, ReadPolicy};
//!
//! let medium = MemoryMedium::from_bytes(image_bytes, 2048)?;
//! let mut fs = IsoFilesystem::open(medium, ReadPolicy::default())?;
//! let entry = fs.entry("/boot/grub.cfg")?;
//! let content = fs.read_file(&entry)?.read_to_end()?;
//! ```
//!
//! # Writing
//!
//! ```ignore
//! use isofs::{IsoWriter, MemoryMedium, SliceSource, WriterOptions};
//!
//! let mut medium = MemoryMedium::new(2048)?;
//! let mut writer = IsoWriter::new(WriterOptions {
//!     volume_identifier: "DATA".into(),
//!     ..WriterOptions::default()
//! });
//! writer.add_file("/hello.txt", 5, None)?;
//! writer.write_and_close(&mut medium, |_| Ok(SliceSource::new(b"hello")))?;
//! ```

#![no_std]
#![warn(missing_docs)]

extern crate alloc;

pub mod directory;
pub mod error;
pub mod fs;
pub mod medium;
pub mod susp;
pub mod types;
pub mod utils;
pub mod volume;
pub mod write;

pub use error::{IsoError, Result};

// High-level API exports
pub use fs::{EntryMetadata, FileReader, FsEntry, IsoFilesystem, LookupStrategy, ReadPolicy};
pub use medium::{BlockIoMedium, MemoryMedium, SectorMedium};
pub use write::{FileSource, IsoWriter, NodeMetadata, SliceSource, WriterOptions};
