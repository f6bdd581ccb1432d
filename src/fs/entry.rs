//! Filesystem entries returned by the read path

use super::ReadPolicy;
use crate::directory::record::DirectoryRecord;
use crate::utils::datetime::RecordDateTime;
use alloc::string::String;

/// POSIX-level metadata attached to every entry
///
/// The optional fields are populated from Rock Ridge entries when the
/// record carries them. The originating directory record is retained
/// for extent location and size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryMetadata {
    /// File mode bits
    pub mode: Option<u32>,

    /// Owner uid
    pub uid: Option<u32>,

    /// Owner gid
    pub gid: Option<u32>,

    /// Link count
    pub links: Option<u32>,

    /// Creation time
    pub created: Option<RecordDateTime>,

    /// Modification time
    pub modified: Option<RecordDateTime>,

    /// The on-disc directory record this entry was built from
    pub record: DirectoryRecord,

    /// The policy that resolved this entry
    pub policy: ReadPolicy,
}

/// One entry of the filesystem
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsEntry {
    /// A regular file
    File {
        /// Name as presented by the active descriptor
        name: String,
        /// File size in bytes
        size: u64,
        /// Metadata
        metadata: EntryMetadata,
    },
    /// A directory
    Directory {
        /// Name as presented by the active descriptor
        name: String,
        /// Metadata
        metadata: EntryMetadata,
    },
    /// A symbolic link (Rock Ridge)
    Symlink {
        /// Name as presented by the active descriptor
        name: String,
        /// Link target path
        target: String,
        /// Metadata
        metadata: EntryMetadata,
    },
    /// The `.` entry of a directory
    CurrentDirectory {
        /// Metadata
        metadata: EntryMetadata,
    },
    /// The `..` entry of a directory
    ParentDirectory {
        /// Metadata
        metadata: EntryMetadata,
    },
}

impl FsEntry {
    /// Entry name; `.` and `..` for the synthetic entries
    pub fn name(&self) -> &str {
        match self {
            Self::File { name, .. }
            | Self::Directory { name, .. }
            | Self::Symlink { name, .. } => name,
            Self::CurrentDirectory { .. } => ".",
            Self::ParentDirectory { .. } => "..",
        }
    }

    /// Metadata of the entry
    pub fn metadata(&self) -> &EntryMetadata {
        match self {
            Self::File { metadata, .. }
            | Self::Directory { metadata, .. }
            | Self::Symlink { metadata, .. }
            | Self::CurrentDirectory { metadata }
            | Self::ParentDirectory { metadata } => metadata,
        }
    }

    /// Whether the entry enumerates as a directory
    pub fn is_directory(&self) -> bool {
        matches!(
            self,
            Self::Directory { .. } | Self::CurrentDirectory { .. } | Self::ParentDirectory { .. }
        )
    }

    /// File size; zero for non-files
    pub fn size(&self) -> u64 {
        match self {
            Self::File { size, .. } => *size,
            _ => 0,
        }
    }
}
