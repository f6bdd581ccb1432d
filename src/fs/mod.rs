//! Filesystem read path
//!
//! Mounts a volume descriptor set off a sector medium, resolves paths
//! through directory records or the path table, enumerates directories
//! and streams file extents. Rock Ridge metadata is reassembled from
//! each record's SUSP area.

pub mod entry;
pub mod reader;

pub use entry::{EntryMetadata, FsEntry};
pub use reader::FileReader;

use crate::directory::path_table::{parse_table, PathTableEndian, PathTableRecord};
use crate::directory::record::{DirectoryRecord, RecordIdentifier};
use crate::error::{IsoError, Result};
use crate::medium::{check_block_size, read_block, read_bytes, SectorMedium};
use crate::susp::area::SuspArea;
use crate::susp::rock_ridge::{self, RockRidgeData};
use crate::utils::strings::strip_version;
use crate::volume::{self, VolumeDescriptor, VolumeDirectoryDescriptor};
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

/// How paths are resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LookupStrategy {
    /// Walk directory extents record by record
    #[default]
    DirectoryRecords,
    /// Walk the Type L path table, falling back to the parent extent
    /// for final file components
    PathTable,
}

/// Which descriptor a filesystem reads through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadPolicy {
    /// The Primary descriptor
    Primary(LookupStrategy),
    /// The first Supplementary descriptor
    Supplementary(LookupStrategy),
    /// The first Enhanced descriptor
    Enhanced(LookupStrategy),
    /// Primary if its root carries SUSP data, else Supplementary, else
    /// Enhanced, else Primary
    Any(LookupStrategy),
}

impl Default for ReadPolicy {
    fn default() -> Self {
        Self::Any(LookupStrategy::default())
    }
}

impl ReadPolicy {
    /// The lookup strategy this policy carries
    pub fn strategy(&self) -> LookupStrategy {
        match self {
            Self::Primary(s) | Self::Supplementary(s) | Self::Enhanced(s) | Self::Any(s) => *s,
        }
    }
}

/// Upper bound on continuations followed per SUSP area
const MAX_CONTINUATIONS: usize = 64;

/// A mounted ISO 9660 filesystem
pub struct IsoFilesystem<M: SectorMedium> {
    medium: M,
    descriptors: Vec<VolumeDescriptor>,
    active: VolumeDirectoryDescriptor,
    policy: ReadPolicy,
}

impl<M: SectorMedium> IsoFilesystem<M> {
    /// Mount a filesystem, selecting the descriptor the policy asks for
    pub fn open(mut medium: M, policy: ReadPolicy) -> Result<Self> {
        let descriptors = volume::discover(&mut medium)?;
        let active = select_descriptor(&mut medium, &descriptors, policy)?;
        check_block_size(&medium, active.logical_block_size as u32)?;
        log::debug!(
            "mounted volume {:?} via {:?}",
            active.volume_identifier,
            policy
        );
        Ok(Self {
            medium,
            descriptors,
            active,
            policy,
        })
    }

    /// All descriptors found on the volume
    pub fn descriptors(&self) -> &[VolumeDescriptor] {
        &self.descriptors
    }

    /// The descriptor paths are resolved against
    pub fn active_descriptor(&self) -> &VolumeDirectoryDescriptor {
        &self.active
    }

    /// Volume identifier of the active descriptor
    pub fn volume_identifier(&self) -> &str {
        &self.active.volume_identifier
    }

    /// Logical block size of the active descriptor
    pub fn logical_block_size(&self) -> u32 {
        self.active.logical_block_size as u32
    }

    /// Volume space size in blocks
    pub fn volume_space_size(&self) -> u32 {
        self.active.volume_space_size
    }

    /// Whether the Primary root carries SUSP data
    pub fn has_rock_ridge(&mut self) -> Result<bool> {
        let primary = self
            .descriptors
            .iter()
            .find_map(|d| match d {
                VolumeDescriptor::Primary(p) => Some(p.clone()),
                _ => None,
            })
            .ok_or(IsoError::InvalidImage)?;
        primary_root_has_susp(&mut self.medium, &primary)
    }

    /// Resolve a path to an entry
    pub fn entry(&mut self, path: &str) -> Result<FsEntry> {
        let components: Vec<String> = path
            .split('/')
            .filter(|c| !c.is_empty())
            .map(String::from)
            .collect();
        if components.is_empty() {
            return Ok(self.root_entry());
        }
        match self.policy.strategy() {
            LookupStrategy::DirectoryRecords => self.resolve_with_records(&components),
            LookupStrategy::PathTable => self.resolve_with_path_table(&components),
        }
    }

    /// Enumerate the entries of a directory, excluding `.` and `..`
    pub fn list(&mut self, path: &str) -> Result<Vec<FsEntry>> {
        let entry = self.entry(path)?;
        if !entry.is_directory() {
            return Err(IsoError::InvalidPath);
        }
        let record = &entry.metadata().record;
        let (extent, length) = (record.extent_location, record.data_length);
        let entries = self.enumerate_extent(extent, length)?;
        Ok(entries
            .into_iter()
            .filter(|e| {
                !matches!(
                    e,
                    FsEntry::CurrentDirectory { .. } | FsEntry::ParentDirectory { .. }
                )
            })
            .collect())
    }

    /// Stream the content of a file entry
    pub fn read_file(&mut self, entry: &FsEntry) -> Result<FileReader<'_, M>> {
        let FsEntry::File { metadata, .. } = entry else {
            return Err(IsoError::InvalidArgument {
                name: "entry",
                message: "not a file",
            });
        };
        let block_size = self.active.logical_block_size as u32;
        Ok(FileReader::new(
            &mut self.medium,
            block_size,
            metadata.record.extent_location,
            metadata.record.data_length as u64,
        ))
    }

    /// Release the filesystem, handing the medium back
    pub fn into_medium(self) -> M {
        self.medium
    }

    fn root_entry(&self) -> FsEntry {
        FsEntry::Directory {
            name: String::from("/"),
            metadata: EntryMetadata {
                mode: None,
                uid: None,
                gid: None,
                links: None,
                created: None,
                modified: self.active.root_directory_record.recording_time,
                record: self.active.root_directory_record.clone(),
                policy: self.policy,
            },
        }
    }

    fn resolve_with_records(&mut self, components: &[String]) -> Result<FsEntry> {
        let mut current = self.root_entry();
        for (depth, component) in components.iter().enumerate() {
            let record = &current.metadata().record;
            if !current.is_directory() {
                return Err(IsoError::InvalidPath);
            }
            let (extent, length) = (record.extent_location, record.data_length);
            let entries = self.enumerate_extent(extent, length)?;
            let found = entries
                .into_iter()
                .find(|e| name_matches(e.name(), component))
                .ok_or(IsoError::InvalidPath)?;
            if depth + 1 < components.len() && !found.is_directory() {
                return Err(IsoError::InvalidPath);
            }
            current = found;
        }
        Ok(current)
    }

    fn resolve_with_path_table(&mut self, components: &[String]) -> Result<FsEntry> {
        let table = self.read_path_table()?;
        if table.is_empty() {
            return Err(IsoError::InvalidImage);
        }
        let encoding = self.active.encoding();

        // Directory numbers are 1-based record indices (ECMA-119 9.4).
        let mut target_parent: u16 = 1;
        for (depth, component) in components.iter().enumerate() {
            let is_last = depth + 1 == components.len();
            let found = table.iter().enumerate().find(|(_, record)| {
                record.parent_directory_number == target_parent
                    && !record.is_root()
                    && name_matches(&encoding.decode(record.identifier()), component)
            });
            match found {
                Some((index, record)) => {
                    if is_last {
                        let parent = &table[target_parent as usize - 1];
                        return self.directory_entry_from_parent(
                            parent.extent_location,
                            component,
                            record.extent_location,
                        );
                    }
                    target_parent = (index + 1) as u16;
                }
                None if is_last => {
                    // Not a directory: search the matched parent's
                    // extent for a file of that name.
                    let parent = &table[target_parent as usize - 1];
                    let extent = parent.extent_location;
                    let length = self.directory_extent_length(extent)?;
                    let entries = self.enumerate_extent(extent, length)?;
                    return entries
                        .into_iter()
                        .find(|e| name_matches(e.name(), component))
                        .ok_or(IsoError::InvalidPath);
                }
                None => return Err(IsoError::InvalidPath),
            }
        }
        Ok(self.root_entry())
    }

    /// Build the entry for a directory found in the path table by
    /// re-reading it from its parent's extent, so name, metadata and
    /// SUSP data come from the real record
    fn directory_entry_from_parent(
        &mut self,
        parent_extent: u32,
        component: &str,
        child_extent: u32,
    ) -> Result<FsEntry> {
        let length = self.directory_extent_length(parent_extent)?;
        let entries = self.enumerate_extent(parent_extent, length)?;
        entries
            .into_iter()
            .find(|e| {
                name_matches(e.name(), component)
                    && e.metadata().record.extent_location == child_extent
            })
            .ok_or(IsoError::InvalidPath)
    }

    /// Extent length of a directory, taken from its own `.` record
    fn directory_extent_length(&mut self, extent: u32) -> Result<u32> {
        let block_size = self.active.logical_block_size as u32;
        let mut block = vec![0u8; block_size as usize];
        read_block(&mut self.medium, block_size, extent as u64, &mut block)?;
        let record = DirectoryRecord::parse(&block)?;
        Ok(record.data_length)
    }

    fn read_path_table(&mut self) -> Result<Vec<PathTableRecord>> {
        let size = self.active.path_table_size as usize;
        let location = self.active.type_l_path_table;
        if size == 0 || location == 0 {
            return Err(IsoError::InvalidImage);
        }
        let block_size = self.active.logical_block_size as u64;
        let mut bytes = vec![0u8; size];
        read_bytes(&mut self.medium, location as u64 * block_size, &mut bytes)?;
        parse_table(&bytes, PathTableEndian::Little)
    }

    fn enumerate_extent(&mut self, extent: u32, length: u32) -> Result<Vec<FsEntry>> {
        let records = walk_directory_extent(
            &mut self.medium,
            self.active.logical_block_size as u32,
            extent,
            length,
        )?;
        let mut entries = Vec::with_capacity(records.len());
        for record in records {
            entries.push(self.build_entry(record)?);
        }
        Ok(entries)
    }

    fn build_entry(&mut self, record: DirectoryRecord) -> Result<FsEntry> {
        let rr = collect_rock_ridge(
            &mut self.medium,
            self.active.logical_block_size as u32,
            &record,
        )?;
        let metadata = EntryMetadata {
            mode: rr.mode,
            uid: rr.uid,
            gid: rr.gid,
            links: rr.links,
            created: rr.created,
            modified: rr.modified.or(record.recording_time),
            record: record.clone(),
            policy: self.policy,
        };
        let identifier = record.decoded_identifier(self.active.encoding());
        Ok(match identifier {
            RecordIdentifier::Current => FsEntry::CurrentDirectory { metadata },
            RecordIdentifier::Parent => FsEntry::ParentDirectory { metadata },
            RecordIdentifier::Directory(decoded) => FsEntry::Directory {
                name: rr.alternate_name.unwrap_or(decoded),
                metadata,
            },
            RecordIdentifier::File(decoded) => {
                let name = rr.alternate_name.unwrap_or(decoded);
                match rr.symlink_target {
                    Some(target) => FsEntry::Symlink {
                        name,
                        target,
                        metadata,
                    },
                    None => FsEntry::File {
                        name,
                        size: record.data_length as u64,
                        metadata,
                    },
                }
            }
        })
    }
}

fn name_matches(entry_name: &str, component: &str) -> bool {
    entry_name == component || strip_version(entry_name) == component
}

fn select_descriptor<M: SectorMedium>(
    medium: &mut M,
    descriptors: &[VolumeDescriptor],
    policy: ReadPolicy,
) -> Result<VolumeDirectoryDescriptor> {
    let primary = descriptors.iter().find_map(|d| match d {
        VolumeDescriptor::Primary(p) => Some(p),
        _ => None,
    });
    let supplementary = descriptors.iter().find_map(|d| match d {
        VolumeDescriptor::Supplementary(s) => Some(s),
        _ => None,
    });
    let enhanced = descriptors.iter().find_map(|d| match d {
        VolumeDescriptor::Enhanced(e) => Some(e),
        _ => None,
    });

    let missing = |name: &'static str| IsoError::InvalidArgument {
        name: "policy",
        message: name,
    };

    Ok(match policy {
        ReadPolicy::Primary(_) => primary.ok_or(IsoError::InvalidImage)?.clone(),
        ReadPolicy::Supplementary(_) => supplementary
            .ok_or(missing("image has no supplementary descriptor"))?
            .clone(),
        ReadPolicy::Enhanced(_) => enhanced
            .ok_or(missing("image has no enhanced descriptor"))?
            .clone(),
        ReadPolicy::Any(_) => {
            let primary = primary.ok_or(IsoError::InvalidImage)?;
            if primary_root_has_susp(medium, primary)? {
                primary.clone()
            } else if let Some(supplementary) = supplementary {
                supplementary.clone()
            } else if let Some(enhanced) = enhanced {
                enhanced.clone()
            } else {
                primary.clone()
            }
        }
    })
}

/// Probe the Primary root extent for any record with SUSP entries
fn primary_root_has_susp<M: SectorMedium + ?Sized>(
    medium: &mut M,
    primary: &VolumeDirectoryDescriptor,
) -> Result<bool> {
    let root = &primary.root_directory_record;
    let records = walk_directory_extent(
        medium,
        primary.logical_block_size as u32,
        root.extent_location,
        root.data_length,
    )?;
    Ok(records
        .iter()
        .any(|record| !SuspArea::new(record.system_use()).is_empty()))
}

/// Walk a directory extent into its records
///
/// Records never cross block boundaries; a zero length byte advances to
/// the next block.
fn walk_directory_extent<M: SectorMedium + ?Sized>(
    medium: &mut M,
    block_size: u32,
    extent: u32,
    length: u32,
) -> Result<Vec<DirectoryRecord>> {
    let mut records = Vec::new();
    let mut block = vec![0u8; block_size as usize];
    let mut offset = 0usize;
    let mut cached: Option<u64> = None;
    while (offset as u32) < length {
        let block_index = offset as u64 / block_size as u64;
        let in_block = offset % block_size as usize;
        if cached != Some(block_index) {
            read_block(medium, block_size, extent as u64 + block_index, &mut block)?;
            cached = Some(block_index);
        }
        if block[in_block] == 0 {
            offset = (block_index as usize + 1) * block_size as usize;
            continue;
        }
        match DirectoryRecord::parse(&block[in_block..]) {
            Ok(record) => {
                offset += record.length();
                records.push(record);
            }
            Err(_) => {
                log::warn!(
                    "malformed directory record at block {} offset {}; stopping walk",
                    extent as u64 + block_index,
                    in_block
                );
                break;
            }
        }
    }
    Ok(records)
}

/// Reassemble a record's SUSP area and interpret its Rock Ridge data
fn collect_rock_ridge<M: SectorMedium + ?Sized>(
    medium: &mut M,
    block_size: u32,
    record: &DirectoryRecord,
) -> Result<RockRidgeData> {
    if record.system_use().is_empty() {
        return Ok(RockRidgeData::default());
    }
    let mut area = SuspArea::new(record.system_use());
    let mut hops = 0;
    while let Some((block, offset, length)) = area.next_continuation() {
        hops += 1;
        if hops > MAX_CONTINUATIONS {
            log::warn!("SUSP continuation chain exceeds {MAX_CONTINUATIONS} hops; truncating");
            break;
        }
        let mut bytes = vec![0u8; length as usize];
        read_bytes(
            medium,
            block as u64 * block_size as u64 + offset as u64,
            &mut bytes,
        )?;
        if !area.add_continuation(&bytes) {
            break;
        }
    }
    Ok(rock_ridge::interpret(&area.entries()))
}
