//! Layout planning and emission
//!
//! Assigns logical block addresses to directory extents, path tables
//! and file data so that every on-disc cross-reference resolves after a
//! single pass: record lengths are fixed first, child extents are
//! allocated bottom-up, and parent records are patched before anything
//! is serialized.

use super::names::{derive_extended_identifier, derive_legacy_name};
use super::tree::{NodeKind, WriteTree, ROOT};
use super::{FileSource, WriterOptions};
use crate::directory::path_table::{PathTableEndian, PathTableRecord};
use crate::directory::record::DirectoryRecord;
use crate::error::{IsoError, Result};
use crate::medium::{check_block_size, write_bytes, SectorMedium};
use crate::susp::area::emit_area;
use crate::susp::rock_ridge::{build_trailer, TrailerSpec};
use crate::types::{MAX_RECORD_LENGTH, SYSTEM_AREA_SECTORS};
use crate::utils::blocks_for;
use crate::utils::strings::{is_d_string, TextEncoding};
use crate::volume::{DescriptorKind, VolumeDescriptor, VolumeDirectoryDescriptor};
use alloc::collections::{BTreeMap, BTreeSet, VecDeque};
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

/// Largest logical block size the dual-endian u16 descriptor field can
/// carry
const MAX_BLOCK_SIZE: u32 = 32768;

enum RecordTarget {
    Current,
    Parent,
    Child(usize),
}

struct PlannedRecord {
    target: RecordTarget,
    record: DirectoryRecord,
}

struct DirPlan {
    node: usize,
    records: Vec<PlannedRecord>,
    extent_bytes: u32,
    lba: u32,
}

struct DescriptorPlan {
    kind: DescriptorKind,
    encoding: TextEncoding,
    dirs: Vec<DirPlan>,
    dir_index: BTreeMap<usize, usize>,
    names: BTreeMap<usize, Vec<u8>>,
    path_table: Vec<PathTableRecord>,
    path_table_size: u32,
    type_l_path_table: u32,
    type_m_path_table: u32,
    optional_type_l_path_table: u32,
    optional_type_m_path_table: u32,
}

struct FileAlloc {
    path: String,
    lba: u32,
    size: u64,
}

/// Plan the whole image and emit it onto the medium
pub(crate) fn write_image<M, S, F>(
    tree: &WriteTree,
    options: &WriterOptions,
    medium: &mut M,
    mut source: F,
) -> Result<()>
where
    M: SectorMedium,
    S: FileSource,
    F: FnMut(&str) -> Result<S>,
{
    check_block_size(medium, options.block_size)?;
    if options.block_size > MAX_BLOCK_SIZE {
        return Err(IsoError::InvalidLogicalBlockSize(options.block_size));
    }
    if !medium.is_blank() && !options.overwrite {
        return Err(IsoError::PreconditionFailed(
            "medium is not blank; set overwrite to replace it",
        ));
    }
    if options.volume_identifier.is_empty() || !is_d_string(&options.volume_identifier) {
        return Err(IsoError::InvalidIdentifier {
            field: "volume_identifier",
            value: options.volume_identifier.clone(),
        });
    }

    let block_size = options.block_size;
    let sector_size = medium.sector_size() as u64;

    let mut kinds = vec![DescriptorKind::Primary];
    if options.include_supplementary {
        kinds.push(DescriptorKind::Supplementary);
    }
    if options.include_enhanced {
        kinds.push(DescriptorKind::Enhanced);
    }
    let descriptor_sectors = kinds.len() as u64 + 1;

    // First block past the system area and the descriptor set.
    let mut cursor: u64 =
        (SYSTEM_AREA_SECTORS + descriptor_sectors) * sector_size / block_size as u64;

    let mut plans = Vec::with_capacity(kinds.len());
    for kind in kinds.iter().copied() {
        let mut plan = plan_descriptor(tree, kind, options)?;
        allocate_directories(&mut plan, tree, ROOT, &mut cursor, block_size);
        patch_directory_references(&mut plan, tree);
        plans.push(plan);
    }

    for plan in &mut plans {
        build_path_table(plan, tree)?;
        let table_blocks = blocks_for(plan.path_table_size as u64, block_size);
        plan.type_l_path_table = cursor as u32;
        cursor += table_blocks;
        plan.type_m_path_table = cursor as u32;
        cursor += table_blocks;
        if options.create_optional_path_tables {
            plan.optional_type_l_path_table = cursor as u32;
            cursor += table_blocks;
            plan.optional_type_m_path_table = cursor as u32;
            cursor += table_blocks;
        }
    }

    let mut file_lbas: BTreeMap<usize, u32> = BTreeMap::new();
    let mut file_allocs: Vec<FileAlloc> = Vec::new();
    allocate_files(tree, ROOT, block_size, &mut cursor, &mut file_lbas, &mut file_allocs);
    for plan in &mut plans {
        patch_file_references(plan, tree, &file_lbas);
    }

    let total_blocks = cursor as u32;
    log::debug!(
        "layout complete: {} descriptors, {} files, {} blocks",
        plans.len(),
        file_allocs.len(),
        total_blocks
    );

    // Descriptors, then the terminator.
    for (index, plan) in plans.iter().enumerate() {
        let descriptor = build_descriptor(plan, options, total_blocks);
        descriptor.validate()?;
        write_bytes(
            medium,
            (SYSTEM_AREA_SECTORS + index as u64) * sector_size,
            &descriptor.serialize(),
        )?;
    }
    write_bytes(
        medium,
        (SYSTEM_AREA_SECTORS + plans.len() as u64) * sector_size,
        &VolumeDescriptor::Terminator.serialize(),
    )?;

    // Directory extents.
    for plan in &plans {
        for dir in &plan.dirs {
            let bytes = serialize_extent(dir, block_size);
            write_bytes(medium, dir.lba as u64 * block_size as u64, &bytes)?;
        }
    }

    // Path tables.
    for plan in &plans {
        let mut little = Vec::with_capacity(plan.path_table_size as usize);
        let mut big = Vec::with_capacity(plan.path_table_size as usize);
        for record in &plan.path_table {
            record.serialize(PathTableEndian::Little, &mut little);
            record.serialize(PathTableEndian::Big, &mut big);
        }
        let block = block_size as u64;
        write_bytes(medium, plan.type_l_path_table as u64 * block, &little)?;
        write_bytes(medium, plan.type_m_path_table as u64 * block, &big)?;
        if options.create_optional_path_tables {
            write_bytes(medium, plan.optional_type_l_path_table as u64 * block, &little)?;
            write_bytes(medium, plan.optional_type_m_path_table as u64 * block, &big)?;
        }
    }

    // File data, via the caller's stream callback.
    for alloc in &file_allocs {
        stream_file(medium, block_size, alloc, &mut source)?;
    }

    medium.sync()
}

fn plan_descriptor(
    tree: &WriteTree,
    kind: DescriptorKind,
    options: &WriterOptions,
) -> Result<DescriptorPlan> {
    let susp = options.enable_susp && kind == DescriptorKind::Primary;
    let encoding = match kind {
        DescriptorKind::Primary => TextEncoding::Ascii,
        DescriptorKind::Supplementary => TextEncoding::Ucs2Be,
        DescriptorKind::Enhanced => TextEncoding::Utf8,
    };
    let mut plan = DescriptorPlan {
        kind,
        encoding,
        dirs: Vec::new(),
        dir_index: BTreeMap::new(),
        names: BTreeMap::new(),
        path_table: Vec::new(),
        path_table_size: 0,
        type_l_path_table: 0,
        type_m_path_table: 0,
        optional_type_l_path_table: 0,
        optional_type_m_path_table: 0,
    };
    plan_directory(tree, ROOT, susp, options, &mut plan)?;
    Ok(plan)
}

fn plan_directory(
    tree: &WriteTree,
    node_id: usize,
    susp: bool,
    options: &WriterOptions,
    plan: &mut DescriptorPlan,
) -> Result<()> {
    let node = tree.node(node_id);
    let parent = tree.node(node.parent);
    let mut records = Vec::new();

    let mut dot = DirectoryRecord::current(0, 0);
    dot.recording_time = node.metadata.modified.or(options.timestamp);
    if susp {
        attach_trailer(
            &mut dot,
            &TrailerSpec {
                is_directory: true,
                is_primary_root_dot: node_id == ROOT,
                mode: node.metadata.mode,
                links: node.metadata.links,
                uid: node.metadata.uid.unwrap_or(options.default_uid),
                gid: node.metadata.gid.unwrap_or(options.default_gid),
                created: node.metadata.created,
                modified: node.metadata.modified.or(options.timestamp),
                ..TrailerSpec::default()
            },
        )?;
    }
    records.push(PlannedRecord {
        target: RecordTarget::Current,
        record: dot,
    });

    let mut dotdot = DirectoryRecord::parent(0, 0);
    dotdot.recording_time = parent.metadata.modified.or(options.timestamp);
    if susp {
        attach_trailer(
            &mut dotdot,
            &TrailerSpec {
                is_directory: true,
                mode: parent.metadata.mode,
                links: parent.metadata.links,
                uid: parent.metadata.uid.unwrap_or(options.default_uid),
                gid: parent.metadata.gid.unwrap_or(options.default_gid),
                created: parent.metadata.created,
                modified: parent.metadata.modified.or(options.timestamp),
                ..TrailerSpec::default()
            },
        )?;
    }
    records.push(PlannedRecord {
        target: RecordTarget::Parent,
        record: dotdot,
    });

    let mut taken: BTreeSet<String> = BTreeSet::new();
    for child_id in tree.children(node_id) {
        let child = tree.node(child_id);
        let symlink_target = match &child.kind {
            NodeKind::Symlink { target } => Some(target.as_str()),
            _ => None,
        };
        if symlink_target.is_some() && !susp {
            // Without SUSP there is no way to record the target.
            continue;
        }
        let identifier = match plan.kind {
            DescriptorKind::Primary => {
                let legacy = derive_legacy_name(&child.name, child.is_directory(), &taken);
                taken.insert(legacy.clone());
                legacy.into_bytes()
            }
            _ => derive_extended_identifier(&child.name, plan.encoding),
        };
        plan.names.insert(child_id, identifier.clone());

        let mut record = DirectoryRecord::new(&identifier)?;
        record.recording_time = child.metadata.modified.or(options.timestamp);
        match &child.kind {
            NodeKind::Directory => record.flags.set_directory(),
            NodeKind::File { size } => record.data_length = *size as u32,
            NodeKind::Symlink { .. } => {}
        }
        if susp {
            attach_trailer(
                &mut record,
                &TrailerSpec {
                    is_directory: child.is_directory(),
                    is_primary_root_dot: false,
                    alternate_name: Some(&child.name),
                    symlink_target,
                    mode: child.metadata.mode,
                    links: child.metadata.links,
                    uid: child.metadata.uid.unwrap_or(options.default_uid),
                    gid: child.metadata.gid.unwrap_or(options.default_gid),
                    created: child.metadata.created,
                    modified: child.metadata.modified.or(options.timestamp),
                },
            )?;
        }
        records.push(PlannedRecord {
            target: RecordTarget::Child(child_id),
            record,
        });
    }

    let lengths: Vec<usize> = records.iter().map(|r| r.record.length()).collect();
    let (_, used) = pack_offsets(&lengths, options.block_size as usize);
    let extent_bytes =
        (blocks_for(used as u64, options.block_size) * options.block_size as u64) as u32;

    plan.dir_index.insert(node_id, plan.dirs.len());
    plan.dirs.push(DirPlan {
        node: node_id,
        records,
        extent_bytes,
        lba: 0,
    });

    for child_id in tree.children(node_id) {
        if tree.node(child_id).is_directory() {
            plan_directory(tree, child_id, susp, options, plan)?;
        }
    }
    Ok(())
}

/// Build a record's SUSP trailer; external continuations are not
/// allocated on write, so content that cannot fit the record is refused
fn attach_trailer(record: &mut DirectoryRecord, spec: &TrailerSpec<'_>) -> Result<()> {
    let entries = build_trailer(spec);
    let base = record.length();
    let budget = (MAX_RECORD_LENGTH - base) & !1;
    let layout = emit_area(&entries, budget, |_| {
        Err(IsoError::PreconditionFailed(
            "SUSP trailer exceeds the directory record budget",
        ))
    })?;
    record.set_system_use(Some(&layout.record_trailer))
}

/// Assign extent locations bottom-up so children precede their parents
fn allocate_directories(
    plan: &mut DescriptorPlan,
    tree: &WriteTree,
    node_id: usize,
    cursor: &mut u64,
    block_size: u32,
) {
    for child_id in tree.children(node_id) {
        if tree.node(child_id).is_directory() {
            allocate_directories(plan, tree, child_id, cursor, block_size);
        }
    }
    let index = plan.dir_index[&node_id];
    let dir = &mut plan.dirs[index];
    dir.lba = *cursor as u32;
    *cursor += blocks_for(dir.extent_bytes as u64, block_size);
}

fn patch_directory_references(plan: &mut DescriptorPlan, tree: &WriteTree) {
    let locations: BTreeMap<usize, (u32, u32)> = plan
        .dirs
        .iter()
        .map(|dir| (dir.node, (dir.lba, dir.extent_bytes)))
        .collect();
    for dir in &mut plan.dirs {
        let own = locations[&dir.node];
        let parent = locations[&tree.node(dir.node).parent];
        for planned in &mut dir.records {
            match planned.target {
                RecordTarget::Current => {
                    planned.record.extent_location = own.0;
                    planned.record.data_length = own.1;
                }
                RecordTarget::Parent => {
                    planned.record.extent_location = parent.0;
                    planned.record.data_length = parent.1;
                }
                RecordTarget::Child(child) => {
                    if let Some(&(lba, bytes)) = locations.get(&child) {
                        planned.record.extent_location = lba;
                        planned.record.data_length = bytes;
                    }
                }
            }
        }
    }
}

/// Path table records in breadth-first order, parents before children
fn build_path_table(plan: &mut DescriptorPlan, tree: &WriteTree) -> Result<()> {
    let root_index = plan.dir_index[&ROOT];
    let mut records = vec![PathTableRecord::root(plan.dirs[root_index].lba)];
    let mut numbers: BTreeMap<usize, u16> = BTreeMap::new();
    numbers.insert(ROOT, 1);
    let mut queue = VecDeque::from([ROOT]);
    while let Some(dir_id) = queue.pop_front() {
        for child_id in tree.children(dir_id) {
            if !tree.node(child_id).is_directory() {
                continue;
            }
            let identifier = &plan.names[&child_id];
            let lba = plan.dirs[plan.dir_index[&child_id]].lba;
            records.push(PathTableRecord::new(identifier, lba, numbers[&dir_id])?);
            numbers.insert(child_id, records.len() as u16);
            queue.push_back(child_id);
        }
    }
    plan.path_table_size = records.iter().map(|r| r.length() as u32).sum();
    plan.path_table = records;
    Ok(())
}

/// Assign file data blocks in tree order; records in every descriptor
/// view share one location per file
fn allocate_files(
    tree: &WriteTree,
    node_id: usize,
    block_size: u32,
    cursor: &mut u64,
    file_lbas: &mut BTreeMap<usize, u32>,
    file_allocs: &mut Vec<FileAlloc>,
) {
    for child_id in tree.children(node_id) {
        match &tree.node(child_id).kind {
            NodeKind::File { size } => {
                file_lbas.insert(child_id, *cursor as u32);
                file_allocs.push(FileAlloc {
                    path: tree.path_of(child_id),
                    lba: *cursor as u32,
                    size: *size,
                });
                *cursor += blocks_for(*size, block_size);
            }
            NodeKind::Directory => {
                allocate_files(tree, child_id, block_size, cursor, file_lbas, file_allocs);
            }
            NodeKind::Symlink { .. } => {}
        }
    }
}

fn patch_file_references(
    plan: &mut DescriptorPlan,
    tree: &WriteTree,
    file_lbas: &BTreeMap<usize, u32>,
) {
    for dir in &mut plan.dirs {
        for planned in &mut dir.records {
            if let RecordTarget::Child(child) = planned.target {
                if matches!(tree.node(child).kind, NodeKind::File { .. }) {
                    if let Some(&lba) = file_lbas.get(&child) {
                        planned.record.extent_location = lba;
                    }
                }
            }
        }
    }
}

fn build_descriptor(
    plan: &DescriptorPlan,
    options: &WriterOptions,
    total_blocks: u32,
) -> VolumeDirectoryDescriptor {
    let mut descriptor = VolumeDirectoryDescriptor::new(plan.kind);
    descriptor.volume_identifier = options.volume_identifier.clone();
    descriptor.logical_block_size = options.block_size as u16;
    descriptor.volume_space_size = total_blocks;
    descriptor.path_table_size = plan.path_table_size;
    descriptor.type_l_path_table = plan.type_l_path_table;
    descriptor.type_m_path_table = plan.type_m_path_table;
    descriptor.optional_type_l_path_table = plan.optional_type_l_path_table;
    descriptor.optional_type_m_path_table = plan.optional_type_m_path_table;
    match plan.kind {
        DescriptorKind::Primary => {}
        DescriptorKind::Supplementary => {
            descriptor.escape_sequences[..3].copy_from_slice(b"%/E");
        }
        DescriptorKind::Enhanced => {
            descriptor.escape_sequences[..3].copy_from_slice(b"%/G");
        }
    }
    let root = &plan.dirs[plan.dir_index[&ROOT]];
    descriptor.root_directory_record = DirectoryRecord::current(root.lba, root.extent_bytes);
    descriptor.root_directory_record.recording_time = options.timestamp;
    descriptor.creation_time = options.timestamp.map(|t| t.to_volume_datetime());
    descriptor.modification_time = descriptor.creation_time;
    descriptor
}

/// Offsets of records packed so none crosses a block boundary; returns
/// the offsets and the total bytes spanned
fn pack_offsets(lengths: &[usize], block_size: usize) -> (Vec<usize>, usize) {
    let mut offsets = Vec::with_capacity(lengths.len());
    let mut offset = 0usize;
    for &length in lengths {
        if offset % block_size + length > block_size {
            offset = (offset / block_size + 1) * block_size;
        }
        offsets.push(offset);
        offset += length;
    }
    (offsets, offset)
}

fn serialize_extent(dir: &DirPlan, block_size: u32) -> Vec<u8> {
    let lengths: Vec<usize> = dir.records.iter().map(|r| r.record.length()).collect();
    let (offsets, _) = pack_offsets(&lengths, block_size as usize);
    let mut out = vec![0u8; dir.extent_bytes as usize];
    for (planned, offset) in dir.records.iter().zip(offsets) {
        let bytes = planned.record.to_bytes();
        out[offset..offset + bytes.len()].copy_from_slice(&bytes);
    }
    out
}

fn stream_file<M, S, F>(
    medium: &mut M,
    block_size: u32,
    alloc: &FileAlloc,
    source: &mut F,
) -> Result<()>
where
    M: SectorMedium,
    S: FileSource,
    F: FnMut(&str) -> Result<S>,
{
    let mut stream = source(&alloc.path)?;
    let mut remaining = alloc.size;
    let mut block_index = 0u64;
    let mut buf = vec![0u8; block_size as usize];
    while remaining > 0 {
        let want = remaining.min(block_size as u64) as usize;
        let mut got = 0usize;
        while got < want {
            let count = stream.read(&mut buf[got..want])?;
            if count == 0 {
                return Err(IsoError::PreconditionFailed(
                    "file stream ended short of its declared size",
                ));
            }
            got += count;
        }
        buf[want..].fill(0);
        write_bytes(
            medium,
            (alloc.lba as u64 + block_index) * block_size as u64,
            &buf,
        )?;
        remaining -= want as u64;
        block_index += 1;
    }
    Ok(())
}
