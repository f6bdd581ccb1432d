//! Rock Ridge interpretation and synthesis
//!
//! Maps between compacted SUSP entry lists and the POSIX-level values
//! they carry: alternate names, symlink targets, ownership, modes and
//! timestamps.

use super::entry::{
    NmFlags, SlComponent, SlComponentFlags, SuspEntry, TfStamp, TfTimestamps,
};
use crate::utils::datetime::RecordDateTime;
use alloc::string::String;
use alloc::vec::Vec;

/// Default mode for directory records without an explicit one
pub const DEFAULT_DIRECTORY_MODE: u32 = 0o755;

/// Default mode for everything else
pub const DEFAULT_FILE_MODE: u32 = 0o644;

/// POSIX-level values recovered from a SUSP area
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RockRidgeData {
    /// Alternate (POSIX) name from `NM`
    pub alternate_name: Option<String>,

    /// Symlink target from `SL`
    pub symlink_target: Option<String>,

    /// File mode from `PX`
    pub mode: Option<u32>,

    /// Link count from `PX`
    pub links: Option<u32>,

    /// Owner uid from `PX`
    pub uid: Option<u32>,

    /// Owner gid from `PX`
    pub gid: Option<u32>,

    /// Creation time from `TF`
    pub created: Option<RecordDateTime>,

    /// Modification time from `TF`
    pub modified: Option<RecordDateTime>,

    /// Virtual size from `SF` (sparse files are recognized, not read)
    pub sparse_size: Option<u64>,
}

impl RockRidgeData {
    /// Whether any Rock Ridge value was present at all
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Interpret a compacted entry list
pub fn interpret(entries: &[SuspEntry]) -> RockRidgeData {
    let mut data = RockRidgeData::default();
    for entry in entries {
        match entry {
            SuspEntry::PosixAttributes {
                mode,
                links,
                uid,
                gid,
                ..
            } => {
                data.mode.get_or_insert(*mode);
                data.links.get_or_insert(*links);
                data.uid.get_or_insert(*uid);
                data.gid.get_or_insert(*gid);
            }
            SuspEntry::AlternateName { flags, name } => {
                if !flags.intersects(NmFlags::CURRENT | NmFlags::PARENT | NmFlags::HOST)
                    && data.alternate_name.is_none()
                {
                    data.alternate_name = Some(String::from_utf8_lossy(name).into_owned());
                }
            }
            SuspEntry::Symlink { components, .. } => {
                if data.symlink_target.is_none() {
                    data.symlink_target = Some(components_to_path(components));
                }
            }
            SuspEntry::Timestamps(stamps) => {
                if data.created.is_none() {
                    data.created = stamps.creation.map(stamp_to_short);
                }
                if data.modified.is_none() {
                    data.modified = stamps.modification.map(stamp_to_short);
                }
            }
            SuspEntry::SparseFile { virtual_size } => {
                data.sparse_size.get_or_insert(*virtual_size);
            }
            _ => {}
        }
    }
    data
}

fn stamp_to_short(stamp: TfStamp) -> RecordDateTime {
    match stamp {
        TfStamp::Short(dt) => dt,
        TfStamp::Long(dt) => dt.to_record_datetime(),
    }
}

/// Join `SL` components back into a target path
pub fn components_to_path(components: &[SlComponent]) -> String {
    let mut prefix = "";
    let mut parts: Vec<String> = Vec::new();
    for component in components {
        if component.flags.contains(SlComponentFlags::VOLUME_ROOT) {
            prefix = "//";
        } else if component.flags.contains(SlComponentFlags::ROOT) {
            prefix = "/";
        } else if component.flags.contains(SlComponentFlags::CURRENT) {
            parts.push(String::from("."));
        } else if component.flags.contains(SlComponentFlags::PARENT) {
            parts.push(String::from(".."));
        } else {
            parts.push(String::from_utf8_lossy(&component.data).into_owned());
        }
    }
    let mut path = String::from(prefix);
    path.push_str(&parts.join("/"));
    path
}

/// Break a target path into `SL` components
///
/// A leading `//` maps to the volume root, a single leading `/` to the
/// root; `.` and `..` components map to their flag-only forms.
pub fn path_to_components(target: &str) -> Vec<SlComponent> {
    let mut components = Vec::new();
    let rest = if let Some(rest) = target.strip_prefix("//") {
        components.push(SlComponent::special(SlComponentFlags::VOLUME_ROOT));
        rest
    } else if let Some(rest) = target.strip_prefix('/') {
        components.push(SlComponent::special(SlComponentFlags::ROOT));
        rest
    } else {
        target
    };
    for part in rest.split('/') {
        match part {
            "" => {}
            "." => components.push(SlComponent::special(SlComponentFlags::CURRENT)),
            ".." => components.push(SlComponent::special(SlComponentFlags::PARENT)),
            name => components.push(SlComponent::named(name.as_bytes())),
        }
    }
    components
}

/// Everything the writer needs to synthesize one record's trailer
#[derive(Debug, Clone, Default)]
pub struct TrailerSpec<'a> {
    /// Record describes a directory
    pub is_directory: bool,
    /// Record is the `.` entry of the primary root (gets the `SP`
    /// announcement)
    pub is_primary_root_dot: bool,
    /// Alternate name to record in `NM`
    pub alternate_name: Option<&'a str>,
    /// Symlink target to record in `SL`
    pub symlink_target: Option<&'a str>,
    /// Explicit mode; falls back to 0755/0644
    pub mode: Option<u32>,
    /// Explicit link count; falls back to 2 for directories, 1 else
    pub links: Option<u32>,
    /// Owner uid
    pub uid: u32,
    /// Owner gid
    pub gid: u32,
    /// Creation stamp for `TF`
    pub created: Option<RecordDateTime>,
    /// Modification stamp for `TF`
    pub modified: Option<RecordDateTime>,
}

/// Build the entry list for one directory record's trailer
pub fn build_trailer(spec: &TrailerSpec<'_>) -> Vec<SuspEntry> {
    let mut entries = Vec::new();
    if spec.is_primary_root_dot {
        entries.push(SuspEntry::SharingProtocol { skip: 0 });
    }
    let default_mode = if spec.is_directory {
        DEFAULT_DIRECTORY_MODE
    } else {
        DEFAULT_FILE_MODE
    };
    entries.push(SuspEntry::PosixAttributes {
        mode: spec.mode.unwrap_or(default_mode),
        links: spec
            .links
            .unwrap_or(if spec.is_directory { 2 } else { 1 }),
        uid: spec.uid,
        gid: spec.gid,
        serial: None,
    });
    if let Some(name) = spec.alternate_name {
        entries.push(SuspEntry::AlternateName {
            flags: NmFlags::empty(),
            name: name.as_bytes().to_vec(),
        });
    }
    if let Some(target) = spec.symlink_target {
        entries.push(SuspEntry::Symlink {
            continues: false,
            components: path_to_components(target),
        });
    }
    entries.push(SuspEntry::Timestamps(TfTimestamps {
        long_form: false,
        creation: spec.created.map(TfStamp::Short),
        modification: spec.modified.map(TfStamp::Short),
        ..TfTimestamps::default()
    }));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_path_components_round_trip() {
        for target in ["/a/../b", "//net/host", "plain", "../up/./here", "/"] {
            let components = path_to_components(target);
            assert_eq!(components_to_path(&components), *target, "{target}");
        }
    }

    #[test]
    fn test_interpret_trailer() {
        let spec = TrailerSpec {
            is_directory: false,
            alternate_name: Some("grub.cfg"),
            mode: Some(0o644),
            uid: 1000,
            gid: 1000,
            ..TrailerSpec::default()
        };
        let data = interpret(&build_trailer(&spec));
        assert_eq!(data.alternate_name.as_deref(), Some("grub.cfg"));
        assert_eq!(data.mode, Some(0o644));
        assert_eq!(data.uid, Some(1000));
        assert_eq!(data.links, Some(1));
        assert_eq!(data.symlink_target, None);
    }

    #[test]
    fn test_symlink_trailer() {
        let spec = TrailerSpec {
            symlink_target: Some("/a/../b"),
            ..TrailerSpec::default()
        };
        let data = interpret(&build_trailer(&spec));
        assert_eq!(data.symlink_target.as_deref(), Some("/a/../b"));
    }

    #[test]
    fn test_dot_alias_names_are_not_alternate_names() {
        let entries = vec![SuspEntry::AlternateName {
            flags: NmFlags::CURRENT,
            name: Vec::new(),
        }];
        assert_eq!(interpret(&entries).alternate_name, None);
    }
}
