//! SUSP entry codec
//!
//! Every entry is framed as `{signature(2), length(1), version(1),
//! payload}`. Unknown signatures are retained verbatim so foreign
//! extensions survive a round trip. `NM` and `SL` entries additionally
//! support splitting at byte boundaries so a logical value can span
//! continuation areas.

use crate::utils::datetime::{RecordDateTime, VolumeDateTime};
use crate::utils::endian::{both_u32, both_u64, read_both_u32, read_both_u64};
use alloc::vec::Vec;
use bitflags::bitflags;

/// Fixed header bytes of every entry
pub const ENTRY_HEADER_LENGTH: usize = 4;

bitflags! {
    /// Flags of an `NM` (alternate name) entry
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct NmFlags: u8 {
        /// Name continues in the next `NM` entry
        const CONTINUE = 0x01;
        /// Name refers to the current directory
        const CURRENT = 0x02;
        /// Name refers to the parent directory
        const PARENT = 0x04;
        /// Name is the host name of the system
        const HOST = 0x20;
    }
}

bitflags! {
    /// Flags of one `SL` symlink component record
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SlComponentFlags: u8 {
        /// Component continues in the next component record
        const CONTINUE = 0x01;
        /// Component is the current directory
        const CURRENT = 0x02;
        /// Component is the parent directory
        const PARENT = 0x04;
        /// Component is the root directory
        const ROOT = 0x08;
        /// Component is the volume root
        const VOLUME_ROOT = 0x10;
        /// Component is the host name of the system
        const HOST = 0x20;
    }
}

/// One component of a symlink target path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlComponent {
    /// Component flags
    pub flags: SlComponentFlags,
    /// Component bytes (empty for flag-only components)
    pub data: Vec<u8>,
}

impl SlComponent {
    /// A named component
    pub fn named(data: &[u8]) -> Self {
        Self {
            flags: SlComponentFlags::empty(),
            data: data.to_vec(),
        }
    }

    /// A flag-only component (`.`, `..`, root, ...)
    pub fn special(flags: SlComponentFlags) -> Self {
        Self {
            flags,
            data: Vec::new(),
        }
    }

    /// Serialized length: two header bytes plus the component bytes
    pub fn length(&self) -> usize {
        2 + self.data.len()
    }
}

/// One timestamp inside a `TF` entry, in either recording form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TfStamp {
    /// 7-byte directory record form
    Short(RecordDateTime),
    /// 17-byte volume descriptor form
    Long(VolumeDateTime),
}

impl TfStamp {
    fn to_short(self) -> RecordDateTime {
        match self {
            Self::Short(dt) => dt,
            Self::Long(dt) => dt.to_record_datetime(),
        }
    }

    fn to_long(self) -> VolumeDateTime {
        match self {
            Self::Short(dt) => dt.to_volume_datetime(),
            Self::Long(dt) => dt,
        }
    }
}

/// Decoded `TF` (timestamps) entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TfTimestamps {
    /// Whether stamps are recorded in the 17-byte long form
    pub long_form: bool,
    /// File creation
    pub creation: Option<TfStamp>,
    /// Last modification
    pub modification: Option<TfStamp>,
    /// Last access
    pub access: Option<TfStamp>,
    /// Last attribute change
    pub attribute_change: Option<TfStamp>,
    /// Last backup
    pub backup: Option<TfStamp>,
    /// Expiration
    pub expiration: Option<TfStamp>,
    /// Effective
    pub effective: Option<TfStamp>,
}

impl TfTimestamps {
    const SLOT_BITS: [u8; 7] = [0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40];

    fn slots(&self) -> [Option<TfStamp>; 7] {
        [
            self.creation,
            self.modification,
            self.access,
            self.attribute_change,
            self.backup,
            self.expiration,
            self.effective,
        ]
    }

    fn slots_mut(&mut self) -> [&mut Option<TfStamp>; 7] {
        [
            &mut self.creation,
            &mut self.modification,
            &mut self.access,
            &mut self.attribute_change,
            &mut self.backup,
            &mut self.expiration,
            &mut self.effective,
        ]
    }

    fn flags_byte(&self) -> u8 {
        let mut flags = if self.long_form { 0x80 } else { 0 };
        for (slot, bit) in self.slots().iter().zip(Self::SLOT_BITS) {
            if slot.is_some() {
                flags |= bit;
            }
        }
        flags
    }

    fn payload_length(&self) -> usize {
        let stamp_len = if self.long_form { 17 } else { 7 };
        1 + self.slots().iter().filter(|s| s.is_some()).count() * stamp_len
    }

    /// Fill slots this entry leaves absent from `other`, converting the
    /// stamp form where it differs
    pub fn fill_absent_from(&mut self, other: &TfTimestamps) {
        let long_form = self.long_form;
        for (slot, value) in self.slots_mut().into_iter().zip(other.slots()) {
            if slot.is_none() {
                *slot = value.map(|stamp| {
                    if long_form {
                        TfStamp::Long(stamp.to_long())
                    } else {
                        TfStamp::Short(stamp.to_short())
                    }
                });
            }
        }
    }
}

/// A System Use field entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuspEntry {
    /// `CE`: continuation area pointer
    Continuation {
        /// Block holding the continuation
        block: u32,
        /// Byte offset within the block
        offset: u32,
        /// Continuation length in bytes
        length: u32,
    },
    /// `PD`: padding
    Padding(Vec<u8>),
    /// `SP`: SUSP presence marker
    SharingProtocol {
        /// Bytes to skip at the start of each system use field
        skip: u8,
    },
    /// `ST`: terminator of the system use area
    Terminator,
    /// `PX`: POSIX file attributes
    PosixAttributes {
        /// File mode bits
        mode: u32,
        /// Link count
        links: u32,
        /// Owner user id
        uid: u32,
        /// Owner group id
        gid: u32,
        /// File serial number (44-byte form only)
        serial: Option<u32>,
    },
    /// `PN`: POSIX device numbers
    DeviceNumber {
        /// Major device number
        high: u32,
        /// Minor device number
        low: u32,
    },
    /// `SL`: symbolic link target
    Symlink {
        /// Target continues in the next `SL` entry
        continues: bool,
        /// Component records
        components: Vec<SlComponent>,
    },
    /// `NM`: alternate (POSIX) name
    AlternateName {
        /// Name flags
        flags: NmFlags,
        /// Name bytes
        name: Vec<u8>,
    },
    /// `TF`: timestamps
    Timestamps(TfTimestamps),
    /// `SF`: sparse file virtual size
    SparseFile {
        /// Virtual size of the expanded file
        virtual_size: u64,
    },
    /// `RR`: legacy Rock-Ridge-in-use marker
    RockRidge {
        /// Bit mask of entries recorded for this file
        flags: u8,
    },
    /// Any other signature, retained verbatim
    Other {
        /// Two-byte signature
        signature: [u8; 2],
        /// Entry version byte
        version: u8,
        /// Payload bytes
        payload: Vec<u8>,
    },
}

impl SuspEntry {
    /// Two-byte signature of this entry
    pub fn signature(&self) -> [u8; 2] {
        match self {
            Self::Continuation { .. } => *b"CE",
            Self::Padding(_) => *b"PD",
            Self::SharingProtocol { .. } => *b"SP",
            Self::Terminator => *b"ST",
            Self::PosixAttributes { .. } => *b"PX",
            Self::DeviceNumber { .. } => *b"PN",
            Self::Symlink { .. } => *b"SL",
            Self::AlternateName { .. } => *b"NM",
            Self::Timestamps(_) => *b"TF",
            Self::SparseFile { .. } => *b"SF",
            Self::RockRidge { .. } => *b"RR",
            Self::Other { signature, .. } => *signature,
        }
    }

    /// Total serialized length including the 4-byte header
    pub fn serialized_len(&self) -> usize {
        ENTRY_HEADER_LENGTH
            + match self {
                Self::Continuation { .. } => 24,
                Self::Padding(bytes) => bytes.len(),
                Self::SharingProtocol { .. } => 3,
                Self::Terminator => 0,
                Self::PosixAttributes { serial, .. } => {
                    if serial.is_some() {
                        40
                    } else {
                        32
                    }
                }
                Self::DeviceNumber { .. } => 16,
                Self::Symlink { components, .. } => {
                    1 + components.iter().map(SlComponent::length).sum::<usize>()
                }
                Self::AlternateName { name, .. } => 1 + name.len(),
                Self::Timestamps(stamps) => stamps.payload_length(),
                Self::SparseFile { .. } => 16,
                Self::RockRidge { .. } => 1,
                Self::Other { payload, .. } => payload.len(),
            }
    }

    /// Append the serialized entry to `out`
    pub fn serialize(&self, out: &mut Vec<u8>) {
        let signature = self.signature();
        out.extend_from_slice(&signature);
        out.push(self.serialized_len() as u8);
        out.push(match self {
            Self::Other { version, .. } => *version,
            _ => 1,
        });
        match self {
            Self::Continuation {
                block,
                offset,
                length,
            } => {
                out.extend_from_slice(&both_u32(*block));
                out.extend_from_slice(&both_u32(*offset));
                out.extend_from_slice(&both_u32(*length));
            }
            Self::Padding(bytes) => out.extend_from_slice(bytes),
            Self::SharingProtocol { skip } => {
                out.extend_from_slice(&[0xBE, 0xEF]);
                out.push(*skip);
            }
            Self::Terminator => {}
            Self::PosixAttributes {
                mode,
                links,
                uid,
                gid,
                serial,
            } => {
                out.extend_from_slice(&both_u32(*mode));
                out.extend_from_slice(&both_u32(*links));
                out.extend_from_slice(&both_u32(*uid));
                out.extend_from_slice(&both_u32(*gid));
                if let Some(serial) = serial {
                    out.extend_from_slice(&both_u32(*serial));
                }
            }
            Self::DeviceNumber { high, low } => {
                out.extend_from_slice(&both_u32(*high));
                out.extend_from_slice(&both_u32(*low));
            }
            Self::Symlink {
                continues,
                components,
            } => {
                out.push(if *continues { 0x01 } else { 0x00 });
                for component in components {
                    out.push(component.flags.bits());
                    out.push(component.data.len() as u8);
                    out.extend_from_slice(&component.data);
                }
            }
            Self::AlternateName { flags, name } => {
                out.push(flags.bits());
                out.extend_from_slice(name);
            }
            Self::Timestamps(stamps) => {
                out.push(stamps.flags_byte());
                for slot in stamps.slots().into_iter().flatten() {
                    if stamps.long_form {
                        out.extend_from_slice(&VolumeDateTime::encode(Some(&slot.to_long())));
                    } else {
                        out.extend_from_slice(&RecordDateTime::encode(Some(&slot.to_short())));
                    }
                }
            }
            Self::SparseFile { virtual_size } => {
                out.extend_from_slice(&both_u64(*virtual_size));
            }
            Self::RockRidge { flags } => out.push(*flags),
            Self::Other { payload, .. } => out.extend_from_slice(payload),
        }
    }

    /// Serialized form as a fresh vector
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.serialized_len());
        self.serialize(&mut out);
        out
    }

    fn parse_one(signature: [u8; 2], version: u8, payload: &[u8]) -> Self {
        match &signature {
            b"CE" if payload.len() >= 24 => Self::Continuation {
                block: read_both_u32(&payload[0..8]),
                offset: read_both_u32(&payload[8..16]),
                length: read_both_u32(&payload[16..24]),
            },
            b"PD" => Self::Padding(payload.to_vec()),
            b"SP" if payload.len() >= 3 && payload[0] == 0xBE && payload[1] == 0xEF => {
                Self::SharingProtocol { skip: payload[2] }
            }
            b"ST" => Self::Terminator,
            b"PX" if payload.len() >= 32 => Self::PosixAttributes {
                mode: read_both_u32(&payload[0..8]),
                links: read_both_u32(&payload[8..16]),
                uid: read_both_u32(&payload[16..24]),
                gid: read_both_u32(&payload[24..32]),
                serial: if payload.len() >= 40 {
                    Some(read_both_u32(&payload[32..40]))
                } else {
                    None
                },
            },
            b"PN" if payload.len() >= 16 => Self::DeviceNumber {
                high: read_both_u32(&payload[0..8]),
                low: read_both_u32(&payload[8..16]),
            },
            b"SL" if !payload.is_empty() => {
                let continues = payload[0] & 0x01 != 0;
                let mut components = Vec::new();
                let mut offset = 1;
                while offset + 2 <= payload.len() {
                    let flags = SlComponentFlags::from_bits_retain(payload[offset]);
                    let len = payload[offset + 1] as usize;
                    if offset + 2 + len > payload.len() {
                        log::warn!("SL component overruns entry; dropping tail");
                        break;
                    }
                    components.push(SlComponent {
                        flags,
                        data: payload[offset + 2..offset + 2 + len].to_vec(),
                    });
                    offset += 2 + len;
                }
                Self::Symlink {
                    continues,
                    components,
                }
            }
            b"NM" if !payload.is_empty() => Self::AlternateName {
                flags: NmFlags::from_bits_retain(payload[0]),
                name: payload[1..].to_vec(),
            },
            b"TF" if !payload.is_empty() => Self::Timestamps(Self::parse_tf(payload)),
            b"SF" if payload.len() >= 16 => Self::SparseFile {
                virtual_size: read_both_u64(&payload[0..16]),
            },
            b"RR" => Self::RockRidge {
                flags: payload.first().copied().unwrap_or(0),
            },
            _ => Self::Other {
                signature,
                version,
                payload: payload.to_vec(),
            },
        }
    }

    fn parse_tf(payload: &[u8]) -> TfTimestamps {
        let flags = payload[0];
        let long_form = flags & 0x80 != 0;
        let stamp_len = if long_form { 17 } else { 7 };
        let mut stamps = TfTimestamps {
            long_form,
            ..TfTimestamps::default()
        };
        let mut offset = 1;
        for (slot, bit) in stamps.slots_mut().into_iter().zip(TfTimestamps::SLOT_BITS) {
            if flags & bit == 0 {
                continue;
            }
            if offset + stamp_len > payload.len() {
                break;
            }
            let field = &payload[offset..offset + stamp_len];
            *slot = if long_form {
                let mut bytes = [0u8; 17];
                bytes.copy_from_slice(field);
                VolumeDateTime::decode(&bytes).map(TfStamp::Long)
            } else {
                let mut bytes = [0u8; 7];
                bytes.copy_from_slice(field);
                RecordDateTime::decode(&bytes).map(TfStamp::Short)
            };
            offset += stamp_len;
        }
        stamps
    }

    /// Parse a system-use region into entries
    ///
    /// Walking stops at a malformed length byte (shorter than the entry
    /// header or overrunning the region) and after an `ST` entry; the
    /// entries read so far are returned.
    pub fn parse_region(bytes: &[u8]) -> Vec<SuspEntry> {
        let mut entries = Vec::new();
        let mut offset = 0;
        while offset + ENTRY_HEADER_LENGTH <= bytes.len() {
            let length = bytes[offset + 2] as usize;
            if length < ENTRY_HEADER_LENGTH || offset + length > bytes.len() {
                if bytes[offset] != 0 {
                    log::trace!(
                        "stopping SUSP walk at malformed entry length {} (offset {})",
                        length,
                        offset
                    );
                }
                break;
            }
            let signature = [bytes[offset], bytes[offset + 1]];
            let version = bytes[offset + 3];
            let payload = &bytes[offset + ENTRY_HEADER_LENGTH..offset + length];
            let entry = Self::parse_one(signature, version, payload);
            let terminator = matches!(entry, Self::Terminator);
            entries.push(entry);
            if terminator {
                break;
            }
            offset += length;
        }
        entries
    }

    /// Split this entry so the first half serializes into at most
    /// `budget` bytes
    ///
    /// Only `NM` and `SL` entries are splittable; everything else
    /// returns `None`. On success, the concatenation of the two halves
    /// is semantically equivalent to the original entry.
    pub fn split_at(&self, budget: usize) -> Option<(SuspEntry, SuspEntry)> {
        match self {
            Self::AlternateName { flags, name } => Self::split_nm(*flags, name, budget),
            Self::Symlink {
                continues,
                components,
            } => Self::split_sl(*continues, components, budget),
            _ => None,
        }
    }

    fn split_nm(flags: NmFlags, name: &[u8], budget: usize) -> Option<(SuspEntry, SuspEntry)> {
        let usable = budget.checked_sub(5)?;
        if name.len() <= usable {
            let mut first_flags = flags;
            first_flags.remove(NmFlags::CONTINUE);
            return Some((
                Self::AlternateName {
                    flags: first_flags,
                    name: name.to_vec(),
                },
                Self::AlternateName {
                    flags,
                    name: Vec::new(),
                },
            ));
        }
        if usable == 0 {
            return None;
        }
        Some((
            Self::AlternateName {
                flags: flags | NmFlags::CONTINUE,
                name: name[..usable].to_vec(),
            },
            Self::AlternateName {
                flags,
                name: name[usable..].to_vec(),
            },
        ))
    }

    fn split_sl(
        continues: bool,
        components: &[SlComponent],
        budget: usize,
    ) -> Option<(SuspEntry, SuspEntry)> {
        let mut remaining = budget.checked_sub(5)?;
        let mut first = Vec::new();
        let mut second = Vec::new();
        let mut split_done = false;

        for component in components {
            if split_done {
                second.push(component.clone());
                continue;
            }
            if component.length() <= remaining {
                remaining -= component.length();
                first.push(component.clone());
                continue;
            }
            // Component does not fit whole: split it mid-data when there
            // is room for a shortened copy, else cut before it.
            if remaining >= 3 && !component.data.is_empty() {
                let take = (remaining - 2).min(component.data.len() - 1);
                first.push(SlComponent {
                    flags: component.flags | SlComponentFlags::CONTINUE,
                    data: component.data[..take].to_vec(),
                });
                second.push(SlComponent {
                    flags: component.flags,
                    data: component.data[take..].to_vec(),
                });
            } else {
                if first.is_empty() {
                    return None;
                }
                second.push(component.clone());
            }
            split_done = true;
        }

        Some((
            Self::Symlink {
                continues: true,
                components: first,
            },
            Self::Symlink {
                continues,
                components: second,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(entry: &SuspEntry) {
        let bytes = entry.to_bytes();
        assert_eq!(bytes.len(), entry.serialized_len());
        let parsed = SuspEntry::parse_region(&bytes);
        assert_eq!(parsed.len(), 1, "entry: {entry:?}");
        assert_eq!(&parsed[0], entry);
    }

    #[test]
    fn test_round_trips() {
        round_trip(&SuspEntry::Continuation {
            block: 21,
            offset: 0,
            length: 237,
        });
        round_trip(&SuspEntry::Padding(alloc::vec![0, 0, 0]));
        round_trip(&SuspEntry::SharingProtocol { skip: 0 });
        round_trip(&SuspEntry::PosixAttributes {
            mode: 0o100644,
            links: 1,
            uid: 1000,
            gid: 1000,
            serial: None,
        });
        round_trip(&SuspEntry::PosixAttributes {
            mode: 0o40755,
            links: 2,
            uid: 0,
            gid: 0,
            serial: Some(7),
        });
        round_trip(&SuspEntry::DeviceNumber { high: 8, low: 1 });
        round_trip(&SuspEntry::Symlink {
            continues: false,
            components: alloc::vec![
                SlComponent::special(SlComponentFlags::ROOT),
                SlComponent::named(b"usr"),
                SlComponent::special(SlComponentFlags::PARENT),
                SlComponent::named(b"lib"),
            ],
        });
        round_trip(&SuspEntry::AlternateName {
            flags: NmFlags::empty(),
            name: b"grub.cfg".to_vec(),
        });
        round_trip(&SuspEntry::SparseFile {
            virtual_size: 0x1_0000_0001,
        });
        round_trip(&SuspEntry::RockRidge { flags: 0x89 });
        round_trip(&SuspEntry::Other {
            signature: *b"ER",
            version: 1,
            payload: b"\x0A\x54\x87\x01RRIP_1991A".to_vec(),
        });
    }

    #[test]
    fn test_tf_round_trip() {
        let stamp = RecordDateTime {
            year: 126,
            month: 8,
            day: 2,
            hour: 12,
            minute: 0,
            second: 0,
            gmt_offset: 0,
        };
        round_trip(&SuspEntry::Timestamps(TfTimestamps {
            long_form: false,
            creation: Some(TfStamp::Short(stamp)),
            modification: Some(TfStamp::Short(stamp)),
            ..TfTimestamps::default()
        }));
        round_trip(&SuspEntry::Timestamps(TfTimestamps {
            long_form: true,
            access: Some(TfStamp::Long(stamp.to_volume_datetime())),
            ..TfTimestamps::default()
        }));
    }

    #[test]
    fn test_terminator_stops_parse() {
        let mut bytes = SuspEntry::Terminator.to_bytes();
        SuspEntry::PosixAttributes {
            mode: 0,
            links: 1,
            uid: 0,
            gid: 0,
            serial: None,
        }
        .serialize(&mut bytes);
        let parsed = SuspEntry::parse_region(&bytes);
        assert_eq!(parsed, alloc::vec![SuspEntry::Terminator]);
    }

    #[test]
    fn test_malformed_length_stops_parse() {
        let mut bytes = SuspEntry::SharingProtocol { skip: 0 }.to_bytes();
        bytes.extend_from_slice(&[b'P', b'X', 200, 1]); // overruns region
        let parsed = SuspEntry::parse_region(&bytes);
        assert_eq!(parsed, alloc::vec![SuspEntry::SharingProtocol { skip: 0 }]);
    }

    #[test]
    fn test_zero_tail_stops_parse() {
        let mut bytes = SuspEntry::RockRidge { flags: 0x81 }.to_bytes();
        bytes.push(0); // record even-length pad
        let parsed = SuspEntry::parse_region(&bytes);
        assert_eq!(parsed, alloc::vec![SuspEntry::RockRidge { flags: 0x81 }]);
    }

    #[test]
    fn test_nm_split() {
        let entry = SuspEntry::AlternateName {
            flags: NmFlags::empty(),
            name: b"network-configuration".to_vec(),
        };
        let (first, second) = entry.split_at(12).unwrap();
        assert!(first.serialized_len() <= 12);
        match (&first, &second) {
            (
                SuspEntry::AlternateName { flags: f1, name: n1 },
                SuspEntry::AlternateName { flags: f2, name: n2 },
            ) => {
                assert!(f1.contains(NmFlags::CONTINUE));
                assert!(!f2.contains(NmFlags::CONTINUE));
                assert_eq!(n1.len(), 7);
                let mut joined = n1.clone();
                joined.extend_from_slice(n2);
                assert_eq!(joined, b"network-configuration");
            }
            _ => panic!("expected NM halves"),
        }
    }

    #[test]
    fn test_nm_split_too_small() {
        let entry = SuspEntry::AlternateName {
            flags: NmFlags::empty(),
            name: b"name".to_vec(),
        };
        assert!(entry.split_at(5).is_none());
        assert!(entry.split_at(4).is_none());
    }

    #[test]
    fn test_sl_split_mid_component() {
        let entry = SuspEntry::Symlink {
            continues: false,
            components: alloc::vec![
                SlComponent::special(SlComponentFlags::ROOT),
                SlComponent::named(b"very-long-component-name"),
                SlComponent::named(b"tail"),
            ],
        };
        // Room for the root component and part of the long name.
        let (first, second) = entry.split_at(17).unwrap();
        assert!(first.serialized_len() <= 17);
        match (&first, &second) {
            (
                SuspEntry::Symlink {
                    continues: c1,
                    components: comps1,
                },
                SuspEntry::Symlink {
                    continues: c2,
                    components: comps2,
                },
            ) => {
                assert!(*c1);
                assert!(!*c2);
                assert_eq!(comps1.len(), 2);
                assert!(comps1[1].flags.contains(SlComponentFlags::CONTINUE));
                assert!(!comps2[0].flags.contains(SlComponentFlags::CONTINUE));
                let mut joined = comps1[1].data.clone();
                joined.extend_from_slice(&comps2[0].data);
                assert_eq!(joined, b"very-long-component-name");
                assert_eq!(comps2[1].data, b"tail");
            }
            _ => panic!("expected SL halves"),
        }
    }

    #[test]
    fn test_sl_split_cut_before_component() {
        let entry = SuspEntry::Symlink {
            continues: false,
            components: alloc::vec![
                SlComponent::named(b"abc"),
                SlComponent::special(SlComponentFlags::PARENT),
            ],
        };
        // Exactly room for the first component, none for the second.
        let (first, second) = entry.split_at(10).unwrap();
        match (&first, &second) {
            (
                SuspEntry::Symlink { components: c1, .. },
                SuspEntry::Symlink { components: c2, .. },
            ) => {
                assert_eq!(c1.len(), 1);
                assert_eq!(c2.len(), 1);
                assert!(c2[0].flags.contains(SlComponentFlags::PARENT));
            }
            _ => panic!("expected SL halves"),
        }
    }

    #[test]
    fn test_sl_split_impossible() {
        let entry = SuspEntry::Symlink {
            continues: false,
            components: alloc::vec![SlComponent::special(SlComponentFlags::PARENT)],
        };
        assert!(entry.split_at(6).is_none());
    }

    #[test]
    fn test_only_nm_and_sl_split() {
        let entry = SuspEntry::PosixAttributes {
            mode: 0,
            links: 1,
            uid: 0,
            gid: 0,
            serial: None,
        };
        assert!(entry.split_at(8).is_none());
    }
}
