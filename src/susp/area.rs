//! SUSP area assembly and emission
//!
//! A SUSP area is the logical concatenation of one directory record's
//! system-use trailer with zero or more continuation regions, each
//! announced by a `CE` entry in the region before it. Reading walks the
//! chain; writing splits a desired entry list across regions, splitting
//! individual `NM`/`SL` entries when they straddle a boundary.

use super::entry::{NmFlags, SuspEntry};
use crate::error::{IsoError, Result};
use crate::types::CE_ENTRY_LENGTH;
use alloc::collections::VecDeque;
use alloc::vec::Vec;

/// Coordinates of one continuation region
pub type ContinuationRef = (u32, u32, u32);

/// A SUSP area being assembled from a record trailer and its
/// continuation chain
#[derive(Debug, Clone)]
pub struct SuspArea {
    raw_entries: Vec<SuspEntry>,
    pending: Option<ContinuationRef>,
    complete: bool,
}

impl SuspArea {
    /// Start an area from a directory record's system-use trailer
    pub fn new(trailer: &[u8]) -> Self {
        let mut area = Self {
            raw_entries: Vec::new(),
            pending: None,
            complete: false,
        };
        area.ingest(trailer, None);
        area
    }

    /// Continuation to fetch next, if the area is not yet complete
    pub fn next_continuation(&self) -> Option<ContinuationRef> {
        if self.complete {
            None
        } else {
            self.pending
        }
    }

    /// Whether the whole chain has been ingested
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Whether nothing at all was parsed out of the area
    pub fn is_empty(&self) -> bool {
        self.raw_entries.is_empty()
    }

    /// Append the bytes read for the pending continuation
    ///
    /// Returns false if the area was already complete or the bytes
    /// parse to no entries at all.
    pub fn add_continuation(&mut self, bytes: &[u8]) -> bool {
        if self.complete || self.pending.is_none() {
            return false;
        }
        let source = self.pending.take();
        let before = self.raw_entries.len();
        self.ingest(bytes, source);
        if self.raw_entries.len() == before {
            self.complete = true;
            return false;
        }
        true
    }

    fn ingest(&mut self, bytes: &[u8], source: Option<ContinuationRef>) {
        let entries = SuspEntry::parse_region(bytes);
        let mut next = None;
        let mut terminated = false;
        for entry in &entries {
            match entry {
                SuspEntry::Terminator => {
                    terminated = true;
                    break;
                }
                SuspEntry::Continuation {
                    block,
                    offset,
                    length,
                } if next.is_none() => {
                    next = Some((*block, *offset, *length));
                }
                _ => {}
            }
        }
        self.raw_entries.extend(entries);
        if terminated {
            self.complete = true;
            return;
        }
        match next {
            Some(ce) if Some(ce) == source => {
                // A continuation naming its own coordinates would loop
                // forever; stop the chain here.
                log::warn!("SUSP continuation self-loop at block {}", ce.0);
                self.complete = true;
            }
            Some(ce) => self.pending = Some(ce),
            None => self.complete = true,
        }
    }

    /// Raw entries in chain order, including `CE`/`ST`/`PD`
    pub fn raw_entries(&self) -> &[SuspEntry] {
        &self.raw_entries
    }

    /// Canonical entry list (see [`compact`])
    pub fn entries(&self) -> Vec<SuspEntry> {
        compact(&self.raw_entries)
    }
}

/// Produce the canonical entry list of a complete area
///
/// Structural entries (`CE`, `ST`, `PD`) are dropped, fragmented `NM`
/// and `SL` values are reassembled, and at most one `TF` survives (the
/// first wins per timestamp slot, later ones fill absent slots only).
pub fn compact(entries: &[SuspEntry]) -> Vec<SuspEntry> {
    let mut out: Vec<SuspEntry> = Vec::new();
    let mut nm_index: Option<usize> = None;
    let mut nm_done = false;
    let mut sl_index: Option<usize> = None;
    let mut tf_index: Option<usize> = None;

    for entry in entries {
        match entry {
            SuspEntry::Continuation { .. }
            | SuspEntry::Terminator
            | SuspEntry::Padding(_) => {}

            SuspEntry::AlternateName { flags, name } => {
                if nm_done {
                    continue;
                }
                let terminal = !flags.contains(NmFlags::CONTINUE);
                match nm_index {
                    None => {
                        out.push(entry.clone());
                        nm_index = Some(out.len() - 1);
                    }
                    Some(index) => {
                        if let SuspEntry::AlternateName {
                            flags: merged_flags,
                            name: merged_name,
                        } = &mut out[index]
                        {
                            merged_name.extend_from_slice(name);
                            *merged_flags |= *flags;
                            if terminal {
                                merged_flags.remove(NmFlags::CONTINUE);
                            }
                        }
                    }
                }
                if terminal {
                    nm_done = true;
                }
            }

            SuspEntry::Symlink {
                continues,
                components,
            } => match sl_index {
                None => {
                    out.push(entry.clone());
                    sl_index = Some(out.len() - 1);
                }
                Some(index) => {
                    if let SuspEntry::Symlink {
                        continues: merged_continues,
                        components: merged,
                    } = &mut out[index]
                    {
                        for component in components {
                            let rejoin = merged.last().is_some_and(|last| {
                                last.flags
                                    .contains(super::entry::SlComponentFlags::CONTINUE)
                            });
                            if rejoin {
                                let mut split_head = merged.pop().unwrap_or_else(|| unreachable!());
                                split_head.data.extend_from_slice(&component.data);
                                split_head.flags = component.flags;
                                merged.push(split_head);
                            } else {
                                merged.push(component.clone());
                            }
                        }
                        *merged_continues = *continues;
                    }
                }
            },

            SuspEntry::Timestamps(stamps) => match tf_index {
                None => {
                    out.push(entry.clone());
                    tf_index = Some(out.len() - 1);
                }
                Some(index) => {
                    if let SuspEntry::Timestamps(merged) = &mut out[index] {
                        merged.fill_absent_from(stamps);
                    }
                }
            },

            _ => out.push(entry.clone()),
        }
    }
    out
}

/// One continuation allocation handed back by the layout planner
#[derive(Debug, Clone, Copy)]
pub struct ContinuationGrant {
    /// Block the region may be written to
    pub block: u32,
    /// Byte offset within the block
    pub offset: u32,
    /// Usable size, at least the requested size
    pub granted: usize,
}

/// Serialized SUSP area split across the in-record trailer and any
/// allocated continuations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuspAreaLayout {
    /// Bytes for the directory record's system-use trailer
    pub record_trailer: Vec<u8>,
    /// `(block, offset, bytes)` for each continuation region
    pub continuations: Vec<(u32, u32, Vec<u8>)>,
}

struct Region {
    entries: Vec<SuspEntry>,
    target: Option<(u32, u32)>,
}

/// Serialize `entries` into the record trailer and as many continuation
/// regions as needed
///
/// `first_budget` is the free tail of the directory record. When the
/// content fits there, `alloc` is never invoked. Otherwise each full
/// region ends with a `CE` naming the next region's coordinates, and
/// `alloc` is asked for the total bytes still owed; it may grant more,
/// which caps the next region.
pub fn emit_area<A>(
    entries: &[SuspEntry],
    first_budget: usize,
    mut alloc: A,
) -> Result<SuspAreaLayout>
where
    A: FnMut(usize) -> Result<ContinuationGrant>,
{
    let total: usize = entries.iter().map(SuspEntry::serialized_len).sum();
    if total <= first_budget {
        let mut trailer = Vec::with_capacity(total);
        for entry in entries {
            entry.serialize(&mut trailer);
        }
        return Ok(SuspAreaLayout {
            record_trailer: trailer,
            continuations: Vec::new(),
        });
    }

    let mut queue: VecDeque<SuspEntry> = entries.iter().cloned().collect();
    let mut regions: Vec<Region> = Vec::new();
    let mut budget = first_budget;

    while !queue.is_empty() {
        let mut region = Vec::new();
        let mut used = 0usize;
        while let Some(front) = queue.front() {
            let entry_len = front.serialized_len();
            if used + entry_len + CE_ENTRY_LENGTH <= budget {
                used += entry_len;
                region.push(queue.pop_front().unwrap_or_else(|| unreachable!()));
                continue;
            }
            if queue.len() == 1 && used + entry_len <= budget {
                // Final entry: no CE will follow, so the reserve is free.
                region.push(queue.pop_front().unwrap_or_else(|| unreachable!()));
                continue;
            }
            let room = (budget - used).saturating_sub(CE_ENTRY_LENGTH);
            if let Some((first_half, second_half)) = front.split_at(room) {
                used += first_half.serialized_len();
                queue.pop_front();
                region.push(first_half);
                queue.push_front(second_half);
            }
            break;
        }

        if queue.is_empty() {
            regions.push(Region {
                entries: region,
                target: None,
            });
            break;
        }
        if region.is_empty() {
            return Err(IsoError::PreconditionFailed(
                "SUSP entry does not fit in any continuation region",
            ));
        }
        let remaining: usize = queue.iter().map(SuspEntry::serialized_len).sum();
        let grant = alloc(remaining)?;
        if grant.granted < CE_ENTRY_LENGTH + 1 {
            return Err(IsoError::PreconditionFailed(
                "continuation grant too small",
            ));
        }
        regions.push(Region {
            entries: region,
            target: Some((grant.block, grant.offset)),
        });
        budget = grant.granted;
    }

    // Serialize back to front so each CE can record its successor's
    // exact length.
    let mut contents: Vec<Vec<u8>> = alloc::vec![Vec::new(); regions.len()];
    for index in (0..regions.len()).rev() {
        let mut bytes = Vec::new();
        for entry in &regions[index].entries {
            entry.serialize(&mut bytes);
        }
        if let Some((block, offset)) = regions[index].target {
            SuspEntry::Continuation {
                block,
                offset,
                length: contents[index + 1].len() as u32,
            }
            .serialize(&mut bytes);
        }
        contents[index] = bytes;
    }

    let mut iter = contents.into_iter();
    let record_trailer = iter.next().unwrap_or_default();
    let continuations = regions[..regions.len() - 1]
        .iter()
        .map(|region| region.target.unwrap_or_else(|| unreachable!()))
        .zip(iter)
        .map(|((block, offset), bytes)| (block, offset, bytes))
        .collect();

    Ok(SuspAreaLayout {
        record_trailer,
        continuations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::susp::entry::{SlComponent, SlComponentFlags, TfStamp, TfTimestamps};
    use crate::utils::datetime::RecordDateTime;
    use alloc::vec;

    fn px() -> SuspEntry {
        SuspEntry::PosixAttributes {
            mode: 0o644,
            links: 1,
            uid: 1000,
            gid: 1000,
            serial: None,
        }
    }

    fn nm(name: &[u8]) -> SuspEntry {
        SuspEntry::AlternateName {
            flags: NmFlags::empty(),
            name: name.to_vec(),
        }
    }

    #[test]
    fn test_single_region_area() {
        let mut trailer = Vec::new();
        px().serialize(&mut trailer);
        nm(b"grub.cfg").serialize(&mut trailer);
        let area = SuspArea::new(&trailer);
        assert!(area.is_complete());
        assert_eq!(area.entries(), vec![px(), nm(b"grub.cfg")]);
    }

    #[test]
    fn test_chain_follow_and_merge() {
        let mut trailer = Vec::new();
        SuspEntry::AlternateName {
            flags: NmFlags::CONTINUE,
            name: b"long-".to_vec(),
        }
        .serialize(&mut trailer);
        SuspEntry::Continuation {
            block: 30,
            offset: 0,
            length: 64,
        }
        .serialize(&mut trailer);

        let mut area = SuspArea::new(&trailer);
        assert!(!area.is_complete());
        assert_eq!(area.next_continuation(), Some((30, 0, 64)));

        let mut continuation = Vec::new();
        nm(b"file-name").serialize(&mut continuation);
        SuspEntry::Terminator.serialize(&mut continuation);
        assert!(area.add_continuation(&continuation));
        assert!(area.is_complete());

        assert_eq!(area.entries(), vec![nm(b"long-file-name")]);
    }

    #[test]
    fn test_self_loop_terminates() {
        let mut trailer = Vec::new();
        SuspEntry::Continuation {
            block: 9,
            offset: 0,
            length: 28,
        }
        .serialize(&mut trailer);
        let mut area = SuspArea::new(&trailer);
        assert_eq!(area.next_continuation(), Some((9, 0, 28)));

        // The continuation holds a CE naming itself.
        let mut continuation = Vec::new();
        SuspEntry::Continuation {
            block: 9,
            offset: 0,
            length: 28,
        }
        .serialize(&mut continuation);
        assert!(area.add_continuation(&continuation));
        assert!(area.is_complete());
        assert_eq!(area.next_continuation(), None);
    }

    #[test]
    fn test_add_to_complete_area_is_refused() {
        let mut area = SuspArea::new(&px().to_bytes());
        assert!(area.is_complete());
        assert!(!area.add_continuation(&nm(b"x").to_bytes()));
    }

    #[test]
    fn test_empty_continuation_is_refused() {
        let mut trailer = Vec::new();
        SuspEntry::Continuation {
            block: 30,
            offset: 0,
            length: 8,
        }
        .serialize(&mut trailer);
        let mut area = SuspArea::new(&trailer);
        assert!(!area.add_continuation(&[0u8; 8]));
        assert!(area.is_complete());
    }

    #[test]
    fn test_tf_dedupe_first_wins() {
        let early = RecordDateTime {
            year: 120,
            month: 1,
            day: 1,
            hour: 0,
            minute: 0,
            second: 0,
            gmt_offset: 0,
        };
        let late = RecordDateTime { year: 126, ..early };
        let first = SuspEntry::Timestamps(TfTimestamps {
            long_form: false,
            modification: Some(TfStamp::Short(early)),
            ..TfTimestamps::default()
        });
        let second = SuspEntry::Timestamps(TfTimestamps {
            long_form: true,
            modification: Some(TfStamp::Long(late.to_volume_datetime())),
            access: Some(TfStamp::Long(late.to_volume_datetime())),
            ..TfTimestamps::default()
        });
        let compacted = compact(&[first, second]);
        assert_eq!(compacted.len(), 1);
        let SuspEntry::Timestamps(merged) = &compacted[0] else {
            panic!("expected TF");
        };
        // First entry wins its slot and the long-form bit; the later
        // entry only fills the absent access slot, converted to short.
        assert!(!merged.long_form);
        assert_eq!(merged.modification, Some(TfStamp::Short(early)));
        assert_eq!(merged.access, Some(TfStamp::Short(late)));
    }

    #[test]
    fn test_split_sl_rejoins_in_compaction() {
        let original = SuspEntry::Symlink {
            continues: false,
            components: vec![
                SlComponent::special(SlComponentFlags::ROOT),
                SlComponent::named(b"a-rather-long-target-name"),
                SlComponent::named(b"tail"),
            ],
        };
        let (first, second) = original.split_at(20).unwrap();
        assert_eq!(compact(&[first, second]), vec![original]);
    }

    #[test]
    fn test_emit_single_region() {
        let entries = vec![px(), nm(b"grub.cfg")];
        let layout = emit_area(&entries, 128, |_| {
            panic!("allocator must not be invoked")
        })
        .unwrap();
        assert!(layout.continuations.is_empty());
        assert_eq!(SuspEntry::parse_region(&layout.record_trailer), entries);
    }

    #[test]
    fn test_emit_spills_and_reassembles() {
        let entries = vec![
            px(),
            nm(b"a-very-long-alternate-file-name-that-will-not-fit.txt"),
            SuspEntry::Symlink {
                continues: false,
                components: vec![
                    SlComponent::special(SlComponentFlags::ROOT),
                    SlComponent::named(b"somewhere"),
                    SlComponent::named(b"else"),
                ],
            },
        ];
        let mut next_offset = 0u32;
        let layout = emit_area(&entries, 64, |requested| {
            let grant = ContinuationGrant {
                block: 40,
                offset: next_offset,
                granted: requested.max(64),
            };
            next_offset += 1024;
            Ok(grant)
        })
        .unwrap();

        assert!(layout.record_trailer.len() <= 64);
        assert!(!layout.continuations.is_empty());

        // Reassemble the way a reader would.
        let mut area = SuspArea::new(&layout.record_trailer);
        while let Some((block, offset, length)) = area.next_continuation() {
            let (_, _, bytes) = layout
                .continuations
                .iter()
                .find(|(b, o, _)| *b == block && *o == offset)
                .expect("CE points at an emitted continuation");
            assert_eq!(bytes.len(), length as usize);
            area.add_continuation(bytes);
        }
        assert!(area.is_complete());
        assert_eq!(area.entries(), entries);
    }

    #[test]
    fn test_emit_rejects_impossible_budget() {
        let entries = vec![px(), px()];
        let result = emit_area(&entries, 8, |requested| {
            Ok(ContinuationGrant {
                block: 1,
                offset: 0,
                granted: requested.max(2048),
            })
        });
        assert!(matches!(result, Err(IsoError::PreconditionFailed(_))));
    }
}
