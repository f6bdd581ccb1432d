//! System Use Sharing Protocol (SUSP) and Rock Ridge support
//!
//! SUSP (IEEE P1281) frames extension data inside directory records'
//! system-use areas as tagged entries, with `CE` entries chaining to
//! continuation areas elsewhere on the volume. Rock Ridge (IEEE P1282)
//! is the extension carrying POSIX semantics: permissions, symlinks,
//! long names, timestamps.

pub mod area;
pub mod entry;
pub mod rock_ridge;

pub use area::{emit_area, ContinuationGrant, SuspArea, SuspAreaLayout};
pub use entry::{NmFlags, SlComponent, SlComponentFlags, SuspEntry, TfStamp, TfTimestamps};
pub use rock_ridge::RockRidgeData;
