//! Error types for ISO 9660 operations

use alloc::string::String;
use core::fmt;

/// Result type for ISO 9660 operations
pub type Result<T> = core::result::Result<T, IsoError>;

/// Errors that can occur during ISO 9660 operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IsoError {
    /// I/O error on the underlying medium
    Io,

    /// Path does not resolve to an entry
    InvalidPath,

    /// Sector size is not a power of two >= 2048
    InvalidSectorSize(usize),

    /// Logical block size is not a power of two, or exceeds the sector size
    InvalidLogicalBlockSize(u32),

    /// An identifier field contains characters outside its character set
    InvalidIdentifier {
        /// Descriptor field that failed validation
        field: &'static str,
        /// Offending value
        value: String,
    },

    /// Application-use area exceeds 512 bytes
    InvalidApplicationUseSize(usize),

    /// SUSP entry carries a signature that cannot be emitted
    InvalidSuspSignature([u8; 2]),

    /// Volume descriptor is malformed or missing mandatory fields
    InvalidVolumeDescriptor,

    /// Directory record would exceed the 255-byte cap
    RecordTooLong(usize),

    /// An internal precondition did not hold
    PreconditionFailed(&'static str),

    /// Caller passed an invalid argument
    InvalidArgument {
        /// Argument name
        name: &'static str,
        /// What was wrong with it
        message: &'static str,
    },

    /// The image carries no valid volume descriptor set
    InvalidImage,

    /// The writer has already been closed
    WriterClosed,
}

impl fmt::Display for IsoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io => write!(f, "I/O error on underlying medium"),
            Self::InvalidPath => write!(f, "path does not resolve to an entry"),
            Self::InvalidSectorSize(size) => {
                write!(f, "invalid sector size {size} (power of two >= 2048 required)")
            }
            Self::InvalidLogicalBlockSize(size) => {
                write!(f, "invalid logical block size {size}")
            }
            Self::InvalidIdentifier { field, value } => {
                write!(f, "invalid characters in {field}: {value:?}")
            }
            Self::InvalidApplicationUseSize(size) => {
                write!(f, "application use area of {size} bytes exceeds 512")
            }
            Self::InvalidSuspSignature(sig) => {
                write!(f, "invalid SUSP signature {:02X} {:02X}", sig[0], sig[1])
            }
            Self::InvalidVolumeDescriptor => write!(f, "malformed volume descriptor"),
            Self::RecordTooLong(len) => {
                write!(f, "directory record of {len} bytes exceeds the 255-byte cap")
            }
            Self::PreconditionFailed(reason) => write!(f, "precondition failed: {reason}"),
            Self::InvalidArgument { name, message } => {
                write!(f, "invalid argument {name}: {message}")
            }
            Self::InvalidImage => write!(f, "no valid volume descriptor set"),
            Self::WriterClosed => write!(f, "writer already closed"),
        }
    }
}
