//! Directory record parsing and navigation

pub mod ext_attr;
pub mod flags;
pub mod path_table;
pub mod record;

pub use ext_attr::{ExtendedAttributeRecord, XarPermissions};
pub use flags::FileFlags;
pub use path_table::{PathTableEndian, PathTableRecord};
pub use record::{DirectoryRecord, RecordIdentifier};
