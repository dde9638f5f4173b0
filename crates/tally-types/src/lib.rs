//! Foundation types for tally.
//!
//! Every other tally crate depends on `tally-types`.
//!
//! # Key Types
//!
//! - [`ComponentId`] -- `namespace/name[@version]` identity of a component
//! - [`FileRecord`] -- A workspace-relative file tracked by a component
//! - [`Origin`] -- Provenance of a tracked component (authored, imported, nested)

pub mod error;
pub mod file;
pub mod id;
pub mod origin;

pub use error::TypeError;
pub use file::FileRecord;
pub use id::{ComponentId, DEFAULT_NAMESPACE};
pub use origin::Origin;
