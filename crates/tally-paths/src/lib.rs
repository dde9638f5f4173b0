//! Path and pattern utilities for tally.
//!
//! Everything here works in terms of workspace-relative, forward-slash
//! normalized path strings anchored at a workspace root.
//!
//! # Key Types
//!
//! - [`IgnoreRules`] -- gitignore-style rules applied to every expansion
//! - [`expand`] / [`walk_dir`] -- pattern and directory expansion
//! - [`PathTemplate`] -- closed-grammar templates for related-file lookup
//! - [`ExcludeSet`] -- exclude patterns applied to candidate file sets
//! - [`resolve_user_paths`] -- validation of explicitly supplied paths

pub mod error;
pub mod exclude;
pub mod expand;
pub mod normalize;
pub mod rules;
pub mod template;
pub mod user;

pub use error::{PathError, PathResult};
pub use exclude::ExcludeSet;
pub use expand::{expand, walk_dir};
pub use normalize::{
    is_glob, join_relative, last_segment, normalize_relative, normalize_str, parent_of,
    relative_to_root,
};
pub use rules::{IgnoreRules, BUILTIN_PATTERNS};
pub use template::{FileInfo, PathTemplate, Placeholder};
pub use user::{resolve_user_paths, PathKind, UserPath};
