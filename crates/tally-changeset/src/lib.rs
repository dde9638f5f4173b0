//! Change-set engine for tally.
//!
//! A [`ChangeSet`] collects pending writes, removals and symlinks with
//! insertion-time collision checks. Committing applies it to a
//! [`CommitTarget`] in strict phases (remove, install, write, symlink),
//! each phase running its operations concurrently.
//!
//! # Key Types
//!
//! - [`ChangeSet`] -- the pending operations
//! - [`Committer`] / [`CommitSummary`] -- the commit protocol and its report
//! - [`CommitTarget`] -- write/remove/symlink primitives of a target
//! - [`LocalFsTarget`] / [`InMemoryTarget`] -- targets
//! - [`PackageInstaller`] / [`CommandInstaller`] -- optional install step

pub mod changeset;
pub mod commit;
pub mod error;
pub mod installer;
pub mod local;
pub mod memory;
pub mod target;

pub use changeset::{ChangeSet, RemoveOp, SymlinkOp, WriteOp};
pub use commit::{CommitSummary, Committer};
pub use error::{ChangeSetError, ChangeSetResult, InstallError, TargetError, TargetResult};
pub use installer::{CommandInstaller, InstallOutput, InstallRequest, PackageInstaller};
pub use local::LocalFsTarget;
pub use memory::{InMemoryTarget, Node, TargetOp};
pub use target::{CommitTarget, RemoveMode};
