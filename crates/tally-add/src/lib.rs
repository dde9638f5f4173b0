//! Add resolver for tally.
//!
//! Turns user-supplied paths, test and main-file templates and exclude
//! patterns into component candidates, reconciles them against the
//! [`tally_index::ComponentIndex`], and persists the index once the whole
//! invocation has succeeded.
//!
//! # Key Types
//!
//! - [`AddRequest`] -- what the user asked to track
//! - [`AddContext`] -- workspace root, working directory and ignore rules
//! - [`AddResolver`] -- runs a request against an index
//! - [`AddOutcome`] -- tracked components plus soft-conflict warnings
//! - [`AddError`] / [`ErrorKind`] -- failures, grouped by kind

mod candidate;
pub mod error;
pub mod request;
pub mod resolver;

pub use error::{AddError, AddResult, ErrorKind};
pub use request::{AddContext, AddRequest};
pub use resolver::{AddOutcome, AddResolver, AddedComponent};
