//! The add resolver: user paths in, tracked components out.
//!
//! A run goes through these steps, and any error aborts the whole run
//! before the index is persisted:
//!
//! 1. validate and classify the user paths
//! 2. build one candidate per path (files, test files, main file)
//! 3. collapse all candidates into one when an explicit id was given
//! 4. apply excludes and drop emptied candidates
//! 5. settle each candidate's identity against the index
//! 6. reject files or ids shared between candidates
//! 7. upsert every candidate into a staged copy of the index
//! 8. swap the staged copy in and persist it once

use std::collections::BTreeMap;

use tally_index::{ComponentIndex, ConflictWarnings, OverrideScope};
use tally_paths::{resolve_user_paths, PathKind};
use tally_types::{ComponentId, FileRecord, Origin};
use tracing::{debug, info};

use crate::candidate::{collect, collect_tests_only, derive_id, Candidate, Patterns};
use crate::error::{AddError, AddResult};
use crate::request::{AddContext, AddRequest};

// ---------------------------------------------------------------------------
// AddOutcome
// ---------------------------------------------------------------------------

/// One component tracked by an add.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddedComponent {
    pub id: ComponentId,
    /// Files this add tracked under `id`.
    pub files: Vec<FileRecord>,
    /// Whether the component was new to the index.
    pub created: bool,
}

/// Result of a successful add.
#[derive(Clone, Debug, Default)]
pub struct AddOutcome {
    pub added: Vec<AddedComponent>,
    /// Files skipped because another component already tracks them.
    pub warnings: ConflictWarnings,
}

// ---------------------------------------------------------------------------
// AddResolver
// ---------------------------------------------------------------------------

/// Resolves an [`AddRequest`] against a [`ComponentIndex`].
pub struct AddResolver<'a> {
    ctx: AddContext<'a>,
    request: AddRequest,
}

impl<'a> AddResolver<'a> {
    pub fn new(ctx: AddContext<'a>, request: AddRequest) -> Self {
        Self { ctx, request }
    }

    /// Run the add. On success `index` holds the result and has been
    /// persisted exactly once; on error it is left untouched.
    pub fn run(&self, index: &mut ComponentIndex) -> AddResult<AddOutcome> {
        let patterns = Patterns::parse(&self.request)?;
        let explicit = self.explicit_id()?;

        let mut candidates = self.collect_candidates(&patterns, explicit.as_ref())?;
        if let Some(id) = &explicit {
            candidates = collapse(candidates, id);
        }

        for candidate in &mut candidates {
            candidate.apply_excludes(&patterns.excludes);
        }
        candidates.retain(|c| !c.is_empty());
        if candidates.is_empty() {
            return Err(AddError::NoFilesMatched);
        }

        for candidate in &mut candidates {
            settle_identity(index, candidate)?;
        }
        check_shared_files(&candidates)?;

        let mut staged = index.clone();
        let outcome = self.reconcile(&mut staged, candidates)?;

        staged.persist()?;
        *index = staged;
        Ok(outcome)
    }

    fn explicit_id(&self) -> AddResult<Option<ComponentId>> {
        let namespace = self
            .request
            .namespace
            .as_deref()
            .unwrap_or(self.ctx.default_namespace);
        self.request
            .id
            .as_deref()
            .map(|raw| ComponentId::parse_with_namespace(raw, namespace))
            .transpose()
            .map_err(AddError::from)
    }

    fn collect_candidates(
        &self,
        patterns: &Patterns,
        explicit: Option<&ComponentId>,
    ) -> AddResult<Vec<Candidate>> {
        let tests_only = |id: &ComponentId| -> AddResult<Vec<Candidate>> {
            debug!(id = %id, "no regular files, tracking test files alone");
            Ok(vec![collect_tests_only(&self.ctx, id.clone(), patterns)?])
        };

        if self.request.paths.is_empty() {
            return match explicit {
                Some(id) if !patterns.tests.is_empty() => tests_only(id),
                _ => Err(AddError::NoPaths),
            };
        }

        let user_paths = resolve_user_paths(
            self.ctx.root,
            self.ctx.cwd,
            &self.request.paths,
            self.ctx.ignore,
        )?;

        let mut candidates = Vec::with_capacity(user_paths.len());
        for user in &user_paths {
            let (id, is_explicit) = match explicit {
                Some(id) => (id.clone(), true),
                None => (
                    derive_id(
                        user,
                        self.request.namespace.as_deref(),
                        self.ctx.default_namespace,
                    )?,
                    false,
                ),
            };
            candidates.push(collect(&self.ctx, user, id, is_explicit, patterns)?);
        }

        match explicit {
            Some(id) if !patterns.tests.is_empty() && candidates.iter().all(Candidate::is_empty) => {
                tests_only(id)
            }
            _ => Ok(candidates),
        }
    }

    fn reconcile(
        &self,
        staged: &mut ComponentIndex,
        candidates: Vec<Candidate>,
    ) -> AddResult<AddOutcome> {
        let overrides = OverrideScope::from_flag(self.request.override_all);
        let mut warnings = ConflictWarnings::new();
        let mut sources: BTreeMap<ComponentId, String> = BTreeMap::new();
        let mut added = Vec::new();

        for candidate in candidates {
            let source = candidate.source.clone();
            let result = staged.upsert(
                candidate.into_descriptor(),
                self.request.origin,
                &overrides,
                &mut warnings,
            )?;

            if let Some(first) = sources.insert(result.id.clone(), source.clone()) {
                return Err(AddError::DuplicateId {
                    id: result.id.to_string(),
                    first,
                    second: source,
                });
            }

            info!(
                id = %result.id,
                files = result.tracked.len(),
                created = result.created,
                "tracked component"
            );
            if !result.tracked.is_empty() {
                added.push(AddedComponent {
                    id: result.id,
                    files: result.tracked,
                    created: result.created,
                });
            }
        }

        Ok(AddOutcome { added, warnings })
    }
}

/// Union every candidate into a single one carrying `id`.
fn collapse(candidates: Vec<Candidate>, id: &ComponentId) -> Vec<Candidate> {
    let mut iter = candidates.into_iter();
    let Some(mut merged) = iter.next() else {
        return Vec::new();
    };
    for other in iter {
        merged.absorb(other);
    }
    merged.id = id.clone();
    vec![merged]
}

/// Reconcile a candidate's id with what the index already tracks.
///
/// With an explicit id, no file may belong to an imported component of a
/// different name. Without one, a file candidate adopts the id of the
/// component that tracks it and a directory candidate adopts the id of the
/// component added from the same directory; adopting an imported id
/// requires it to be spelled out.
fn settle_identity(index: &ComponentIndex, candidate: &mut Candidate) -> AddResult<()> {
    if candidate.explicit_id {
        for path in candidate.paths() {
            if let Some(owner) = index.owner_of(path) {
                if owner.origin == Origin::Imported && !owner.id.same_box_and_name(&candidate.id) {
                    return Err(AddError::ImportedIdMismatch {
                        path: path.to_string(),
                        expected: owner.id.to_string(),
                        supplied: candidate.id.to_string(),
                    });
                }
            }
        }
        return Ok(());
    }

    let adopted = match (candidate.kind, &candidate.root_dir) {
        (PathKind::Directory, Some(dir)) => index
            .lookup_by_root_dir(dir)
            .map(|owner| (dir.clone(), owner)),
        _ => candidate
            .main_file
            .as_deref()
            .into_iter()
            .chain(candidate.paths())
            .find_map(|path| index.owner_of(path).map(|owner| (path.to_string(), owner))),
    };

    if let Some((path, owner)) = adopted {
        if owner.origin == Origin::Imported {
            return Err(AddError::MissingIdForImported {
                path,
                tracked: owner.id.to_string(),
            });
        }
        debug!(from = %candidate.id, to = %owner.id, path = %path, "adopting tracked id");
        candidate.id = owner.id.clone();
    }
    Ok(())
}

fn check_shared_files(candidates: &[Candidate]) -> AddResult<()> {
    let mut owners: BTreeMap<&str, &ComponentId> = BTreeMap::new();
    for candidate in candidates {
        for path in candidate.paths() {
            if let Some(first) = owners.insert(path, &candidate.id) {
                if *first != candidate.id {
                    return Err(AddError::SharedFile {
                        path: path.to_string(),
                        first: first.to_string(),
                        second: candidate.id.to_string(),
                    });
                }
            }
        }
    }
    Ok(())
}
