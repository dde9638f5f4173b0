//! Candidate components assembled from user paths before reconciliation.

use std::collections::{BTreeMap, BTreeSet};

use tally_index::ComponentDescriptor;
use tally_paths::{
    expand, is_glob, last_segment, parent_of, walk_dir, ExcludeSet, FileInfo, PathError,
    PathKind, PathTemplate, UserPath,
};
use tally_types::{ComponentId, FileRecord};
use tracing::{debug, warn};

use crate::error::{AddError, AddResult};
use crate::request::{AddContext, AddRequest};

/// Parsed templates and excludes of one request.
#[derive(Debug)]
pub(crate) struct Patterns {
    pub tests: Vec<PathTemplate>,
    pub main: Option<PathTemplate>,
    pub excludes: ExcludeSet,
}

impl Patterns {
    pub fn parse(request: &AddRequest) -> AddResult<Self> {
        let tests = request
            .tests
            .iter()
            .map(|raw| PathTemplate::parse(raw))
            .collect::<Result<Vec<_>, _>>()?;
        let main = request
            .main
            .as_deref()
            .map(PathTemplate::parse)
            .transpose()?;
        let excludes = ExcludeSet::new(&request.excludes)?;
        Ok(Self {
            tests,
            main,
            excludes,
        })
    }
}

/// A component as it is being assembled.
#[derive(Clone, Debug)]
pub(crate) struct Candidate {
    /// The user path (or paths) it came from, for messages.
    pub source: String,
    pub id: ComponentId,
    pub explicit_id: bool,
    pub files: BTreeMap<String, FileRecord>,
    pub main_file: Option<String>,
    pub root_dir: Option<String>,
    pub kind: PathKind,
}

impl Candidate {
    fn new(source: &str, id: ComponentId, explicit_id: bool, kind: PathKind) -> Self {
        Self {
            source: source.to_string(),
            id,
            explicit_id,
            files: BTreeMap::new(),
            main_file: None,
            root_dir: None,
            kind,
        }
    }

    /// Track a file. On a repeated path the first non-empty value of each
    /// field wins, except that test marking always sticks.
    pub fn insert(&mut self, record: FileRecord) {
        match self.files.get_mut(&record.relative_path) {
            Some(existing) => {
                existing.is_test |= record.is_test;
                if existing.name.is_empty() {
                    existing.name = record.name;
                }
            }
            None => {
                self.files.insert(record.relative_path.clone(), record);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Union `other` into `self`.
    pub fn absorb(&mut self, other: Candidate) {
        self.source = format!("{}, {}", self.source, other.source);
        for record in other.files.into_values() {
            self.insert(record);
        }
        if self.main_file.is_none() {
            self.main_file = other.main_file;
        }
        self.root_dir = None;
    }

    /// Remove excluded files. An excluded main file empties the candidate.
    pub fn apply_excludes(&mut self, excludes: &ExcludeSet) {
        if excludes.is_empty() {
            return;
        }
        if let Some(main) = &self.main_file {
            if excludes.matches(main) {
                warn!(id = %self.id, main = %main, "main file is excluded, dropping component");
                self.files.clear();
                self.main_file = None;
                return;
            }
        }
        self.files.retain(|path, _| !excludes.matches(path));
    }

    pub fn into_descriptor(self) -> ComponentDescriptor {
        ComponentDescriptor {
            id: self.id,
            files: self.files.into_values().collect(),
            main_file: self.main_file,
            root_dir: self.root_dir,
        }
    }
}

/// Build the candidate for one user path.
pub(crate) fn collect(
    ctx: &AddContext<'_>,
    user: &UserPath,
    id: ComponentId,
    explicit_id: bool,
    patterns: &Patterns,
) -> AddResult<Candidate> {
    let mut candidate = Candidate::new(&user.input, id, explicit_id, user.kind);

    let (found, subject) = match user.kind {
        PathKind::Directory => {
            let found = walk_dir(ctx.root, &user.relative, ctx.ignore)?;
            if found.is_empty() {
                return Err(AddError::EmptyDirectory(user.relative.clone()));
            }
            candidate.root_dir = Some(user.relative.clone());
            (found, FileInfo::of_dir(&user.relative))
        }
        PathKind::File => (
            expand(ctx.root, &user.relative, ctx.ignore)?,
            FileInfo::of_file(&user.relative),
        ),
    };
    for path in found {
        candidate.insert(FileRecord::new(path));
    }

    add_test_files(ctx, &mut candidate, &patterns.tests)?;
    resolve_main(ctx, &mut candidate, patterns.main.as_ref(), &subject)?;

    debug!(
        source = %candidate.source,
        id = %candidate.id,
        files = candidate.files.len(),
        main = ?candidate.main_file,
        "collected candidate"
    );
    Ok(candidate)
}

/// A candidate made only of the files matched by subject-free test patterns.
pub(crate) fn collect_tests_only(
    ctx: &AddContext<'_>,
    id: ComponentId,
    patterns: &Patterns,
) -> AddResult<Candidate> {
    let mut candidate = Candidate::new("<tests>", id, true, PathKind::File);
    for template in &patterns.tests {
        if template.has_placeholders() {
            debug!(template = %template, "skipping test pattern that needs a subject file");
            continue;
        }
        let pattern = template.render(&FileInfo::of_dir(""))?;
        for path in expand(ctx.root, &pattern, ctx.ignore)? {
            candidate.insert(FileRecord::test(path));
        }
    }
    if candidate.files.len() == 1 {
        candidate.main_file = candidate.files.keys().next().cloned();
    }
    Ok(candidate)
}

/// Merge in every file matched by the test templates, rendered against
/// each regular file of the candidate.
fn add_test_files(
    ctx: &AddContext<'_>,
    candidate: &mut Candidate,
    tests: &[PathTemplate],
) -> AddResult<()> {
    if tests.is_empty() {
        return Ok(());
    }
    let subjects: Vec<String> = candidate
        .files
        .values()
        .filter(|f| !f.is_test)
        .map(|f| f.relative_path.clone())
        .collect();

    let mut rendered = BTreeSet::new();
    let mut literal = BTreeSet::new();
    for template in tests {
        if !template.has_placeholders() {
            let pattern = template.render(&FileInfo::of_dir(""))?;
            rendered.insert(pattern.clone());
            literal.insert(pattern);
            continue;
        }
        for subject in &subjects {
            match template.render(&FileInfo::of_file(subject)) {
                Ok(pattern) => {
                    rendered.insert(pattern);
                }
                Err(PathError::MissingExtension { .. }) => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    for pattern in rendered {
        let found = expand(ctx.root, &pattern, ctx.ignore)?;
        if found.is_empty() && literal.contains(&pattern) && !is_glob(&pattern) {
            return Err(AddError::MissingTestFile(pattern));
        }
        for path in found {
            candidate.insert(FileRecord::test(path));
        }
    }
    Ok(())
}

/// Pick the main file: the template match if any, otherwise the only
/// regular file, otherwise an `index.*` file directly inside the
/// candidate's directory.
fn resolve_main(
    ctx: &AddContext<'_>,
    candidate: &mut Candidate,
    template: Option<&PathTemplate>,
    subject: &FileInfo,
) -> AddResult<()> {
    if let Some(template) = template {
        match template.render(subject) {
            Ok(pattern) => {
                let found = expand(ctx.root, &pattern, ctx.ignore)?;
                if let Some(main) = found.into_iter().next() {
                    candidate.insert(FileRecord::new(main.clone()));
                    candidate.main_file = Some(main);
                    return Ok(());
                }
                debug!(pattern = %pattern, "main file pattern matched nothing");
            }
            Err(PathError::MissingExtension { .. }) => {}
            Err(e) => return Err(e.into()),
        }
    }

    let mut regular = candidate.files.values().filter(|f| !f.is_test);
    candidate.main_file = match (regular.next(), regular.next()) {
        (Some(only), None) => Some(only.relative_path.clone()),
        _ => candidate.root_dir.as_deref().and_then(|dir| {
            candidate
                .files
                .keys()
                .find(|path| parent_of(path) == dir && last_segment(path).starts_with("index."))
                .cloned()
        }),
    };
    Ok(())
}

/// Id derived from a path: `<parent dir>/<dir name>` for directories,
/// `<containing dir>/<file stem>` for files.
pub(crate) fn derive_id(
    user: &UserPath,
    namespace: Option<&str>,
    default_namespace: &str,
) -> AddResult<ComponentId> {
    let relative = user.relative.as_str();
    let name = match user.kind {
        PathKind::Directory => last_segment(relative).to_string(),
        PathKind::File => {
            let base = last_segment(relative);
            match base.rsplit_once('.') {
                Some((stem, _)) if !stem.is_empty() => stem.to_string(),
                _ => base.to_string(),
            }
        }
    };
    let derived_namespace = last_segment(parent_of(relative));
    let namespace = match namespace {
        Some(ns) => ns,
        None if derived_namespace.is_empty() => default_namespace,
        None => derived_namespace,
    };
    Ok(ComponentId::new(id_segment(namespace), id_segment(&name), None)?)
}

fn id_segment(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_whitespace() || c == '@' || c == '/' { '-' } else { c })
        .collect()
}
