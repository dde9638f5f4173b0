//! Path templates used to locate a file's related files by convention.
//!
//! A template is literal text interleaved with a closed set of placeholders:
//!
//! | Placeholder | Meaning for `src/foo.test.js` |
//! |-------------|-------------------------------|
//! | `{dir}`     | `src`                         |
//! | `{base}`    | `foo.test.js`                 |
//! | `{name}`    | `foo.test`                    |
//! | `{ext}`     | `js`                          |
//!
//! `"{dir}/{name}.spec.js"` rendered against `src/foo.js` yields
//! `src/foo.spec.js`. Rendering never checks that the result exists.

use std::fmt;
use std::str::FromStr;

use crate::error::{PathError, PathResult};
use crate::normalize::{collapse, last_segment, parent_of};

/// A named placeholder in a [`PathTemplate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placeholder {
    Dir,
    Name,
    Base,
    Ext,
}

impl Placeholder {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "dir" => Some(Self::Dir),
            "name" => Some(Self::Name),
            "base" => Some(Self::Base),
            "ext" => Some(Self::Ext),
            _ => None,
        }
    }

    fn token(&self) -> &'static str {
        match self {
            Self::Dir => "dir",
            Self::Name => "name",
            Self::Base => "base",
            Self::Ext => "ext",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Slot(Placeholder),
}

/// The subject a template is rendered against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileInfo {
    path: String,
    dir: String,
    base: String,
    name: String,
    ext: Option<String>,
}

impl FileInfo {
    /// Placeholders bound to a file: `{dir}` is its parent directory.
    pub fn of_file(relative: &str) -> Self {
        let base = last_segment(relative).to_string();
        let (name, ext) = match base.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
                (stem.to_string(), Some(ext.to_string()))
            }
            _ => (base.clone(), None),
        };
        Self {
            path: relative.to_string(),
            dir: parent_of(relative).to_string(),
            base,
            name,
            ext,
        }
    }

    /// Placeholders bound to a directory acting as a component container:
    /// `{dir}` is the directory itself and `{name}` its last segment.
    pub fn of_dir(relative: &str) -> Self {
        let base = last_segment(relative).to_string();
        Self {
            path: relative.to_string(),
            dir: relative.to_string(),
            name: base.clone(),
            base,
            ext: None,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// A parsed path template.
#[derive(Clone, PartialEq, Eq)]
pub struct PathTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    pub fn parse(source: &str) -> PathResult<Self> {
        if source.starts_with('/') {
            return Err(PathError::Absolute(source.to_string()));
        }

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars();

        while let Some(c) = chars.next() {
            if c != '{' {
                literal.push(c);
                continue;
            }
            let mut token = String::new();
            let mut closed = false;
            for t in chars.by_ref() {
                if t == '}' {
                    closed = true;
                    break;
                }
                token.push(t);
            }
            if !closed {
                return Err(PathError::UnterminatedPlaceholder(source.to_string()));
            }
            let slot = Placeholder::parse(&token).ok_or_else(|| PathError::UnknownPlaceholder {
                template: source.to_string(),
                placeholder: token.clone(),
            })?;
            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(Segment::Slot(slot));
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// Whether the template depends on its subject at all.
    pub fn has_placeholders(&self) -> bool {
        self.segments.iter().any(|s| matches!(s, Segment::Slot(_)))
    }

    pub fn placeholders(&self) -> impl Iterator<Item = Placeholder> + '_ {
        self.segments.iter().filter_map(|s| match s {
            Segment::Slot(p) => Some(*p),
            Segment::Literal(_) => None,
        })
    }

    /// Render against `subject`, producing a normalized workspace-relative
    /// path (which may still contain glob metacharacters from literals).
    pub fn render(&self, subject: &FileInfo) -> PathResult<String> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Slot(Placeholder::Dir) => out.push_str(&subject.dir),
                Segment::Slot(Placeholder::Base) => out.push_str(&subject.base),
                Segment::Slot(Placeholder::Name) => out.push_str(&subject.name),
                Segment::Slot(Placeholder::Ext) => match &subject.ext {
                    Some(ext) => out.push_str(ext),
                    None => {
                        return Err(PathError::MissingExtension {
                            template: self.source.clone(),
                            path: subject.path.clone(),
                        })
                    }
                },
            }
        }
        collapse(&out.replace('\\', "/")).ok_or_else(|| PathError::Escapes(out.clone()))
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl FromStr for PathTemplate {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots: Vec<&str> = self.placeholders().map(|p| p.token()).collect();
        f.debug_struct("PathTemplate")
            .field("source", &self.source)
            .field("placeholders", &slots)
            .finish()
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_test_file_pattern() {
        let t = PathTemplate::parse("{dir}/{name}.test.js").unwrap();
        assert_eq!(t.render(&FileInfo::of_file("src/foo.js")).unwrap(), "src/foo.test.js");
    }

    #[test]
    fn root_level_file_has_empty_dir() {
        let t = PathTemplate::parse("{dir}/{name}.test.js").unwrap();
        assert_eq!(t.render(&FileInfo::of_file("a.js")).unwrap(), "a.test.js");
    }

    #[test]
    fn all_placeholders() {
        let t: PathTemplate = "{dir}/__tests__/{base}.{ext}.snap".parse().unwrap();
        assert_eq!(
            t.render(&FileInfo::of_file("ui/button.tsx")).unwrap(),
            "ui/__tests__/button.tsx.tsx.snap"
        );
        let placeholders: Vec<_> = t.placeholders().collect();
        assert_eq!(placeholders, vec![Placeholder::Dir, Placeholder::Base, Placeholder::Ext]);
    }

    #[test]
    fn directory_subject_binds_itself() {
        let t = PathTemplate::parse("{dir}/{name}.js").unwrap();
        assert_eq!(t.render(&FileInfo::of_dir("src/utils")).unwrap(), "src/utils/utils.js");
    }

    #[test]
    fn literal_only_template() {
        let t = PathTemplate::parse("tests/*.spec.js").unwrap();
        assert!(!t.has_placeholders());
        assert_eq!(t.render(&FileInfo::of_file("x.js")).unwrap(), "tests/*.spec.js");
    }

    #[test]
    fn grammar_errors_are_typed() {
        assert!(matches!(
            PathTemplate::parse("{dir}/{stem}.js"),
            Err(PathError::UnknownPlaceholder { placeholder, .. }) if placeholder == "stem"
        ));
        assert!(matches!(
            PathTemplate::parse("{dir/{name}.js"),
            Err(PathError::UnknownPlaceholder { .. })
        ));
        assert!(matches!(
            PathTemplate::parse("{dir}/{name"),
            Err(PathError::UnterminatedPlaceholder(_))
        ));
        assert!(matches!(PathTemplate::parse("/abs/{name}"), Err(PathError::Absolute(_))));
    }

    #[test]
    fn missing_extension_is_typed() {
        let t = PathTemplate::parse("{dir}/{name}.spec.{ext}").unwrap();
        assert!(matches!(
            t.render(&FileInfo::of_file("bin/run")),
            Err(PathError::MissingExtension { .. })
        ));
    }

    #[test]
    fn dotfiles_have_no_extension() {
        let info = FileInfo::of_file("cfg/.eslintrc");
        let t = PathTemplate::parse("{name}").unwrap();
        assert_eq!(t.render(&info).unwrap(), ".eslintrc");
    }
}
