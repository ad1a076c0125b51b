use crate::decl::{DeclKind, DeclShape, Declaration, DeclarationIndex};
use crate::imports::errors::ImportError;
use crate::imports::path::{default_name, is_identifier, is_standard, split_version};
use crate::imports::splice::CGO_PATH;
use crate::imports::usage::Usages;
use crate::ts::SourceFile;
use std::collections::BTreeSet;
use std::fmt;

/// One import: a path and an optional explicit name.
///
/// Ordered by path, then alias, which is the order imports are rendered in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImportEntry {
    pub path: String,
    /// Identifier, `_` or `.`; `None` binds the default package name.
    pub alias: Option<String>,
}

impl ImportEntry {
    /// Validated entry. An empty alias means no alias.
    pub fn new(path: &str, alias: Option<&str>) -> Result<Self, ImportError> {
        validate_path(path)?;
        let alias = alias.filter(|a| !a.is_empty());
        if let Some(alias) = alias {
            if alias != "_" && alias != "." && !is_identifier(alias) {
                return Err(ImportError::InvalidAlias {
                    path: path.to_string(),
                    alias: alias.to_string(),
                });
            }
        }
        Ok(Self {
            path: path.to_string(),
            alias: alias.map(str::to_string),
        })
    }

    /// Name the import binds in the file.
    pub fn bound_name(&self) -> String {
        self.alias.clone().unwrap_or_else(|| default_name(&self.path))
    }

    /// Blank and dot imports cannot be traced through qualifiers; `import "C"`
    /// carries the cgo preamble.
    pub fn always_used(&self) -> bool {
        matches!(self.alias.as_deref(), Some("_") | Some(".")) || self.path == CGO_PATH
    }

    pub fn is_used(&self, usages: &Usages) -> bool {
        self.always_used() || usages.uses(&self.bound_name())
    }

    pub fn is_standard(&self) -> bool {
        is_standard(&self.path)
    }
}

impl fmt::Display for ImportEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.alias {
            Some(alias) => write!(f, "{alias} \"{}\"", self.path),
            None => write!(f, "\"{}\"", self.path),
        }
    }
}

fn validate_path(path: &str) -> Result<(), ImportError> {
    let reason = if path.is_empty() {
        Some("empty path")
    } else if path.contains(['"', '`', '\\']) {
        Some("contains a quote or backslash")
    } else if path.chars().any(|c| c.is_whitespace() || c.is_control()) {
        Some("contains whitespace or control characters")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(ImportError::InvalidPath {
            path: path.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

/// The import list of one file, deduplicated by `(path, alias)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSet {
    entries: BTreeSet<ImportEntry>,
}

impl ImportSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Imports declared in `file`.
    pub fn from_file(file: &SourceFile) -> Self {
        let mut index = DeclarationIndex::new(file);
        Self::from_declarations(index.all(file, Some(DeclKind::Import)))
    }

    /// Imports carried by already classified import declarations.
    pub fn from_declarations<'a>(decls: impl IntoIterator<Item = &'a Declaration>) -> Self {
        let mut set = Self::new();
        for decl in decls {
            if let DeclShape::Import { specs } = &decl.shape {
                for spec in specs {
                    set.entries.insert(ImportEntry {
                        path: spec.path.clone(),
                        alias: spec.alias.clone(),
                    });
                }
            }
        }
        set
    }

    /// Insert `(path, alias)` unless present. Returns whether it was added.
    pub fn add(&mut self, path: &str, alias: Option<&str>) -> Result<bool, ImportError> {
        let entry = ImportEntry::new(path, alias)?;
        let added = self.entries.insert(entry);
        if added {
            tracing::trace!(path, alias = alias.unwrap_or(""), "added import");
        }
        Ok(added)
    }

    /// Remove `(path, alias)` unless its bound name is still referenced.
    pub fn remove(&mut self, path: &str, alias: Option<&str>, usages: &Usages) -> bool {
        let key = ImportEntry {
            path: path.to_string(),
            alias: alias.filter(|a| !a.is_empty()).map(str::to_string),
        };
        if !self.entries.contains(&key) {
            return false;
        }
        if key.is_used(usages) {
            tracing::debug!(import = %key, "keeping import still in use");
            return false;
        }
        self.entries.remove(&key)
    }

    /// Collapse unaliased `mod` + `mod/vN` pairs into `mod/vN`.
    /// Returns the number of entries dropped.
    pub fn dedup_versioned(&mut self) -> usize {
        let shadowed: Vec<ImportEntry> = self
            .entries
            .iter()
            .filter(|e| e.alias.is_none())
            .filter_map(|e| split_version(&e.path))
            .map(|(base, _)| ImportEntry {
                path: base.to_string(),
                alias: None,
            })
            .filter(|base| self.entries.contains(base))
            .collect();

        for entry in &shadowed {
            tracing::debug!(import = %entry, "dropping unversioned duplicate");
            self.entries.remove(entry);
        }
        shadowed.len()
    }

    /// Drop every import whose bound name is never referenced.
    pub fn prune_unused(&mut self, usages: &Usages) -> Vec<ImportEntry> {
        let (kept, pruned): (BTreeSet<_>, BTreeSet<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|e| e.is_used(usages));
        self.entries = kept;
        for entry in &pruned {
            tracing::debug!(import = %entry, "pruned unused import");
        }
        pruned.into_iter().collect()
    }

    pub fn contains_entry(&self, entry: &ImportEntry) -> bool {
        self.entries.contains(entry)
    }

    pub fn contains(&self, path: &str, alias: Option<&str>) -> bool {
        self.entries.iter().any(|e| {
            e.path == path && e.alias.as_deref() == alias.filter(|a| !a.is_empty())
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in render order.
    pub fn iter(&self) -> impl Iterator<Item = &ImportEntry> {
        self.entries.iter()
    }
}

impl FromIterator<ImportEntry> for ImportSet {
    fn from_iter<I: IntoIterator<Item = ImportEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
