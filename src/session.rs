//! One file's unit of work: source, declaration index, pending edits and
//! import list, kept in step.
//!
//! Every mutation goes through `&mut self` and ends in a re-parse, so
//! declarations borrowed from the session cannot outlive the text they
//! describe. Cloned declarations are checked against the current buffer
//! before use.

use crate::decl::{DeclKind, Declaration, DeclarationIndex};
use crate::edit::{EditRequest, EditSet, PatchError};
use crate::imports::path::is_identifier;
use crate::imports::{sync_edits, ImportError, ImportSet, Usages};
use crate::sg::{find_and_replace, AstGrepError, PatternMatcher};
use crate::ts::{GoParser, ParseError, SourceFile, Span, TreeSitterError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Patch(#[from] PatchError),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Query(#[from] TreeSitterError),

    #[error(transparent)]
    Pattern(#[from] AstGrepError),

    #[error("invalid package name {0:?}")]
    InvalidPackageName(String),

    #[error("declaration {name:?} belongs to an earlier version of the file")]
    StaleDeclaration { name: String },
}

pub struct RewriteSession {
    parser: GoParser,
    file: SourceFile,
    index: DeclarationIndex,
    edits: EditSet,
    imports: ImportSet,
}

impl RewriteSession {
    /// Parse `bytes` and read its imports.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, SessionError> {
        let mut parser = GoParser::new()?;
        let file = SourceFile::parse_with(&mut parser, bytes)?;
        let index = DeclarationIndex::new(&file);
        let edits = EditSet::for_file(&file);
        let imports = ImportSet::from_file(&file);
        Ok(Self {
            parser,
            file,
            index,
            edits,
            imports,
        })
    }

    /// A session over an empty file of package `name`.
    pub fn with_package(name: &str) -> Result<Self, SessionError> {
        check_package_name(name)?;
        Self::new(format!("package {name}\n"))
    }

    pub fn file(&self) -> &SourceFile {
        &self.file
    }

    pub fn source(&self) -> &str {
        self.file.source()
    }

    pub fn imports(&self) -> &ImportSet {
        &self.imports
    }

    /// Edits queued and not yet applied.
    pub fn pending_edits(&self) -> &EditSet {
        &self.edits
    }

    pub fn into_source(self) -> String {
        self.file.into_buffer().into_string()
    }

    /// Replace the current text and rebuild tree and index. On a parse
    /// failure the session keeps its previous version.
    fn rebuild(&mut self, text: String) -> Result<(), SessionError> {
        let file = SourceFile::parse_with(&mut self.parser, text)?;
        tracing::debug!(
            from = %self.file.buffer_id(),
            to = %file.buffer_id(),
            len = file.len(),
            "rebuilt source"
        );
        self.index = DeclarationIndex::new(&file);
        self.edits.clear();
        self.edits.rebind(file.buffer_id());
        self.file = file;
        Ok(())
    }

    // ---- declarations ----

    pub fn index(&self) -> &DeclarationIndex {
        &self.index
    }

    pub fn index_next(&mut self, kind: Option<DeclKind>, quota: Option<usize>) -> bool {
        self.index.index_next(&self.file, kind, quota)
    }

    pub fn get_nth(&mut self, kind: Option<DeclKind>, offset: isize) -> Option<&Declaration> {
        self.index.get_nth(&self.file, kind, offset)
    }

    pub fn find_by_name<S: AsRef<str>>(
        &mut self,
        kind: Option<DeclKind>,
        patterns: &[S],
    ) -> Vec<&Declaration> {
        self.index.find_by_name(&self.file, kind, patterns)
    }

    pub fn declarations(&mut self, kind: Option<DeclKind>) -> Vec<&Declaration> {
        self.index.all(&self.file, kind)
    }

    pub fn anomalies(&mut self) -> Vec<&Declaration> {
        self.index.anomalies(&self.file)
    }

    // ---- text edits ----

    /// Change the package clause, adding one when missing.
    pub fn set_package(&mut self, name: &str) -> Result<(), SessionError> {
        check_package_name(name)?;
        let mut edits = EditSet::for_file(&self.file);
        match self.file.package_span() {
            Some(span) => edits.push(EditRequest::replace(span, name)),
            None => edits.insert(0, format!("package {name}\n\n")),
        }
        let text = edits.apply(self.file.buffer())?;
        self.rebuild(text)
    }

    /// Append `code` after the last declaration, separated by a blank line.
    pub fn add_code(&mut self, code: &str) -> Result<(), SessionError> {
        let source = self.file.source();
        let content_end = source.trim_end().len();
        let mut edits = EditSet::for_file(&self.file);
        edits.push(EditRequest::replace(
            Span::new(content_end, source.len()),
            format!("\n\n{}\n", code.trim_matches('\n')),
        ));
        let text = edits.apply(self.file.buffer())?;
        self.rebuild(text)
    }

    /// Queue a replacement of everything from `first` through `last`.
    pub fn replace(&mut self, first: Span, last: Span, text: impl Into<String>) {
        self.edits.replace(first, last, text);
    }

    /// Queue a replacement of a whole declaration.
    pub fn replace_declaration(
        &mut self,
        decl: &Declaration,
        text: impl Into<String>,
    ) -> Result<(), SessionError> {
        if !decl.belongs_to(&self.file) {
            return Err(SessionError::StaleDeclaration { name: decl.name() });
        }
        self.edits.replace(decl.span, decl.span, text);
        Ok(())
    }

    /// Apply queued edits and re-parse. Returns whether the text changed.
    pub fn apply_edits(&mut self) -> Result<bool, SessionError> {
        if self.edits.is_empty() {
            return Ok(false);
        }
        let text = self.edits.apply(self.file.buffer())?;
        if text == self.file.source() {
            return Ok(false);
        }
        self.rebuild(text)?;
        Ok(true)
    }

    /// Replace every match of an ast-grep `pattern` with `template`.
    /// Returns the number of matches rewritten.
    pub fn rewrite_pattern(&mut self, pattern: &str, template: &str) -> Result<usize, SessionError> {
        let matcher = PatternMatcher::for_file(&self.file);
        let requests = find_and_replace(&matcher, pattern, template)?;
        let count = requests.len();
        for request in requests {
            self.edits.push(request);
        }
        self.apply_edits()?;
        Ok(count)
    }

    // ---- imports ----

    pub fn add_import(&mut self, path: &str, alias: Option<&str>) -> Result<bool, SessionError> {
        Ok(self.imports.add(path, alias)?)
    }

    /// Drop an import from the list unless the file still references it.
    pub fn remove_import(&mut self, path: &str, alias: Option<&str>) -> Result<bool, SessionError> {
        let usages = Usages::collect(&self.file)?;
        Ok(self.imports.remove(path, alias, &usages))
    }

    /// Re-read the import list from the current text.
    pub fn reload_imports(&mut self) {
        self.imports = ImportSet::from_file(&self.file);
    }

    /// Render the import list as one canonical block after the package
    /// clause, replacing the declarations there. Returns whether the text
    /// changed.
    pub fn write_imports(&mut self) -> Result<bool, SessionError> {
        let text = self.imports.render(self.file.package_end(), &self.file)?;
        if text == self.file.source() {
            return Ok(false);
        }
        self.rebuild(text)?;
        Ok(true)
    }

    /// Edit the written imports into the import list, touching only the
    /// specs that differ. Returns whether the text changed.
    fn sync_imports(&mut self) -> Result<bool, SessionError> {
        let mut edits = sync_edits(&self.imports, self.file.package_end(), &self.file);
        if edits.is_empty() {
            return Ok(false);
        }
        let text = edits.apply(self.file.buffer())?;
        if text == self.file.source() {
            return Ok(false);
        }
        self.rebuild(text)?;
        Ok(true)
    }

    /// Drop unused and version-shadowed imports, deleting just their specs
    /// from the text, and write entries added since the last sync.
    /// Returns the number of imports removed.
    pub fn clean_imports(&mut self) -> Result<usize, SessionError> {
        let usages = Usages::collect(&self.file)?;
        let removed = self.imports.prune_unused(&usages).len() + self.imports.dedup_versioned();
        if removed > 0 {
            tracing::debug!(removed, "cleaned imports");
        }
        self.sync_imports()?;
        Ok(removed)
    }

    /// Add imports speculatively, then keep only those the code references.
    /// Returns the number of imports pruned.
    pub fn inject_imports<'a, I>(&mut self, imports: I) -> Result<usize, SessionError>
    where
        I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
    {
        let mut candidate = self.imports.clone();
        for (path, alias) in imports {
            candidate.add(path, alias)?;
        }
        self.imports = candidate;
        self.clean_imports()
    }
}

fn check_package_name(name: &str) -> Result<(), SessionError> {
    if is_identifier(name) && name != "_" {
        Ok(())
    } else {
        Err(SessionError::InvalidPackageName(name.to_string()))
    }
}
