//! Lazily built catalogue of the top-level declarations of one file.
//!
//! The index walks the top-level nodes of a [`SourceFile`] only as far as a
//! lookup needs. Every method takes the file it was created for; passing a
//! different buffer version is an engine bug and panics.

use crate::decl::classify::{classify, Classified};
use crate::decl::glob::NamePatterns;
use crate::decl::node::{Comment, DeclKind, Declaration};
use crate::ts::{BufferId, SourceFile, Span};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
struct CommentGroup {
    span: Span,
    end_row: usize,
}

#[derive(Debug)]
pub struct DeclarationIndex {
    buffer: BufferId,
    /// All declarations indexed so far, in source order.
    decls: Vec<Declaration>,
    by_kind: HashMap<DeclKind, Vec<usize>>,
    /// Top-level named children consumed so far.
    next_child: usize,
    exhausted: bool,
    last_end_row: Option<usize>,
    pending_comment: Option<CommentGroup>,
    classified: usize,
    extensions: usize,
}

impl DeclarationIndex {
    /// An empty index over `file`. Nothing is classified until a lookup asks.
    pub fn new(file: &SourceFile) -> Self {
        Self {
            buffer: file.buffer_id(),
            decls: Vec::new(),
            by_kind: HashMap::new(),
            next_child: 0,
            exhausted: false,
            last_end_row: None,
            pending_comment: None,
            classified: 0,
            extensions: 0,
        }
    }

    /// An index with every declaration classified.
    pub fn build(file: &SourceFile) -> Self {
        let mut index = Self::new(file);
        index.index_all(file);
        index
    }

    pub fn buffer_id(&self) -> BufferId {
        self.buffer
    }

    /// Number of declarations classified so far.
    pub fn classified_count(&self) -> usize {
        self.classified
    }

    /// Number of index runs that classified at least one declaration.
    pub fn extension_count(&self) -> usize {
        self.extensions
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Declarations indexed so far, in source order.
    pub fn indexed(&self) -> &[Declaration] {
        &self.decls
    }

    fn check(&self, file: &SourceFile) {
        assert_eq!(
            self.buffer,
            file.buffer_id(),
            "declaration index used with a different buffer version"
        );
    }

    fn count(&self, kind: Option<DeclKind>) -> usize {
        match kind {
            None => self.decls.len(),
            Some(kind) => self.by_kind.get(&kind).map_or(0, Vec::len),
        }
    }

    fn bucket(&self, kind: Option<DeclKind>) -> Vec<&Declaration> {
        match kind {
            None => self.decls.iter().collect(),
            Some(kind) => self
                .by_kind
                .get(&kind)
                .map(|idxs| idxs.iter().map(|&i| &self.decls[i]).collect())
                .unwrap_or_default(),
        }
    }

    /// Classify unseen declarations until `quota` of `kind` are indexed.
    ///
    /// `None` kind counts every declaration; `None` quota exhausts the file.
    /// Returns whether the quota was met. A run that had to classify
    /// anything counts as one extension.
    pub fn index_next(
        &mut self,
        file: &SourceFile,
        kind: Option<DeclKind>,
        quota: Option<usize>,
    ) -> bool {
        self.check(file);
        let met = |index: &Self| quota.is_some_and(|q| index.count(kind) >= q);
        if met(self) {
            return true;
        }
        if self.exhausted {
            return false;
        }

        let root = file.root_node();
        let mut cursor = root.walk();
        let mut children = root.named_children(&mut cursor).skip(self.next_child);
        let before = self.classified;

        while !met(self) {
            let Some(node) = children.next() else {
                self.exhausted = true;
                break;
            };
            self.next_child += 1;
            match node.kind() {
                "package_clause" => {
                    self.last_end_row = Some(node.end_position().row);
                    self.pending_comment = None;
                }
                "comment" => self.note_comment(node),
                _ => self.push(node, file),
            }
        }

        if self.classified > before {
            self.extensions += 1;
            tracing::debug!(
                kind = kind.map_or("any", |k| k.as_str()),
                classified = self.classified - before,
                total = self.classified,
                exhausted = self.exhausted,
                "extended declaration index"
            );
        }
        quota.map_or(true, |_| met(self))
    }

    /// Classify everything that is left.
    pub fn index_all(&mut self, file: &SourceFile) {
        self.index_next(file, None, None);
    }

    fn note_comment(&mut self, node: tree_sitter::Node<'_>) {
        let start_row = node.start_position().row;
        let end_row = node.end_position().row;
        if self.last_end_row == Some(start_row) {
            // trailing comment of the previous declaration
            self.pending_comment = None;
            return;
        }
        match &mut self.pending_comment {
            Some(group) if start_row <= group.end_row + 1 => {
                group.span = group.span.to(&Span::of(node));
                group.end_row = end_row;
            }
            _ => {
                self.pending_comment = Some(CommentGroup {
                    span: Span::of(node),
                    end_row,
                });
            }
        }
    }

    fn push(&mut self, node: tree_sitter::Node<'_>, file: &SourceFile) {
        let start_row = node.start_position().row;
        let leading_comment = self
            .pending_comment
            .take()
            .filter(|group| group.end_row + 1 == start_row)
            .and_then(|group| {
                file.span_text(group.span).map(|text| Comment {
                    text: text.to_string(),
                    span: group.span,
                })
            });

        let Classified { names, shape } = classify(node, file);
        let decl = Declaration {
            ordinal: self.decls.len(),
            names,
            span: Span::of(node),
            leading_comment,
            shape,
            buffer: self.buffer,
        };
        debug_assert!(
            self.decls
                .last()
                .map_or(true, |prev| prev.span.end <= decl.span.start),
            "declarations out of source order"
        );

        let idx = self.decls.len();
        for kind in decl.kinds() {
            self.by_kind.entry(*kind).or_default().push(idx);
        }
        tracing::trace!(kind = %decl.kind(), names = ?decl.names, span = %decl.span, "classified declaration");
        self.decls.push(decl);
        self.last_end_row = Some(node.end_position().row);
        self.classified += 1;
    }

    /// The `offset`-th declaration of `kind`; negative offsets count from
    /// the end. Extends the index only as far as needed.
    pub fn get_nth(
        &mut self,
        file: &SourceFile,
        kind: Option<DeclKind>,
        offset: isize,
    ) -> Option<&Declaration> {
        let position = if offset >= 0 {
            let wanted = offset.unsigned_abs();
            if !self.index_next(file, kind, Some(wanted + 1)) {
                return None;
            }
            wanted
        } else {
            self.index_all(file);
            self.count(kind).checked_sub(offset.unsigned_abs())?
        };
        self.bucket(kind).get(position).copied()
    }

    /// Declarations of `kind` with any bound name matching any pattern.
    /// An empty pattern list matches every declaration.
    pub fn find_by_name<S: AsRef<str>>(
        &mut self,
        file: &SourceFile,
        kind: Option<DeclKind>,
        patterns: &[S],
    ) -> Vec<&Declaration> {
        self.index_all(file);
        let patterns = NamePatterns::new(patterns);
        self.bucket(kind)
            .into_iter()
            .filter(|d| patterns.matches_any(&d.names))
            .collect()
    }

    /// Every declaration of `kind`, exhausting the index.
    pub fn all(&mut self, file: &SourceFile, kind: Option<DeclKind>) -> Vec<&Declaration> {
        self.index_all(file);
        self.bucket(kind)
    }

    /// Top-level nodes that could not be classified.
    pub fn anomalies(&mut self, file: &SourceFile) -> Vec<&Declaration> {
        self.all(file, Some(DeclKind::Unclassified))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::node::DeclShape;

    fn funcs(n: usize) -> String {
        let mut src = String::from("package a\n");
        for i in 0..n {
            src.push_str(&format!("\nfunc f{i}() {{}}\n"));
        }
        src
    }

    #[test]
    fn quota_limits_classification() {
        let file = SourceFile::parse(funcs(10)).unwrap();
        let mut index = DeclarationIndex::new(&file);
        assert_eq!(index.classified_count(), 0);

        assert!(index.index_next(&file, Some(DeclKind::Func), Some(3)));
        assert_eq!(index.classified_count(), 3);
        assert_eq!(index.extension_count(), 1);

        // already satisfied: no work
        assert!(index.index_next(&file, Some(DeclKind::Func), Some(2)));
        assert_eq!(index.extension_count(), 1);

        let fourth = index.get_nth(&file, Some(DeclKind::Func), 3).unwrap();
        assert_eq!(fourth.names, vec!["f3"]);
        assert_eq!(index.classified_count(), 4);
        assert_eq!(index.extension_count(), 2);
    }

    #[test]
    fn quota_unmet_exhausts() {
        let file = SourceFile::parse(funcs(2)).unwrap();
        let mut index = DeclarationIndex::new(&file);
        assert!(!index.index_next(&file, Some(DeclKind::Func), Some(5)));
        assert!(index.is_exhausted());
        assert_eq!(index.classified_count(), 2);
    }

    #[test]
    fn negative_offsets_count_from_end() {
        let file = SourceFile::parse(funcs(4)).unwrap();
        let mut index = DeclarationIndex::new(&file);
        let last = index.get_nth(&file, Some(DeclKind::Func), -1).unwrap();
        assert_eq!(last.names, vec!["f3"]);
        let first = index.get_nth(&file, Some(DeclKind::Func), -4).unwrap();
        assert_eq!(first.names, vec!["f0"]);
        assert!(index.get_nth(&file, Some(DeclKind::Func), -5).is_none());
        assert!(index.get_nth(&file, Some(DeclKind::Func), 4).is_none());
    }

    const MIXED: &str = r#"package models

import "time"

// MaxUsers caps registrations.
const MaxUsers = 100

// Config holds settings.
// It is loaded once.
type Config struct {
	Name string
	Port int
}

type ID int64

var started time.Time // set on boot
func (c *Config) Addr() string { return c.Name }

func NewConfig() *Config { return &Config{} }
"#;

    #[test]
    fn buckets_and_comments() {
        let file = SourceFile::parse(MIXED).unwrap();
        let mut index = DeclarationIndex::build(&file);
        assert!(index.is_exhausted());

        let all = index.all(&file, None);
        assert_eq!(all.len(), 7);
        for pair in all.windows(2) {
            assert!(pair[0].span.end <= pair[1].span.start);
        }

        let types: Vec<_> = index
            .all(&file, Some(DeclKind::Type))
            .into_iter()
            .map(|d| d.name())
            .collect();
        assert_eq!(types, vec!["Config", "ID"]);
        assert_eq!(index.all(&file, Some(DeclKind::Struct)).len(), 1);
        assert_eq!(index.all(&file, Some(DeclKind::Func)).len(), 2);

        let config = index.find_by_name(&file, Some(DeclKind::Type), &["Config"])[0];
        assert_eq!(config.kind_label(), "type.struct");
        assert_eq!(
            config.comment(true).as_deref(),
            Some("Config holds settings.\nIt is loaded once.")
        );
        assert_eq!(config.member_text(&file, -1), Some("Port int"));

        let max = index.find_by_name(&file, Some(DeclKind::Const), &["Max*"])[0];
        assert_eq!(max.comment(false).as_deref(), Some("// MaxUsers caps registrations."));

        // trailing comment of `started` must not lead the method
        let addr = index.find_by_name(&file, Some(DeclKind::Func), &["Addr"])[0];
        assert!(addr.leading_comment.is_none());
        assert!(matches!(addr.shape, DeclShape::Function { receiver: Some(_) }));
    }

    #[test]
    fn empty_pattern_list_matches_all() {
        let file = SourceFile::parse(MIXED).unwrap();
        let mut index = DeclarationIndex::new(&file);
        let none: [&str; 0] = [];
        assert_eq!(index.find_by_name(&file, None, &none).len(), 7);
    }

    #[test]
    fn well_formed_file_has_no_anomalies() {
        let file = SourceFile::parse(MIXED).unwrap();
        let mut index = DeclarationIndex::new(&file);
        assert!(index.anomalies(&file).is_empty());
    }

    #[test]
    fn top_level_statements_are_anomalies() {
        let file = SourceFile::parse("package a\n\nfunc f() {}\n\nx := 1\n\nvar y int\n").unwrap();
        let mut index = DeclarationIndex::new(&file);
        let anomalies = index.anomalies(&file);
        assert_eq!(anomalies.len(), 1);
        let error = anomalies[0].classification_error().unwrap();
        assert_eq!(error.node_kind, "short_var_declaration");
        assert_eq!(index.all(&file, None).len(), 3);
    }

    #[test]
    fn each_name_pattern_is_tried_on_its_own() {
        let file = SourceFile::parse("package a\n\nfunc GetX() {}\n\nfunc GetY() {}\n\nfunc SetX() {}\n").unwrap();
        let mut index = DeclarationIndex::new(&file);
        let names: Vec<String> = index
            .find_by_name(&file, Some(DeclKind::Func), &["Get*", "!GetX"])
            .iter()
            .map(|d| d.name())
            .collect();
        assert_eq!(names, vec!["GetX", "GetY"]);
    }

    #[test]
    #[should_panic(expected = "different buffer version")]
    fn stale_file_is_rejected() {
        let a = SourceFile::parse("package a\n").unwrap();
        let b = SourceFile::parse("package b\n").unwrap();
        let mut index = DeclarationIndex::new(&a);
        index.index_all(&b);
    }
}
