//! Bringing the import declarations of a buffer in line with an import list
//! by editing only the specs that differ.
//!
//! Specs that stay are never rewritten, so their comments, grouping and the
//! cgo preamble above `import "C"` survive.

use crate::decl::{DeclKind, DeclShape, DeclarationIndex};
use crate::edit::EditSet;
use crate::imports::render::render_block;
use crate::imports::set::{ImportEntry, ImportSet};
use crate::ts::{SourceFile, Span};
use std::collections::BTreeSet;

/// The cgo pseudo-package. Always its own declaration.
pub const CGO_PATH: &str = "C";

/// One top-level `import` declaration as written.
#[derive(Debug, Clone)]
pub(crate) struct ImportDecl {
    pub span: Span,
    /// `import ( ... )` rather than `import "x"`.
    pub grouped: bool,
    pub specs: Vec<(ImportEntry, Span)>,
}

impl ImportDecl {
    pub fn is_cgo(&self) -> bool {
        !self.specs.is_empty() && self.specs.iter().all(|(e, _)| e.path == CGO_PATH)
    }
}

/// Import declarations of `file` starting at or after `offset`, in order.
pub(crate) fn import_decls(file: &SourceFile, offset: usize) -> Vec<ImportDecl> {
    let mut index = DeclarationIndex::new(file);
    let mut decls: Vec<ImportDecl> = index
        .all(file, Some(DeclKind::Import))
        .into_iter()
        .filter(|d| d.span.start >= offset)
        .filter_map(|d| match &d.shape {
            DeclShape::Import { specs } => Some(ImportDecl {
                span: d.span,
                grouped: file.source()[d.span.range()].ends_with(')'),
                specs: specs
                    .iter()
                    .map(|s| {
                        let entry = ImportEntry {
                            path: s.path.clone(),
                            alias: s.alias.clone(),
                        };
                        (entry, s.span)
                    })
                    .collect(),
            }),
            _ => None,
        })
        .collect();
    decls.sort_by_key(|d| d.span.start);
    decls
}

/// Region to delete for `span`: whole lines when `span` is alone on its
/// lines (a trailing `//` comment goes with it), otherwise just the text
/// and a following `;`.
fn line_extent(source: &str, span: Span) -> Span {
    let line_start = source[..span.start].rfind('\n').map_or(0, |i| i + 1);
    let line_end = source[span.end..]
        .find('\n')
        .map_or(source.len(), |i| span.end + i + 1);

    let lead = &source[line_start..span.start];
    let tail = source[span.end..line_end].trim_start_matches([' ', '\t']);
    let own_line = lead.trim().is_empty();

    if own_line && (tail.trim().is_empty() || tail.starts_with("//")) {
        Span::new(line_start, line_end)
    } else if tail.starts_with(';') {
        Span::new(span.start, line_end - tail.len() + 1)
    } else {
        span
    }
}

/// Swallow the blank line a deletion would otherwise leave doubled, or
/// dangling right after `(` or before `)`.
fn widen(source: &str, region: Span) -> Span {
    let before = &source[..region.start];
    let after = &source[region.end..];
    let opened = before.ends_with("\n\n") || before.ends_with("(\n") || before.is_empty();
    if opened && after.starts_with('\n') {
        Span::new(region.start, region.end + 1)
    } else if before.ends_with("\n\n") && after.trim_start_matches([' ', '\t']).starts_with(')') {
        Span::new(region.start - 1, region.end)
    } else {
        region
    }
}

/// Deletion regions for `spans`: extended to whole lines, adjacent ones
/// merged, then widened over blank lines.
pub(crate) fn deletions(source: &str, spans: impl IntoIterator<Item = Span>) -> Vec<Span> {
    let regions = merge(spans.into_iter().map(|s| line_extent(source, s)).collect());
    merge(regions.into_iter().map(|r| widen(source, r)).collect())
}

fn merge(mut regions: Vec<Span>) -> Vec<Span> {
    regions.sort();
    let mut merged: Vec<Span> = Vec::with_capacity(regions.len());
    for region in regions {
        match merged.last_mut() {
            Some(last) if last.end >= region.start => *last = last.to(&region),
            _ => merged.push(region),
        }
    }
    merged
}

/// Edits turning the imports written in `file` into exactly `set`.
///
/// Specs missing from `set` are deleted, or their whole declaration when
/// none of its specs stay. Entries missing from the text go into the first
/// parenthesized declaration that stays, or into a new declaration after
/// the last one (after `target_offset` when there is none). `import "C"` is
/// never touched and never merged into a group. Repeated specs keep their
/// first occurrence.
pub fn sync_edits(set: &ImportSet, target_offset: usize, file: &SourceFile) -> EditSet {
    let source = file.source();
    let decls = import_decls(file, target_offset);
    let mut edits = EditSet::for_file(file);

    let mut written: BTreeSet<&ImportEntry> = BTreeSet::new();
    let mut doomed: Vec<Span> = Vec::new();
    let mut survivors: Vec<&ImportDecl> = Vec::new();
    for decl in &decls {
        if decl.is_cgo() {
            written.extend(decl.specs.iter().map(|(e, _)| e));
            survivors.push(decl);
            continue;
        }
        let mut dropped = Vec::new();
        for (entry, span) in &decl.specs {
            if !set.contains_entry(entry) || !written.insert(entry) {
                dropped.push(*span);
            }
        }
        if dropped.len() == decl.specs.len() {
            doomed.push(decl.span);
        } else {
            doomed.extend(dropped);
            survivors.push(decl);
        }
    }
    for region in deletions(source, doomed) {
        edits.replace(region, region, "");
    }

    let (cgo, missing): (Vec<&ImportEntry>, Vec<&ImportEntry>) = set
        .iter()
        .filter(|e| !written.contains(e))
        .partition(|e| e.path == CGO_PATH);

    let group = survivors.iter().find(|d| d.grouped && !d.is_cgo());
    let mut extra: Vec<String> = Vec::new();
    match group {
        Some(group) if !missing.is_empty() => {
            let close = group.span.end - 1;
            let mut lines = String::new();
            if !source[..close].ends_with('\n') {
                lines.push('\n');
            }
            for entry in &missing {
                lines.push_str(&format!("\t{entry}\n"));
            }
            edits.insert(close, lines);
        }
        _ => {
            let block = render_block(&missing.iter().copied().cloned().collect::<ImportSet>());
            if !block.is_empty() {
                extra.push(block);
            }
        }
    }
    if !cgo.is_empty() {
        extra.push(format!("import \"{CGO_PATH}\""));
    }

    if !extra.is_empty() {
        let text = extra.join("\n\n");
        match survivors.last() {
            Some(last) => edits.insert(last.span.end, format!("\n\n{text}")),
            None => {
                let tail = if source[target_offset..].starts_with('\n') { "" } else { "\n" };
                edits.insert(target_offset, format!("\n\n{text}{tail}"));
            }
        }
    }

    tracing::trace!(
        edits = edits.len(),
        added = missing.len() + cgo.len(),
        "computed import edits"
    );
    edits
}
