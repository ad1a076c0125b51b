//! Canonical import blocks and splicing them into a buffer.

use crate::edit::EditSet;
use crate::imports::errors::ImportError;
use crate::imports::set::{ImportEntry, ImportSet};
use crate::imports::splice::{deletions, import_decls, CGO_PATH};
use crate::ts::SourceFile;

/// Render the set as one import declaration: standard library first, a blank
/// line, then everything else, each group sorted by path then alias.
/// Empty for an empty set. `C` is left out; cgo needs it on its own.
pub fn render_block(set: &ImportSet) -> String {
    let (std, third): (Vec<&ImportEntry>, Vec<&ImportEntry>) = set
        .iter()
        .filter(|e| e.path != CGO_PATH)
        .partition(|e| e.is_standard());

    match (std.as_slice(), third.as_slice()) {
        ([], []) => String::new(),
        ([only], []) | ([], [only]) => format!("import {only}"),
        _ => {
            let mut out = String::from("import (\n");
            for entry in &std {
                out.push_str(&format!("\t{entry}\n"));
            }
            if !std.is_empty() && !third.is_empty() {
                out.push('\n');
            }
            for entry in &third {
                out.push_str(&format!("\t{entry}\n"));
            }
            out.push(')');
            out
        }
    }
}

/// Splice the rendered set into `file` at `target_offset`.
///
/// The first import declaration at or after the offset is replaced by the
/// block and the others are deleted; comments between them stay. A cgo
/// `import "C"` keeps its own declaration and preamble. Rendering the same
/// set twice yields the same bytes.
pub fn render_into(
    set: &ImportSet,
    target_offset: usize,
    file: &SourceFile,
) -> Result<String, ImportError> {
    let source = file.source();
    if target_offset > source.len() || !source.is_char_boundary(target_offset) {
        return Err(ImportError::InvalidOffset {
            offset: target_offset,
            len: source.len(),
        });
    }

    let (cgo, decls): (Vec<_>, Vec<_>) = import_decls(file, target_offset)
        .into_iter()
        .partition(|d| d.is_cgo());
    let mut block = render_block(set);
    if cgo.is_empty() && set.contains(CGO_PATH, None) {
        if !block.is_empty() {
            block.push_str("\n\n");
        }
        block.push_str(&format!("import \"{CGO_PATH}\""));
    }

    let mut edits = EditSet::for_file(file);
    match decls.split_first() {
        Some((first, rest)) if !block.is_empty() => {
            edits.replace(first.span, first.span, block);
            for region in deletions(source, rest.iter().map(|d| d.span)) {
                edits.replace(region, region, "");
            }
        }
        Some(_) => {
            for region in deletions(source, decls.iter().map(|d| d.span)) {
                edits.replace(region, region, "");
            }
        }
        None if block.is_empty() => {}
        None => {
            let tail = if source[target_offset..].starts_with('\n') { "" } else { "\n" };
            edits.insert(target_offset, format!("\n\n{block}{tail}"));
        }
    }
    let out = edits.apply(file.buffer())?;
    tracing::trace!(entries = set.len(), offset = target_offset, "rendered import block");
    Ok(out)
}
