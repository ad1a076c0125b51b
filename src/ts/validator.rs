//! Syntax checks for generated Go text.

use crate::ts::errors::TreeSitterError;
use crate::ts::parser::{error_nodes, ErrorNode, GoParser};
use crate::ts::source::Span;

fn check(errors: &[&ErrorNode]) -> Result<(), TreeSitterError> {
    match errors {
        [] => Ok(()),
        [only] => Err(TreeSitterError::SyntaxError {
            byte_start: only.span.start,
            byte_end: only.span.end,
        }),
        many => Err(TreeSitterError::MultipleSyntaxErrors { count: many.len() }),
    }
}

/// Whether `source` parses as a Go file without ERROR or MISSING nodes.
pub fn validate_syntax(source: &str) -> Result<(), TreeSitterError> {
    let tree = GoParser::new()?.parse(source)?;
    let errors = error_nodes(tree.root_node());
    check(&errors.iter().collect::<Vec<_>>())
}

/// Whether `edited` has syntax errors that `original` did not.
///
/// Both texts are compared through their common prefix and suffix: an error
/// of `edited` lying entirely in the unchanged prefix, or in the unchanged
/// suffix shifted by the length difference, is tolerated when `original`
/// has the same error there.
pub fn validate_edit(original: &str, edited: &str) -> Result<(), TreeSitterError> {
    let mut parser = GoParser::new()?;
    let before = error_nodes(parser.parse(original)?.root_node());
    let after = error_nodes(parser.parse(edited)?.root_node());

    let (a, b) = (original.as_bytes(), edited.as_bytes());
    let prefix = a.iter().zip(b).take_while(|(x, y)| x == y).count();
    let max_suffix = a.len().min(b.len()) - prefix;
    let suffix = a
        .iter()
        .rev()
        .zip(b.iter().rev())
        .take(max_suffix)
        .take_while(|(x, y)| x == y)
        .count();
    let edited_tail = b.len() - suffix;
    let original_tail = a.len() - suffix;

    let preexisting = |e: &ErrorNode| {
        if e.span.end <= prefix {
            return before.contains(e);
        }
        if e.span.start >= edited_tail {
            let shifted = ErrorNode {
                span: Span::new(
                    e.span.start - edited_tail + original_tail,
                    e.span.end - edited_tail + original_tail,
                ),
                missing: e.missing,
            };
            return before.contains(&shifted);
        }
        false
    };

    let introduced: Vec<&ErrorNode> = after.iter().filter(|e| !preexisting(e)).collect();
    if !introduced.is_empty() {
        tracing::debug!(count = introduced.len(), "edit introduced syntax errors");
    }
    check(&introduced)
}
