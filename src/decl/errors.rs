use crate::ts::Span;
use thiserror::Error;

/// A top-level node the indexer could not categorize.
///
/// Recorded on an unclassified declaration instead of aborting, so the rest
/// of the file stays indexable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot classify top-level `{node_kind}` at {span}: {reason}")]
pub struct ClassificationError {
    pub node_kind: String,
    pub span: Span,
    pub reason: &'static str,
}
