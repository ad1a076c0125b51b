//! Declaration indexer: classifies the top-level declarations of a Go file.
//!
//! Classification dispatches over the closed [`DeclShape`] sum type. Nodes
//! that fit no shape are kept as [`DeclShape::Unclassified`] together with a
//! [`ClassificationError`] so the rest of the file stays usable.

mod classify;
pub mod errors;
pub mod glob;
pub mod index;
pub mod node;

pub use errors::ClassificationError;
pub use glob::NamePatterns;
pub use index::DeclarationIndex;
pub use node::{
    trim_comment, Comment, DeclKind, DeclShape, Declaration, ImportSpecInfo, Member, TypeSpecInfo,
    UnknownKind, ValueKeyword,
};
