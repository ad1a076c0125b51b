//! Tree-sitter integration: the tree builder for Go sources.
//!
//! Parsing is lossless. The buffer is kept verbatim next to its tree, and
//! every node, comments included, is addressable by byte span.

pub mod errors;
pub mod parser;
pub mod position;
pub mod query;
pub mod source;
pub mod validator;

pub use errors::{ParseError, TreeSitterError};
pub use parser::{ErrorNode, GoParser};
pub use position::{Position, PositionIndex};
pub use query::{queries, QueryEngine, QueryMatch};
pub use source::{BufferId, SourceBuffer, SourceFile, Span, SyntaxTree};
pub use validator::{validate_edit, validate_syntax};
