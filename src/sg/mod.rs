//! ast-grep integration for pattern-based Go code matching.
//!
//! Patterns use ast-grep's metavariable syntax (`$NAME`, `$$$BODY`, ...).
//! Matches come back as byte spans that feed [`crate::edit::EditRequest`]s.

pub mod errors;
pub mod lang;
pub mod matcher;
pub mod replacer;

pub use errors::AstGrepError;
pub use lang::{go, SupportLang};
pub use matcher::{PatternMatch, PatternMatcher};
pub use replacer::{find_and_replace, CaptureReplacer};
