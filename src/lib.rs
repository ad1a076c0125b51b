//! gorew: structural rewriting of Go source files.
//!
//! Parsed Go files are edited through byte-span replacements, with a lazily
//! built catalogue of top-level declarations and an import list that is kept
//! deduplicated and pruned against actual package usage.
//!
//! # Architecture
//!
//! All text changes compile down to one primitive: [`EditRequest`], a span
//! replacement collected into an [`EditSet`] and applied in a single pass.
//! Intelligence lives in span acquisition (the declaration index,
//! tree-sitter queries, ast-grep patterns), not in the application logic.
//!
//! Every buffer version carries a [`BufferId`]. Spans, declarations and edit
//! sets remember the version they came from, so nothing computed against old
//! text can be applied to new text.
//!
//! # Example
//!
//! ```no_run
//! use gorew::{DeclKind, RewriteSession};
//!
//! let mut session = RewriteSession::new("package a\n\ntype Config struct {\n\tA int\n}\n")?;
//! let decl = session.find_by_name(Some(DeclKind::Type), &["Conf*"])[0].clone();
//! session.replace_declaration(&decl, "type Config struct {\n\tA int\n\tB string\n}")?;
//! session.apply_edits()?;
//! session.add_import("fmt", None)?;
//! session.write_imports()?;
//! println!("{}", session.source());
//! # Ok::<(), gorew::SessionError>(())
//! ```

pub mod config;
pub mod decl;
pub mod edit;
pub mod format;
pub mod imports;
pub mod session;
pub mod sg;
pub mod ts;
pub mod workspace;

// Re-exports
pub use config::{load_from_path, load_from_str, ConfigError, RewriteConfig};
pub use decl::{DeclKind, DeclShape, Declaration, DeclarationIndex, Member};
pub use edit::{EditRequest, EditSet, PatchError};
pub use format::{
    atomic_write, prettify_file, prettify_source, CommandFormatter, IdentityFormatter,
    SourceFormatter,
};
pub use imports::{ImportEntry, ImportError, ImportSet};
pub use session::{RewriteSession, SessionError};
pub use ts::{BufferId, GoParser, ParseError, SourceFile, Span, TreeSitterError};
