//! Go language support via ast-grep-language.
//!
//! The built-in `SupportLang::Go` handles metavariable preprocessing, so
//! `$NAME` works in patterns even though `$` is not a Go identifier char.

pub use ast_grep_language::SupportLang;

/// The Go language for ast-grep operations.
pub fn go() -> SupportLang {
    SupportLang::Go
}
