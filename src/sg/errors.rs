use thiserror::Error;

/// Failures of structural search over Go source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AstGrepError {
    #[error("pattern is not valid Go: {message}")]
    InvalidPattern { message: String },

    #[error("pattern matched {count} locations, expected exactly 1")]
    AmbiguousMatch { count: usize },

    #[error("pattern matched nothing")]
    NoMatch,

    /// Asked for a `$NAME` the pattern never bound.
    #[error("match has no capture named '{name}'")]
    MetavarNotFound { name: String },
}
