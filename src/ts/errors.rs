use thiserror::Error;

#[derive(Error, Debug)]
pub enum TreeSitterError {
    #[error("failed to set language for parser")]
    LanguageSet,

    #[error("failed to parse source code")]
    ParseFailed,

    #[error("invalid tree-sitter query: {message}")]
    InvalidQuery { message: String },

    #[error("query matched {count} locations, expected exactly 1")]
    AmbiguousMatch { count: usize },

    #[error("query matched 0 locations")]
    NoMatch,

    #[error("syntax error detected at byte {byte_start}..{byte_end}")]
    SyntaxError { byte_start: usize, byte_end: usize },

    #[error("multiple syntax errors detected: {count} ERROR nodes")]
    MultipleSyntaxErrors { count: usize },
}

/// Malformed input. Fatal for the file: no partial tree is kept.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("syntax error at {line}:{column} (byte {offset})")]
    Syntax {
        line: usize,
        column: usize,
        offset: usize,
        /// Number of ERROR/MISSING nodes in the whole tree.
        count: usize,
    },

    #[error("invalid UTF-8 at {line}:{column} (byte {offset})")]
    InvalidUtf8 {
        line: usize,
        column: usize,
        offset: usize,
    },

    #[error("parser unavailable: {message}")]
    Parser { message: String },
}

impl ParseError {
    /// 1-based line/column of the offending input, if the error has one.
    pub fn location(&self) -> Option<(usize, usize)> {
        match self {
            ParseError::Syntax { line, column, .. } | ParseError::InvalidUtf8 { line, column, .. } => {
                Some((*line, *column))
            }
            ParseError::Parser { .. } => None,
        }
    }
}

impl From<TreeSitterError> for ParseError {
    fn from(e: TreeSitterError) -> Self {
        ParseError::Parser {
            message: e.to_string(),
        }
    }
}
