use crate::ts::errors::TreeSitterError;
use crate::ts::source::Span;
use ast_grep_language::{LanguageExt, SupportLang};
use tree_sitter::{Node, Parser, Tree};

/// A tree-sitter parser loaded with the Go grammar.
///
/// Owned by one session and reused across re-parses; there is no shared
/// pool.
pub struct GoParser {
    parser: Parser,
}

impl GoParser {
    pub fn new() -> Result<Self, TreeSitterError> {
        let mut parser = Parser::new();
        parser
            .set_language(&SupportLang::Go.get_ts_language())
            .map_err(|_| TreeSitterError::LanguageSet)?;
        Ok(Self { parser })
    }

    /// Parse `source` from scratch. Old trees are never reused, so every
    /// tree describes exactly one buffer version.
    pub fn parse(&mut self, source: &str) -> Result<Tree, TreeSitterError> {
        self.parser
            .parse(source, None)
            .ok_or(TreeSitterError::ParseFailed)
    }
}

/// An ERROR or MISSING node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorNode {
    pub span: Span,
    pub missing: bool,
}

/// ERROR and MISSING nodes below `root`, in document order.
pub(crate) fn error_nodes(root: Node<'_>) -> Vec<ErrorNode> {
    let mut found = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            found.push(ErrorNode {
                span: Span::of(node),
                missing: node.is_missing(),
            });
        }
        if !node.has_error() {
            continue;
        }
        // reversed so the leftmost child is visited first
        let mut cursor = node.walk();
        let children: Vec<_> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    found
}
