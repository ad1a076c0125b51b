//! One version of a Go file: verbatim text, line table and syntax tree.
//!
//! A [`SourceFile`] is never mutated. Rewriting produces new bytes which must
//! be parsed into a new `SourceFile`; spans taken from the old one carry its
//! [`BufferId`] so they can be rejected against the new version.

use crate::ts::errors::ParseError;
use crate::ts::parser::{error_nodes, GoParser};
use crate::ts::position::{Position, PositionIndex};
use std::fmt;
use std::ops::Range;
use tree_sitter::{Node, Tree};
use xxhash_rust::xxh3::xxh3_64;

/// Half-open byte range `[start, end)` into one buffer version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, serde::Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "inverted span {start}..{end}");
        Self { start, end }
    }

    pub fn of(node: Node<'_>) -> Self {
        Self {
            start: node.start_byte(),
            end: node.end_byte(),
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Smallest span covering both.
    pub fn to(&self, last: &Span) -> Span {
        Span {
            start: self.start.min(last.start),
            end: self.end.max(last.end),
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Identity of one buffer version: length plus xxh3 of the bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId {
    len: usize,
    hash: u64,
}

impl BufferId {
    pub fn of(bytes: &[u8]) -> Self {
        Self {
            len: bytes.len(),
            hash: xxh3_64(bytes),
        }
    }
}

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}/{}", self.hash, self.len)
    }
}

/// Raw text of one file version.
#[derive(Debug, Clone)]
pub struct SourceBuffer {
    text: String,
    positions: PositionIndex,
    id: BufferId,
}

impl SourceBuffer {
    /// Validate UTF-8 and build the position table.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, ParseError> {
        let bytes = bytes.into();
        let positions = PositionIndex::new(&bytes);
        let id = BufferId::of(&bytes);
        let text = String::from_utf8(bytes).map_err(|e| {
            let offset = e.utf8_error().valid_up_to();
            let pos = positions.position(offset);
            ParseError::InvalidUtf8 {
                line: pos.line,
                column: pos.column,
                offset,
            }
        })?;
        Ok(Self {
            text,
            positions,
            id,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn positions(&self) -> &PositionIndex {
        &self.positions
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

/// Immutable syntax tree stamped with the buffer it was built from.
pub struct SyntaxTree {
    tree: Tree,
    buffer: BufferId,
}

impl SyntaxTree {
    pub fn root_node(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn buffer_id(&self) -> BufferId {
        self.buffer
    }
}

impl fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("buffer", &self.buffer)
            .field("root", &self.tree.root_node().kind())
            .finish()
    }
}

/// A parsed Go file.
#[derive(Debug)]
pub struct SourceFile {
    buffer: SourceBuffer,
    tree: SyntaxTree,
}

impl SourceFile {
    /// Parse with a fresh parser.
    pub fn parse(bytes: impl Into<Vec<u8>>) -> Result<Self, ParseError> {
        let mut parser = GoParser::new()?;
        Self::parse_with(&mut parser, bytes)
    }

    /// Parse reusing a caller-owned parser.
    pub fn parse_with(parser: &mut GoParser, bytes: impl Into<Vec<u8>>) -> Result<Self, ParseError> {
        let buffer = SourceBuffer::new(bytes)?;
        let tree = parser.parse(buffer.as_str())?;

        let root = tree.root_node();
        if root.has_error() {
            let errors = error_nodes(root);
            let first = errors.first().map_or(root.start_byte(), |e| e.span.start);
            let pos = buffer.positions().position(first);
            tracing::debug!(
                line = pos.line,
                column = pos.column,
                count = errors.len(),
                "go source failed to parse"
            );
            return Err(ParseError::Syntax {
                line: pos.line,
                column: pos.column,
                offset: first,
                count: errors.len().max(1),
            });
        }

        tracing::trace!(bytes = buffer.len(), id = %buffer.id(), "parsed go source");
        let tree = SyntaxTree {
            tree,
            buffer: buffer.id(),
        };
        Ok(Self { buffer, tree })
    }

    pub fn source(&self) -> &str {
        self.buffer.as_str()
    }

    pub fn buffer(&self) -> &SourceBuffer {
        &self.buffer
    }

    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    pub fn root_node(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn buffer_id(&self) -> BufferId {
        self.buffer.id()
    }

    /// Text of a node of this file's tree.
    pub fn node_text(&self, node: Node<'_>) -> &str {
        &self.source()[node.byte_range()]
    }

    /// Text of a span, `None` when out of range or off a char boundary.
    pub fn span_text(&self, span: Span) -> Option<&str> {
        self.source().get(span.range())
    }

    pub fn position(&self, offset: usize) -> Position {
        self.buffer.positions().position(offset)
    }

    pub fn offset_of(&self, line: usize, column: usize) -> Option<usize> {
        self.buffer.positions().offset(line, column)
    }

    fn package_clause(&self) -> Option<Node<'_>> {
        let root = self.root_node();
        let mut cursor = root.walk();
        let clause = root
            .named_children(&mut cursor)
            .find(|n| n.kind() == "package_clause");
        clause
    }

    /// Package name from the `package` clause.
    pub fn package_name(&self) -> Option<&str> {
        self.package_span().and_then(|span| self.span_text(span))
    }

    /// Span of the package identifier.
    pub fn package_span(&self) -> Option<Span> {
        let clause = self.package_clause()?;
        let mut cursor = clause.walk();
        let ident = clause
            .named_children(&mut cursor)
            .find(|n| n.kind() == "package_identifier");
        ident.map(Span::of)
    }

    /// Offset right after the package clause; 0 when there is none.
    pub fn package_end(&self) -> usize {
        self.package_clause().map_or(0, |n| n.end_byte())
    }

    pub fn into_buffer(self) -> SourceBuffer {
        self.buffer
    }
}
