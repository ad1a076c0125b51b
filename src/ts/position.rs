//! Byte offset to line/column mapping for one buffer version.

/// 1-based line and byte column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Line start table built once per buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionIndex {
    line_starts: Vec<usize>,
    len: usize,
}

impl PositionIndex {
    pub fn new(source: &[u8]) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .iter()
                .enumerate()
                .filter(|(_, b)| **b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            line_starts,
            len: source.len(),
        }
    }

    /// Position of a byte offset. Offsets past the end clamp to the end.
    pub fn position(&self, offset: usize) -> Position {
        let offset = offset.min(self.len);
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(next) => next - 1,
        };
        Position {
            line: line + 1,
            column: offset - self.line_starts[line] + 1,
        }
    }

    /// Byte offset of a 1-based line/column, if it lies inside the buffer.
    pub fn offset(&self, line: usize, column: usize) -> Option<usize> {
        let start = *self.line_starts.get(line.checked_sub(1)?)?;
        let offset = start + column.checked_sub(1)?;
        let line_end = self
            .line_starts
            .get(line)
            .map_or(self.len, |next| next - 1);
        (offset <= line_end).then_some(offset)
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Byte offset where the given 1-based line starts.
    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.line_starts.get(line.checked_sub(1)?).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_across_lines() {
        let index = PositionIndex::new(b"package a\n\nfunc f() {}\n");
        assert_eq!(index.position(0), Position { line: 1, column: 1 });
        assert_eq!(index.position(8), Position { line: 1, column: 9 });
        assert_eq!(index.position(10), Position { line: 2, column: 1 });
        assert_eq!(index.position(11), Position { line: 3, column: 1 });
        assert_eq!(index.position(16), Position { line: 3, column: 6 });
        assert_eq!(index.line_count(), 4);
    }

    #[test]
    fn offset_round_trips_position() {
        let source = b"package a\nvar x = 1\n";
        let index = PositionIndex::new(source);
        for offset in 0..=source.len() {
            let pos = index.position(offset);
            assert_eq!(index.offset(pos.line, pos.column), Some(offset));
        }
    }

    #[test]
    fn offset_outside_buffer() {
        let index = PositionIndex::new(b"ab\ncd");
        assert_eq!(index.offset(0, 1), None);
        assert_eq!(index.offset(1, 0), None);
        assert_eq!(index.offset(1, 5), None);
        assert_eq!(index.offset(3, 1), None);
        assert_eq!(index.offset(2, 3), Some(5));
    }

    #[test]
    fn clamps_past_end() {
        let index = PositionIndex::new(b"ab");
        assert_eq!(index.position(99), Position { line: 1, column: 3 });
    }
}
