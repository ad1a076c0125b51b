use crate::ts::{BufferId, SourceBuffer, SourceFile, Span};
use thiserror::Error;

/// The fundamental edit primitive: replace the text from the start of one
/// node to the end of another.
///
/// All higher level rewrites (declaration replacement, structural matches,
/// import blocks) compile down to this. Intelligence lives in span
/// acquisition, not application.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "EditRequest does nothing until its EditSet is applied"]
pub struct EditRequest {
    /// Span of the first node covered.
    pub first: Span,
    /// Span of the last node covered. Equal to `first` for single nodes.
    pub last: Span,
    pub replacement: String,
}

impl EditRequest {
    pub fn new(first: Span, last: Span, replacement: impl Into<String>) -> Self {
        Self {
            first,
            last,
            replacement: replacement.into(),
        }
    }

    /// Replace exactly `span`.
    pub fn replace(span: Span, replacement: impl Into<String>) -> Self {
        Self::new(span, span, replacement)
    }

    /// Insert at `offset` without removing anything.
    pub fn insert(offset: usize, text: impl Into<String>) -> Self {
        Self::replace(Span::new(offset, offset), text)
    }

    /// Effective region `[first.start, last.end)`. May be inverted when the
    /// spans were given in the wrong order; `apply` rejects that.
    pub fn start(&self) -> usize {
        self.first.start
    }

    pub fn end(&self) -> usize {
        self.last.end
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatchError {
    #[error(
        "overlapping edits: [{}, {}) and [{}, {})",
        first.start(), first.end(), second.start(), second.end()
    )]
    Overlap {
        first: Box<EditRequest>,
        second: Box<EditRequest>,
    },

    #[error("invalid edit range [{start}, {end}) in buffer of length {len}")]
    InvalidRange { start: usize, end: usize, len: usize },

    #[error("edits address buffer {expected} but the current buffer is {found}")]
    StaleBuffer { expected: BufferId, found: BufferId },
}

/// Edit requests against one buffer version, applied together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSet {
    buffer: BufferId,
    requests: Vec<EditRequest>,
}

impl EditSet {
    pub fn new(buffer: BufferId) -> Self {
        Self {
            buffer,
            requests: Vec::new(),
        }
    }

    pub fn for_file(file: &SourceFile) -> Self {
        Self::new(file.buffer_id())
    }

    pub fn buffer_id(&self) -> BufferId {
        self.buffer
    }

    pub fn push(&mut self, request: EditRequest) {
        self.requests.push(request);
    }

    pub fn replace(&mut self, first: Span, last: Span, replacement: impl Into<String>) {
        self.push(EditRequest::new(first, last, replacement));
    }

    pub fn insert(&mut self, offset: usize, text: impl Into<String>) {
        self.push(EditRequest::insert(offset, text));
    }

    pub fn requests(&self) -> &[EditRequest] {
        &self.requests
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn clear(&mut self) {
        self.requests.clear();
    }

    /// Retarget an empty set at a new buffer version.
    pub(crate) fn rebind(&mut self, buffer: BufferId) {
        debug_assert!(self.requests.is_empty(), "rebinding pending edits");
        self.buffer = buffer;
    }

    /// Apply every request to `buffer` in one pass.
    ///
    /// Requests are ordered by start offset (then end, keeping insertion
    /// order for ties). Adjacent regions and zero-length inserts at the same
    /// offset are fine; intersecting regions are not. On success the set is
    /// emptied, on error it is left untouched.
    pub fn apply(&mut self, buffer: &SourceBuffer) -> Result<String, PatchError> {
        if buffer.id() != self.buffer {
            return Err(PatchError::StaleBuffer {
                expected: self.buffer,
                found: buffer.id(),
            });
        }

        let source = buffer.as_str();
        if self.requests.is_empty() {
            return Ok(source.to_string());
        }

        for req in &self.requests {
            let (start, end) = (req.start(), req.end());
            if start > end
                || end > source.len()
                || !source.is_char_boundary(start)
                || !source.is_char_boundary(end)
            {
                return Err(PatchError::InvalidRange {
                    start,
                    end,
                    len: source.len(),
                });
            }
        }

        let mut order: Vec<&EditRequest> = self.requests.iter().collect();
        order.sort_by_key(|r| (r.start(), r.end()));

        for pair in order.windows(2) {
            if pair[0].end() > pair[1].start() {
                return Err(PatchError::Overlap {
                    first: Box::new(pair[0].clone()),
                    second: Box::new(pair[1].clone()),
                });
            }
        }

        let growth: usize = order.iter().map(|r| r.replacement.len()).sum();
        let mut out = String::with_capacity(source.len() + growth);
        let mut cursor = 0;
        for req in &order {
            out.push_str(&source[cursor..req.start()]);
            out.push_str(&req.replacement);
            cursor = req.end();
        }
        out.push_str(&source[cursor..]);

        tracing::debug!(
            edits = self.requests.len(),
            before = source.len(),
            after = out.len(),
            "applied edit set"
        );
        self.requests.clear();
        Ok(out)
    }
}
