use crate::sg::errors::AstGrepError;
use crate::sg::lang::go;
use crate::ts::{BufferId, SourceFile, Span};
use ast_grep_core::tree_sitter::StrDoc;
use ast_grep_core::{AstGrep, NodeMatch, Pattern};
use ast_grep_language::SupportLang;
use std::collections::HashMap;

/// A match from an ast-grep pattern with captured metavariables.
#[derive(Debug, Clone)]
pub struct PatternMatch {
    /// Byte range of the entire match
    pub span: Span,
    /// The matched text
    pub text: String,
    /// Captured metavariables: name -> text
    pub captures: HashMap<String, String>,
    /// Captured metavariables: name -> byte range. Variadic captures cover
    /// their first through last node.
    pub capture_spans: HashMap<String, Span>,
}

impl PatternMatch {
    pub fn span(&self) -> Span {
        self.span
    }

    pub fn capture(&self, name: &str) -> Option<&str> {
        self.captures.get(name).map(String::as_str)
    }

    pub fn capture_span(&self, name: &str) -> Option<Span> {
        self.capture_spans.get(name).copied()
    }
}

/// Pattern matcher over Go source using ast-grep's metavariable syntax.
///
/// # Metavariable Syntax
///
/// - `$NAME` - Matches a single node and captures it
/// - `$$$NAME` - Matches zero or more nodes (variadic)
/// - `$_` - Matches any single node (anonymous)
///
/// # Example Patterns
///
/// ```text
/// func $NAME($$$PARAMS) { $$$BODY }    // function declaration
/// type $NAME struct { $$$FIELDS }      // struct type
/// $PKG.Println($$$ARGS)                // qualified calls
/// ```
pub struct PatternMatcher {
    source: String,
    buffer: BufferId,
    sg: AstGrep<StrDoc<SupportLang>>,
}

impl PatternMatcher {
    /// Create a new pattern matcher for the given source code.
    pub fn new(source: &str) -> Self {
        let sg = AstGrep::new(source, go());
        Self {
            source: source.to_string(),
            buffer: BufferId::of(source.as_bytes()),
            sg,
        }
    }

    /// Matcher over the current text of a parsed file.
    pub fn for_file(file: &SourceFile) -> Self {
        Self::new(file.source())
    }

    /// Identity of the text the matcher was built from.
    pub fn buffer_id(&self) -> BufferId {
        self.buffer
    }

    fn compile(pattern: &str) -> Result<Pattern, AstGrepError> {
        Pattern::try_new(pattern, go()).map_err(|e| AstGrepError::InvalidPattern {
            message: e.to_string(),
        })
    }

    /// Find all matches for a pattern.
    pub fn find_all(&self, pattern: &str) -> Result<Vec<PatternMatch>, AstGrepError> {
        let pat = Self::compile(pattern)?;
        let root = self.sg.root();
        let results = root
            .find_all(&pat)
            .map(|m| self.node_match_to_pattern_match(m))
            .collect();
        Ok(results)
    }

    /// Find exactly one match for a pattern.
    pub fn find_unique(&self, pattern: &str) -> Result<PatternMatch, AstGrepError> {
        let mut matches = self.find_all(pattern)?;

        match matches.len() {
            0 => Err(AstGrepError::NoMatch),
            1 => Ok(matches.remove(0)),
            n => Err(AstGrepError::AmbiguousMatch { count: n }),
        }
    }

    /// Check if a pattern has any matches. Invalid patterns never match.
    pub fn has_match(&self, pattern: &str) -> bool {
        match Self::compile(pattern) {
            Ok(pat) => self.sg.root().find(&pat).is_some(),
            Err(e) => {
                tracing::debug!(pattern, error = %e, "pattern failed to compile");
                false
            }
        }
    }

    /// Find matches within a specific byte range.
    pub fn find_in_range(
        &self,
        pattern: &str,
        range: Span,
    ) -> Result<Vec<PatternMatch>, AstGrepError> {
        let matches = self.find_all(pattern)?;
        Ok(matches
            .into_iter()
            .filter(|m| m.span.start >= range.start && m.span.end <= range.end)
            .collect())
    }

    /// Find matches inside the function or method with the given name.
    pub fn find_in_function(
        &self,
        pattern: &str,
        function_name: &str,
    ) -> Result<Vec<PatternMatch>, AstGrepError> {
        let mut results = Vec::new();
        for func in self.find_by_kind_with_field("function_declaration", None)?
            .into_iter()
            .chain(self.find_by_kind_with_field("method_declaration", None)?)
        {
            if func.capture("name") == Some(function_name) {
                results.extend(self.find_in_range(pattern, func.span)?);
            }
        }
        results.sort_by_key(|m| m.span);
        Ok(results)
    }

    /// Get the source code.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Find all nodes of a specific kind, optionally filtering by a pattern
    /// on one of their fields.
    ///
    /// Useful for constructs that are not valid standalone Go, like the
    /// `case` clauses of a switch. The node's `name` field, when present, is
    /// reported as the `name` capture.
    pub fn find_by_kind_with_field(
        &self,
        kind: &str,
        field_filter: Option<(&str, &str)>,
    ) -> Result<Vec<PatternMatch>, AstGrepError> {
        let filter = match field_filter {
            Some((field, pattern)) => Some((field, Self::compile(pattern)?)),
            None => None,
        };

        let root = self.sg.root();
        let mut results = Vec::new();
        for node in root.dfs() {
            if node.kind() != kind {
                continue;
            }
            if let Some((field_name, pat)) = &filter {
                match node.field(field_name) {
                    Some(field) if field.find(pat).is_some() => {}
                    _ => continue,
                }
            }

            let range = node.range();
            let mut captures = HashMap::new();
            let mut capture_spans = HashMap::new();
            if let Some(name) = node.field("name") {
                let r = name.range();
                captures.insert("name".to_string(), self.source[r.clone()].to_string());
                capture_spans.insert("name".to_string(), Span::new(r.start, r.end));
            }
            results.push(PatternMatch {
                span: Span::new(range.start, range.end),
                text: self.source[range].to_string(),
                captures,
                capture_spans,
            });
        }
        Ok(results)
    }

    fn node_match_to_pattern_match(&self, m: NodeMatch<StrDoc<SupportLang>>) -> PatternMatch {
        let range = m.get_node().range();
        let env = m.get_env();

        let names: Vec<String> = HashMap::<String, String>::from(env.clone())
            .into_keys()
            .collect();

        // Capture text is sliced from the source so variadic captures keep
        // their separators.
        let mut captures = HashMap::new();
        let mut capture_spans = HashMap::new();
        for name in names {
            let range = match env.get_match(&name) {
                Some(node) => Some(node.range()),
                None => {
                    let nodes = env.get_multiple_matches(&name);
                    match (nodes.first(), nodes.last()) {
                        (Some(first), Some(last)) => Some(first.range().start..last.range().end),
                        _ => None,
                    }
                }
            };
            match range {
                Some(r) => {
                    captures.insert(name.clone(), self.source[r.clone()].to_string());
                    capture_spans.insert(name, Span::new(r.start, r.end));
                }
                None => {
                    captures.insert(name, String::new());
                }
            }
        }

        PatternMatch {
            span: Span::new(range.start, range.end),
            text: self.source[range].to_string(),
            captures,
            capture_spans,
        }
    }
}
