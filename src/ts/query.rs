use crate::ts::errors::TreeSitterError;
use crate::ts::source::{SourceFile, Span};
use ast_grep_language::{LanguageExt, SupportLang};
use std::collections::HashMap;
use tree_sitter::{Query, QueryCursor, StreamingIterator};

/// A match from a tree-sitter query with captured nodes.
#[derive(Debug, Clone)]
pub struct QueryMatch {
    /// The full match byte range
    pub span: Span,
    /// Named captures: capture_name -> node
    pub captures: HashMap<String, CapturedNode>,
}

#[derive(Debug, Clone)]
pub struct CapturedNode {
    pub span: Span,
    pub text: String,
    pub kind: String,
}

/// Engine for executing tree-sitter queries against a parsed Go file.
pub struct QueryEngine {
    query: Query,
    capture_names: Vec<String>,
}

impl QueryEngine {
    /// Create a new query engine from a tree-sitter query string.
    ///
    /// # Query Syntax
    ///
    /// Tree-sitter queries use S-expression syntax:
    /// ```text
    /// (function_declaration
    ///   name: (identifier) @func_name
    ///   body: (block) @body)
    /// ```
    pub fn new(query_str: &str) -> Result<Self, TreeSitterError> {
        let language = SupportLang::Go.get_ts_language();
        let query = Query::new(&language, query_str).map_err(|e| TreeSitterError::InvalidQuery {
            message: e.to_string(),
        })?;

        let capture_names = query.capture_names().iter().map(|s| s.to_string()).collect();

        Ok(Self {
            query,
            capture_names,
        })
    }

    /// Execute the query against a file and return all matches.
    pub fn find_all(&self, file: &SourceFile) -> Vec<QueryMatch> {
        let mut cursor = QueryCursor::new();
        let source = file.source();
        let mut matches = cursor.matches(&self.query, file.root_node(), source.as_bytes());

        let mut results = Vec::new();

        // tree-sitter 0.25+ uses StreamingIterator
        while let Some(m) = matches.next() {
            let mut captures = HashMap::new();
            let mut overall_start = usize::MAX;
            let mut overall_end = 0usize;

            for capture in m.captures {
                let node = capture.node;
                let name = &self.capture_names[capture.index as usize];

                overall_start = overall_start.min(node.start_byte());
                overall_end = overall_end.max(node.end_byte());

                captures.insert(
                    name.clone(),
                    CapturedNode {
                        span: Span::of(node),
                        text: source[node.byte_range()].to_string(),
                        kind: node.kind().to_string(),
                    },
                );
            }

            if overall_start != usize::MAX {
                results.push(QueryMatch {
                    span: Span::new(overall_start, overall_end),
                    captures,
                });
            }
        }

        results
    }

    /// Execute the query and expect exactly one match.
    pub fn find_unique(&self, file: &SourceFile) -> Result<QueryMatch, TreeSitterError> {
        let mut matches = self.find_all(file);

        match matches.len() {
            0 => Err(TreeSitterError::NoMatch),
            1 => Ok(matches.remove(0)),
            n => Err(TreeSitterError::AmbiguousMatch { count: n }),
        }
    }

    /// Get capture names defined in the query.
    pub fn capture_names(&self) -> &[String] {
        &self.capture_names
    }
}

/// Common tree-sitter queries for Go constructs.
pub mod queries {
    /// Package qualifiers: the `pkg` in `pkg.Func()` and `pkg.Type`.
    pub const QUALIFIERS: &str = r#"
        (selector_expression operand: (identifier) @qualifier)
        (qualified_type package: (package_identifier) @qualifier)
    "#;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_function_by_name() {
        let file = SourceFile::parse(
            r#"package main

func helper() {}

func main() {
	helper()
}

func other() {}
"#,
        )
        .unwrap();
        let engine = QueryEngine::new(
            r#"(function_declaration name: (identifier) @name (#eq? @name "main")) @function"#,
        )
        .unwrap();

        let matches = engine.find_all(&file);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].captures["name"].text, "main");
        assert!(file.span_text(matches[0].span).unwrap().starts_with("func main()"));
    }

    #[test]
    fn qualifier_usages() {
        let file = SourceFile::parse(
            r#"package main

import (
	"fmt"
	"net/http"
)

var handler http.Handler

func main() { fmt.Println("x") }
"#,
        )
        .unwrap();
        let engine = QueryEngine::new(queries::QUALIFIERS).unwrap();
        let mut names: Vec<_> = engine
            .find_all(&file)
            .into_iter()
            .map(|m| m.captures["qualifier"].text.clone())
            .collect();
        names.sort();
        assert_eq!(names, vec!["fmt", "http"]);
    }

    #[test]
    fn ambiguous_and_missing() {
        let file = SourceFile::parse("package a\n\ntype A int\ntype B int\n").unwrap();
        let any_type = QueryEngine::new("(type_spec) @t").unwrap();
        assert!(matches!(
            any_type.find_unique(&file),
            Err(TreeSitterError::AmbiguousMatch { count: 2 })
        ));
        let missing =
            QueryEngine::new(r#"(type_spec name: (type_identifier) @name (#eq? @name "C"))"#).unwrap();
        assert!(matches!(missing.find_unique(&file), Err(TreeSitterError::NoMatch)));
    }

    #[test]
    fn invalid_query_rejected() {
        assert!(matches!(
            QueryEngine::new("(not_a_node"),
            Err(TreeSitterError::InvalidQuery { .. })
        ));
    }
}
