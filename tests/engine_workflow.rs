//! End-to-end workflows through a rewrite session
//!
//! Covers the usual generator loop:
//! 1. Locate declarations by kind and name
//! 2. Queue and apply replacements
//! 3. Inject imports and prune the unused ones

use gorew::decl::{DeclKind, DeclShape};
use gorew::edit::EditSet;
use gorew::imports::ImportSet;
use gorew::{RewriteSession, SessionError, SourceFile, Span};

const MODELS: &str = r#"package models

import (
	"fmt"
	"os"
)

// Config holds service settings.
type Config struct {
	Name string `json:"name"`
	Port int
}

type ID = string

const (
	A = iota
	B
)

var debug = os.Getenv("DEBUG") != ""

func (c Config) String() string {
	return fmt.Sprintf("%s:%d", c.Name, c.Port)
}

func New(name string) Config {
	return Config{Name: name}
}
"#;

#[test]
fn config_struct_is_extended_in_place() {
    let mut session = RewriteSession::new(MODELS).unwrap();

    let found = session.find_by_name(Some(DeclKind::Type), &["Conf*"]);
    assert_eq!(found.len(), 1);
    let config = found[0].clone();
    assert_eq!(config.names, vec!["Config"]);
    assert_eq!(config.members().len(), 2);
    assert_eq!(config.members()[0].tag_lookup("json").as_deref(), Some("name"));
    assert_eq!(
        config.comment(true).as_deref(),
        Some("Config holds service settings.")
    );

    session
        .replace_declaration(
            &config,
            "type Config struct {\n\tName string `json:\"name\"`\n\tPort int\n\tHost string\n}",
        )
        .unwrap();
    assert!(session.apply_edits().unwrap());

    let reparsed = SourceFile::parse(session.source()).unwrap();
    assert!(reparsed.source().contains("\tHost string\n"));

    let again = session.find_by_name(Some(DeclKind::Struct), &["Config"]);
    assert_eq!(again.len(), 1);
    let members = again[0].members();
    assert_eq!(members.len(), 3);
    assert_eq!(members[2].names, vec!["Host"]);
    assert_eq!(members[2].type_text, "string");

    // the old handle points at the previous buffer
    let err = session.replace_declaration(&config, "type Config struct{}").unwrap_err();
    assert!(matches!(err, SessionError::StaleDeclaration { .. }));
}

#[test]
fn grouped_type_declaration_keeps_each_struct_apart() {
    let mut session = RewriteSession::new(
        "package a\n\ntype (\n\tA struct{ X int }\n\tB struct{ Y string }\n\tC int\n)\n",
    )
    .unwrap();
    let decl = session.find_by_name(Some(DeclKind::Struct), &["C"])[0].clone();
    assert_eq!(decl.type_specs().len(), 3);
    assert_eq!(decl.members_of("A").unwrap()[0].names, vec!["X"]);
    assert_eq!(decl.members_of("B").unwrap()[0].names, vec!["Y"]);
    assert_eq!(decl.members_of("C"), None);
    assert_eq!(decl.type_specs()[2].type_text, "int");
    assert_eq!(decl.members().len(), 1);
}

#[test]
fn declarations_come_out_in_source_order_with_buckets() {
    let mut session = RewriteSession::new(MODELS).unwrap();

    let all: Vec<_> = session
        .declarations(None)
        .into_iter()
        .map(|d| (d.kind(), d.name()))
        .collect();
    assert_eq!(
        all,
        vec![
            (DeclKind::Import, "fmt, os".to_string()),
            (DeclKind::Struct, "Config".to_string()),
            (DeclKind::Type, "ID".to_string()),
            (DeclKind::Const, "A, B".to_string()),
            (DeclKind::Var, "debug".to_string()),
            (DeclKind::Func, "String".to_string()),
            (DeclKind::Func, "New".to_string()),
        ]
    );

    let types = session.declarations(Some(DeclKind::Type));
    assert_eq!(types.len(), 2);
    match &types[1].shape {
        DeclShape::TypeDef { specs } => {
            assert!(specs[0].alias);
            assert_eq!(specs[0].type_text, "string");
        }
        other => panic!("unexpected shape {other:?}"),
    }

    let method = session.get_nth(Some(DeclKind::Func), 0).unwrap();
    assert_eq!(
        method.shape,
        DeclShape::Function {
            receiver: Some("(c Config)".to_string())
        }
    );
    assert_eq!(session.get_nth(Some(DeclKind::Func), -1).unwrap().name(), "New");
    assert!(session.get_nth(Some(DeclKind::Func), 2).is_none());
    assert!(session.anomalies().is_empty());
}

#[test]
fn index_grows_only_as_far_as_asked() {
    let mut session = RewriteSession::new(MODELS).unwrap();
    assert_eq!(session.index().classified_count(), 0);

    assert!(session.index_next(None, Some(3)));
    assert_eq!(session.index().classified_count(), 3);
    assert_eq!(session.index().extension_count(), 1);

    // already satisfied, nothing new is classified
    assert!(session.index_next(None, Some(2)));
    assert_eq!(session.index().extension_count(), 1);

    assert!(session.get_nth(Some(DeclKind::Var), 0).is_some());
    assert_eq!(session.index().classified_count(), 5);
    assert_eq!(session.index().extension_count(), 2);
    assert!(!session.index().is_exhausted());

    assert!(!session.index_next(Some(DeclKind::Var), Some(2)));
    assert!(session.index().is_exhausted());
    assert_eq!(session.index().classified_count(), 7);
}

#[test]
fn empty_edit_set_is_the_identity() {
    let file = SourceFile::parse(MODELS).unwrap();
    let mut edits = EditSet::for_file(&file);
    assert_eq!(edits.apply(file.buffer()).unwrap(), MODELS);
}

#[test]
fn declaration_spans_never_overlap() {
    let mut session = RewriteSession::new(MODELS).unwrap();
    let spans: Vec<Span> = session.declarations(None).iter().map(|d| d.span).collect();
    for pair in spans.windows(2) {
        assert!(pair[0].end <= pair[1].start, "{} overlaps {}", pair[0], pair[1]);
    }
}

#[test]
fn edits_against_one_version_apply_together() {
    let mut session = RewriteSession::new(MODELS).unwrap();
    let funcs: Vec<_> = session
        .declarations(Some(DeclKind::Func))
        .into_iter()
        .cloned()
        .collect();
    let new_fn = funcs[1].clone();

    // same start and end: replace the whole declaration
    session.replace(new_fn.span, new_fn.span, "func New() Config {\n\treturn Config{}\n}");
    session.replace_declaration(&funcs[0], "").unwrap();
    assert!(session.apply_edits().unwrap());

    let names: Vec<String> = session
        .declarations(Some(DeclKind::Func))
        .iter()
        .map(|d| d.name())
        .collect();
    assert_eq!(names, vec!["New"]);
    assert!(session.pending_edits().is_empty());
}

#[test]
fn import_rendering_is_idempotent() {
    let mut session = RewriteSession::new(MODELS).unwrap();
    session.add_import("strings", None).unwrap();
    session.add_import("github.com/pkg/errors", None).unwrap();
    assert!(session.write_imports().unwrap());
    let once = session.source().to_string();
    assert!(once.contains(
        "import (\n\t\"fmt\"\n\t\"os\"\n\t\"strings\"\n\n\t\"github.com/pkg/errors\"\n)"
    ));

    assert!(!session.write_imports().unwrap());
    assert_eq!(session.source(), once);

    let reread = ImportSet::from_file(session.file());
    assert_eq!(reread, session.imports().clone());
}

#[test]
fn injected_imports_are_pruned_to_what_is_used() {
    let mut session = RewriteSession::new(MODELS).unwrap();
    session
        .add_code("func Upper(s string) string {\n\treturn strings.ToUpper(s)\n}")
        .unwrap();

    let pruned = session
        .inject_imports([("strings", None), ("bytes", None), ("unsafe", Some("_"))])
        .unwrap();
    assert_eq!(pruned, 1);
    assert!(session.imports().contains("strings", None));
    assert!(session.imports().contains("unsafe", Some("_")));
    assert!(!session.imports().contains("bytes", None));
    assert!(!session.source().contains("\"bytes\""));
    assert!(session
        .source()
        .contains("import (\n\t\"fmt\"\n\t\"os\"\n\t\"strings\"\n\t_ \"unsafe\"\n)"));
}

#[test]
fn versioned_import_shadows_the_unversioned_one() {
    let src = "package a\n\nimport (\n\t\"github.com/x/y\"\n\t\"github.com/x/y/v2\"\n)\n\nvar _ = y.Foo\n";
    let mut session = RewriteSession::new(src).unwrap();
    assert_eq!(session.clean_imports().unwrap(), 1);
    assert_eq!(
        session.source(),
        "package a\n\nimport (\n\t\"github.com/x/y/v2\"\n)\n\nvar _ = y.Foo\n"
    );
}

#[test]
fn cleaning_a_tidy_file_changes_nothing() {
    let mut session = RewriteSession::new(MODELS).unwrap();
    assert_eq!(session.clean_imports().unwrap(), 0);
    assert_eq!(session.source(), MODELS);
}

#[test]
fn generated_file_from_scratch() {
    let mut session = RewriteSession::with_package("gen").unwrap();
    session
        .add_code("func Now() time.Time {\n\treturn time.Now()\n}")
        .unwrap();
    session.add_import("time", None).unwrap();
    session.add_import("fmt", None).unwrap();
    session.clean_imports().unwrap();

    let out = session.source();
    assert!(out.starts_with("package gen\n\nimport \"time\"\n"));
    assert!(out.ends_with("func Now() time.Time {\n\treturn time.Now()\n}\n"));
    assert!(SourceFile::parse(out).is_ok());
}

#[test]
fn pattern_rewrite_updates_every_call() {
    let mut session = RewriteSession::new(MODELS).unwrap();
    let count = session
        .rewrite_pattern("fmt.Sprintf($$$ARGS)", "fmt.Sprint($$$ARGS)")
        .unwrap();
    assert_eq!(count, 1);
    assert!(session.source().contains("fmt.Sprint(\"%s:%d\", c.Name, c.Port)"));
}

#[test]
fn overlapping_requests_leave_the_session_untouched() {
    let mut session = RewriteSession::new(MODELS).unwrap();
    let decl = session.get_nth(Some(DeclKind::Struct), 0).unwrap().clone();
    session.replace_declaration(&decl, "type Config struct{}").unwrap();
    let inner = Span::new(decl.span.start + 5, decl.span.start + 11);
    session.replace(inner, inner, "Settings");

    assert!(matches!(
        session.apply_edits(),
        Err(SessionError::Patch(_))
    ));
    assert_eq!(session.source(), MODELS);
    assert_eq!(session.pending_edits().len(), 2);
}
