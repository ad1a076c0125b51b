//! Shape dispatch for top-level Go nodes.

use crate::decl::errors::ClassificationError;
use crate::decl::node::{DeclShape, ImportSpecInfo, Member, TypeSpecInfo, ValueKeyword};
use crate::imports::path::{default_name, unquote};
use crate::ts::{SourceFile, Span};
use tree_sitter::Node;

/// Names and shape of one top-level node.
pub(crate) struct Classified {
    pub names: Vec<String>,
    pub shape: DeclShape,
}

/// Classify a top-level node. Never fails: unknown shapes come back as
/// [`DeclShape::Unclassified`].
pub(crate) fn classify(node: Node<'_>, file: &SourceFile) -> Classified {
    let result = match node.kind() {
        "import_declaration" => Ok(classify_import(node, file)),
        "const_declaration" => Ok(classify_values(node, file, ValueKeyword::Const)),
        "var_declaration" => Ok(classify_values(node, file, ValueKeyword::Var)),
        "type_declaration" => classify_types(node, file),
        "function_declaration" => classify_function(node, file, None),
        "method_declaration" => {
            let receiver = node
                .child_by_field_name("receiver")
                .map(|r| file.node_text(r).to_string());
            classify_function(node, file, receiver)
        }
        _ => Err("not a declaration"),
    };

    result.unwrap_or_else(|reason| {
        let error = ClassificationError {
            node_kind: node.kind().to_string(),
            span: Span::of(node),
            reason,
        };
        tracing::warn!(%error, "recording unclassified declaration");
        Classified {
            names: Vec::new(),
            shape: DeclShape::Unclassified { error },
        }
    })
}

/// Specs of a grouped declaration, looking through `(...)` list nodes.
fn specs<'t>(node: Node<'t>, spec_kinds: &[&str]) -> Vec<Node<'t>> {
    let mut out = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if spec_kinds.contains(&child.kind()) {
            out.push(child);
        } else if child.kind().ends_with("_list") {
            out.extend(specs(child, spec_kinds));
        }
    }
    out
}

fn field_texts(node: Node<'_>, field: &str, file: &SourceFile) -> Vec<String> {
    let mut cursor = node.walk();
    let names = node
        .children_by_field_name(field, &mut cursor)
        .map(|n| file.node_text(n).to_string())
        .collect();
    names
}

fn classify_import(node: Node<'_>, file: &SourceFile) -> Classified {
    let mut names = Vec::new();
    let mut infos = Vec::new();
    for spec in specs(node, &["import_spec"]) {
        let Some(path_node) = spec.child_by_field_name("path") else {
            continue;
        };
        let path = unquote(file.node_text(path_node)).to_string();
        let alias = spec
            .child_by_field_name("name")
            .map(|n| file.node_text(n).to_string());
        names.push(alias.clone().unwrap_or_else(|| default_name(&path)));
        infos.push(ImportSpecInfo {
            path,
            alias,
            span: Span::of(spec),
        });
    }
    Classified {
        names,
        shape: DeclShape::Import { specs: infos },
    }
}

fn classify_values(node: Node<'_>, file: &SourceFile, keyword: ValueKeyword) -> Classified {
    let names = specs(node, &["const_spec", "var_spec"])
        .into_iter()
        .flat_map(|spec| field_texts(spec, "name", file))
        .collect();
    Classified {
        names,
        shape: DeclShape::Values { keyword },
    }
}

fn classify_types(node: Node<'_>, file: &SourceFile) -> Result<Classified, &'static str> {
    let specs = specs(node, &["type_spec", "type_alias"]);
    if specs.is_empty() {
        return Err("type declaration without specs");
    }

    let mut names = Vec::new();
    let mut type_specs = Vec::new();
    for spec in specs {
        let name = spec
            .child_by_field_name("name")
            .map(|n| file.node_text(n).to_string())
            .ok_or("type spec without name")?;
        let ty = spec.child_by_field_name("type").ok_or("type spec without type")?;

        let members = (ty.kind() == "struct_type" && spec.kind() == "type_spec")
            .then(|| extract_members(ty, file));
        type_specs.push(TypeSpecInfo {
            name: name.clone(),
            alias: spec.kind() == "type_alias",
            type_text: file.node_text(ty).to_string(),
            members,
        });
        names.push(name);
    }

    let shape = if type_specs.iter().any(|s| s.members.is_some()) {
        DeclShape::Aggregate { specs: type_specs }
    } else {
        DeclShape::TypeDef { specs: type_specs }
    };
    Ok(Classified { names, shape })
}

fn classify_function(
    node: Node<'_>,
    file: &SourceFile,
    receiver: Option<String>,
) -> Result<Classified, &'static str> {
    let name = node
        .child_by_field_name("name")
        .ok_or("function without name")?;
    Ok(Classified {
        names: vec![file.node_text(name).to_string()],
        shape: DeclShape::Function { receiver },
    })
}

/// Fields of a `struct { ... }` type, in source order.
pub(crate) fn extract_members(struct_type: Node<'_>, file: &SourceFile) -> Vec<Member> {
    let mut cursor = struct_type.walk();
    let Some(list) = struct_type
        .named_children(&mut cursor)
        .find(|n| n.kind() == "field_declaration_list")
    else {
        return Vec::new();
    };

    let mut members: Vec<Member> = Vec::new();
    let mut last_row = None;
    let mut cursor = list.walk();
    for child in list.named_children(&mut cursor) {
        match child.kind() {
            "field_declaration" => {
                members.push(member(child, file));
                last_row = Some(child.end_position().row);
            }
            "comment" => {
                if last_row == Some(child.start_position().row) {
                    if let Some(m) = members.last_mut() {
                        m.comment = Some(file.node_text(child).to_string());
                    }
                }
            }
            _ => {}
        }
    }
    members
}

fn member(field: Node<'_>, file: &SourceFile) -> Member {
    let names = field_texts(field, "name", file);
    let mut type_text = field
        .child_by_field_name("type")
        .map(|t| file.node_text(t).to_string())
        .unwrap_or_default();

    if names.is_empty() {
        // Embedded pointer: `*` is an anonymous child ahead of the type.
        let mut cursor = field.walk();
        let pointer = field.children(&mut cursor).any(|c| c.kind() == "*");
        if pointer {
            type_text.insert(0, '*');
        }
    }

    Member {
        names,
        type_text,
        tag_text: field
            .child_by_field_name("tag")
            .map(|t| file.node_text(t).to_string()),
        span: Span::of(field),
        comment: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify_first(src: &str) -> Classified {
        let file = SourceFile::parse(src).unwrap();
        let root = file.root_node();
        let mut cursor = root.walk();
        let node = root
            .named_children(&mut cursor)
            .find(|n| n.kind() != "package_clause" && n.kind() != "comment")
            .unwrap();
        classify(node, &file)
    }

    #[test]
    fn struct_members() {
        let c = classify_first(
            "package a\n\ntype Config struct {\n\tName, Alias string `json:\"name\"` // display\n\t*Base\n\tPort int\n}\n",
        );
        assert_eq!(c.names, vec!["Config"]);
        let DeclShape::Aggregate { specs } = c.shape else {
            panic!("expected aggregate");
        };
        let members = specs[0].members.clone().unwrap();
        assert_eq!(members.len(), 3);
        assert_eq!(members[0].names, vec!["Name", "Alias"]);
        assert_eq!(members[0].type_text, "string");
        assert_eq!(members[0].tag_text.as_deref(), Some("`json:\"name\"`"));
        assert_eq!(members[0].comment.as_deref(), Some("// display"));
        assert!(members[1].is_embedded());
        assert_eq!(members[1].type_text, "*Base");
        assert_eq!(members[2].names, vec!["Port"]);
        assert_eq!(members[2].comment, None);
    }

    #[test]
    fn grouped_types_keep_members_per_spec() {
        let c = classify_first(
            "package a\n\ntype (\n\tA struct{ X int }\n\tB struct {\n\t\tY string\n\t\tZ bool\n\t}\n\tC int\n)\n",
        );
        assert_eq!(c.names, vec!["A", "B", "C"]);
        let DeclShape::Aggregate { specs } = c.shape else {
            panic!("expected aggregate");
        };
        assert_eq!(specs.len(), 3);

        let a = specs[0].members.as_ref().unwrap();
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].names, vec!["X"]);
        let b = specs[1].members.as_ref().unwrap();
        let b_names: Vec<_> = b.iter().flat_map(|m| m.names.clone()).collect();
        assert_eq!(b_names, vec!["Y", "Z"]);

        assert_eq!(specs[2].name, "C");
        assert_eq!(specs[2].type_text, "int");
        assert_eq!(specs[2].members, None);
    }

    #[test]
    fn value_groups_bind_every_name() {
        let c = classify_first("package a\n\nvar (\n\ta, b = 1, 2\n\tc int\n)\n");
        assert_eq!(c.names, vec!["a", "b", "c"]);
        assert_eq!(
            c.shape,
            DeclShape::Values {
                keyword: ValueKeyword::Var
            }
        );

        let c = classify_first("package a\n\nconst Max = 10\n");
        assert_eq!(c.names, vec!["Max"]);
    }

    #[test]
    fn imports_bind_package_names() {
        let c = classify_first(
            "package a\n\nimport (\n\t\"fmt\"\n\tredis \"github.com/redis/go-redis/v9\"\n\t_ \"embed\"\n)\n",
        );
        assert_eq!(c.names, vec!["fmt", "redis", "_"]);
        let DeclShape::Import { specs } = c.shape else {
            panic!("expected import");
        };
        assert_eq!(specs[1].path, "github.com/redis/go-redis/v9");
        assert_eq!(specs[1].alias.as_deref(), Some("redis"));
        assert_eq!(specs[0].alias, None);
    }

    #[test]
    fn unknown_nodes_are_unclassified() {
        let file = SourceFile::parse("package a\n\nfunc f() {}\n").unwrap();
        let func = file.root_node().named_child(1).unwrap();
        let body = func.child_by_field_name("body").unwrap();
        let c = classify(body, &file);
        assert!(c.names.is_empty());
        let DeclShape::Unclassified { error } = c.shape else {
            panic!("expected unclassified");
        };
        assert_eq!(error.node_kind, "block");
        assert_eq!(error.span, Span::of(body));
    }

    #[test]
    fn type_aliases_and_methods() {
        let c = classify_first("package a\n\ntype ID = string\n");
        assert_eq!(
            c.shape,
            DeclShape::TypeDef {
                specs: vec![TypeSpecInfo {
                    name: "ID".to_string(),
                    alias: true,
                    type_text: "string".to_string(),
                    members: None,
                }]
            }
        );

        let c = classify_first("package a\n\nfunc (c *Config) Load() error { return nil }\n");
        assert_eq!(c.names, vec!["Load"]);
        assert_eq!(
            c.shape,
            DeclShape::Function {
                receiver: Some("(c *Config)".to_string())
            }
        );
    }
}
