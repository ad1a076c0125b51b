use crate::decl::errors::ClassificationError;
use crate::ts::{BufferId, SourceFile, Span};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Declaration kind, also the key of an index bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclKind {
    Import,
    Const,
    Var,
    Type,
    /// Struct type definitions. Also listed under [`DeclKind::Type`].
    Struct,
    Func,
    Unclassified,
}

impl DeclKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclKind::Import => "import",
            DeclKind::Const => "const",
            DeclKind::Var => "var",
            DeclKind::Type => "type",
            DeclKind::Struct => "struct",
            DeclKind::Func => "func",
            DeclKind::Unclassified => "unclassified",
        }
    }

    /// Parse a kind name. `""`, `"all"` and `"*"` mean any kind.
    pub fn parse_filter(s: &str) -> Result<Option<DeclKind>, UnknownKind> {
        if matches!(s, "" | "all" | "*") {
            return Ok(None);
        }
        s.parse().map(Some)
    }
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown declaration kind '{0}'")]
pub struct UnknownKind(pub String);

impl FromStr for DeclKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "import" => Ok(DeclKind::Import),
            "const" => Ok(DeclKind::Const),
            "var" => Ok(DeclKind::Var),
            "type" => Ok(DeclKind::Type),
            "struct" => Ok(DeclKind::Struct),
            "func" | "function" => Ok(DeclKind::Func),
            "unclassified" => Ok(DeclKind::Unclassified),
            other => Err(UnknownKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKeyword {
    Const,
    Var,
}

/// One spec of an import declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSpecInfo {
    pub path: String,
    /// Explicit name: identifier, `_` or `.`.
    pub alias: Option<String>,
    pub span: Span,
}

/// One spec of a type declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeSpecInfo {
    pub name: String,
    /// `type A = B` rather than `type A B`.
    pub alias: bool,
    pub type_text: String,
    /// Fields, for a spec defining a struct type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<Member>>,
}

/// A field of a struct declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Member {
    /// Empty for embedded fields.
    pub names: Vec<String>,
    pub type_text: String,
    /// Raw tag literal including its quotes.
    pub tag_text: Option<String>,
    pub span: Span,
    /// Trailing comment on the same line.
    pub comment: Option<String>,
}

impl Member {
    pub fn is_embedded(&self) -> bool {
        self.names.is_empty()
    }

    /// Tag content without the surrounding quotes.
    pub fn tag(&self) -> &str {
        self.tag_text
            .as_deref()
            .map(|t| t.trim_matches(|c| c == '`' || c == '"' || c == ' '))
            .unwrap_or("")
    }

    /// Value of `key` in a conventional `key:"value"` struct tag.
    pub fn tag_lookup(&self, key: &str) -> Option<String> {
        lookup_tag(self.tag(), key)
    }
}

fn lookup_tag(mut tag: &str, key: &str) -> Option<String> {
    loop {
        tag = tag.trim_start_matches(' ');
        if tag.is_empty() {
            return None;
        }
        let colon = tag.find(':')?;
        let name = &tag[..colon];
        let rest = tag[colon + 1..].strip_prefix('"')?;

        let mut value = String::new();
        let mut chars = rest.char_indices();
        let mut end = None;
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => {
                    if let Some((_, escaped)) = chars.next() {
                        value.push(escaped);
                    }
                }
                '"' => {
                    end = Some(i);
                    break;
                }
                c => value.push(c),
            }
        }
        let end = end?;
        if name == key {
            return Some(value);
        }
        tag = &rest[end + 1..];
    }
}

/// The leading comment group of a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub text: String,
    pub span: Span,
}

impl Comment {
    /// Comment text without markers and surrounding blanks.
    pub fn trimmed(&self) -> String {
        trim_comment(&self.text)
    }
}

/// Strip `//` and `/* */` markers from each line of a comment group.
pub fn trim_comment(text: &str) -> String {
    let text = text.trim();
    let text = text
        .strip_prefix("/*")
        .and_then(|t| t.strip_suffix("*/"))
        .unwrap_or(text);
    text.lines()
        .map(|line| {
            let line = line.trim();
            line.strip_prefix("//").unwrap_or(line).trim()
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Shape of a top-level declaration. Closed: every consumer matches it
/// exhaustively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum DeclShape {
    Import { specs: Vec<ImportSpecInfo> },
    Values { keyword: ValueKeyword },
    TypeDef { specs: Vec<TypeSpecInfo> },
    /// At least one spec defines a struct.
    Aggregate { specs: Vec<TypeSpecInfo> },
    Function { receiver: Option<String> },
    Unclassified {
        #[serde(skip)]
        error: ClassificationError,
    },
}

/// A catalogued top-level declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Declaration {
    /// Position in source order among all declarations of the file.
    pub ordinal: usize,
    pub names: Vec<String>,
    pub span: Span,
    pub leading_comment: Option<Comment>,
    pub shape: DeclShape,
    #[serde(skip)]
    pub(crate) buffer: BufferId,
}

impl Declaration {
    pub fn kind(&self) -> DeclKind {
        match &self.shape {
            DeclShape::Import { .. } => DeclKind::Import,
            DeclShape::Values {
                keyword: ValueKeyword::Const,
            } => DeclKind::Const,
            DeclShape::Values {
                keyword: ValueKeyword::Var,
            } => DeclKind::Var,
            DeclShape::TypeDef { .. } => DeclKind::Type,
            DeclShape::Aggregate { .. } => DeclKind::Struct,
            DeclShape::Function { .. } => DeclKind::Func,
            DeclShape::Unclassified { .. } => DeclKind::Unclassified,
        }
    }

    /// Every bucket this declaration is listed under.
    pub fn kinds(&self) -> &'static [DeclKind] {
        match self.kind() {
            DeclKind::Struct => &[DeclKind::Type, DeclKind::Struct],
            DeclKind::Import => &[DeclKind::Import],
            DeclKind::Const => &[DeclKind::Const],
            DeclKind::Var => &[DeclKind::Var],
            DeclKind::Type => &[DeclKind::Type],
            DeclKind::Func => &[DeclKind::Func],
            DeclKind::Unclassified => &[DeclKind::Unclassified],
        }
    }

    /// Kind path such as `type.struct`.
    pub fn kind_label(&self) -> String {
        self.kinds()
            .iter()
            .map(DeclKind::as_str)
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Names joined with `", "`.
    pub fn name(&self) -> String {
        self.names.join(", ")
    }

    /// Specs of a type declaration, struct or not.
    pub fn type_specs(&self) -> &[TypeSpecInfo] {
        match &self.shape {
            DeclShape::TypeDef { specs } | DeclShape::Aggregate { specs } => specs,
            _ => &[],
        }
    }

    /// Fields of the first struct spec. Empty for anything else.
    pub fn members(&self) -> &[Member] {
        self.type_specs()
            .iter()
            .find_map(|s| s.members.as_deref())
            .unwrap_or(&[])
    }

    /// Fields of the struct spec named `name`.
    pub fn members_of(&self, name: &str) -> Option<&[Member]> {
        self.type_specs()
            .iter()
            .find(|s| s.name == name)
            .and_then(|s| s.members.as_deref())
    }

    pub fn classification_error(&self) -> Option<&ClassificationError> {
        match &self.shape {
            DeclShape::Unclassified { error } => Some(error),
            _ => None,
        }
    }

    pub fn buffer_id(&self) -> BufferId {
        self.buffer
    }

    /// Whether this declaration was produced from `file`'s buffer.
    pub fn belongs_to(&self, file: &SourceFile) -> bool {
        self.buffer == file.buffer_id()
    }

    /// Source text of the declaration, `None` for a declaration of another
    /// buffer version.
    pub fn text<'a>(&self, file: &'a SourceFile) -> Option<&'a str> {
        self.belongs_to(file)
            .then(|| file.span_text(self.span))
            .flatten()
    }

    /// Trimmed source text of member `i`; negative indexes count from the end.
    pub fn member_text<'a>(&self, file: &'a SourceFile, i: isize) -> Option<&'a str> {
        let members = self.members();
        let idx = if i < 0 {
            members.len().checked_sub(i.unsigned_abs())?
        } else {
            i.unsigned_abs()
        };
        let member = members.get(idx)?;
        self.belongs_to(file)
            .then(|| file.span_text(member.span))
            .flatten()
            .map(str::trim)
    }

    /// Leading comment, optionally without comment markers.
    pub fn comment(&self, trim: bool) -> Option<String> {
        self.leading_comment.as_ref().map(|c| {
            if trim {
                c.trimmed()
            } else {
                c.text.clone()
            }
        })
    }
}
