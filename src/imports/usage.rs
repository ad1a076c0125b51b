use crate::ts::{queries, QueryEngine, SourceFile, TreeSitterError};
use std::collections::HashSet;

/// Package qualifiers referenced in a file: the `pkg` of `pkg.Func()` and
/// of `pkg.Type`.
///
/// Purely syntactic. A local variable shadowing a package name counts as a
/// use of that package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Usages {
    names: HashSet<String>,
}

impl Usages {
    pub fn collect(file: &SourceFile) -> Result<Self, TreeSitterError> {
        let engine = QueryEngine::new(queries::QUALIFIERS)?;
        let names = engine
            .find_all(file)
            .into_iter()
            .filter_map(|m| m.captures.get("qualifier").map(|c| c.text.clone()))
            .collect();
        Ok(Self { names })
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn uses(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
