use globset::{Glob, GlobSet, GlobSetBuilder};

/// Case-sensitive name globs (`*`, `?`, `[...]`), each tested on its own
/// against the whole name.
///
/// An empty pattern list matches every name. Invalid patterns are skipped.
#[derive(Debug, Clone)]
pub struct NamePatterns {
    set: Option<GlobSet>,
}

impl NamePatterns {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        if patterns.is_empty() {
            return Self { set: None };
        }

        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            match Glob::new(pattern.as_ref()) {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(e) => {
                    tracing::debug!(pattern = pattern.as_ref(), error = %e, "skipping invalid name pattern");
                }
            }
        }
        let set = builder.build().unwrap_or_else(|e| {
            tracing::debug!(error = %e, "name patterns failed to compile");
            GlobSet::empty()
        });
        Self { set: Some(set) }
    }

    pub fn matches(&self, name: &str) -> bool {
        self.set.as_ref().map_or(true, |set| set.is_match(name))
    }

    /// True when any of `names` matches any pattern.
    pub fn matches_any<S: AsRef<str>>(&self, names: &[S]) -> bool {
        match &self.set {
            None => true,
            Some(set) => names.iter().any(|n| set.is_match(n.as_ref())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_syntax() {
        let p = NamePatterns::new(&["Conf*", "?ID", "[AB]x"]);
        assert!(p.matches("Config"));
        assert!(p.matches("UID"));
        assert!(p.matches("Bx"));
        assert!(!p.matches("config"));
        assert!(!p.matches("Cx"));
    }

    #[test]
    fn empty_list_matches_everything() {
        let p = NamePatterns::new::<&str>(&[]);
        assert!(p.matches("anything"));
        assert!(p.matches_any::<&str>(&[]));
    }

    #[test]
    fn invalid_patterns_are_skipped() {
        let p = NamePatterns::new(&["[unclosed", "Get*"]);
        assert!(p.matches("GetUser"));
        assert!(!p.matches("[unclosed"));
    }

    #[test]
    fn patterns_never_negate_each_other() {
        let p = NamePatterns::new(&["Get*", "!GetX"]);
        assert!(p.matches("GetX"));
        assert!(p.matches("GetY"));
        assert!(p.matches("!GetX"));
        assert!(!p.matches("SetX"));

        // no comment lines or directory suffixes either
        let p = NamePatterns::new(&["#Tag", "Dir/"]);
        assert!(p.matches("#Tag"));
        assert!(!p.matches("Dir"));
    }

    #[test]
    fn any_name_matches() {
        let p = NamePatterns::new(&["b*"]);
        assert!(p.matches_any(&["a", "bee"]));
        assert!(!p.matches_any(&["a", "c"]));
    }
}
