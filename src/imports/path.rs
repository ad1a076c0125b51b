//! Import path heuristics: version suffixes, default package names, grouping.
//!
//! A trailing `/v<digits>` element is treated as a major-version suffix. This
//! is an approximation: a path whose last element legitimately looks like
//! `v2` without being a module version is misread the same way.

/// Split `mod/v2` into `("mod", "v2")`. `None` when unversioned.
pub fn split_version(path: &str) -> Option<(&str, &str)> {
    let idx = path.rfind("/v")?;
    let digits = &path[idx + 2..];
    if idx == 0 || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((&path[..idx], &path[idx + 1..]))
}

pub fn is_versioned(path: &str) -> bool {
    split_version(path).is_some()
}

/// Path with any major-version suffix stripped.
pub fn logical_path(path: &str) -> &str {
    split_version(path).map_or(path, |(base, _)| base)
}

/// Package name a path binds when imported without alias.
///
/// Uses the last element of the logical path, drops a `go-` prefix and
/// anything from the first non-identifier character (`yaml.v3` -> `yaml`).
pub fn default_name(path: &str) -> String {
    let logical = logical_path(path);
    let base = logical.rsplit('/').next().unwrap_or(logical);
    let base = base.strip_prefix("go-").unwrap_or(base);
    let end = base
        .char_indices()
        .find(|(_, c)| !(c.is_alphanumeric() || *c == '_'))
        .map_or(base.len(), |(i, _)| i);
    let name = &base[..end];
    if name.is_empty() {
        base.to_string()
    } else {
        name.to_string()
    }
}

/// Standard library paths have no dot in their first element.
pub fn is_standard(path: &str) -> bool {
    let first = path.split('/').next().unwrap_or(path);
    !first.contains('.')
}

/// Go identifier check for aliases.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Strip Go string quotes from an import path literal.
pub fn unquote(literal: &str) -> &str {
    let literal = literal.trim();
    for quote in ['"', '`'] {
        if let Some(inner) = literal
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    literal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_suffix_detection() {
        assert_eq!(
            split_version("github.com/redis/go-redis/v9"),
            Some(("github.com/redis/go-redis", "v9"))
        );
        assert_eq!(split_version("example.com/mod/v12"), Some(("example.com/mod", "v12")));
        assert_eq!(split_version("example.com/mod"), None);
        assert_eq!(split_version("example.com/mod/v"), None);
        assert_eq!(split_version("example.com/mod/v2beta"), None);
        assert_eq!(split_version("/v2"), None);
        assert_eq!(logical_path("mod/v2"), "mod");
        assert_eq!(logical_path("mod"), "mod");
    }

    #[test]
    fn default_names() {
        assert_eq!(default_name("fmt"), "fmt");
        assert_eq!(default_name("net/http"), "http");
        assert_eq!(default_name("github.com/redis/go-redis/v9"), "redis");
        assert_eq!(default_name("gopkg.in/yaml.v3"), "yaml");
        assert_eq!(default_name("github.com/klauspost/cpuid/v2"), "cpuid");
    }

    #[test]
    fn grouping_and_identifiers() {
        assert!(is_standard("fmt"));
        assert!(is_standard("net/http"));
        assert!(!is_standard("github.com/pkg/errors"));
        assert!(is_identifier("xerrors"));
        assert!(is_identifier("_x1"));
        assert!(!is_identifier("1x"));
        assert!(!is_identifier("a-b"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn unquote_literals() {
        assert_eq!(unquote("\"fmt\""), "fmt");
        assert_eq!(unquote("`fmt`"), "fmt");
        assert_eq!(unquote("fmt"), "fmt");
    }
}
