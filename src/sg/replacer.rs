use crate::edit::EditRequest;
use crate::sg::errors::AstGrepError;
use crate::sg::matcher::{PatternMatch, PatternMatcher};

/// Builder for capture-based replacements.
///
/// Turns one pattern match into an [`EditRequest`] that replaces the whole
/// match, a single capture, or the match expanded from a template.
pub struct CaptureReplacer<'a> {
    matcher: &'a PatternMatcher,
    pattern_match: PatternMatch,
}

impl<'a> CaptureReplacer<'a> {
    pub fn new(matcher: &'a PatternMatcher, pattern_match: PatternMatch) -> Self {
        Self {
            matcher,
            pattern_match,
        }
    }

    /// Replace the entire matched region with new text.
    pub fn replace_match(&self, new_text: &str) -> EditRequest {
        EditRequest::replace(self.pattern_match.span, new_text)
    }

    /// Replace a specific captured metavariable with new text.
    pub fn replace_capture(
        &self,
        capture_name: &str,
        new_text: &str,
    ) -> Result<EditRequest, AstGrepError> {
        let span = self
            .pattern_match
            .capture_span(capture_name)
            .ok_or_else(|| AstGrepError::MetavarNotFound {
                name: capture_name.to_string(),
            })?;
        Ok(EditRequest::replace(span, new_text))
    }

    /// Replace the match with a template that references captures.
    ///
    /// `$NAME` and `$$$NAME` expand to the captured text. Unknown `$NAME`s
    /// are kept verbatim; unknown `$$$NAME`s expand to nothing.
    ///
    /// ```text
    /// pattern:  func $NAME($$$PARAMS) { $$$BODY }
    /// template: func Legacy$NAME($$$PARAMS) { $$$BODY }
    /// ```
    pub fn replace_with_template(&self, template: &str) -> EditRequest {
        EditRequest::replace(self.pattern_match.span, self.expand(template))
    }

    fn expand(&self, template: &str) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(dollar) = rest.find('$') {
            out.push_str(&rest[..dollar]);
            let after = &rest[dollar..];
            let sigil = if after.starts_with("$$$") { 3 } else { 1 };
            let name_len = after[sigil..]
                .find(|c: char| !(c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_'))
                .unwrap_or(after.len() - sigil);
            let name = &after[sigil..sigil + name_len];

            match self.pattern_match.capture(name) {
                Some(value) if !name.is_empty() => out.push_str(value),
                // a variadic that matched nothing
                None if sigil == 3 && !name.is_empty() => {}
                _ => out.push_str(&after[..sigil + name_len]),
            }
            rest = &after[sigil + name_len..];
        }
        out.push_str(rest);
        out
    }

    pub fn pattern_match(&self) -> &PatternMatch {
        &self.pattern_match
    }

    pub fn source(&self) -> &str {
        self.matcher.source()
    }
}

/// Edit requests replacing every match of `pattern` with the expanded
/// `template`.
pub fn find_and_replace(
    matcher: &PatternMatcher,
    pattern: &str,
    template: &str,
) -> Result<Vec<EditRequest>, AstGrepError> {
    let matches = matcher.find_all(pattern)?;
    Ok(matches
        .into_iter()
        .map(|m| CaptureReplacer::new(matcher, m).replace_with_template(template))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::EditSet;
    use crate::ts::SourceBuffer;

    #[test]
    fn replace_entire_match() {
        let source = "package a\n\nfunc oldName() int { return 42 }\n";
        let matcher = PatternMatcher::new(source);
        let m = matcher.find_unique("func oldName() int { $$$BODY }").unwrap();
        let req = CaptureReplacer::new(&matcher, m).replace_match("func newName() int { return 42 }");

        assert_eq!(req.start(), source.find("func").unwrap());
        assert_eq!(req.end(), source.len() - 1);
        assert_eq!(req.replacement, "func newName() int { return 42 }");
    }

    #[test]
    fn replace_with_template() {
        let source = "package a\n\nfunc foo(a int) {\n\tprintln(a)\n}\n";
        let matcher = PatternMatcher::new(source);
        let m = matcher.find_unique("func $NAME($$$PARAMS) { $$$BODY }").unwrap();
        let req = CaptureReplacer::new(&matcher, m)
            .replace_with_template("func legacy_$NAME($$$PARAMS) { $$$BODY }");

        assert!(req.replacement.starts_with("func legacy_foo(a int) {"));
        assert!(req.replacement.contains("println(a)"));
        assert!(!req.replacement.contains('$'));
    }

    #[test]
    fn unknown_placeholders_are_kept() {
        let source = "package a\n\nvar x = f(1)\n";
        let matcher = PatternMatcher::new(source);
        let m = matcher.find_unique("f($ARG)").unwrap();
        let req = CaptureReplacer::new(&matcher, m).replace_with_template("g($ARG, $OTHER, $)");
        assert_eq!(req.replacement, "g(1, $OTHER, $)");
    }

    #[test]
    fn replace_capture_only() {
        let source = "package a\n\nfunc f() { fmt.Println(old) }\n";
        let matcher = PatternMatcher::new(source);
        let m = matcher.find_unique("fmt.Println($ARG)").unwrap();
        let replacer = CaptureReplacer::new(&matcher, m);
        let req = replacer.replace_capture("ARG", "fresh").unwrap();
        assert_eq!(&source[req.start()..req.end()], "old");
        assert!(matches!(
            replacer.replace_capture("MISSING", "x"),
            Err(AstGrepError::MetavarNotFound { .. })
        ));
    }

    #[test]
    fn find_and_replace_all() {
        let source = "package a\n\nfunc f() {\n\tlog.Print(a)\n\tlog.Print(b)\n}\n";
        let matcher = PatternMatcher::new(source);
        let requests = find_and_replace(&matcher, "log.Print($X)", "slog.Info($X)").unwrap();
        assert_eq!(requests.len(), 2);

        let buffer = SourceBuffer::new(source).unwrap();
        let mut set = EditSet::new(matcher.buffer_id());
        for req in requests {
            set.push(req);
        }
        assert_eq!(
            set.apply(&buffer).unwrap(),
            "package a\n\nfunc f() {\n\tslog.Info(a)\n\tslog.Info(b)\n}\n"
        );
    }
}
