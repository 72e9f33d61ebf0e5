//! Route pattern compilation.
//!
//! A pattern is a `/`-separated template. Each segment is one of:
//!
//! | Segment          | Example      | Matches                                 | Captured as |
//! |------------------|--------------|-----------------------------------------|-------------|
//! | literal          | `users`      | exactly `users`                         | *(none)*    |
//! | parameter        | `[id]`       | one or more non-`/` characters          | `id`        |
//! | affixed parameter| `@[handle]`  | `@` followed by one or more non-`/`     | `handle`    |
//! | wildcard         | `*`          | one or more characters, `/` included    | `*`         |
//!
//! Leading and trailing slashes on the pattern are ignored, and the compiled
//! matcher accepts an optional trailing `/` on the request path. A segment whose
//! brackets do not form `prefix[name]suffix` (for example `a[b` or `[]`) is
//! matched as a literal.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::context::Params;

/// `prefix[name]suffix`, greedy on the prefix so `[a][b]` binds `b` with prefix `[a]`.
static PARAM_SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*)\[([^\]]+)\](.*)$").expect("parameter segment expression is valid")
});

/// Implicit parameter name bound by a `*` segment.
pub const WILDCARD_PARAM: &str = "*";

/// Errors produced while compiling a route pattern.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("route pattern `{pattern}` could not be compiled: {source}")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

// One pattern segment after classification.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment<'a> {
    Param {
        prefix: &'a str,
        name: &'a str,
        suffix: &'a str,
    },
    Wildcard,
    Literal(&'a str),
}

impl<'a> Segment<'a> {
    fn parse(segment: &'a str) -> Self {
        if let Some(caps) = PARAM_SEGMENT.captures(segment) {
            let part = |i| caps.get(i).map_or("", |m| m.as_str());
            return Segment::Param {
                prefix: part(1),
                name: part(2),
                suffix: part(3),
            };
        }
        if segment == WILDCARD_PARAM {
            return Segment::Wildcard;
        }
        Segment::Literal(segment)
    }

    // Whether this segment alone makes a route "specific".
    fn is_specific(&self) -> bool {
        match self {
            Segment::Param { prefix, suffix, .. } => !prefix.is_empty() || !suffix.is_empty(),
            Segment::Wildcard => false,
            Segment::Literal(_) => true,
        }
    }

    fn push_expression(&self, expr: &mut String) {
        match self {
            Segment::Param { prefix, suffix, .. } => {
                expr.push_str(&regex::escape(prefix));
                expr.push_str("([^/]+)");
                expr.push_str(&regex::escape(suffix));
            }
            Segment::Wildcard => expr.push_str("(.+)"),
            Segment::Literal(text) => expr.push_str(&regex::escape(text)),
        }
    }
}

/// A route pattern compiled into an anchored matcher plus its parameter names.
///
/// The `i`-th capture group of the matcher corresponds to the `i`-th entry of
/// [`param_names`](Self::param_names), in left-to-right segment order.
///
/// # Examples
///
/// ```
/// use zapi::router::pattern::CompiledPattern;
///
/// let pattern = CompiledPattern::compile("/users/[id]/posts/[post]").unwrap();
/// assert!(pattern.is_specific());
///
/// let params = pattern.captures("/users/7/posts/99/").unwrap();
/// assert_eq!(params.get("id"), Some("7"));
/// assert_eq!(params.get("post"), Some("99"));
/// ```
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    source: String,
    matcher: Regex,
    param_names: Vec<String>,
    specific: bool,
}

impl CompiledPattern {
    /// Compile `pattern` into a matcher.
    ///
    /// Compilation is pure: the same input always yields a matcher with the same
    /// behavior. Malformed bracket syntax is not an error; such segments are
    /// matched literally.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::Regex`] only if the generated expression exceeds the
    /// regex engine's size limits.
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        let mut expr = String::from("^");
        let mut param_names = Vec::new();
        let mut specific = false;

        for raw in pattern.trim_matches('/').split('/') {
            let segment = Segment::parse(raw);
            expr.push('/');
            segment.push_expression(&mut expr);
            specific |= segment.is_specific();
            match segment {
                Segment::Param { name, .. } => param_names.push(name.to_owned()),
                Segment::Wildcard => param_names.push(WILDCARD_PARAM.to_owned()),
                Segment::Literal(_) => {}
            }
        }

        expr.push_str("/?$");

        let matcher = Regex::new(&expr).map_err(|source| PatternError::Regex {
            pattern: pattern.to_owned(),
            source,
        })?;

        Ok(Self {
            source: pattern.to_owned(),
            matcher,
            param_names,
            specific,
        })
    }

    /// The pattern string this matcher was compiled from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Parameter names in capture order. Duplicates are kept.
    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    /// `true` if the pattern has a literal segment or a parameter with literal
    /// prefix/suffix text; such routes are consulted before all others.
    pub fn is_specific(&self) -> bool {
        self.specific
    }

    /// Returns `true` if `path` matches in full.
    pub fn is_match(&self, path: &str) -> bool {
        self.matcher.is_match(path)
    }

    /// Match `path` in full and map each capture to its parameter name.
    ///
    /// Captures without a corresponding name are ignored and names without a
    /// participating capture are skipped. Duplicate names keep the last capture.
    pub fn captures(&self, path: &str) -> Option<Params> {
        let caps = self.matcher.captures(path)?;
        let mut params = Params::new();
        for (i, name) in self.param_names.iter().enumerate() {
            if let Some(m) = caps.get(i + 1) {
                params.insert(name.as_str(), m.as_str());
            }
        }
        Some(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(pattern: &str) -> CompiledPattern {
        CompiledPattern::compile(pattern).unwrap()
    }

    // ── Segment::parse ────────────────────────────────────────────────────────

    #[test]
    fn segment_bare_param() {
        assert_eq!(
            Segment::parse("[id]"),
            Segment::Param { prefix: "", name: "id", suffix: "" }
        );
    }

    #[test]
    fn segment_affixed_param() {
        assert_eq!(
            Segment::parse("@[handle].json"),
            Segment::Param { prefix: "@", name: "handle", suffix: ".json" }
        );
    }

    #[test]
    fn segment_greedy_prefix_binds_last_brackets() {
        assert_eq!(
            Segment::parse("[a][b]"),
            Segment::Param { prefix: "[a]", name: "b", suffix: "" }
        );
    }

    #[test]
    fn segment_unclosed_bracket_is_literal() {
        assert_eq!(Segment::parse("a[b"), Segment::Literal("a[b"));
        assert_eq!(Segment::parse("[]"), Segment::Literal("[]"));
    }

    #[test]
    fn segment_wildcard() {
        assert_eq!(Segment::parse("*"), Segment::Wildcard);
        assert_eq!(Segment::parse("**"), Segment::Literal("**"));
    }

    // ── compile ───────────────────────────────────────────────────────────────

    #[test]
    fn literal_route_is_specific() {
        let p = compile("/users/admin");
        assert!(p.is_specific());
        assert!(p.param_names().is_empty());
        assert!(p.is_match("/users/admin"));
        assert!(!p.is_match("/users/admins"));
    }

    #[test]
    fn bare_params_are_not_specific() {
        let p = compile("/[section]/[id]");
        assert!(!p.is_specific());
        assert_eq!(p.param_names(), ["section", "id"]);
    }

    #[test]
    fn wildcard_only_is_not_specific() {
        assert!(!compile("/*").is_specific());
    }

    #[test]
    fn affixed_param_is_specific() {
        let p = compile("/@[user]");
        assert!(p.is_specific());
        let params = p.captures("/@ada").unwrap();
        assert_eq!(params.get("user"), Some("ada"));
        assert!(p.captures("/ada").is_none());
    }

    #[test]
    fn param_suffix_is_matched_literally() {
        let p = compile("/reports/[year].csv");
        assert_eq!(p.captures("/reports/2024.csv").unwrap().get("year"), Some("2024"));
        assert!(p.captures("/reports/2024xcsv").is_none());
    }

    #[test]
    fn param_does_not_cross_slash() {
        let p = compile("/users/[id]");
        assert!(p.captures("/users/1/2").is_none());
        assert!(p.captures("/users/").is_none());
    }

    #[test]
    fn wildcard_spans_segments() {
        let p = compile("/files/*");
        let params = p.captures("/files/a/b/c").unwrap();
        assert_eq!(params.get(WILDCARD_PARAM), Some("a/b/c"));
        assert!(p.captures("/files").is_none());
    }

    #[test]
    fn trailing_slash_is_optional() {
        let p = compile("/items/[id]");
        assert_eq!(p.captures("/items/5").unwrap().get("id"), Some("5"));
        assert_eq!(p.captures("/items/5/").unwrap().get("id"), Some("5"));
    }

    #[test]
    fn pattern_slashes_are_trimmed() {
        let p = compile("items/[id]/");
        assert!(p.is_match("/items/5"));
    }

    #[test]
    fn match_is_anchored() {
        let p = compile("/items");
        assert!(!p.is_match("/api/items"));
        assert!(!p.is_match("/items/extra"));
    }

    #[test]
    fn literal_metacharacters_are_escaped() {
        let p = compile("/v1.0/a+b");
        assert!(p.is_match("/v1.0/a+b"));
        assert!(!p.is_match("/v1x0/aab"));
    }

    #[test]
    fn unclosed_bracket_matches_verbatim() {
        let p = compile("/a[b");
        assert!(p.is_specific());
        assert!(p.is_match("/a[b"));
        assert!(!p.is_match("/ab"));
    }

    #[test]
    fn percent_escapes_match_verbatim() {
        let p = compile("/a%20b");
        assert!(p.is_match("/a%20b"));
        assert!(!p.is_match("/a b"));
    }

    #[test]
    fn root_pattern() {
        let p = compile("/");
        assert!(p.is_specific());
        assert!(p.is_match("/"));
        assert!(!p.is_match("/x"));
    }

    #[test]
    fn duplicate_names_keep_last_capture() {
        let p = compile("/[id]/x/[id]");
        assert_eq!(p.param_names(), ["id", "id"]);
        let params = p.captures("/first/x/second").unwrap();
        assert_eq!(params.get("id"), Some("second"));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn compilation_is_deterministic() {
        let a = compile("/shop/[category]/*");
        let b = compile("/shop/[category]/*");
        for path in ["/shop/books/x/y", "/shop/toys/", "/shop", "/other/a/b"] {
            assert_eq!(a.captures(path), b.captures(path));
        }
    }
}
