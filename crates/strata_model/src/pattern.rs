//! Identifier patterns: globs and regular expressions.
//!
//! Dependencies on collections can be restricted to members whose
//! identifiers match a pattern, and filters look items up by pattern.
//! Globs translate `*` to "any characters" and `?` to "any one character";
//! everything else matches literally.

use regex_lite::Regex;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Which syntax a [`Pattern`]'s source text uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternKind {
    /// Glob syntax (`/posts/*`).
    Glob,
    /// Regular-expression syntax (`^/posts/.*`).
    Regex,
}

/// A compiled identifier pattern.
///
/// Equality, hashing, and serialization go by kind and source text; the
/// compiled regex is rebuilt on deserialization.
#[derive(Clone)]
pub struct Pattern {
    kind: PatternKind,
    source: String,
    regex: Regex,
}

/// Error compiling a pattern.
#[derive(Debug)]
pub struct PatternError {
    /// The pattern syntax that failed.
    pub kind: PatternKind,
    /// The offending source text.
    pub source: String,
    /// Description of the failure.
    pub reason: String,
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid {:?} pattern `{}`: {}",
            self.kind, self.source, self.reason
        )
    }
}

impl std::error::Error for PatternError {}

impl Pattern {
    /// Compiles a glob pattern.
    ///
    /// Glob translation cannot fail: metacharacters other than `*` and `?`
    /// are escaped, and the result is anchored at both ends.
    pub fn glob(source: impl Into<String>) -> Self {
        let source = source.into();
        let mut re = String::with_capacity(source.len() + 2);
        re.push('^');
        for c in source.chars() {
            match c {
                '*' => re.push_str(".*"),
                '?' => re.push('.'),
                c if "\\.+()[]{}|^$".contains(c) => {
                    re.push('\\');
                    re.push(c);
                }
                c => re.push(c),
            }
        }
        re.push('$');
        let regex = Regex::new(&re).expect("escaped glob translation is always a valid regex");
        Self {
            kind: PatternKind::Glob,
            source,
            regex,
        }
    }

    /// Compiles a regular-expression pattern.
    pub fn regex(source: impl Into<String>) -> Result<Self, PatternError> {
        let source = source.into();
        let regex = Regex::new(&source).map_err(|e| PatternError {
            kind: PatternKind::Regex,
            source: source.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            kind: PatternKind::Regex,
            source,
            regex,
        })
    }

    /// Returns `true` if the identifier string matches this pattern.
    ///
    /// Globs match the whole identifier; regexes match anywhere unless
    /// anchored in their source.
    pub fn matches(&self, identifier: &str) -> bool {
        self.regex.is_match(identifier)
    }

    /// The pattern's source text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The pattern's syntax kind.
    pub fn kind(&self) -> PatternKind {
        self.kind
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.source == other.source
    }
}

impl Eq for Pattern {}

impl std::hash::Hash for Pattern {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.source.hash(state);
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pattern({:?}, {:?})", self.kind, self.source)
    }
}

#[derive(Serialize, Deserialize)]
struct PatternRepr {
    kind: PatternKind,
    source: String,
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        PatternRepr {
            kind: self.kind,
            source: self.source.clone(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = PatternRepr::deserialize(deserializer)?;
        match repr.kind {
            PatternKind::Glob => Ok(Pattern::glob(repr.source)),
            PatternKind::Regex => Pattern::regex(repr.source).map_err(D::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_star_matches_any_run() {
        let p = Pattern::glob("/new*");
        assert!(p.matches("/newblahz.md"));
        assert!(p.matches("/new"));
        assert!(!p.matches("/nublahz.md"));
    }

    #[test]
    fn glob_question_matches_one_char() {
        let p = Pattern::glob("/a?.md");
        assert!(p.matches("/ab.md"));
        assert!(!p.matches("/abc.md"));
    }

    #[test]
    fn glob_is_anchored() {
        let p = Pattern::glob("/other.md");
        assert!(p.matches("/other.md"));
        assert!(!p.matches("/x/other.md"));
    }

    #[test]
    fn glob_escapes_metacharacters() {
        let p = Pattern::glob("/a.md");
        assert!(!p.matches("/axmd"));
    }

    #[test]
    fn regex_pattern() {
        let p = Pattern::regex("^/new.*").unwrap();
        assert!(p.matches("/newblahz.md"));
        assert!(!p.matches("/nublahz.md"));
    }

    #[test]
    fn invalid_regex_errors() {
        let err = Pattern::regex("([unclosed").unwrap_err();
        assert_eq!(err.kind, PatternKind::Regex);
        assert!(err.to_string().contains("[unclosed"));
    }

    #[test]
    fn equality_by_source() {
        assert_eq!(Pattern::glob("/new*"), Pattern::glob("/new*"));
        assert_ne!(Pattern::glob("/new*"), Pattern::glob("/old*"));
        assert_ne!(Pattern::glob("/new*"), Pattern::regex("/new*").unwrap());
    }

    #[test]
    fn serde_roundtrip_recompiles() {
        let p = Pattern::glob("/posts/*");
        let json = serde_json::to_string(&p).unwrap();
        let back: Pattern = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);
        assert!(back.matches("/posts/hello.md"));
    }
}
