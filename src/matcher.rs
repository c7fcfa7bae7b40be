//! Pattern matching over candidate addresses
//!
//! Patterns are regular expressions over the base32 alphabet, always
//! anchored at the start of the address: generated addresses are
//! uniformly random, so a prefix search is the only mode that can be
//! satisfied meaningfully faster than scanning the whole key space.

use regex::Regex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PatternError {
    #[error("invalid pattern: {0}")]
    InvalidSyntax(#[from] regex::Error),

    #[error("pattern cannot be empty")]
    Empty,
}

/// A compiled, anchored search pattern. Cheap to clone into workers.
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
    source: String,
}

impl Pattern {
    /// Compile a pattern, prefixing `^` unless the caller already
    /// anchored it. Syntax errors surface here, before any worker starts.
    pub fn compile(expr: &str) -> Result<Self, PatternError> {
        if expr.is_empty() {
            return Err(PatternError::Empty);
        }
        let anchored = if expr.starts_with('^') {
            expr.to_string()
        } else {
            format!("^{}", expr)
        };
        Ok(Self {
            regex: Regex::new(&anchored)?,
            source: expr.to_string(),
        })
    }

    /// Test a candidate address body against the pattern.
    #[inline]
    pub fn is_match(&self, address: &str) -> bool {
        self.regex.is_match(address)
    }

    /// The pattern as the user supplied it.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The anchored form actually compiled.
    pub fn anchored(&self) -> &str {
        self.regex.as_str()
    }

    /// Expected attempts per match, when the pattern is a plain base32
    /// literal: each character constrains 5 bits, so 32^len. General
    /// regexes get `None`; display-only either way.
    pub fn expected_attempts(&self) -> Option<f64> {
        let literal = self.source.trim_start_matches('^');
        if !literal.is_empty()
            && literal.chars().all(|c| matches!(c, 'a'..='z' | '2'..='7'))
        {
            Some(32f64.powi(literal.len() as i32))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(prefix: &str) -> String {
        let mut s = prefix.to_string();
        while s.len() < 56 {
            s.push('a');
        }
        s
    }

    #[test]
    fn test_auto_anchoring() {
        let pattern = Pattern::compile("test").unwrap();
        assert_eq!(pattern.anchored(), "^test");
        assert!(pattern.is_match(&addr("test")));
        assert!(!pattern.is_match(&addr("xtest")));
    }

    #[test]
    fn test_pre_anchored_unchanged() {
        let pattern = Pattern::compile("^ab").unwrap();
        assert_eq!(pattern.anchored(), "^ab");
        assert!(pattern.is_match(&addr("ab")));
    }

    #[test]
    fn test_regex_alternation() {
        let pattern = Pattern::compile("(cat|dog)").unwrap();
        assert!(pattern.is_match(&addr("cat")));
        assert!(pattern.is_match(&addr("dog")));
        assert!(!pattern.is_match(&addr("bird")));
    }

    #[test]
    fn test_invalid_syntax() {
        assert!(matches!(
            Pattern::compile("["),
            Err(PatternError::InvalidSyntax(_))
        ));
        assert!(matches!(Pattern::compile(""), Err(PatternError::Empty)));
    }

    #[test]
    fn test_expected_attempts() {
        assert_eq!(Pattern::compile("ab").unwrap().expected_attempts(), Some(1024.0));
        assert_eq!(Pattern::compile("^ab").unwrap().expected_attempts(), Some(1024.0));
        assert_eq!(Pattern::compile("a|b").unwrap().expected_attempts(), None);
    }
}
