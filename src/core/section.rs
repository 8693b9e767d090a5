use regex::Regex;
use std::borrow::Cow;

/// Broad predicate: a paragraph is a candidate when it carries a numbered
/// marker, free text, a period, an optional space, then an em-dash.
const DETECT_PATTERN: &str = r"\d+[A-Za-z]*\.\s[^—]*\.\s?—";

/// Narrow rewrite: the body may not contain another period and the dash must
/// follow the closing period directly. Kept distinct from `DETECT_PATTERN`.
const REWRITE_PATTERN: &str = r"(\d+[A-Za-z]*\.\s[^—.]*\.)(—)";
const REWRITE_TEMPLATE: &str = "Section ${1}${2}";

/// Prefixes section markers such as `4B. Definitions.—` with `Section `.
#[derive(Debug, Clone)]
pub struct SectionAnnotator {
    detect: Regex,
    rewrite: Regex,
}

impl Default for SectionAnnotator {
    fn default() -> Self {
        Self::new()
    }
}

impl SectionAnnotator {
    pub fn new() -> Self {
        Self {
            detect: Regex::new(DETECT_PATTERN).expect("valid section detect regex"),
            rewrite: Regex::new(REWRITE_PATTERN).expect("valid section rewrite regex"),
        }
    }

    pub fn detects(&self, text: &str) -> bool {
        self.detect.is_match(text)
    }

    /// Replace every non-overlapping rewrite match, borrowing when nothing matched.
    pub fn rewrite<'t>(&self, text: &'t str) -> Cow<'t, str> {
        self.rewrite.replace_all(text, REWRITE_TEMPLATE)
    }

    /// `None` when the paragraph is not a candidate. A candidate whose text
    /// the rewrite pattern does not reach comes back unchanged.
    pub fn annotate(&self, text: &str) -> Option<String> {
        if !self.detects(text) {
            return None;
        }
        Some(self.rewrite(text).into_owned())
    }
}
