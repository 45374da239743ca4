//! Done-like board classification.
//!
//! A board list counts as "done-like" when its name contains one of a fixed
//! set of completion keywords, compared case-insensitively. Issues on any
//! other list survive into the next cycle.

/// Keywords that mark a board list as done-like.
pub const DEFAULT_DONE_KEYWORDS: [&str; 4] = ["done", "closed", "complete", "finished"];

/// Substring matcher over a set of lowercase keywords.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoneBoardMatcher {
    keywords: Vec<String>,
}

impl DoneBoardMatcher {
    /// Build a matcher from keywords. Blank keywords are dropped.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// Whether the board name contains any keyword.
    pub fn is_done(&self, board: &str) -> bool {
        let board = board.to_lowercase();
        self.keywords.iter().any(|k| board.contains(k.as_str()))
    }

    /// The keywords in use.
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

impl Default for DoneBoardMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_DONE_KEYWORDS)
    }
}

/// Classify a board name with the default keywords.
pub fn is_done_like(board: &str) -> bool {
    DoneBoardMatcher::default().is_done(board)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::exact("Done", true)]
    #[case::upper("CLOSED", true)]
    #[case::substring("Review complete", true)]
    #[case::completed("Completed", true)]
    #[case::finished("finished items", true)]
    #[case::doing("Doing", false)]
    #[case::open("Open", false)]
    #[case::blocked("Blocked", false)]
    #[case::empty("", false)]
    fn default_classification(#[case] board: &str, #[case] expected: bool) {
        assert_eq!(is_done_like(board), expected);
    }

    #[test]
    fn custom_keywords_replace_defaults() {
        let matcher = DoneBoardMatcher::new(["Shipped", " "]);
        assert_eq!(matcher.keywords(), ["shipped".to_string()]);
        assert!(matcher.is_done("shipped to prod"));
        assert!(!matcher.is_done("Done"));
    }
}
