use anyhow::Context;
use std::borrow::Cow;
use std::path::Path;

/// Class names indexed by class id, loaded once and never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSet {
    labels: Vec<String>,
}

impl LabelSet {
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }

    /// One label per line; line `i` names class `i`.
    ///
    /// Trailing whitespace is trimmed and trailing blank lines are dropped.
    /// Blank lines in the middle are kept so later indices stay aligned.
    pub fn parse(contents: &str) -> Self {
        let mut labels: Vec<String> = contents
            .lines()
            .map(|line| line.trim_end().to_string())
            .collect();

        while labels.last().is_some_and(|l| l.is_empty()) {
            labels.pop();
        }

        Self { labels }
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read label file {}", path.display()))?;

        let labels = Self::parse(&contents);
        tracing::info!(count = labels.len(), path = %path.display(), "Labels loaded");

        Ok(labels)
    }

    /// The stored label, or `class_<index>` when the index is out of range.
    pub fn resolve(&self, index: usize) -> Cow<'_, str> {
        match self.labels.get(index) {
            Some(label) => Cow::Borrowed(label.as_str()),
            None => Cow::Owned(format!("class_{}", index)),
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for LabelSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_resolve_in_bounds() {
        let labels: LabelSet = ["cat", "dog", "red-box"].into_iter().collect();
        assert_eq!(labels.resolve(0), "cat");
        assert_eq!(labels.resolve(2), "red-box");
    }

    #[test]
    fn test_resolve_out_of_bounds_falls_back() {
        let labels: LabelSet = ["cat", "dog", "red-box"].into_iter().collect();
        assert_eq!(labels.resolve(3), "class_3");
        assert_eq!(labels.resolve(1000), "class_1000");
    }

    #[test]
    fn test_empty_set_always_falls_back() {
        assert_eq!(LabelSet::default().resolve(0), "class_0");
    }

    #[test]
    fn test_parse_handles_crlf_and_trailing_blank_lines() {
        let labels = LabelSet::parse("background\r\ntench\r\ngoldfish\r\n\r\n\n");
        assert_eq!(labels.len(), 3);
        assert_eq!(labels.resolve(1), "tench");
        assert_eq!(labels.resolve(2), "goldfish");
    }

    #[test]
    fn test_parse_keeps_interior_blank_lines() {
        let labels = LabelSet::parse("a\n\nc\n");
        assert_eq!(labels.len(), 3);
        assert_eq!(labels.resolve(1), "");
        assert_eq!(labels.resolve(2), "c");
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "cat\ndog\nred-box").unwrap();

        let labels = LabelSet::from_file(file.path()).unwrap();

        assert_eq!(labels.iter().collect::<Vec<_>>(), vec!["cat", "dog", "red-box"]);
    }

    #[test]
    fn test_from_missing_file_names_path() {
        let err = LabelSet::from_file("/nonexistent/labels.txt").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/labels.txt"));
    }
}
