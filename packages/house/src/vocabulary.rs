//! Fixed categorical vocabularies.
//!
//! A [`Vocabulary`] maps each distinct string seen in a column to its
//! position in sorted order, so codes are stable for a given dataset.

use std::collections::BTreeSet;

/// Sorted set of known labels for one categorical column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    classes: Vec<String>,
}

impl Vocabulary {
    /// Builds a vocabulary from every value in a column.
    pub fn fit<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let classes: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        Self {
            classes: classes.into_iter().collect(),
        }
    }

    /// Integer code for a label.
    #[must_use]
    pub fn encode(&self, label: &str) -> Option<usize> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(label))
            .ok()
    }

    /// Label for an integer code.
    #[must_use]
    pub fn decode(&self, code: usize) -> Option<&str> {
        self.classes.get(code).map(String::as_str)
    }

    /// Every known label in code order.
    #[must_use]
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Number of known labels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether the vocabulary is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_sorted_order() {
        let vocab = Vocabulary::fit(["T Nagar", "Adyar", "Chrompet", "Adyar"]);
        assert_eq!(vocab.classes(), ["Adyar", "Chrompet", "T Nagar"]);
        assert_eq!(vocab.encode("Chrompet"), Some(1));
    }

    #[test]
    fn every_label_round_trips() {
        let vocab = Vocabulary::fit(["KK Nagar", "Anna Nagar", "Velachery", "Karapakkam"]);
        for label in vocab.classes() {
            let code = vocab.encode(label).unwrap();
            assert_eq!(vocab.decode(code), Some(label.as_str()));
        }
    }

    #[test]
    fn unknown_labels_are_case_sensitive_misses() {
        let vocab = Vocabulary::fit(["Adyar"]);
        assert_eq!(vocab.encode("adyar"), None);
        assert_eq!(vocab.decode(1), None);
    }
}
