use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Recorded answers keyed by 0-based question index.
///
/// Values are option ids, `"true"`/`"false"`, or free text. A missing key
/// means the question is unanswered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSheet(BTreeMap<usize, String>);

impl AnswerSheet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the answer at `index`.
    ///
    /// Returns `true` if the question was previously unanswered.
    pub fn record(&mut self, index: usize, value: impl Into<String>) -> bool {
        self.0.insert(index, value.into()).is_none()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(&index).map(String::as_str)
    }

    #[must_use]
    pub fn is_answered(&self, index: usize) -> bool {
        self.0.contains_key(&index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

impl FromIterator<(usize, String)> for AnswerSheet {
    fn from_iter<I: IntoIterator<Item = (usize, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Question indices marked "review later".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagSet(BTreeSet<usize>);

impl FlagSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip membership of `index`. Returns the new membership.
    pub fn toggle(&mut self, index: usize) -> bool {
        if self.0.remove(&index) {
            false
        } else {
            self.0.insert(index);
            true
        }
    }

    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.0.contains(&index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_reports_first_answer_only() {
        let mut sheet = AnswerSheet::new();
        assert!(sheet.record(2, "a"));
        assert!(!sheet.record(2, "b"));
        assert_eq!(sheet.get(2), Some("b"));
        assert_eq!(sheet.len(), 1);
    }

    #[test]
    fn double_toggle_restores_membership() {
        let mut flags = FlagSet::new();
        assert!(flags.toggle(4));
        assert!(flags.contains(4));
        assert!(!flags.toggle(4));
        assert!(flags.is_empty());
    }
}
