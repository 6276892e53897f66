//! Program text snapshots for one session.

/// Ordered full-source snapshots, one per successful program mutation.
///
/// The last entry always matches the text most recently pulled from the
/// execution environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramHistory {
    entries: Vec<String>,
}

impl ProgramHistory {
    /// Create an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a snapshot.
    pub fn push(&mut self, text: String) {
        self.entries.push(text);
    }

    /// Drop the two most recent snapshots after an undo round-trip: the
    /// resynced copy and the entry being undone.
    ///
    /// Callers check [`ProgramHistory::can_undo`] first; with fewer than two
    /// entries this empties the history.
    pub fn trim_after_undo(&mut self) {
        self.entries.pop();
        self.entries.pop();
    }

    /// Whether there is a mutation to undo.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.entries.len() >= 2
    }

    /// Most recent snapshot.
    #[must_use]
    pub fn latest(&self) -> Option<&str> {
        self.entries.last().map(String::as_str)
    }

    /// `(before, after)` for the most recent change.
    #[must_use]
    pub fn last_change(&self) -> Option<(&str, &str)> {
        match self.entries.as_slice() {
            [.., before, after] => Some((before.as_str(), after.as_str())),
            _ => None,
        }
    }

    /// Number of snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no snapshot has been taken yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All snapshots, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}
