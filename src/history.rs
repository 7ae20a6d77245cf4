//! Navigation history management
//!
//! A cursor over an entry stack, where each entry carries the navigation key
//! identifying its view slot. Returning to an entry reuses its key, so the
//! webview registry resolves the same mounted instance; replacing an entry
//! allocates a fresh key and therefore a fresh slot.

/// One position in the navigation history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Normalized route path
    pub path: String,
    /// Key identifying this entry's view slot
    pub key: String,
}

/// Navigation history stack with a movable cursor.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<HistoryEntry>,
    current: usize,
    /// Maximum retained entries (0 = unlimited)
    max_size: usize,
    next_key: u64,
}

impl History {
    /// Create a history seeded with an initial entry
    pub fn new(initial_path: impl Into<String>) -> Self {
        Self::with_limit(initial_path, 50)
    }

    /// Create with an explicit retention limit
    pub fn with_limit(initial_path: impl Into<String>, max_size: usize) -> Self {
        let mut history = Self {
            entries: Vec::new(),
            current: 0,
            max_size,
            next_key: 0,
        };
        let key = history.allocate_key();
        history.entries.push(HistoryEntry {
            path: initial_path.into(),
            key,
        });
        history
    }

    fn allocate_key(&mut self) -> String {
        let key = format!("wn-{}", self.next_key);
        self.next_key += 1;
        key
    }

    /// Current entry
    pub fn current_entry(&self) -> &HistoryEntry {
        &self.entries[self.current]
    }

    /// Current path
    pub fn current_path(&self) -> &str {
        &self.current_entry().path
    }

    /// Current view-slot key
    pub fn current_key(&self) -> &str {
        &self.current_entry().key
    }

    /// Number of retained entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the history holds no entries (never true; seeded at creation)
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a backward step is possible
    pub fn can_go_back(&self) -> bool {
        self.current > 0
    }

    /// Whether a forward step is possible
    pub fn can_go_forward(&self) -> bool {
        self.current + 1 < self.entries.len()
    }

    /// Push a new entry, truncating any forward history
    pub fn push(&mut self, path: impl Into<String>) -> &HistoryEntry {
        self.entries.truncate(self.current + 1);

        let key = self.allocate_key();
        self.entries.push(HistoryEntry {
            path: path.into(),
            key,
        });
        self.current = self.entries.len() - 1;

        if self.max_size > 0 && self.entries.len() > self.max_size {
            let overflow = self.entries.len() - self.max_size;
            self.entries.drain(..overflow);
            self.current -= overflow;
        }

        self.current_entry()
    }

    /// Replace the current entry, allocating a fresh view slot
    pub fn replace(&mut self, path: impl Into<String>) -> &HistoryEntry {
        let key = self.allocate_key();
        self.entries[self.current] = HistoryEntry {
            path: path.into(),
            key,
        };
        self.current_entry()
    }

    /// Step the cursor back one entry
    pub fn back(&mut self) -> Option<&HistoryEntry> {
        if self.current > 0 {
            self.current -= 1;
            Some(self.current_entry())
        } else {
            None
        }
    }

    /// Step the cursor forward one entry
    pub fn forward(&mut self) -> Option<&HistoryEntry> {
        if self.current + 1 < self.entries.len() {
            self.current += 1;
            Some(self.current_entry())
        } else {
            None
        }
    }

    /// Move the cursor back to the nearest older entry with the given path
    pub fn back_to(&mut self, path: &str) -> Option<&HistoryEntry> {
        let target = self.entries[..self.current]
            .iter()
            .rposition(|entry| entry.path == path)?;
        self.current = target;
        Some(self.current_entry())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation_cursor() {
        let mut history = History::new("/");
        assert_eq!(history.current_path(), "/");
        assert!(!history.can_go_back());

        history.push("/users");
        history.push("/users/1");
        assert_eq!(history.current_path(), "/users/1");
        assert_eq!(history.len(), 3);

        assert_eq!(history.back().map(|e| e.path.clone()), Some("/users".into()));
        assert!(history.can_go_forward());
        assert_eq!(
            history.forward().map(|e| e.path.clone()),
            Some("/users/1".into())
        );
        assert!(history.forward().is_none());
    }

    #[test]
    fn test_keys_are_stable_across_traversal() {
        let mut history = History::new("/");
        let first_key = history.current_key().to_string();

        history.push("/next");
        let second_key = history.current_key().to_string();
        assert_ne!(first_key, second_key);

        history.back();
        assert_eq!(history.current_key(), first_key);
        history.forward();
        assert_eq!(history.current_key(), second_key);
    }

    #[test]
    fn test_push_truncates_forward_history() {
        let mut history = History::new("/");
        history.push("/a");
        history.push("/b");
        history.back();

        history.push("/c");
        assert_eq!(history.current_path(), "/c");
        assert_eq!(history.len(), 3);
        assert!(!history.can_go_forward());
    }

    #[test]
    fn test_replace_allocates_fresh_key() {
        let mut history = History::new("/");
        history.push("/old");
        let old_key = history.current_key().to_string();

        history.replace("/new");
        assert_eq!(history.current_path(), "/new");
        assert_ne!(history.current_key(), old_key);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_back_to_finds_nearest_older_entry() {
        let mut history = History::new("/");
        history.push("/list");
        history.push("/detail");
        history.push("/settings");

        let entry = history.back_to("/list").map(|e| e.path.clone());
        assert_eq!(entry, Some("/list".into()));
        assert_eq!(history.current_path(), "/list");

        assert!(history.back_to("/nowhere").is_none());
    }

    #[test]
    fn test_retention_limit_drops_oldest() {
        let mut history = History::with_limit("/", 3);
        history.push("/a");
        history.push("/b");
        history.push("/c");

        assert_eq!(history.len(), 3);
        assert_eq!(history.current_path(), "/c");
        // Oldest entry is gone; cursor still valid.
        assert!(history.back_to("/").is_none());
    }
}
