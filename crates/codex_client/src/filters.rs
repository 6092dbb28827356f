//! Active tag filter set.

/// Set of tags selected for filtering, iterated in insertion order.
///
/// Insertion order decides which copy of a duplicate snippet wins when tag
/// results are merged, so it is kept stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveFilterSet {
    tags: Vec<String>,
}

impl ActiveFilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip membership of `tag`. Blank tags are ignored.
    ///
    /// # Returns
    /// `Some(true)` when the tag was added, `Some(false)` when removed, `None`
    /// when the input was blank.
    pub fn toggle(&mut self, tag: &str) -> Option<bool> {
        let tag = tag.trim();
        if tag.is_empty() {
            return None;
        }
        match self.tags.iter().position(|t| t == tag) {
            Some(index) => {
                self.tags.remove(index);
                Some(false)
            }
            None => {
                self.tags.push(tag.to_string());
                Some(true)
            }
        }
    }

    pub fn remove(&mut self, tag: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| t != tag.trim());
        self.tags.len() != before
    }

    pub fn clear(&mut self) {
        self.tags.clear();
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag.trim())
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.tags
    }
}
