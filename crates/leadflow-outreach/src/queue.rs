//! Ordered, de-duplicated worklist.

use std::collections::HashSet;

use crate::target::InteractionTarget;

/// Targets in processing order with a cursor.
///
/// Duplicate ids are dropped on construction, keeping the first occurrence,
/// so indices always refer to the de-duplicated list.
#[derive(Debug, Clone, Default)]
pub struct InteractionQueue {
    targets: Vec<InteractionTarget>,
    cursor: usize,
}

impl InteractionQueue {
    pub fn new(targets: Vec<InteractionTarget>) -> Self {
        let mut seen = HashSet::new();
        let targets = targets
            .into_iter()
            .filter(|t| seen.insert(t.id.clone()))
            .collect();
        Self { targets, cursor: 0 }
    }

    /// Move the cursor. Positions past the end are clamped.
    pub fn seek(&mut self, index: usize) {
        self.cursor = index.min(self.targets.len());
    }

    /// Take the target under the cursor and advance.
    pub fn next(&mut self) -> Option<(usize, InteractionTarget)> {
        let target = self.targets.get(self.cursor)?.clone();
        let index = self.cursor;
        self.cursor += 1;
        Some((index, target))
    }

    /// Drop all remaining work.
    pub fn clear(&mut self) {
        self.targets.truncate(self.cursor);
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.targets.len() - self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn targets(ids: &[&str]) -> Vec<InteractionTarget> {
        ids.iter()
            .map(|id| InteractionTarget::new(*id, id.to_uppercase()))
            .collect()
    }

    #[test]
    fn test_dedup_keeps_first() {
        let mut input = targets(&["a", "b", "a", "c"]);
        input[2].display_name = "second a".to_string();

        let mut queue = InteractionQueue::new(input);
        assert_eq!(queue.len(), 3);

        let (_, first) = queue.next().unwrap();
        assert_eq!(first.display_name, "A");
    }

    #[test]
    fn test_next_in_order() {
        let mut queue = InteractionQueue::new(targets(&["a", "b"]));
        assert_eq!(queue.next().map(|(i, t)| (i, t.id)), Some((0, "a".to_string())));
        assert_eq!(queue.next().map(|(i, t)| (i, t.id)), Some((1, "b".to_string())));
        assert!(queue.next().is_none());
        assert_eq!(queue.position(), 2);
    }

    #[test]
    fn test_seek() {
        let mut queue = InteractionQueue::new(targets(&["a", "b", "c"]));
        queue.seek(1);
        assert_eq!(queue.remaining(), 2);
        assert_eq!(queue.next().unwrap().0, 1);

        queue.seek(10);
        assert_eq!(queue.position(), 3);
        assert!(queue.next().is_none());
    }

    #[test]
    fn test_clear_drops_remaining() {
        let mut queue = InteractionQueue::new(targets(&["a", "b", "c"]));
        queue.next();
        queue.clear();

        assert_eq!(queue.len(), 1);
        assert_eq!(queue.remaining(), 0);
        assert!(queue.next().is_none());
    }
}
