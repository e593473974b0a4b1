use std::collections::VecDeque;

use super::{Manifest, ManifestEntry};

/// FIFO of pending manifest entries with append-on-requeue.
///
/// A re-appended entry is a new pending unit; the queue tracks no identity
/// beyond the entry itself.
#[derive(Debug, Default)]
pub struct WorkQueue {
    pending: VecDeque<ManifestEntry>,
}

impl WorkQueue {
    pub fn from_manifest(manifest: &Manifest) -> Self {
        Self {
            pending: manifest.iter().cloned().collect(),
        }
    }

    pub fn pop(&mut self) -> Option<ManifestEntry> {
        self.pending.pop_front()
    }

    pub fn requeue(&mut self, entry: ManifestEntry) {
        self.pending.push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_manifest_order_and_requeues_at_back() {
        let manifest = Manifest::new(vec![
            ManifestEntry::new("generated/a.py", "a"),
            ManifestEntry::new("generated/b.py", "b"),
        ]);
        let mut queue = WorkQueue::from_manifest(&manifest);

        let first = queue.pop().unwrap();
        assert_eq!(first.path, "generated/a.py");
        queue.requeue(first);

        assert_eq!(queue.pop().unwrap().path, "generated/b.py");
        assert_eq!(queue.pop().unwrap().path, "generated/a.py");
        assert!(queue.is_empty());
    }
}
