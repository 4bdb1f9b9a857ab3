//! Extract-minimum priority queue keyed by a function.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Binary heap returning the item with the smallest key first.
/// The key of every item is computed once, on insertion, by the key function.
/// Items with equal keys are returned in insertion order.
pub struct KeyedHeap<T, K, F = fn(&T) -> K>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    slots: BinaryHeap<Slot<T, K>>,
    key_fn: F,
    next_seq: u64,
}

impl<T, K, F> KeyedHeap<T, K, F>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    pub fn new(key_fn: F) -> Self {
        Self::with_capacity(0, key_fn)
    }

    pub fn with_capacity(capacity: usize, key_fn: F) -> Self {
        KeyedHeap {
            slots: BinaryHeap::with_capacity(capacity),
            key_fn,
            next_seq: 0,
        }
    }

    pub fn push(&mut self, item: T) {
        let key = (self.key_fn)(&item);
        self.slots.push(Slot {
            key,
            seq: self.next_seq,
            item,
        });
        self.next_seq += 1;
    }

    /// Removes the item with the smallest key.
    pub fn pop(&mut self) -> Option<T> {
        self.slots.pop().map(|slot| slot.item)
    }

    pub fn peek(&self) -> Option<&T> {
        self.slots.peek().map(|slot| &slot.item)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

struct Slot<T, K> {
    key: K,
    seq: u64,
    item: T,
}

impl<T, K: Ord> PartialEq for Slot<T, K> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T, K: Ord> Eq for Slot<T, K> {}

impl<T, K: Ord> PartialOrd for Slot<T, K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T, K: Ord> Ord for Slot<T, K> {
    // binary heap is max-heap by default so the comparison is reversed
    fn cmp(&self, other: &Self) -> Ordering {
        other.key.cmp(&self.key).then_with(|| other.seq.cmp(&self.seq))
    }
}

#[cfg(test)]
mod test {
    use std::cmp::Reverse;

    use super::KeyedHeap;

    #[test]
    fn test_keyed_heap_min() {
        let mut heap = KeyedHeap::new(|item: &u64| *item);
        for item in [4, 1, 7, 3, 1] {
            heap.push(item);
        }
        assert_eq!(heap.len(), 5);
        assert_eq!(heap.peek(), Some(&1));

        let drained: Vec<u64> = std::iter::from_fn(|| heap.pop()).collect();
        assert_eq!(drained, vec![1, 1, 3, 4, 7]);
        assert!(heap.is_empty());
    }

    #[test]
    fn test_keyed_heap_inverted_key() {
        let mut heap = KeyedHeap::new(|item: &u64| Reverse(*item));
        for item in [4, 1, 7, 3] {
            heap.push(item);
        }

        let drained: Vec<u64> = std::iter::from_fn(|| heap.pop()).collect();
        assert_eq!(drained, vec![7, 4, 3, 1]);
    }

    #[test]
    fn test_keyed_heap_insertion_order() {
        let mut heap = KeyedHeap::new(|item: &(u64, char)| item.0);
        heap.push((2, 'a'));
        heap.push((1, 'b'));
        heap.push((2, 'c'));
        heap.push((1, 'd'));

        assert_eq!(heap.pop(), Some((1, 'b')));
        heap.push((1, 'e'));

        let drained: Vec<char> = std::iter::from_fn(|| heap.pop()).map(|item| item.1).collect();
        assert_eq!(drained, vec!['d', 'e', 'a', 'c']);
    }
}
