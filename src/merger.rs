//! K-way merger.

use std::marker::PhantomData;

use crate::heap::KeyedHeap;
use crate::order::{Order, Priority};

/// Current head item of a chunk.
struct Head<T> {
    item: T,
    chunk: usize,
    order: Order,
}

impl<T: Clone> Head<T> {
    // equal items are emitted in chunk index order
    fn priority(&self) -> (Priority<T>, usize) {
        (Priority::new(self.item.clone(), self.order), self.chunk)
    }
}

/// K-way merger implementation.
/// Merges multiple sorted inputs into a single sorted output.
/// Holds at most one pending item per input, so memory is proportional to the number of inputs.
/// Time complexity is *m* \* log(*n*) in worst case where *m* is the number of items,
/// *n* is the number of chunks (inputs).
///
/// The merger is fused after the first error: once an `Err` is returned, every following call yields `None`.
pub struct KWayMerger<T, E, C>
where
    T: Ord + Clone,
    C: IntoIterator<Item = Result<T, E>>,
{
    frontier: KeyedHeap<Head<T>, (Priority<T>, usize)>,
    chunks: Vec<C::IntoIter>,
    order: Order,
    initiated: bool,
    failed: bool,

    /// Chunk error type.
    error_type: PhantomData<E>,
}

impl<T, E, C> KWayMerger<T, E, C>
where
    T: Ord + Clone,
    C: IntoIterator<Item = Result<T, E>>,
{
    /// Creates an instance of a k-way merger using chunks as inputs.
    /// Chunk items should be sorted according to `order` otherwise the result is undefined.
    ///
    /// # Arguments
    /// * `chunks` - Chunks to be merged in a single sorted one
    /// * `order` - Order of the chunks and of the merged output
    pub fn new<I>(chunks: I, order: Order) -> Self
    where
        I: IntoIterator<Item = C>,
    {
        let chunks = Vec::from_iter(chunks.into_iter().map(|c| c.into_iter()));
        let key_fn = Head::<T>::priority as fn(&Head<T>) -> (Priority<T>, usize);
        let frontier = KeyedHeap::with_capacity(chunks.len(), key_fn);

        return KWayMerger {
            chunks,
            frontier,
            order,
            initiated: false,
            failed: false,
            error_type: PhantomData,
        };
    }

    /// Number of chunks that still have pending items.
    pub fn open_chunks(&self) -> usize {
        self.frontier.len()
    }

    fn advance(&mut self, chunk: usize) -> Result<(), E> {
        if let Some(item) = self.chunks[chunk].next() {
            self.frontier.push(Head {
                item: item?,
                chunk,
                order: self.order,
            });
        }

        return Ok(());
    }
}

impl<T, E, C> Iterator for KWayMerger<T, E, C>
where
    T: Ord + Clone,
    C: IntoIterator<Item = Result<T, E>>,
{
    type Item = Result<T, E>;

    /// Returns the next item from the inputs in the merger order.
    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        if !self.initiated {
            self.initiated = true;
            for chunk in 0..self.chunks.len() {
                if let Err(err) = self.advance(chunk) {
                    self.failed = true;
                    return Some(Err(err));
                }
            }
        }

        let head = self.frontier.pop()?;
        if let Err(err) = self.advance(head.chunk) {
            self.failed = true;
            return Some(Err(err));
        }

        return Some(Ok(head.item));
    }
}

#[cfg(test)]
mod test {
    use rstest::*;
    use std::cmp::Ordering;
    use std::error::Error;
    use std::io::{self, ErrorKind};

    use super::KWayMerger;
    use crate::order::Order;

    #[rstest]
    #[case(
        vec![],
        Order::Asc,
        vec![],
    )]
    #[case(
        vec![
            vec![],
            vec![]
        ],
        Order::Asc,
        vec![],
    )]
    #[case(
        vec![
            vec![Ok(4), Ok(5), Ok(7)],
            vec![Ok(1), Ok(6)],
            vec![Ok(3)],
            vec![],
        ],
        Order::Asc,
        vec![Ok(1), Ok(3), Ok(4), Ok(5), Ok(6), Ok(7)],
    )]
    #[case(
        vec![
            vec![Ok(7), Ok(5), Ok(4)],
            vec![],
            vec![Ok(6), Ok(1)],
            vec![Ok(3)],
        ],
        Order::Desc,
        vec![Ok(7), Ok(6), Ok(5), Ok(4), Ok(3), Ok(1)],
    )]
    #[case(
        vec![
            vec![Ok(3), Ok(5)],
            vec![Ok(1), Ok(3)],
        ],
        Order::Asc,
        vec![Ok(1), Ok(3), Ok(3), Ok(5)],
    )]
    #[case(
        vec![
            vec![Ok(5), Ok(3)],
            vec![Ok(3), Ok(1)],
        ],
        Order::Desc,
        vec![Ok(5), Ok(3), Ok(3), Ok(1)],
    )]
    #[case(
        vec![
            vec![Result::Err(io::Error::new(ErrorKind::Other, "test error"))]
        ],
        Order::Asc,
        vec![
            Result::Err(io::Error::new(ErrorKind::Other, "test error"))
        ],
    )]
    #[case(
        vec![
            vec![Ok(3), Result::Err(io::Error::new(ErrorKind::Other, "test error"))],
            vec![Ok(1), Ok(2)],
        ],
        Order::Asc,
        vec![
            Ok(1),
            Ok(2),
            Result::Err(io::Error::new(ErrorKind::Other, "test error")),
        ],
    )]
    fn test_merger(
        #[case] chunks: Vec<Vec<Result<u64, io::Error>>>,
        #[case] order: Order,
        #[case] expected_result: Vec<Result<u64, io::Error>>,
    ) {
        let merger = KWayMerger::new(chunks, order);
        let actual_result = merger.collect();
        assert!(
            compare_vectors_of_result::<_, io::Error>(&actual_result, &expected_result),
            "actual={:?}, expected={:?}",
            actual_result,
            expected_result
        );
    }

    /// Item compared by key only, the chunk field tells where it came from.
    #[derive(Debug, Clone)]
    struct Sourced {
        key: u64,
        chunk: usize,
    }

    impl PartialEq for Sourced {
        fn eq(&self, other: &Self) -> bool {
            self.key == other.key
        }
    }

    impl Eq for Sourced {}

    impl PartialOrd for Sourced {
        fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
            Some(self.cmp(other))
        }
    }

    impl Ord for Sourced {
        fn cmp(&self, other: &Self) -> Ordering {
            self.key.cmp(&other.key)
        }
    }

    #[rstest]
    #[case(Order::Asc)]
    #[case(Order::Desc)]
    fn test_merger_stability(#[case] order: Order) {
        let chunks: Vec<Vec<Result<Sourced, io::Error>>> = (0..4)
            .map(|chunk| {
                let mut keys = vec![1, 2, 2, 3, 3, 3];
                if order == Order::Desc {
                    keys.reverse();
                }
                keys.into_iter().map(|key| Ok(Sourced { key, chunk })).collect()
            })
            .collect();

        let merged: Vec<Sourced> = KWayMerger::new(chunks, order).map(Result::unwrap).collect();
        assert_eq!(merged.len(), 24);
        assert!(order.is_sorted(&merged));

        for pair in merged.windows(2) {
            if pair[0].key == pair[1].key {
                assert!(pair[0].chunk <= pair[1].chunk, "unstable merge: {:?}", pair);
            }
        }
    }

    #[test]
    fn test_merger_frontier_bound() {
        let chunks: Vec<Vec<Result<u64, io::Error>>> = vec![
            vec![Ok(1), Ok(4), Ok(9)],
            vec![Ok(2)],
            vec![Ok(3), Ok(5)],
        ];

        let mut merger = KWayMerger::new(chunks, Order::Asc);
        assert_eq!(merger.next().unwrap().unwrap(), 1);
        assert_eq!(merger.open_chunks(), 3);
        assert_eq!(merger.next().unwrap().unwrap(), 2);
        assert_eq!(merger.open_chunks(), 2);

        let rest: Vec<u64> = merger.map(Result::unwrap).collect();
        assert_eq!(rest, vec![3, 4, 5, 9]);
    }

    #[rstest]
    #[case(
        vec![
            vec![Result::Err(io::Error::new(ErrorKind::Other, "test error"))],
            vec![Ok(1), Ok(2)],
        ],
        0,
    )]
    #[case(
        vec![
            vec![Ok(1), Result::Err(io::Error::new(ErrorKind::Other, "test error")), Ok(5)],
            vec![Ok(2), Ok(3)],
        ],
        0,
    )]
    #[case(
        vec![
            vec![Ok(1), Ok(4)],
            vec![Ok(2), Result::Err(io::Error::new(ErrorKind::Other, "test error"))],
        ],
        1,
    )]
    fn test_merger_fused_after_error(#[case] chunks: Vec<Vec<Result<u64, io::Error>>>, #[case] items_before: usize) {
        let mut merger = KWayMerger::new(chunks, Order::Asc);

        for _ in 0..items_before {
            assert!(merger.next().unwrap().is_ok());
        }
        assert!(merger.next().unwrap().is_err());
        assert!(merger.next().is_none());
        assert!(merger.next().is_none());
    }

    fn compare_vectors_of_result<T: PartialEq, E: Error + 'static>(
        actual: &Vec<Result<T, E>>,
        expected: &Vec<Result<T, E>>,
    ) -> bool {
        actual.len() == expected.len()
            && actual
                .into_iter()
                .zip(expected)
                .all(
                    |(actual_result, expected_result)| match (actual_result, expected_result) {
                        (Ok(actual_result), Ok(expected_result)) if actual_result == expected_result => true,
                        (Err(actual_err), Err(expected_err)) => actual_err.to_string() == expected_err.to_string(),
                        _ => false,
                    },
                )
    }
}
