//! Stable merge sort and the chunk sorter built on it.

use log;
use rayon::prelude::*;

use crate::chunk::Chunk;
use crate::order::Order;
use crate::sort::SortError;

/// Sorts `items` in place using a top-down merge sort.
///
/// The slice is halved (split point rounded down) until single items remain, then the halves
/// are merged back taking the left item on ties, so equal items keep their relative order.
/// A single scratch buffer of `items.len()` elements is reused by every merge step.
pub fn merge_sort<T: Ord + Clone>(items: &mut [T], order: Order) {
    let mut scratch = Vec::with_capacity(items.len());
    sort_range(items, &mut scratch, order);
}

fn sort_range<T: Ord + Clone>(items: &mut [T], scratch: &mut Vec<T>, order: Order) {
    if items.len() <= 1 {
        return;
    }

    let middle = items.len() / 2;
    {
        let (left, right) = items.split_at_mut(middle);
        sort_range(left, scratch, order);
        sort_range(right, scratch, order);
    }
    merge_halves(items, middle, scratch, order);
}

fn merge_halves<T: Ord + Clone>(items: &mut [T], middle: usize, scratch: &mut Vec<T>, order: Order) {
    scratch.clear();
    scratch.extend_from_slice(items);
    let (left, right) = scratch.split_at(middle);

    let (mut l, mut r) = (0, 0);
    for slot in items.iter_mut() {
        let take_left = match (left.get(l), right.get(r)) {
            (Some(a), Some(b)) => order.takes_left(a, b),
            (Some(_), None) => true,
            (None, _) => false,
        };

        if take_left {
            *slot = left[l].clone();
            l += 1;
        } else {
            *slot = right[r].clone();
            r += 1;
        }
    }
}

/// Chunk sorter. Loads every chunk, sorts it in memory and rewrites it in place.
pub struct ChunkSorter<'a> {
    order: Order,
    thread_pool: Option<&'a rayon::ThreadPool>,
}

impl<'a> ChunkSorter<'a> {
    /// Creates a chunk sorter. With a thread pool chunks are distributed over its threads,
    /// without one they are sorted one after another in index order.
    pub fn new(order: Order, thread_pool: Option<&'a rayon::ThreadPool>) -> Self {
        ChunkSorter { order, thread_pool }
    }

    pub fn sort_chunks(&self, chunks: &mut [Chunk]) -> Result<(), SortError> {
        log::debug!("sorting {} chunks ({})", chunks.len(), self.order);

        match self.thread_pool {
            Some(thread_pool) => {
                thread_pool.install(|| chunks.par_iter_mut().try_for_each(|chunk| self.sort_chunk(chunk)))
            }
            None => chunks.iter_mut().try_for_each(|chunk| self.sort_chunk(chunk)),
        }
    }

    pub fn sort_chunk(&self, chunk: &mut Chunk) -> Result<(), SortError> {
        let mut items = chunk.load().map_err(SortError::IO)?;
        merge_sort(&mut items, self.order);
        chunk.rewrite(items).map_err(SortError::IO)?;

        log::debug!("chunk {} sorted", chunk.index());

        return Ok(());
    }
}
