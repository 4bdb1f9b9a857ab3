//! `ext-merge-sort` is a rust external merge sort implementation for line-oriented integer files.
//!
//! External sorting is required when the data being sorted do not fit into the main memory (RAM) of a computer
//! and instead must reside in slower external memory, usually a hard disk drive. Sorting is done in three stages:
//!
//! * **Split:** the input is read line by line and partitioned into chunks of at most `chunk_size` records,
//!   every chunk is stored in its own file inside a private temporary directory.
//! * **Sort:** every chunk is loaded, sorted in memory by a stable merge sort and rewritten in place.
//! * **Merge:** all chunks are opened at once and merged into the output by a k-way merge that keeps only
//!   the current head record of every chunk in memory.
//!
//! Records are non-negative base-10 integers, one per line, compared numerically. Both ascending and
//! descending orders are supported. The temporary directory is removed when the sort finishes, successfully
//! or not.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use ext_merge_sort::{ExternalSorter, ExternalSorterBuilder, Order};
//!
//! fn main() {
//!     let sorter: ExternalSorter = ExternalSorterBuilder::new()
//!         .with_tmp_dir(Path::new("./"))
//!         .with_chunk_size(100_000)
//!         .with_order(Order::Desc)
//!         .build()
//!         .unwrap();
//!
//!     let summary = sorter
//!         .sort_file(Path::new("input.txt"), Path::new("output.txt"))
//!         .unwrap();
//!
//!     println!("{} records sorted", summary.records);
//! }
//! ```

pub mod buffer;
pub mod chunk;
pub mod heap;
pub mod merger;
pub mod mergesort;
pub mod order;
pub mod record;
pub mod sort;
pub mod split;

pub use buffer::LimitedBuffer;
pub use chunk::{Chunk, ChunkReader, WorkingSet};
pub use heap::KeyedHeap;
pub use merger::KWayMerger;
pub use mergesort::{merge_sort, ChunkSorter};
pub use order::{Order, Priority};
pub use record::{Record, RecordError, RecordReader};
pub use sort::{ExternalSorter, ExternalSorterBuilder, SortError, SortSummary, DEFAULT_CHUNK_SIZE};
pub use split::Splitter;
