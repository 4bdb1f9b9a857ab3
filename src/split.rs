//! Chunk splitter.

use log;

use crate::buffer::LimitedBuffer;
use crate::chunk::WorkingSet;
use crate::record::Record;
use crate::sort::SortError;

/// Partitions an input record stream into chunks of `chunk_size` records.
/// At most one chunk worth of records is held in memory at a time.
pub struct Splitter {
    chunk_size: usize,
}

impl Splitter {
    pub fn new(chunk_size: usize) -> Self {
        Splitter { chunk_size }
    }

    /// Splits `input` into chunks stored in `working_set`, preserving the input order inside each chunk.
    /// Returns the number of records read.
    pub fn split<I>(&self, input: I, working_set: &mut WorkingSet) -> Result<u64, SortError>
    where
        I: IntoIterator<Item = Result<Record, SortError>>,
    {
        if self.chunk_size == 0 {
            return Err(SortError::InvalidChunkSize(self.chunk_size));
        }

        let mut chunk_buf = LimitedBuffer::new(self.chunk_size);
        let mut records = 0;

        for item in input.into_iter() {
            chunk_buf.push(item?);
            records += 1;

            if chunk_buf.is_full() {
                working_set.push_chunk(chunk_buf.drain()).map_err(SortError::IO)?;
            }
        }

        if !chunk_buf.is_empty() {
            working_set.push_chunk(chunk_buf.drain()).map_err(SortError::IO)?;
        }

        log::debug!("input split into {} chunks ({} records)", working_set.len(), records);

        return Ok(records);
    }
}
