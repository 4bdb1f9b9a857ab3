//! External sorter.

use log;
use std::error::Error;
use std::fmt;
use std::fmt::Display;
use std::fs;
use std::io::{self, prelude::*};
use std::path::Path;

use crate::chunk::{Chunk, WorkingSet};
use crate::merger::KWayMerger;
use crate::mergesort::ChunkSorter;
use crate::order::Order;
use crate::record::{self, Record, RecordError, RecordReader};
use crate::split::Splitter;

/// Default number of records per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Sorting error.
#[derive(Debug)]
pub enum SortError {
    /// Chunk size must be positive.
    InvalidChunkSize(usize),
    /// Threads number must be positive.
    InvalidThreadsNumber(usize),
    /// Temporary directory or file creation error.
    TempDir(io::Error),
    /// Workers thread pool initialization error.
    ThreadPoolBuildError(rayon::ThreadPoolBuildError),
    /// Common I/O error.
    IO(io::Error),
    /// Input line that is not a non-negative base-10 integer, or not valid UTF-8.
    MalformedRecord {
        line: u64,
        content: String,
        err: RecordError,
    },
}

impl Error for SortError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self {
            SortError::InvalidChunkSize(_) | SortError::InvalidThreadsNumber(_) => None,
            SortError::TempDir(err) => Some(err),
            SortError::ThreadPoolBuildError(err) => Some(err),
            SortError::IO(err) => Some(err),
            SortError::MalformedRecord { err, .. } => Some(err),
        }
    }
}

impl Display for SortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self {
            SortError::InvalidChunkSize(size) => write!(f, "chunk size must be positive, got {}", size),
            SortError::InvalidThreadsNumber(n) => write!(f, "threads number must be positive, got {}", n),
            SortError::TempDir(err) => write!(f, "temporary directory or file not created: {}", err),
            SortError::ThreadPoolBuildError(err) => write!(f, "thread pool initialization failed: {}", err),
            SortError::IO(err) => write!(f, "I/O operation failed: {}", err),
            SortError::MalformedRecord { line, content, err } => {
                write!(f, "malformed record at line {} ({:?}): {}", line, content, err)
            }
        }
    }
}

/// Sorting run summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSummary {
    /// Number of records written to the output.
    pub records: u64,
    /// Number of chunks the input was split into.
    pub chunks: usize,
}

/// External sorter builder. Provides methods for [`ExternalSorter`] initialization.
#[derive(Clone)]
pub struct ExternalSorterBuilder {
    /// Maximum number of records in a chunk.
    chunk_size: usize,
    /// Output order.
    order: Order,
    /// Number of threads to be used to sort chunks in parallel.
    threads_number: Option<usize>,
    /// Directory to be used to store temporary data.
    tmp_dir: Option<Box<Path>>,
    /// Chunk file read/write buffer size.
    rw_buf_size: Option<usize>,
}

impl ExternalSorterBuilder {
    /// Creates an instance of a builder with default parameters.
    pub fn new() -> Self {
        ExternalSorterBuilder::default()
    }

    /// Builds an [`ExternalSorter`] instance using provided configuration.
    pub fn build(self) -> Result<ExternalSorter, SortError> {
        ExternalSorter::new(
            self.chunk_size,
            self.order,
            self.threads_number,
            self.tmp_dir.as_deref(),
            self.rw_buf_size,
        )
    }

    /// Sets maximum number of records in a chunk.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> ExternalSorterBuilder {
        self.chunk_size = chunk_size;
        return self;
    }

    /// Sets output order.
    pub fn with_order(mut self, order: Order) -> ExternalSorterBuilder {
        self.order = order;
        return self;
    }

    /// Sets number of threads to be used to sort chunks in parallel.
    pub fn with_threads_number(mut self, threads_number: usize) -> ExternalSorterBuilder {
        self.threads_number = Some(threads_number);
        return self;
    }

    /// Sets directory to be used to store temporary data.
    pub fn with_tmp_dir(mut self, path: &Path) -> ExternalSorterBuilder {
        self.tmp_dir = Some(path.into());
        return self;
    }

    /// Sets chunk read/write buffer size.
    pub fn with_rw_buf_size(mut self, buf_size: usize) -> ExternalSorterBuilder {
        self.rw_buf_size = Some(buf_size);
        return self;
    }
}

impl Default for ExternalSorterBuilder {
    fn default() -> Self {
        ExternalSorterBuilder {
            chunk_size: DEFAULT_CHUNK_SIZE,
            order: Order::default(),
            threads_number: None,
            tmp_dir: None,
            rw_buf_size: None,
        }
    }
}

/// External sorter.
/// Splits the input into chunks, sorts every chunk and merges them into the output.
pub struct ExternalSorter {
    /// Maximum number of records in a chunk.
    chunk_size: usize,
    /// Output order.
    order: Order,
    /// Chunk sorting thread pool, chunks are sorted sequentially without it.
    thread_pool: Option<rayon::ThreadPool>,
    /// Directory the working directory of every run is created in.
    tmp_path: Option<Box<Path>>,
    /// Chunk file read/write buffer size.
    rw_buf_size: Option<usize>,
}

impl ExternalSorter {
    /// Creates a new external sorter instance.
    ///
    /// # Arguments
    /// * `chunk_size` - Maximum number of records held in memory and stored in a single chunk.
    /// * `order` - Output order.
    /// * `threads_number` - Number of threads to be used to sort chunks in parallel. If the parameter is [`None`]
    ///   chunks are sorted sequentially.
    /// * `tmp_path` - Directory to be used to store temporary data. If paramater is [`None`] default OS temporary
    ///   directory will be used.
    /// * `rw_buf_size` - Chunks file read/write buffer size.
    pub fn new(
        chunk_size: usize,
        order: Order,
        threads_number: Option<usize>,
        tmp_path: Option<&Path>,
        rw_buf_size: Option<usize>,
    ) -> Result<Self, SortError> {
        if chunk_size == 0 {
            return Err(SortError::InvalidChunkSize(chunk_size));
        }

        return Ok(ExternalSorter {
            chunk_size,
            order,
            rw_buf_size,
            thread_pool: Self::init_thread_pool(threads_number)?,
            tmp_path: tmp_path.map(Into::into),
        });
    }

    fn init_thread_pool(threads_number: Option<usize>) -> Result<Option<rayon::ThreadPool>, SortError> {
        let threads_number = match threads_number {
            Some(0) => return Err(SortError::InvalidThreadsNumber(0)),
            Some(threads_number) => threads_number,
            None => {
                log::info!("sorting chunks sequentially");
                return Ok(None);
            }
        };

        log::info!("initializing thread-pool (threads: {})", threads_number);
        let thread_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads_number)
            .build()
            .map_err(|err| SortError::ThreadPoolBuildError(err))?;

        return Ok(Some(thread_pool));
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn order(&self) -> Order {
        self.order
    }

    /// Number of chunk sorting threads, [`None`] if chunks are sorted sequentially.
    pub fn threads_number(&self) -> Option<usize> {
        self.thread_pool.as_ref().map(|pool| pool.current_num_threads())
    }

    /// Sorts records read line by line from `input` and writes them to `output`.
    ///
    /// # Arguments
    /// * `input` - Input stream, one record per line
    /// * `output` - Output stream the sorted records are written to
    pub fn sort<R, W>(&self, input: R, output: W) -> Result<SortSummary, SortError>
    where
        R: BufRead,
        W: Write,
    {
        let (working_set, records) = self.prepare(RecordReader::new(input))?;
        return self.merge(working_set, records, output);
    }

    /// Sorts the `input` file into the `output` file.
    /// The output file is created right before the merge starts.
    pub fn sort_file(&self, input: &Path, output: &Path) -> Result<SortSummary, SortError> {
        let input_file = fs::File::open(input).map_err(SortError::IO)?;
        let input_stream = match self.rw_buf_size {
            Some(buf_size) => io::BufReader::with_capacity(buf_size, input_file),
            None => io::BufReader::new(input_file),
        };

        let (working_set, records) = self.prepare(RecordReader::new(input_stream))?;

        let output_file = fs::File::create(output).map_err(SortError::IO)?;
        let output_stream = match self.rw_buf_size {
            Some(buf_size) => io::BufWriter::with_capacity(buf_size, output_file),
            None => io::BufWriter::new(output_file),
        };

        return self.merge(working_set, records, output_stream);
    }

    /// Splits the input into chunks and sorts every chunk.
    fn prepare<I>(&self, input: I) -> Result<(WorkingSet, u64), SortError>
    where
        I: IntoIterator<Item = Result<Record, SortError>>,
    {
        let mut working_set =
            WorkingSet::new(self.tmp_path.as_deref(), self.rw_buf_size).map_err(SortError::TempDir)?;

        let records = Splitter::new(self.chunk_size).split(input, &mut working_set)?;
        log::info!("{} records split into {} chunks", records, working_set.len());

        ChunkSorter::new(self.order, self.thread_pool.as_ref()).sort_chunks(working_set.chunks_mut())?;

        log::debug!("external sort preparation done");

        return Ok((working_set, records));
    }

    fn merge<W: Write>(&self, working_set: WorkingSet, records: u64, mut output: W) -> Result<SortSummary, SortError> {
        let readers = working_set
            .chunks()
            .iter()
            .map(Chunk::reader)
            .collect::<io::Result<Vec<_>>>()
            .map_err(SortError::IO)?;

        log::debug!("merging {} chunks ({})", readers.len(), self.order);

        let mut written = 0;
        for item in KWayMerger::new(readers, self.order) {
            let item = item.map_err(SortError::IO)?;
            record::write_record(&mut output, item).map_err(SortError::IO)?;
            written += 1;
        }
        output.flush().map_err(SortError::IO)?;
        debug_assert_eq!(written, records);

        let summary = SortSummary {
            records: written,
            chunks: working_set.len(),
        };
        working_set.close().map_err(SortError::TempDir)?;

        log::info!("{} records merged from {} chunks", summary.records, summary.chunks);

        return Ok(summary);
    }
}
