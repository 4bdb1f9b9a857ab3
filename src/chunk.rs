//! Chunk stores and the working set they live in.

use std::fs;
use std::io::{self, prelude::*};
use std::path::{Path, PathBuf};

use log;
use tempfile;

use crate::record::{self, Record};

/// External chunk. A bounded partition of the input stored as a text file, one record per line.
#[derive(Debug)]
pub struct Chunk {
    index: usize,
    path: PathBuf,
    len: usize,
    rw_buf_size: Option<usize>,
}

impl Chunk {
    /// Creates a chunk file in `dir` and fills it with `items`.
    /// The file name is derived from the chunk index.
    pub fn build(
        dir: &Path,
        index: usize,
        items: impl IntoIterator<Item = Record>,
        rw_buf_size: Option<usize>,
    ) -> io::Result<Self> {
        let mut chunk = Chunk {
            index,
            path: dir.join(format!("chunk-{:06}.txt", index)),
            len: 0,
            rw_buf_size,
        };
        chunk.dump(items)?;

        return Ok(chunk);
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of records stored in the chunk.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Reads the whole chunk into memory.
    pub fn load(&self) -> io::Result<Vec<Record>> {
        let mut items = Vec::with_capacity(self.len);
        for item in self.reader()? {
            items.push(item?);
        }

        return Ok(items);
    }

    /// Replaces the chunk content with `items`.
    pub fn rewrite(&mut self, items: impl IntoIterator<Item = Record>) -> io::Result<()> {
        self.dump(items)
    }

    /// Opens a sequential reader over the chunk records.
    pub fn reader(&self) -> io::Result<ChunkReader> {
        let file = fs::File::open(&self.path)?;
        let reader = match self.rw_buf_size {
            Some(buf_size) => io::BufReader::with_capacity(buf_size, file),
            None => io::BufReader::new(file),
        };

        return Ok(ChunkReader {
            path: self.path.clone(),
            lines: reader.lines(),
        });
    }

    /// Deletes the chunk file.
    pub fn remove(self) -> io::Result<()> {
        fs::remove_file(&self.path)
    }

    fn dump(&mut self, items: impl IntoIterator<Item = Record>) -> io::Result<()> {
        let file = fs::File::create(&self.path)?;
        let mut chunk_writer = match self.rw_buf_size {
            Some(buf_size) => io::BufWriter::with_capacity(buf_size, file),
            None => io::BufWriter::new(file),
        };

        let mut len = 0;
        for item in items.into_iter() {
            record::write_record(&mut chunk_writer, item)?;
            len += 1;
        }
        chunk_writer.flush()?;
        self.len = len;

        return Ok(());
    }
}

/// Sequential chunk reader. Yields the chunk records from start to end.
pub struct ChunkReader {
    path: PathBuf,
    lines: io::Lines<io::BufReader<fs::File>>,
}

impl Iterator for ChunkReader {
    type Item = io::Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(err) => return Some(Err(err)),
            };

            match record::parse_line(&line) {
                Ok(Some(item)) => return Some(Ok(item)),
                Ok(None) => continue,
                Err(err) => {
                    return Some(Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("chunk {} corrupted: {}", self.path.display(), err),
                    )))
                }
            }
        }
    }
}

/// Working set of a single sort run: a private temporary directory and the chunks stored in it.
///
/// The directory and every chunk file are removed when the working set is dropped,
/// so an aborted run leaves nothing behind. [`WorkingSet::close`] does the same
/// explicitly and reports removal errors.
pub struct WorkingSet {
    dir: tempfile::TempDir,
    chunks: Vec<Chunk>,
    rw_buf_size: Option<usize>,
}

impl WorkingSet {
    /// Creates a working directory inside `tmp_path` or inside the OS temporary directory.
    pub fn new(tmp_path: Option<&Path>, rw_buf_size: Option<usize>) -> io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("ext-merge-sort-");

        let dir = match tmp_path {
            Some(tmp_path) => builder.tempdir_in(tmp_path),
            None => builder.tempdir(),
        }?;

        log::info!("using {} as a temporary directory", dir.path().display());

        return Ok(WorkingSet {
            dir,
            chunks: Vec::new(),
            rw_buf_size,
        });
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Stores `items` as the next chunk.
    pub fn push_chunk(&mut self, items: impl IntoIterator<Item = Record>) -> io::Result<&Chunk> {
        let index = self.chunks.len();
        let chunk = Chunk::build(self.dir.path(), index, items, self.rw_buf_size)?;
        log::debug!("chunk {} saved ({} records)", index, chunk.len());

        self.chunks.push(chunk);
        return Ok(&self.chunks[index]);
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn chunks_mut(&mut self) -> &mut [Chunk] {
        &mut self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Deletes every chunk file and then the directory itself.
    pub fn close(self) -> io::Result<()> {
        let WorkingSet { dir, chunks, .. } = self;
        for chunk in chunks {
            chunk.remove()?;
        }
        log::debug!("removing temporary directory {}", dir.path().display());

        return dir.close();
    }
}

#[cfg(test)]
mod test {
    use std::fs;

    use rstest::*;

    use super::{Chunk, WorkingSet};

    #[fixture]
    fn tmp_dir() -> tempfile::TempDir {
        tempfile::tempdir().unwrap()
    }

    #[rstest]
    fn test_chunk(tmp_dir: tempfile::TempDir) {
        let saved = Vec::from_iter(0..100u64);

        let chunk = Chunk::build(tmp_dir.path(), 3, saved.clone(), None).unwrap();
        assert_eq!(chunk.index(), 3);
        assert_eq!(chunk.len(), 100);
        assert!(chunk.path().ends_with("chunk-000003.txt"));

        let restored: Vec<u64> = chunk.reader().unwrap().map(Result::unwrap).collect();
        assert_eq!(restored, saved);
    }

    #[rstest]
    fn test_chunk_rewrite(tmp_dir: tempfile::TempDir) {
        let mut chunk = Chunk::build(tmp_dir.path(), 0, vec![5, 3, 4], Some(16)).unwrap();

        chunk.rewrite(vec![1, 2]).unwrap();
        assert_eq!(chunk.len(), 2);
        assert_eq!(chunk.load().unwrap(), vec![1, 2]);
        assert_eq!(fs::read_to_string(chunk.path()).unwrap(), "1\n2\n");
    }

    #[rstest]
    fn test_chunk_corrupted(tmp_dir: tempfile::TempDir) {
        let chunk = Chunk::build(tmp_dir.path(), 0, vec![1], None).unwrap();
        fs::write(chunk.path(), "1\nbroken\n").unwrap();

        let err = chunk.load().unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    #[rstest]
    fn test_working_set_close(tmp_dir: tempfile::TempDir) {
        let mut working_set = WorkingSet::new(Some(tmp_dir.path()), None).unwrap();
        let path = working_set.path().to_path_buf();

        working_set.push_chunk(vec![2, 1]).unwrap();
        working_set.push_chunk(vec![3]).unwrap();
        assert_eq!(working_set.len(), 2);
        assert_eq!(working_set.chunks()[1].index(), 1);
        assert_eq!(fs::read_dir(&path).unwrap().count(), 2);

        working_set.close().unwrap();
        assert!(!path.exists());
    }

    #[rstest]
    fn test_working_set_drop(tmp_dir: tempfile::TempDir) {
        let path = {
            let mut working_set = WorkingSet::new(Some(tmp_dir.path()), None).unwrap();
            working_set.push_chunk(vec![7]).unwrap();
            working_set.path().to_path_buf()
        };

        assert!(!path.exists());
        assert_eq!(fs::read_dir(tmp_dir.path()).unwrap().count(), 0);
    }
}
