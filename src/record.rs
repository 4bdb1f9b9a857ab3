//! Line-oriented record encoding.

use std::error::Error;
use std::fmt::{self, Display};
use std::io::{self, prelude::*};
use std::num::ParseIntError;
use std::str::Utf8Error;

use crate::sort::SortError;

/// A single sortable unit: a non-negative integer stored as base-10 text on its own line.
pub type Record = u64;

/// Reason an input line is not a record.
#[derive(Debug)]
pub enum RecordError {
    /// The line is not valid UTF-8.
    Encoding(Utf8Error),
    /// The line is not a non-negative base-10 integer.
    Number(ParseIntError),
}

impl Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordError::Encoding(err) => write!(f, "invalid UTF-8: {}", err),
            RecordError::Number(err) => write!(f, "not a non-negative integer: {}", err),
        }
    }
}

impl Error for RecordError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RecordError::Encoding(err) => Some(err),
            RecordError::Number(err) => Some(err),
        }
    }
}

/// Parses a line into a record. Blank lines yield `Ok(None)`.
///
/// Surrounding whitespace is ignored. An explicit leading `+` sign is accepted, so `+5` reads as `5`
/// and is written back without the sign.
pub fn parse_line(line: &str) -> Result<Option<Record>, ParseIntError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    return trimmed.parse::<Record>().map(Some);
}

/// Writes a record followed by a line break.
pub fn write_record<W: Write>(writer: &mut W, record: Record) -> io::Result<()> {
    writeln!(writer, "{}", record)
}

/// Input record reader.
/// Reads records line by line, skipping blank lines and failing on the first malformed one.
/// Lines that are not valid UTF-8 are malformed too.
pub struct RecordReader<R> {
    reader: R,
    line: Vec<u8>,
    line_number: u64,
    failed: bool,
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(reader: R) -> Self {
        RecordReader {
            reader,
            line: Vec::new(),
            line_number: 0,
            failed: false,
        }
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = Result<Record, SortError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            self.line.clear();
            match self.reader.read_until(b'\n', &mut self.line) {
                Ok(0) => return None,
                Ok(_) => self.line_number += 1,
                Err(err) => {
                    self.failed = true;
                    return Some(Err(SortError::IO(err)));
                }
            }

            let parsed = std::str::from_utf8(&self.line)
                .map_err(RecordError::Encoding)
                .and_then(|line| parse_line(line).map_err(RecordError::Number));

            match parsed {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => continue,
                Err(err) => {
                    self.failed = true;
                    let content = String::from_utf8_lossy(&self.line);
                    return Some(Err(SortError::MalformedRecord {
                        line: self.line_number,
                        content: content.trim_end_matches(|c: char| c == '\r' || c == '\n').to_string(),
                        err,
                    }));
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::io;

    use rstest::*;

    use super::{parse_line, write_record, RecordError, RecordReader};
    use crate::sort::SortError;

    #[rstest]
    #[case("42", Some(42))]
    #[case("  7\t", Some(7))]
    #[case("", None)]
    #[case("   ", None)]
    #[case("+5", Some(5))]
    fn test_parse_line(#[case] line: &str, #[case] expected: Option<u64>) {
        assert_eq!(parse_line(line).unwrap(), expected);
    }

    #[rstest]
    #[case("abc")]
    #[case("-3")]
    #[case("1.5")]
    #[case("1 2")]
    fn test_parse_line_malformed(#[case] line: &str) {
        assert!(parse_line(line).is_err());
    }

    #[test]
    fn test_record_reader() {
        let input = io::Cursor::new("5\n3\n\n3\r\n1\n");
        let records: Vec<u64> = RecordReader::new(input).map(Result::unwrap).collect();
        assert_eq!(records, vec![5, 3, 3, 1]);
    }

    #[test]
    fn test_record_reader_malformed() {
        let input = io::Cursor::new("5\n\nfive\n1\n");
        let mut reader = RecordReader::new(input);

        assert_eq!(reader.next().unwrap().unwrap(), 5);
        match reader.next() {
            Some(Err(SortError::MalformedRecord { line, content, .. })) => {
                assert_eq!(line, 3);
                assert_eq!(content, "five");
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_record_reader_invalid_utf8() {
        let input = io::Cursor::new(b"4\n\n\xff\xfe7\r\n1\n".to_vec());
        let mut reader = RecordReader::new(input);

        assert_eq!(reader.next().unwrap().unwrap(), 4);
        match reader.next() {
            Some(Err(SortError::MalformedRecord { line, content, err })) => {
                assert_eq!(line, 3);
                assert_eq!(content, "\u{FFFD}\u{FFFD}7");
                assert!(matches!(err, RecordError::Encoding(_)));
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_record_reader_no_trailing_newline() {
        let input = io::Cursor::new("2\n1");
        let records: Vec<u64> = RecordReader::new(input).map(Result::unwrap).collect();
        assert_eq!(records, vec![2, 1]);
    }

    #[test]
    fn test_write_record() {
        let mut output = Vec::new();
        write_record(&mut output, 10).unwrap();
        write_record(&mut output, 0).unwrap();
        assert_eq!(output, b"10\n0\n");
    }
}
