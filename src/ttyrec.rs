//! ttyrec recordings
//!
//! A recording is a sequence of records, each a 12-byte header of three
//! little-endian `u32` values (seconds, microseconds, payload length)
//! followed by the payload bytes.

use std::path::Path;
use std::time::Duration;

use thiserror::Error;

const HEADER_LEN: usize = 12;

/// Recording errors
#[derive(Debug, Error)]
pub enum RecordingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("truncated record header at byte {offset}")]
    TruncatedHeader { offset: usize },

    #[error("record at byte {offset} needs {expected} payload bytes, {available} left")]
    TruncatedPayload {
        offset: usize,
        expected: usize,
        available: usize,
    },
}

/// One chunk of terminal output with its capture time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Absolute capture time as stored in the file
    pub time: Duration,
    pub data: Vec<u8>,
}

impl Record {
    pub fn new(time: Duration, data: impl Into<Vec<u8>>) -> Self {
        Self {
            time,
            data: data.into(),
        }
    }
}

fn le32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

/// Decode a whole recording
pub fn parse(bytes: &[u8]) -> Result<Vec<Record>, RecordingError> {
    let mut records = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        if bytes.len() - pos < HEADER_LEN {
            return Err(RecordingError::TruncatedHeader { offset: pos });
        }
        let sec = le32(bytes, pos);
        let usec = le32(bytes, pos + 4);
        let len = le32(bytes, pos + 8) as usize;

        let start = pos + HEADER_LEN;
        let available = bytes.len() - start;
        if available < len {
            return Err(RecordingError::TruncatedPayload {
                offset: pos,
                expected: len,
                available,
            });
        }

        let time = Duration::from_secs(u64::from(sec)) + Duration::from_micros(u64::from(usec));
        records.push(Record::new(time, &bytes[start..start + len]));
        pos = start + len;
    }
    tracing::debug!(records = records.len(), bytes = bytes.len(), "parsed recording");
    Ok(records)
}

pub fn read_file(path: impl AsRef<Path>) -> Result<Vec<Record>, RecordingError> {
    let bytes = std::fs::read(path)?;
    parse(&bytes)
}

/// Encode records back into the file format
///
/// Payloads longer than `u32::MAX` are split into several records with the
/// same timestamp.
pub fn encode(records: &[Record]) -> Vec<u8> {
    let mut out = Vec::with_capacity(
        records
            .iter()
            .map(|r| HEADER_LEN + r.data.len())
            .sum::<usize>(),
    );
    for record in records {
        let sec = u32::try_from(record.time.as_secs()).unwrap_or(u32::MAX);
        let usec = record.time.subsec_micros();
        let mut write = |chunk: &[u8]| {
            out.extend_from_slice(&sec.to_le_bytes());
            out.extend_from_slice(&usec.to_le_bytes());
            out.extend_from_slice(&(chunk.len() as u32).to_le_bytes());
            out.extend_from_slice(chunk);
        };
        if record.data.is_empty() {
            write(&[]);
        }
        for chunk in record.data.chunks(u32::MAX as usize) {
            write(chunk);
        }
    }
    out
}

pub fn write_file(path: impl AsRef<Path>, records: &[Record]) -> Result<(), RecordingError> {
    std::fs::write(path, encode(records))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(sec: u32, usec: u32, len: u32) -> Vec<u8> {
        [sec, usec, len].iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn test_parse_two_records() {
        let mut bytes = header(10, 500_000, 2);
        bytes.extend_from_slice(b"hi");
        bytes.extend(header(11, 0, 0));

        let records = parse(&bytes).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].time, Duration::from_millis(10_500));
        assert_eq!(records[0].data, b"hi");
        assert_eq!(records[1].time, Duration::from_secs(11));
        assert!(records[1].data.is_empty());
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_parse_truncated_header() {
        let mut bytes = header(1, 0, 1);
        bytes.push(b'x');
        bytes.extend_from_slice(&[0, 0, 0]);
        assert!(matches!(
            parse(&bytes),
            Err(RecordingError::TruncatedHeader { offset: 13 })
        ));
    }

    #[test]
    fn test_parse_truncated_payload() {
        let mut bytes = header(1, 0, 5);
        bytes.extend_from_slice(b"abc");
        assert!(matches!(
            parse(&bytes),
            Err(RecordingError::TruncatedPayload {
                offset: 0,
                expected: 5,
                available: 3
            })
        ));
    }

    #[test]
    fn test_encode_matches_layout() {
        let records = vec![Record::new(Duration::from_micros(1_000_002), b"ab".to_vec())];
        let mut expected = header(1, 2, 2);
        expected.extend_from_slice(b"ab");
        assert_eq!(encode(&records), expected);
        assert_eq!(parse(&expected).unwrap(), records);
    }
}
