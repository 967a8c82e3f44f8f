//! Result marshaling between the host and the launcher process.
//!
//! Both directions use the same plain encoding: `i32` values separated by
//! single spaces. The launcher flattens whatever argument shape it called
//! with (slice, boxed slice or vector) into that encoding after the call.

use crate::config::types::{Result, SortboxError};
use std::io::ErrorKind;
use std::path::Path;

pub struct ResultMarshaler;

impl ResultMarshaler {
    pub fn encode(values: &[i32]) -> String {
        values
            .iter()
            .map(i32::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn decode(text: &str) -> Result<Vec<i32>> {
        text.split_whitespace()
            .map(|token| {
                token.parse::<i32>().map_err(|e| {
                    SortboxError::Invocation(format!("malformed result value '{}': {}", token, e))
                })
            })
            .collect()
    }

    /// Read the post-call argument state written by the launcher.
    pub fn read(path: &Path) -> Result<Vec<i32>> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::decode(&text),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(SortboxError::Invocation(
                "callee exited before its result was written back".to_string(),
            )),
            Err(e) => Err(SortboxError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_accepts_any_whitespace() {
        assert_eq!(ResultMarshaler::decode(" -3 0\n7\t2147483647 ").unwrap(), vec![-3, 0, 7, i32::MAX]);
        assert!(ResultMarshaler::decode("").unwrap().is_empty());
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = ResultMarshaler::decode("1 two 3").unwrap_err();
        assert!(matches!(err, SortboxError::Invocation(msg) if msg.contains("two")));
    }

    #[test]
    fn encode_matches_launcher_format() {
        assert_eq!(ResultMarshaler::encode(&[5, -1, 0]), "5 -1 0");
        assert_eq!(ResultMarshaler::encode(&[]), "");
    }

    #[test]
    fn missing_result_is_invocation_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ResultMarshaler::read(&dir.path().join("result.txt")).unwrap_err();
        assert!(matches!(err, SortboxError::Invocation(_)));
    }
}
