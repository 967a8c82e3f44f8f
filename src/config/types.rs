use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Known algorithm families a submission can be tagged with.
///
/// The hint only influences entry-point selection: partition-style families
/// prefer the `(arr, low, high)` shape over the single-argument one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AlgorithmHint {
    BubbleSort,
    SelectionSort,
    InsertionSort,
    QuickSort,
    MergeSort,
    HeapSort,
    ShellSort,
    BucketSort,
    RadixSort,
}

impl AlgorithmHint {
    pub const ALL: [AlgorithmHint; 9] = [
        AlgorithmHint::BubbleSort,
        AlgorithmHint::SelectionSort,
        AlgorithmHint::InsertionSort,
        AlgorithmHint::QuickSort,
        AlgorithmHint::MergeSort,
        AlgorithmHint::HeapSort,
        AlgorithmHint::ShellSort,
        AlgorithmHint::BucketSort,
        AlgorithmHint::RadixSort,
    ];

    /// Wire name used by the surrounding platform (`"quickSort"`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            AlgorithmHint::BubbleSort => "bubbleSort",
            AlgorithmHint::SelectionSort => "selectionSort",
            AlgorithmHint::InsertionSort => "insertionSort",
            AlgorithmHint::QuickSort => "quickSort",
            AlgorithmHint::MergeSort => "mergeSort",
            AlgorithmHint::HeapSort => "heapSort",
            AlgorithmHint::ShellSort => "shellSort",
            AlgorithmHint::BucketSort => "bucketSort",
            AlgorithmHint::RadixSort => "radixSort",
        }
    }

    /// Families whose textbook form recurses over `(low, high)` bounds.
    pub fn is_partitioning(self) -> bool {
        matches!(self, AlgorithmHint::QuickSort | AlgorithmHint::MergeSort)
    }

    /// Lenient parse: unknown names map to `None` instead of an error.
    pub fn parse_lenient(name: &str) -> Option<Self> {
        name.parse().ok()
    }
}

impl fmt::Display for AlgorithmHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlgorithmHint {
    type Err = SortboxError;

    fn from_str(s: &str) -> Result<Self> {
        // Accept camelCase, snake_case and kebab-case spellings alike.
        let folded: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        AlgorithmHint::ALL
            .into_iter()
            .find(|hint| hint.as_str().to_lowercase() == folded)
            .ok_or_else(|| SortboxError::Config(format!("unknown algorithm hint: {s}")))
    }
}

/// Failure classification reported to callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Compile,
    Resolution,
    Invocation,
    Timeout,
    Internal,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Compile => write!(f, "compile_error"),
            FailureKind::Resolution => write!(f, "resolution_error"),
            FailureKind::Invocation => write!(f, "invocation_error"),
            FailureKind::Timeout => write!(f, "timeout_error"),
            FailureKind::Internal => write!(f, "internal_error"),
        }
    }
}

/// Custom error types for sortbox
#[derive(Error, Debug)]
pub enum SortboxError {
    #[error("Compile error:\n{diagnostics}")]
    Compile { diagnostics: String },

    #[error("Resolution error: {0}")]
    Resolution(String),

    #[error("Invocation error: {0}")]
    Invocation(String),

    #[error("Time limit exceeded: {elapsed_ms} ms elapsed, limit is {limit_ms} ms")]
    Timeout { elapsed_ms: u64, limit_ms: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Toolchain error: {0}")]
    Toolchain(String),
}

impl SortboxError {
    pub fn kind(&self) -> FailureKind {
        match self {
            SortboxError::Compile { .. } => FailureKind::Compile,
            SortboxError::Resolution(_) => FailureKind::Resolution,
            SortboxError::Invocation(_) => FailureKind::Invocation,
            SortboxError::Timeout { .. } => FailureKind::Timeout,
            SortboxError::Io(_) | SortboxError::Config(_) | SortboxError::Toolchain(_) => {
                FailureKind::Internal
            }
        }
    }
}

/// Result type for sortbox operations
pub type Result<T> = std::result::Result<T, SortboxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hint_parses_platform_names() {
        assert_eq!("quickSort".parse::<AlgorithmHint>().unwrap(), AlgorithmHint::QuickSort);
        assert_eq!("merge_sort".parse::<AlgorithmHint>().unwrap(), AlgorithmHint::MergeSort);
        assert_eq!("Heap-Sort".parse::<AlgorithmHint>().unwrap(), AlgorithmHint::HeapSort);
        assert_eq!(AlgorithmHint::parse_lenient("bogoSort"), None);
    }

    #[test]
    fn only_quick_and_merge_sort_partition() {
        let partitioning: Vec<_> = AlgorithmHint::ALL
            .into_iter()
            .filter(|h| h.is_partitioning())
            .collect();
        assert_eq!(partitioning, vec![AlgorithmHint::QuickSort, AlgorithmHint::MergeSort]);
    }

    #[test]
    fn hint_serializes_as_camel_case() {
        let json = serde_json::to_string(&AlgorithmHint::InsertionSort).unwrap();
        assert_eq!(json, "\"insertionSort\"");
    }

    #[test]
    fn error_kinds_map_to_taxonomy() {
        let timeout = SortboxError::Timeout { elapsed_ms: 5100, limit_ms: 5000 };
        assert_eq!(timeout.kind(), FailureKind::Timeout);
        assert!(timeout.to_string().contains("5100"));
        assert_eq!(SortboxError::Toolchain("rustc missing".into()).kind(), FailureKind::Internal);
        assert_eq!(format!("{}", FailureKind::Resolution), "resolution_error");
    }
}
