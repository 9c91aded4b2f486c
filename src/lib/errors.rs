//! Custom error types for covcap operations.

use covcap_raw_bam::LayoutError;
use thiserror::Error;

/// Result type alias for covcap operations
pub type Result<T> = std::result::Result<T, CovcapError>;

/// Error type for covcap operations
#[derive(Error, Debug)]
pub enum CovcapError {
    /// Invalid parameter value provided
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// The parameter name
        parameter: String,
        /// Explanation of why it's invalid
        reason: String,
    },

    /// File format error
    #[error("Invalid {file_type} file '{path}': {reason}")]
    InvalidFileFormat {
        /// Type of file (e.g., "BAM", "Input BAM")
        file_type: String,
        /// Path to the file
        path: String,
        /// Explanation of the problem
        reason: String,
    },

    /// Input records are not in coordinate order.
    #[error(
        "Input is not coordinate sorted: record '{read_name}' at {ref_id}:{pos} follows a record at {previous_ref_id}:{previous_pos}"
    )]
    UnsortedInput {
        /// Name of the out-of-order record
        read_name: String,
        /// Reference id of the out-of-order record
        ref_id: i32,
        /// 0-based start of the out-of-order record
        pos: i32,
        /// Reference id of the record admitted just before it
        previous_ref_id: i32,
        /// 0-based start of the record admitted just before it
        previous_pos: i32,
    },

    /// A raw record could not be interpreted.
    #[error("Malformed BAM record #{record_number}: {source}")]
    MalformedRecord {
        /// 1-based ordinal of the record in the input
        record_number: u64,
        /// Layout problem found in the record bytes
        #[source]
        source: LayoutError,
    },

    /// Underlying I/O failure while reading or writing records.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
